//! Engine collaborators.
//!
//! A backend owns one running engine instance. It accepts command lines
//! through [`EngineBackend::send`] and hands every output line to the
//! [`LineSink`] it was started with, in the order the engine produced them.

mod process;
#[cfg(any(test, feature = "mock"))]
mod scripted;

pub use process::ProcessBackend;
#[cfg(any(test, feature = "mock"))]
pub use scripted::{ScriptedBackend, ScriptedEngine};

use crate::error::EngineError;
use crate::registry::LineSink;

pub trait EngineBackend: Send {
    /// Bring the engine up and begin delivering its output to `sink`.
    fn start(&mut self, sink: LineSink) -> Result<(), EngineError>;

    /// Send one command line. The line carries no trailing newline.
    fn send(&mut self, line: &str) -> Result<(), EngineError>;

    /// When enabled, output goes only to the sink and never to a console.
    fn set_library_mode(&mut self, _enabled: bool) {}

    /// Ask the engine to quit and release its resources.
    fn shutdown(&mut self) -> Result<(), EngineError>;
}
