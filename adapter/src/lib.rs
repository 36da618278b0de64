//! Client-side UCI session adapter
//!
//! Validates and serializes outbound UCI commands, parses the engine's text
//! output into structured records, and fans those records out to observers.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use uci_adapter::{CallbackRegistry, GoParams, PositionSpec, ProcessBackend, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(CallbackRegistry::new());
//!     let backend = ProcessBackend::new("stockfish");
//!     let session = Session::new(backend, registry, SessionConfig::default())?;
//!     session.on_best_move(|best| println!("bestmove {}", best.mv));
//!     session.uci()?;
//!     session.set_position(&PositionSpec::startpos())?;
//!     session.go(&GoParams::depth(12))?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod observer;
pub mod registry;
pub mod session;
pub mod uci;

pub use backend::{EngineBackend, ProcessBackend};
#[cfg(any(test, feature = "mock"))]
pub use backend::ScriptedBackend;
pub use error::{EngineError, OptionError, SessionError, SessionResult};
pub use observer::{ObserverId, ObserverList};
pub use registry::{CallbackRegistry, LineSink, SessionToken};
pub use session::{Dispatcher, Session, SessionConfig};
pub use uci::{
    classify, validate, Command, GoParams, InfoSplitting, PositionBase, PositionSpec, UciOption,
    UciOutput, ValidatedOption,
};

use serde::{Deserialize, Serialize};

/// Engine analysis information from one `info` segment
///
/// Numeric fields the engine did not report stay at zero; callers that care
/// about "absent" versus "zero" should check the `Option` fields or the raw
/// line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchInfo {
    pub multipv: u32,
    pub depth: u32,
    pub seldepth: u32,
    pub time_ms: u64,
    pub pv: Vec<String>, // Principal variation
    pub score: Score,
    pub bound: Option<ScoreBound>,
    pub wdl: Option<Wdl>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub hashfull: Option<u32>,
    pub tbhits: Option<u64>,
    pub currmove: Option<String>,
    pub currmovenumber: Option<u32>,
}

impl Default for SearchInfo {
    fn default() -> Self {
        Self {
            multipv: 1,
            depth: 0,
            seldepth: 0,
            time_ms: 0,
            pv: Vec::new(),
            score: Score::Centipawns(0),
            bound: None,
            wdl: None,
            nodes: None,
            nps: None,
            hashfull: None,
            tbhits: None,
            currmove: None,
            currmovenumber: None,
        }
    }
}

impl SearchInfo {
    /// Centipawn score, or mate distance in moves when [`Self::is_mate`].
    pub fn score_centipawns(&self) -> i32 {
        match self.score {
            Score::Centipawns(cp) => cp,
            Score::Mate(n) => n,
        }
    }

    pub fn is_mate(&self) -> bool {
        matches!(self.score, Score::Mate(_))
    }

    /// Per-candidate-move progress report rather than a finished iteration.
    pub fn is_progress_update(&self) -> bool {
        self.currmove.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    Centipawns(i32),
    Mate(i32), // Negative for being mated
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBound {
    Lower,
    Upper,
}

/// Win/draw/loss estimate in permille.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wdl {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

/// Result of a `bestmove` line.
///
/// `mv` is `"(none)"` or empty when the engine had no legal move to report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestMove {
    pub mv: String,
    pub ponder: Option<String>,
}
