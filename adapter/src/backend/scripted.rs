//! Scripted engine backend for testing

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::EngineBackend;
use crate::error::EngineError;
use crate::registry::LineSink;

#[derive(Default)]
struct ScriptState {
    sink: Option<LineSink>,
    sent: Vec<String>,
    replies: HashMap<String, Vec<String>>,
    library_mode: Option<bool>,
    shut_down: bool,
}

/// In-memory engine that records every command and answers from a script.
///
/// Replies configured with [`ScriptedBackend::with_reply`] are delivered
/// synchronously from inside `send`, before it returns.
#[derive(Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptState>>,
}

/// Test-side handle to a [`ScriptedBackend`] that has been moved into a session.
#[derive(Clone)]
pub struct ScriptedEngine {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` (matched on its first token) with `lines`.
    pub fn with_reply<I, S>(self, command: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.state)
            .replies
            .insert(command.to_string(), lines.into_iter().map(Into::into).collect());
        self
    }

    /// Replies that make `uci` and `isready` succeed.
    pub fn with_handshake(self) -> Self {
        self.with_reply("uci", ["id name Scripted", "uciok"])
            .with_reply("isready", ["readyok"])
    }

    pub fn handle(&self) -> ScriptedEngine {
        ScriptedEngine {
            state: self.state.clone(),
        }
    }
}

impl ScriptedEngine {
    /// Inject a line as if the engine had printed it.
    pub fn emit(&self, line: &str) -> bool {
        let sink = lock(&self.state).sink.clone();
        match sink {
            Some(sink) => sink.deliver(line),
            None => false,
        }
    }

    pub fn sent(&self) -> Vec<String> {
        lock(&self.state).sent.clone()
    }

    pub fn library_mode(&self) -> Option<bool> {
        lock(&self.state).library_mode
    }

    pub fn is_shut_down(&self) -> bool {
        lock(&self.state).shut_down
    }
}

impl EngineBackend for ScriptedBackend {
    fn start(&mut self, sink: LineSink) -> Result<(), EngineError> {
        lock(&self.state).sink = Some(sink);
        Ok(())
    }

    fn send(&mut self, line: &str) -> Result<(), EngineError> {
        let (sink, replies) = {
            let mut state = lock(&self.state);
            if state.shut_down {
                return Err(EngineError::Closed);
            }
            let sink = state.sink.clone().ok_or(EngineError::NotStarted)?;
            state.sent.push(line.to_string());
            let key = line.split_whitespace().next().unwrap_or_default();
            (sink, state.replies.get(key).cloned().unwrap_or_default())
        };

        for reply in replies {
            sink.deliver(&reply);
        }
        Ok(())
    }

    fn set_library_mode(&mut self, enabled: bool) {
        lock(&self.state).library_mode = Some(enabled);
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        let mut state = lock(&self.state);
        state.shut_down = true;
        state.sink = None;
        Ok(())
    }
}

fn lock(state: &Mutex<ScriptState>) -> MutexGuard<'_, ScriptState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
