//! Routing of engine output to the session that owns the engine.
//!
//! Each session registers its [`Dispatcher`] and receives a [`SessionToken`].
//! The backend gets a [`LineSink`] carrying that token and hands every output
//! line back through it, so any number of sessions can share one registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use uuid::Uuid;

use crate::session::Dispatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
pub struct CallbackRegistry {
    targets: RwLock<HashMap<SessionToken, Weak<Dispatcher>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, dispatcher: &Arc<Dispatcher>) -> SessionToken {
        let token = SessionToken::new();
        self.targets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token, Arc::downgrade(dispatcher));
        tracing::debug!("Registered session {}", token);
        token
    }

    /// Returns `true` if the token was registered.
    pub fn unregister(&self, token: SessionToken) -> bool {
        let removed = self
            .targets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&token)
            .is_some();
        if removed {
            tracing::debug!("Unregistered session {}", token);
        }
        removed
    }

    /// Hand `line` to the session registered under `token`.
    ///
    /// Returns `false` when no live session holds the token; the line is
    /// dropped.
    pub fn deliver(&self, token: SessionToken, line: &str) -> bool {
        let target = self
            .targets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&token)
            .and_then(Weak::upgrade);

        match target {
            Some(dispatcher) => {
                dispatcher.dispatch_line(line);
                true
            }
            None => {
                tracing::trace!("Dropping line for unknown session {}: {}", token, line);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.targets.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output channel handed to an engine backend.
#[derive(Clone)]
pub struct LineSink {
    token: SessionToken,
    registry: Arc<CallbackRegistry>,
}

impl LineSink {
    pub fn new(token: SessionToken, registry: Arc<CallbackRegistry>) -> Self {
        Self { token, registry }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn deliver(&self, line: &str) -> bool {
        self.registry.deliver(self.token, line)
    }
}

impl fmt::Debug for LineSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSink").field("token", &self.token).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;
    use std::sync::Mutex;

    fn recording_dispatcher() -> (Arc<Dispatcher>, Arc<Mutex<Vec<String>>>) {
        let dispatcher = Arc::new(Dispatcher::new(SessionConfig::default()));
        let lines = Arc::new(Mutex::new(Vec::new()));
        let l = lines.clone();
        dispatcher
            .raw_output()
            .add(move |line: &str| l.lock().unwrap().push(line.to_string()));
        (dispatcher, lines)
    }

    #[test]
    fn test_tokens_route_to_their_own_session() {
        let registry = Arc::new(CallbackRegistry::new());
        let (first, first_lines) = recording_dispatcher();
        let (second, second_lines) = recording_dispatcher();

        let first_sink = LineSink::new(registry.register(&first), registry.clone());
        let second_sink = LineSink::new(registry.register(&second), registry.clone());
        assert_ne!(first_sink.token(), second_sink.token());
        assert_eq!(registry.len(), 2);

        assert!(first_sink.deliver("readyok"));
        assert!(second_sink.deliver("uciok"));

        assert_eq!(*first_lines.lock().unwrap(), vec!["readyok"]);
        assert_eq!(*second_lines.lock().unwrap(), vec!["uciok"]);
    }

    #[test]
    fn test_unregistered_token_drops_lines() {
        let registry = Arc::new(CallbackRegistry::new());
        let (dispatcher, lines) = recording_dispatcher();
        let token = registry.register(&dispatcher);

        assert!(registry.unregister(token));
        assert!(!registry.unregister(token));
        assert!(!registry.deliver(token, "readyok"));
        assert!(lines.lock().unwrap().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropped_dispatcher_is_not_reached() {
        let registry = CallbackRegistry::new();
        let (dispatcher, _) = recording_dispatcher();
        let token = registry.register(&dispatcher);
        drop(dispatcher);

        assert!(!registry.deliver(token, "readyok"));
    }
}
