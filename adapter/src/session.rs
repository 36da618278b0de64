//! UCI session: one engine, its outbound command stream, and the observers
//! its output is fanned out to.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::EngineBackend;
use crate::error::SessionResult;
use crate::observer::{ObserverId, ObserverList};
use crate::registry::{CallbackRegistry, LineSink, SessionToken};
use crate::uci::{
    classify_with, validate, Command, GoParams, InfoSplitting, PositionSpec, UciOption, UciOutput,
    ValidatedOption,
};
use crate::{config, BestMove, SearchInfo};

/// Per-session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub info_splitting: InfoSplitting,
    /// Keep engine output off the console; observers are the only consumer.
    pub library_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            info_splitting: InfoSplitting::default(),
            library_mode: true,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self {
            info_splitting: config::get_info_splitting(),
            ..Default::default()
        }
    }
}

/// Fans each engine output line out to the registered observers.
///
/// [`Dispatcher::dispatch_line`] may be called from any thread. Lines are
/// handled one at a time, in the order they are passed in.
pub struct Dispatcher {
    config: SessionConfig,
    raw_output: ObserverList<str>,
    search_info: ObserverList<[SearchInfo]>,
    best_move: ObserverList<BestMove>,
}

impl Dispatcher {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            raw_output: ObserverList::new(),
            search_info: ObserverList::new(),
            best_move: ObserverList::new(),
        }
    }

    /// Every line, verbatim, before any parsing.
    pub fn raw_output(&self) -> &ObserverList<str> {
        &self.raw_output
    }

    /// Batches of search info, one record per multi-PV line.
    pub fn search_info(&self) -> &ObserverList<[SearchInfo]> {
        &self.search_info
    }

    pub fn best_move(&self) -> &ObserverList<BestMove> {
        &self.best_move
    }

    pub fn dispatch_line(&self, line: &str) {
        tracing::trace!("UCI << {}", line);
        self.raw_output.notify(line);

        match classify_with(line, self.config.info_splitting) {
            UciOutput::SearchInfo(infos) => {
                if infos.is_empty() {
                    tracing::trace!("Info line carries no search data");
                } else if infos.iter().any(SearchInfo::is_progress_update) {
                    tracing::trace!("Skipping currmove progress update");
                } else {
                    tracing::trace!("Dispatching {} search info record(s)", infos.len());
                    self.search_info.notify(&infos);
                }
            }
            UciOutput::BestMove(best) => {
                tracing::debug!("Received bestmove: {}", best.mv);
                self.best_move.notify(&best);
            }
            UciOutput::Unrecognized => {}
        }
    }
}

/// One engine instance and the observers of its output.
///
/// Commands go out one at a time through the owned backend. The session's
/// [`Dispatcher`] is registered with the [`CallbackRegistry`] for as long as
/// the session lives.
pub struct Session<B: EngineBackend> {
    backend: Mutex<B>,
    dispatcher: Arc<Dispatcher>,
    registry: Arc<CallbackRegistry>,
    token: SessionToken,
}

impl<B: EngineBackend> Session<B> {
    /// Register with `registry` and start `backend`.
    pub fn new(
        mut backend: B,
        registry: Arc<CallbackRegistry>,
        config: SessionConfig,
    ) -> SessionResult<Self> {
        let library_mode = config.library_mode;
        let dispatcher = Arc::new(Dispatcher::new(config));
        let token = registry.register(&dispatcher);

        backend.set_library_mode(library_mode);
        if let Err(e) = backend.start(LineSink::new(token, registry.clone())) {
            tracing::error!("Failed to start engine for session {}: {}", token, e);
            registry.unregister(token);
            return Err(e.into());
        }

        tracing::info!("Session {} started", token);
        Ok(Self {
            backend: Mutex::new(backend),
            dispatcher,
            registry,
            token,
        })
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn on_raw_output<F>(&self, f: F) -> ObserverId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.dispatcher.raw_output.add(f)
    }

    pub fn on_search_info<F>(&self, f: F) -> ObserverId
    where
        F: Fn(&[SearchInfo]) + Send + Sync + 'static,
    {
        self.dispatcher.search_info.add(f)
    }

    pub fn on_best_move<F>(&self, f: F) -> ObserverId
    where
        F: Fn(&BestMove) + Send + Sync + 'static,
    {
        self.dispatcher.best_move.add(f)
    }

    pub fn remove_raw_output_observer(&self, id: ObserverId) -> bool {
        self.dispatcher.raw_output.remove(id)
    }

    pub fn remove_search_info_observer(&self, id: ObserverId) -> bool {
        self.dispatcher.search_info.remove(id)
    }

    pub fn remove_best_move_observer(&self, id: ObserverId) -> bool {
        self.dispatcher.best_move.remove(id)
    }

    /// Send a command to the engine
    pub fn send_command(&self, cmd: &Command) -> SessionResult<()> {
        let line = cmd.to_string();
        tracing::trace!("UCI >> {}", line);
        self.backend().send(&line)?;
        Ok(())
    }

    pub fn uci(&self) -> SessionResult<()> {
        self.send_command(&Command::Uci)
    }

    pub fn is_ready(&self) -> SessionResult<()> {
        self.send_command(&Command::IsReady)
    }

    pub fn new_game(&self) -> SessionResult<()> {
        self.send_command(&Command::UciNewGame)
    }

    pub fn set_position(&self, position: &PositionSpec) -> SessionResult<()> {
        tracing::info!("Setting position: {}", position);
        self.send_command(&Command::Position(position.clone()))
    }

    pub fn go(&self, params: &GoParams) -> SessionResult<()> {
        tracing::info!("Starting engine calculation: {}", params);
        self.send_command(&Command::Go(params.clone()))
    }

    /// Abort the current search. The engine answers with `bestmove`.
    pub fn stop(&self) -> SessionResult<()> {
        self.send_command(&Command::Stop)
    }

    pub fn quit(&self) -> SessionResult<()> {
        self.send_command(&Command::Quit)
    }

    pub fn ponder_hit(&self) -> SessionResult<()> {
        self.send_command(&Command::PonderHit)
    }

    pub fn flip(&self) -> SessionResult<()> {
        self.send_command(&Command::Flip)
    }

    pub fn eval(&self) -> SessionResult<()> {
        self.send_command(&Command::Eval)
    }

    pub fn display(&self) -> SessionResult<()> {
        self.send_command(&Command::Display)
    }

    pub fn bench(&self, params: Option<&str>) -> SessionResult<()> {
        self.send_command(&Command::Bench(params.map(str::to_string)))
    }

    /// Validate and send one option. Nothing is sent if validation fails.
    pub fn set_option(&self, option: UciOption, raw: &str) -> SessionResult<ValidatedOption> {
        let validated = validate(option, raw).inspect_err(|e| {
            tracing::warn!("Rejected option {}: {}", option, e);
        })?;
        tracing::info!("Setting option: {}", validated);
        self.send_command(&Command::SetOption(validated.clone()))?;
        Ok(validated)
    }

    /// Validate every option first; send them only if all are valid.
    pub fn set_options(&self, options: &[(UciOption, &str)]) -> SessionResult<Vec<ValidatedOption>> {
        let validated = options
            .iter()
            .map(|(option, raw)| validate(*option, raw))
            .collect::<Result<Vec<_>, _>>()?;
        for opt in &validated {
            tracing::info!("Setting option: {}", opt);
            self.send_command(&Command::SetOption(opt.clone()))?;
        }
        Ok(validated)
    }

    /// Shut the engine down. The session stops receiving output.
    pub fn shutdown(&self) -> SessionResult<()> {
        tracing::info!("Shutting down session {}", self.token);
        self.backend().shutdown()?;
        Ok(())
    }

    fn backend(&self) -> MutexGuard<'_, B> {
        self.backend.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<B: EngineBackend> Drop for Session<B> {
    fn drop(&mut self) {
        self.registry.unregister(self.token);
    }
}
