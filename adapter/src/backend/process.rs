use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

use super::EngineBackend;
use crate::error::EngineError;
use crate::registry::LineSink;

/// How long `shutdown` lets the engine exit on its own before killing it.
const QUIT_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// An engine running as a child process, spoken to over stdin/stdout.
///
/// [`EngineBackend::start`] must be called from within a tokio runtime: the
/// stdout reader and stdin writer run as tasks on it.
pub struct ProcessBackend {
    path: PathBuf,
    args: Vec<String>,
    process: Option<Child>,
    stdin: Option<mpsc::UnboundedSender<String>>,
    library_mode: Arc<AtomicBool>,
}

impl ProcessBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            args: Vec::new(),
            process: None,
            stdin: None,
            library_mode: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// OS process id, once started.
    pub fn id(&self) -> Option<u32> {
        self.process.as_ref().and_then(Child::id)
    }
}

impl EngineBackend for ProcessBackend {
    #[tracing::instrument(level = "info", skip(self, sink), fields(path = %self.path.display()))]
    fn start(&mut self, sink: LineSink) -> Result<(), EngineError> {
        tracing::debug!("Spawning engine process");
        let mut process = tokio::process::Command::new(&self.path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                tracing::error!("Failed to spawn engine: {}", source);
                EngineError::Spawn {
                    path: self.path.clone(),
                    source,
                }
            })?;

        let mut stdin = process.stdin.take().ok_or(EngineError::NoStdin)?;
        let stdout = process.stdout.take().ok_or(EngineError::NoStdout)?;

        // Spawn output reader task
        let library_mode = self.library_mode.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Engine stdout EOF - engine closed");
                        break;
                    }
                    Ok(_) => {
                        let text = line.trim_end_matches(['\r', '\n']);
                        if !library_mode.load(Ordering::Relaxed) {
                            println!("{}", text);
                        }
                        sink.deliver(text);
                    }
                    Err(e) => {
                        tracing::error!("Error reading from engine stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::info!("Output reader task exiting");
        });

        // Spawn stdin writer task
        let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            while let Some(cmd) = stdin_rx.recv().await {
                if let Err(e) = stdin.write_all(cmd.as_bytes()).await {
                    tracing::error!("Failed to write to stdin: {}", e);
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Failed to flush stdin: {}", e);
                    break;
                }
            }
            tracing::info!("Stdin writer task exiting");
        });

        tracing::info!("Engine process spawned (pid {:?})", process.id());
        self.process = Some(process);
        self.stdin = Some(stdin_tx);
        Ok(())
    }

    fn send(&mut self, line: &str) -> Result<(), EngineError> {
        let stdin = self.stdin.as_ref().ok_or(EngineError::NotStarted)?;
        stdin
            .send(format!("{}\n", line))
            .map_err(|_| EngineError::Closed)
    }

    fn set_library_mode(&mut self, enabled: bool) {
        self.library_mode.store(enabled, Ordering::Relaxed);
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        if let Some(stdin) = self.stdin.take() {
            let _ = stdin.send("quit\n".to_string());
        }
        let Some(mut process) = self.process.take() else {
            return Ok(());
        };

        tracing::info!("Shutting down engine process");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let _ = tokio::time::timeout(QUIT_GRACE_PERIOD, process.wait()).await;
                    let _ = process.kill().await;
                });
            }
            Err(_) => process.start_kill()?,
        }
        Ok(())
    }
}

impl Drop for ProcessBackend {
    fn drop(&mut self) {
        if self.process.is_some() {
            let _ = self.shutdown();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::registry::CallbackRegistry;
    use crate::session::{Dispatcher, SessionConfig};

    #[tokio::test]
    async fn test_lines_round_trip_through_child() {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(SessionConfig::default()));
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        dispatcher.raw_output().add(move |line: &str| {
            let _ = tx.send(line.to_string());
        });
        let sink = LineSink::new(registry.register(&dispatcher), registry.clone());

        // `cat` echoes every command back as output
        let mut backend = ProcessBackend::new("cat");
        backend.start(sink).unwrap();
        backend.send("readyok").unwrap();
        backend.send("bestmove e2e4").unwrap();

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        let second = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert_eq!(first.unwrap().as_deref(), Some("readyok"));
        assert_eq!(second.unwrap().as_deref(), Some("bestmove e2e4"));

        backend.shutdown().unwrap();
        assert!(backend.id().is_none());
    }

    #[tokio::test]
    async fn test_lines_keep_whitespace_and_blanks() {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(SessionConfig::default()));
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        dispatcher.raw_output().add(move |line: &str| {
            let _ = tx.send(line.to_string());
        });
        let sink = LineSink::new(registry.register(&dispatcher), registry.clone());

        let mut backend = ProcessBackend::new("cat");
        backend.start(sink).unwrap();
        backend.send("  info depth 1 ").unwrap();
        backend.send("").unwrap();
        backend.send("readyok\r").unwrap();

        let mut received = Vec::new();
        for _ in 0..3 {
            let line = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
            received.push(line.unwrap().unwrap());
        }
        assert_eq!(received, vec!["  info depth 1 ", "", "readyok"]);

        backend.shutdown().unwrap();
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(SessionConfig::default()));
        let sink = LineSink::new(registry.register(&dispatcher), registry.clone());

        let mut backend = ProcessBackend::new("/definitely/not/an/engine");
        assert!(matches!(
            backend.start(sink),
            Err(EngineError::Spawn { .. })
        ));
    }

    #[test]
    fn test_send_before_start() {
        let mut backend = ProcessBackend::new("stockfish");
        assert!(matches!(backend.send("uci"), Err(EngineError::NotStarted)));
    }
}
