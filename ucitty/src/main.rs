//! ucitty - drive a UCI chess engine from the command line.
//!
//! Spawns the engine, performs the `uci` / `isready` handshake, applies the
//! requested options (all validated before the engine is even started), sets
//! up the position and runs one search. Search info batches are printed as
//! they arrive, followed by the best move.
//!
//! The engine path comes from `--engine`, then `UCI_ENGINE_PATH`, then a few
//! common install locations (see [`uci_adapter::config`]).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use uci_adapter::uci::DEFAULT_DEPTH;
use uci_adapter::{
    config, validate, BestMove, CallbackRegistry, Command, GoParams, PositionSpec,
    ProcessBackend, Score, SearchInfo, Session, SessionConfig, UciOption,
};

mod wait;

/// Command-line arguments for ucitty.
#[derive(Parser)]
#[command(name = "ucitty", about = "Run a single search on a UCI chess engine")]
struct Cli {
    /// Engine executable.
    #[arg(short, long)]
    engine: Option<PathBuf>,

    /// Engine option as NAME=VALUE, e.g. `-o Threads=4 -o "Skill Level=10"`.
    #[arg(short = 'o', long = "option", value_parser = parse_option_arg)]
    options: Vec<(UciOption, String)>,

    /// `startpos` or a FEN string.
    #[arg(short, long, default_value = "startpos")]
    position: String,

    /// Moves to play from the position, in UCI notation.
    #[arg(short, long, num_args = 1..)]
    moves: Vec<String>,

    /// Search depth (also the mate distance with `--mate`).
    #[arg(short, long, default_value_t = DEFAULT_DEPTH)]
    depth: u32,

    /// Node limit; overrides `--depth` unless searching for mate.
    #[arg(long, default_value_t = 0)]
    nodes: u64,

    /// Search for a mate within `--depth` moves.
    #[arg(long)]
    mate: bool,

    /// Fixed time per move in milliseconds.
    #[arg(long, default_value_t = 0)]
    movetime: u64,

    /// Search until stopped.
    #[arg(long)]
    infinite: bool,

    /// With `--infinite`, send `stop` after this many milliseconds.
    #[arg(long, default_value_t = 5000)]
    stop_after: u64,

    /// Give up on the search after this many seconds.
    #[arg(long, default_value_t = 300)]
    search_timeout: u64,

    /// Print records as JSON lines.
    #[arg(long)]
    json: bool,

    /// Echo every engine output line to stderr.
    #[arg(long)]
    raw: bool,
}

/// Parse `NAME=VALUE`. The value may be empty for buttons such as `Clear Hash`.
fn parse_option_arg(arg: &str) -> Result<(UciOption, String), String> {
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => (name, value),
        None => (arg, ""),
    };
    let option = name.parse::<UciOption>().map_err(|e| e.to_string())?;
    Ok((option, value.trim().to_string()))
}

fn format_info(info: &SearchInfo) -> String {
    let score = match info.score {
        Score::Centipawns(cp) => format!("cp {}", cp),
        Score::Mate(n) => format!("mate {}", n),
    };
    let mut out = format!(
        "depth {} seldepth {} multipv {} score {} time {}",
        info.depth, info.seldepth, info.multipv, score, info.time_ms
    );
    if let Some(wdl) = info.wdl {
        out.push_str(&format!(" wdl {} {} {}", wdl.win, wdl.draw, wdl.loss));
    }
    if let Some(nodes) = info.nodes {
        out.push_str(&format!(" nodes {}", nodes));
    }
    if !info.pv.is_empty() {
        out.push_str(&format!(" pv {}", info.pv.join(" ")));
    }
    out
}

fn format_best_move(best: &BestMove) -> String {
    match &best.ponder {
        Some(ponder) => format!("bestmove {} ponder {}", best.mv, ponder),
        None => format!("bestmove {}", best.mv),
    }
}

fn go_params(cli: &Cli) -> GoParams {
    GoParams {
        infinite: cli.infinite,
        mate: cli.mate,
        depth: cli.depth,
        nodes: cli.nodes,
        movetime: cli.movetime,
        ..Default::default()
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let engine_path = cli.engine.clone().unwrap_or_else(config::get_engine_path);
    let startup_timeout = Duration::from_secs(config::get_startup_timeout_secs());

    // Reject bad options before the engine is spawned
    let options = cli
        .options
        .iter()
        .map(|(option, raw)| validate(*option, raw))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid engine option")?;

    tracing::info!("Using engine at {}", engine_path.display());
    let registry = Arc::new(CallbackRegistry::new());
    let session = Session::new(
        ProcessBackend::new(&engine_path),
        registry,
        SessionConfig::from_env(),
    )
    .with_context(|| format!("failed to start engine {}", engine_path.display()))?;

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    session.on_raw_output(move |line| {
        let _ = line_tx.send(line.to_string());
    });
    if cli.raw {
        session.on_raw_output(|line| eprintln!("<< {}", line));
    }

    let json = cli.json;
    session.on_search_info(move |batch| {
        for info in batch {
            if json {
                match serde_json::to_string(info) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!("Failed to serialize search info: {}", e),
                }
            } else {
                println!("{}", format_info(info));
            }
        }
    });

    let (best_tx, mut best_rx) = mpsc::unbounded_channel::<BestMove>();
    session.on_best_move(move |best| {
        let _ = best_tx.send(best.clone());
    });

    session.uci()?;
    wait::wait_for_keyword(&mut line_rx, "uciok", startup_timeout).await?;

    for option in options {
        tracing::info!("Setting option: {}", option);
        session.send_command(&Command::SetOption(option))?;
    }

    session.is_ready()?;
    wait::wait_for_keyword(&mut line_rx, "readyok", startup_timeout).await?;

    session.new_game()?;
    session.set_position(&PositionSpec::from_marker(&cli.position, cli.moves.clone()))?;
    session.go(&go_params(&cli))?;

    if cli.infinite {
        tokio::time::sleep(Duration::from_millis(cli.stop_after)).await;
        tracing::info!("Stopping infinite search after {}ms", cli.stop_after);
        session.stop()?;
    }

    // Nothing reads raw lines past the handshake
    drop(line_rx);

    let search_timeout = Duration::from_secs(cli.search_timeout);
    let best = tokio::time::timeout(search_timeout, best_rx.recv())
        .await
        .context("timed out waiting for bestmove")?
        .context("engine exited before reporting a best move")?;

    if json {
        println!("{}", serde_json::to_string(&best)?);
    } else {
        println!("{}", format_best_move(&best));
    }

    session.shutdown()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only engine records
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use uci_adapter::Wdl;

    #[test]
    fn test_parse_option_arg() {
        let (option, value) = parse_option_arg("Skill Level=7").unwrap();
        assert_eq!(option, UciOption::SkillLevel);
        assert_eq!(value, "7");

        let (option, value) = parse_option_arg("ClearHash").unwrap();
        assert_eq!(option, UciOption::ClearHash);
        assert_eq!(value, "");

        assert!(parse_option_arg("Contempt=10").is_err());
    }

    #[test]
    fn test_cli_builds_go_params() {
        let cli = Cli::parse_from(["ucitty", "--nodes", "5000", "--movetime", "250"]);
        assert_eq!(go_params(&cli).to_string(), "go nodes 5000 movetime 250");

        let cli = Cli::parse_from(["ucitty", "--infinite", "--depth", "9"]);
        assert_eq!(go_params(&cli).to_string(), "go infinite");

        let cli = Cli::parse_from(["ucitty", "-o", "Threads=2", "-m", "e2e4", "e7e5"]);
        assert_eq!(cli.options, vec![(UciOption::Threads, "2".to_string())]);
        assert_eq!(cli.moves, vec!["e2e4", "e7e5"]);
    }

    #[test]
    fn test_format_info() {
        let info = SearchInfo {
            depth: 12,
            seldepth: 18,
            score: Score::Mate(-2),
            wdl: Some(Wdl {
                win: 0,
                draw: 0,
                loss: 1000,
            }),
            pv: vec!["e2e4".into(), "e7e5".into()],
            ..Default::default()
        };
        assert_eq!(
            format_info(&info),
            "depth 12 seldepth 18 multipv 1 score mate -2 time 0 wdl 0 0 1000 pv e2e4 e7e5"
        );
    }

    #[test]
    fn test_format_best_move() {
        let best = BestMove {
            mv: "e2e4".into(),
            ponder: Some("e7e5".into()),
        };
        assert_eq!(format_best_move(&best), "bestmove e2e4 ponder e7e5");
    }
}
