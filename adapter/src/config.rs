//! Runtime configuration for the UCI adapter.
//!
//! Every value has a compile-time default and can be overridden at runtime
//! via a dedicated environment variable.

use std::path::{Path, PathBuf};

use crate::uci::InfoSplitting;

/// Default engine binary name, resolved through `PATH`.
const DEFAULT_ENGINE: &str = "stockfish";

/// Default time to wait for `uciok` / `readyok` (in seconds).
const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Common install locations checked before falling back to `PATH`.
const ENGINE_SEARCH_PATHS: &[&str] = &[
    "/usr/local/bin/stockfish",
    "/usr/bin/stockfish",
    "/opt/homebrew/bin/stockfish",
    "/usr/games/stockfish",
];

/// Get the engine executable path.
///
/// Priority:
/// 1. `UCI_ENGINE_PATH` env variable if set
/// 2. The first existing path in the common install locations
/// 3. `stockfish` (looked up on `PATH` at spawn time)
pub fn get_engine_path() -> PathBuf {
    if let Ok(path) = std::env::var("UCI_ENGINE_PATH") {
        return PathBuf::from(path);
    }

    ENGINE_SEARCH_PATHS
        .iter()
        .map(Path::new)
        .find(|path| path.is_file())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE))
}

/// Get the handshake timeout in seconds.
///
/// Priority:
/// 1. `UCI_STARTUP_TIMEOUT_SECS` env variable if set (falls back to default
///    if the value cannot be parsed as a `u64`)
/// 2. `10` seconds as fallback
pub fn get_startup_timeout_secs() -> u64 {
    if let Ok(timeout) = std::env::var("UCI_STARTUP_TIMEOUT_SECS") {
        return timeout.parse().unwrap_or(DEFAULT_STARTUP_TIMEOUT_SECS);
    }

    DEFAULT_STARTUP_TIMEOUT_SECS
}

/// Get how `info` lines are split into records.
///
/// `UCI_INFO_SPLITTING=line` treats each physical line as one record; any
/// other value, or none, splits on every `info` token.
pub fn get_info_splitting() -> InfoSplitting {
    match std::env::var("UCI_INFO_SPLITTING") {
        Ok(value) => parse_info_splitting(&value),
        Err(_) => InfoSplitting::default(),
    }
}

fn parse_info_splitting(value: &str) -> InfoSplitting {
    if value.trim().eq_ignore_ascii_case("line") {
        InfoSplitting::WholeLine
    } else {
        InfoSplitting::PerSegment
    }
}
