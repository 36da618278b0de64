//! Outbound UCI commands.

use std::fmt;

use super::options::ValidatedOption;

/// Marker that selects the standard starting position.
pub const STARTPOS: &str = "startpos";

/// Depth used by `go` when no other primary mode applies.
pub const DEFAULT_DEPTH: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionBase {
    StartPos,
    Fen(String),
}

/// Argument of the `position` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSpec {
    pub base: PositionBase,
    pub moves: Vec<String>,
}

impl PositionSpec {
    pub fn startpos() -> Self {
        Self {
            base: PositionBase::StartPos,
            moves: Vec::new(),
        }
    }

    pub fn fen(fen: impl Into<String>) -> Self {
        Self {
            base: PositionBase::Fen(fen.into()),
            moves: Vec::new(),
        }
    }

    /// `startpos` selects the start position, anything else is taken as a FEN.
    pub fn from_marker<I, S>(marker: &str, moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let marker = marker.trim();
        let spec = if marker == STARTPOS {
            Self::startpos()
        } else {
            Self::fen(marker)
        };
        spec.with_moves(moves)
    }

    pub fn with_moves<I, S>(mut self, moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.moves = moves.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for PositionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            PositionBase::StartPos => f.write_str(STARTPOS)?,
            PositionBase::Fen(fen) => write!(f, "fen {}", fen)?,
        }
        if !self.moves.is_empty() {
            write!(f, " moves {}", self.moves.join(" "))?;
        }
        Ok(())
    }
}

/// Parameters for the "go" command.
///
/// Exactly one primary mode is emitted, chosen in this order: `infinite`,
/// `mate` (searching to `depth`), `nodes` when positive, then `depth`. The
/// remaining fields are independent clauses appended when positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoParams {
    pub infinite: bool,
    pub mate: bool,
    pub depth: u32,
    pub nodes: u64,
    pub search_moves: Vec<String>,
    pub movetime: u64, // Move time in milliseconds
    pub wtime: u64,
    pub btime: u64,
    pub winc: u64,
    pub binc: u64,
    pub movestogo: u32,
    pub perft: u32,
}

impl Default for GoParams {
    fn default() -> Self {
        Self {
            infinite: false,
            mate: false,
            depth: DEFAULT_DEPTH,
            nodes: 0,
            search_moves: Vec::new(),
            movetime: 0,
            wtime: 0,
            btime: 0,
            winc: 0,
            binc: 0,
            movestogo: 0,
            perft: 0,
        }
    }
}

impl GoParams {
    pub fn depth(depth: u32) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    pub fn infinite() -> Self {
        Self {
            infinite: true,
            ..Default::default()
        }
    }

    pub fn nodes(nodes: u64) -> Self {
        Self {
            nodes,
            ..Default::default()
        }
    }

    pub fn mate_in(depth: u32) -> Self {
        Self {
            mate: true,
            depth,
            ..Default::default()
        }
    }
}

impl fmt::Display for GoParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("go")?;
        if self.infinite {
            f.write_str(" infinite")?;
        } else if self.mate {
            write!(f, " mate {}", self.depth)?;
        } else if self.nodes > 0 {
            write!(f, " nodes {}", self.nodes)?;
        } else {
            write!(f, " depth {}", self.depth)?;
        }

        if !self.search_moves.is_empty() {
            write!(f, " searchmoves {}", self.search_moves.join(" "))?;
        }
        for (keyword, value) in [
            ("movetime", self.movetime),
            ("wtime", self.wtime),
            ("btime", self.btime),
            ("winc", self.winc),
            ("binc", self.binc),
            ("movestogo", u64::from(self.movestogo)),
            ("perft", u64::from(self.perft)),
        ] {
            if value > 0 {
                write!(f, " {} {}", keyword, value)?;
            }
        }
        Ok(())
    }
}

/// Commands sent to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Uci,
    UciNewGame,
    IsReady,
    Stop,
    Quit,
    PonderHit,
    Flip,
    Eval,
    /// Stockfish `d`: print the current position.
    Display,
    Bench(Option<String>),
    Position(PositionSpec),
    Go(GoParams),
    SetOption(ValidatedOption),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Uci => f.write_str("uci"),
            Command::UciNewGame => f.write_str("ucinewgame"),
            Command::IsReady => f.write_str("isready"),
            Command::Stop => f.write_str("stop"),
            Command::Quit => f.write_str("quit"),
            Command::PonderHit => f.write_str("ponderhit"),
            Command::Flip => f.write_str("flip"),
            Command::Eval => f.write_str("eval"),
            Command::Display => f.write_str("d"),
            Command::Bench(None) => f.write_str("bench"),
            Command::Bench(Some(params)) if params.trim().is_empty() => f.write_str("bench"),
            Command::Bench(Some(params)) => write!(f, "bench {}", params.trim()),
            Command::Position(spec) => write!(f, "position {}", spec),
            Command::Go(params) => fmt::Display::fmt(params, f),
            Command::SetOption(opt) => fmt::Display::fmt(opt, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uci::options::{validate, UciOption};

    #[test]
    fn test_startpos_with_moves() {
        let spec = PositionSpec::from_marker("startpos", ["e2e4", "e7e5"]);
        assert_eq!(spec.to_string(), "startpos moves e2e4 e7e5");
        assert_eq!(
            Command::Position(spec).to_string(),
            "position startpos moves e2e4 e7e5"
        );
    }

    #[test]
    fn test_fen_without_moves() {
        let fen = "8/8/8/8/8/8/8/K6k w - - 0 1";
        let spec = PositionSpec::from_marker(fen, Vec::<String>::new());
        assert_eq!(spec.base, PositionBase::Fen(fen.to_string()));
        assert_eq!(spec.to_string(), format!("fen {}", fen));
    }

    #[test]
    fn test_fen_with_moves() {
        let spec = PositionSpec::fen("k7/8/8/8/8/8/8/K7 w - - 0 1").with_moves(["a1b1"]);
        assert_eq!(spec.to_string(), "fen k7/8/8/8/8/8/8/K7 w - - 0 1 moves a1b1");
    }

    #[test]
    fn test_go_infinite_ignores_depth() {
        let params = GoParams {
            infinite: true,
            depth: 12,
            ..Default::default()
        };
        assert_eq!(params.to_string(), "go infinite");
    }

    #[test]
    fn test_go_nodes_beats_default_depth() {
        assert_eq!(GoParams::nodes(1000).to_string(), "go nodes 1000");
    }

    #[test]
    fn test_go_mate_uses_depth() {
        let params = GoParams {
            mate: true,
            depth: 5,
            nodes: 1000,
            ..Default::default()
        };
        assert_eq!(params.to_string(), "go mate 5");
    }

    #[test]
    fn test_go_default_is_depth() {
        assert_eq!(GoParams::default().to_string(), format!("go depth {}", DEFAULT_DEPTH));
        assert_eq!(GoParams::depth(8).to_string(), "go depth 8");
    }

    #[test]
    fn test_go_auxiliary_clauses_in_order() {
        let params = GoParams {
            infinite: true,
            search_moves: vec!["e2e4".into(), "d2d4".into()],
            movetime: 500,
            wtime: 60_000,
            btime: 59_000,
            winc: 1000,
            binc: 0,
            movestogo: 40,
            perft: 0,
            ..Default::default()
        };
        assert_eq!(
            params.to_string(),
            "go infinite searchmoves e2e4 d2d4 movetime 500 wtime 60000 btime 59000 winc 1000 movestogo 40"
        );
    }

    #[test]
    fn test_fixed_commands() {
        assert_eq!(Command::Uci.to_string(), "uci");
        assert_eq!(Command::UciNewGame.to_string(), "ucinewgame");
        assert_eq!(Command::IsReady.to_string(), "isready");
        assert_eq!(Command::PonderHit.to_string(), "ponderhit");
        assert_eq!(Command::Display.to_string(), "d");
        assert_eq!(Command::Bench(None).to_string(), "bench");
        assert_eq!(
            Command::Bench(Some("16 1 13".into())).to_string(),
            "bench 16 1 13"
        );
    }

    #[test]
    fn test_setoption_command() {
        let opt = validate(UciOption::Threads, "4").unwrap();
        assert_eq!(
            Command::SetOption(opt).to_string(),
            "setoption name Threads value 4"
        );
    }
}
