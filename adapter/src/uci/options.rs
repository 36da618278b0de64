//! Validation of `setoption` requests.
//!
//! Every option kind declares its value domain in [`UciOption::domain`]; a
//! single routine, [`validate`], checks a raw value against that domain and
//! produces the normalized name/value pair that goes on the wire.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::OptionError;

/// The closed set of engine options this client knows how to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UciOption {
    Threads,
    Hash,
    Ponder,
    MultiPV,
    EvalFile,
    UciChess960,
    UciShowWdl,
    UciLimitStrength,
    UciElo,
    SkillLevel,
    SyzygyPath,
    SyzygyProbeDepth,
    Syzygy50MoveRule,
    SyzygyProbeLimit,
    MoveOverhead,
    SlowMover,
    NodesTime,
    DebugLogFile,
    ClearHash,
    UciAnalyseMode,
}

/// Accepted values for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionDomain {
    /// Integer, inclusive bounds.
    Spin { min: i64, max: i64 },
    /// `true` / `false`.
    Check,
    /// Valueless trigger.
    Button,
    /// Path to a file that must already exist.
    ExistingFile,
    /// Path to a directory that must already exist.
    ExistingDirectory,
    /// Path to a file, created empty when missing.
    CreatableFile,
    /// Forwarded unchecked; has no effect on validation.
    PassThrough,
}

impl UciOption {
    pub const ALL: [UciOption; 20] = [
        UciOption::Threads,
        UciOption::Hash,
        UciOption::Ponder,
        UciOption::MultiPV,
        UciOption::EvalFile,
        UciOption::UciChess960,
        UciOption::UciShowWdl,
        UciOption::UciLimitStrength,
        UciOption::UciElo,
        UciOption::SkillLevel,
        UciOption::SyzygyPath,
        UciOption::SyzygyProbeDepth,
        UciOption::Syzygy50MoveRule,
        UciOption::SyzygyProbeLimit,
        UciOption::MoveOverhead,
        UciOption::SlowMover,
        UciOption::NodesTime,
        UciOption::DebugLogFile,
        UciOption::ClearHash,
        UciOption::UciAnalyseMode,
    ];

    pub fn domain(self) -> OptionDomain {
        use OptionDomain::{
            Button, Check, CreatableFile, ExistingDirectory, ExistingFile, PassThrough, Spin,
        };

        match self {
            UciOption::Threads => Spin { min: 1, max: 1024 },
            UciOption::Hash => Spin {
                min: 1,
                max: 33_554_432,
            },
            UciOption::MultiPV => Spin { min: 1, max: 500 },
            UciOption::UciElo => Spin {
                min: 1320,
                max: 3190,
            },
            UciOption::SkillLevel => Spin { min: 0, max: 20 },
            UciOption::SyzygyProbeDepth => Spin { min: 1, max: 100 },
            UciOption::SyzygyProbeLimit => Spin { min: 0, max: 7 },
            UciOption::MoveOverhead => Spin { min: 0, max: 5000 },
            UciOption::SlowMover => Spin { min: 10, max: 1000 },
            UciOption::NodesTime => Spin { min: 0, max: 10_000 },
            UciOption::Ponder
            | UciOption::UciChess960
            | UciOption::UciShowWdl
            | UciOption::UciLimitStrength
            | UciOption::Syzygy50MoveRule => Check,
            UciOption::ClearHash => Button,
            UciOption::EvalFile => ExistingFile,
            UciOption::SyzygyPath => ExistingDirectory,
            UciOption::DebugLogFile => CreatableFile,
            UciOption::UciAnalyseMode => PassThrough,
        }
    }

    /// Name as it appears after `setoption name`.
    pub fn wire_name(self) -> &'static str {
        match self {
            UciOption::Threads => "Threads",
            UciOption::Hash => "Hash",
            UciOption::Ponder => "Ponder",
            UciOption::MultiPV => "MultiPV",
            UciOption::EvalFile => "EvalFile",
            UciOption::UciChess960 => "UCI_Chess960",
            UciOption::UciShowWdl => "UCI_ShowWDL",
            UciOption::UciLimitStrength => "UCI_LimitStrength",
            UciOption::UciElo => "UCI_Elo",
            UciOption::SkillLevel => "Skill Level",
            UciOption::SyzygyPath => "SyzygyPath",
            UciOption::SyzygyProbeDepth => "SyzygyProbeDepth",
            UciOption::Syzygy50MoveRule => "Syzygy50MoveRule",
            UciOption::SyzygyProbeLimit => "SyzygyProbeLimit",
            UciOption::MoveOverhead => "Move Overhead",
            UciOption::SlowMover => "Slow Mover",
            UciOption::NodesTime => "nodestime",
            UciOption::DebugLogFile => "Debug Log File",
            UciOption::ClearHash => "Clear Hash",
            UciOption::UciAnalyseMode => "UCI_AnalyseMode",
        }
    }

    /// Identifier form with underscores in place of spaces (`Skill_Level`).
    fn identifier(self) -> &'static str {
        match self {
            UciOption::SkillLevel => "Skill_Level",
            UciOption::MoveOverhead => "Move_Overhead",
            UciOption::SlowMover => "Slow_Mover",
            UciOption::NodesTime => "NodesTime",
            UciOption::DebugLogFile => "Debug_Log_File",
            UciOption::ClearHash => "ClearHash",
            other => other.wire_name(),
        }
    }
}

impl fmt::Display for UciOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for UciOption {
    type Err = OptionError;

    /// Accepts either the wire name (`Skill Level`) or the identifier
    /// (`Skill_Level`), ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        UciOption::ALL
            .into_iter()
            .find(|opt| {
                opt.wire_name().eq_ignore_ascii_case(s) || opt.identifier().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| OptionError::UnknownOption(s.to_string()))
    }
}

/// A wire-ready option assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOption {
    pub option: UciOption,
    pub name: &'static str,
    pub value: String,
}

impl fmt::Display for ValidatedOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "setoption name {}", self.name)?;
        if self.option.domain() != OptionDomain::Button {
            write!(f, " value {}", self.value)?;
        }
        Ok(())
    }
}

/// Check `raw` against the domain of `option` and normalize it.
///
/// `Debug Log File` creates an empty file when the path does not exist yet.
/// `EvalFile` and `SyzygyPath` only look at the filesystem.
pub fn validate(option: UciOption, raw: &str) -> Result<ValidatedOption, OptionError> {
    // A line break would end the `setoption` command early
    if raw.contains(['\n', '\r']) {
        return Err(OptionError::TypeMismatch {
            option,
            expected: "a single-line value",
            value: raw.to_string(),
        });
    }

    let value = match option.domain() {
        OptionDomain::Spin { min, max } => {
            let value: i64 = raw.trim().parse().map_err(|_| OptionError::TypeMismatch {
                option,
                expected: "an integer",
                value: raw.to_string(),
            })?;
            if value < min || value > max {
                return Err(OptionError::OutOfRange {
                    option,
                    value,
                    min,
                    max,
                });
            }
            value.to_string()
        }
        OptionDomain::Check => parse_check(raw)
            .ok_or_else(|| OptionError::TypeMismatch {
                option,
                expected: "true or false",
                value: raw.to_string(),
            })?
            .to_string(),
        OptionDomain::Button => String::new(),
        OptionDomain::ExistingFile => {
            let path = Path::new(raw);
            if !path.is_file() {
                return Err(OptionError::FileNotFound {
                    option,
                    path: PathBuf::from(raw),
                });
            }
            raw.to_string()
        }
        OptionDomain::ExistingDirectory => {
            if !Path::new(raw).is_dir() {
                return Err(OptionError::DirectoryNotFound {
                    option,
                    path: PathBuf::from(raw),
                });
            }
            raw.to_string()
        }
        OptionDomain::CreatableFile => {
            let path = Path::new(raw);
            if !path.exists() {
                tracing::debug!("Creating {} at {}", option, path.display());
                if let Err(e) = std::fs::File::create(path) {
                    tracing::warn!("Failed to create {}: {}", path.display(), e);
                }
            }
            if !path.is_file() {
                return Err(OptionError::FileNotFound {
                    option,
                    path: PathBuf::from(raw),
                });
            }
            raw.to_string()
        }
        OptionDomain::PassThrough => raw.to_string(),
    };

    Ok(ValidatedOption {
        option,
        name: option.wire_name(),
        value,
    })
}

fn parse_check(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
