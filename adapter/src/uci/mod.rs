pub mod command;
pub mod options;
pub mod parser;

pub use command::{Command, GoParams, PositionBase, PositionSpec, DEFAULT_DEPTH, STARTPOS};
pub use options::{validate, OptionDomain, UciOption, ValidatedOption};
pub use parser::{
    classify, classify_with, parse_best_move, parse_search_info, split_info_segments,
    InfoSplitting, UciOutput,
};
