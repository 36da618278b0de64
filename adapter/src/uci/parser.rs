use crate::{BestMove, Score, ScoreBound, SearchInfo, Wdl};

/// Incoming message from UCI engine, classified by its first token
#[derive(Debug, Clone, PartialEq)]
pub enum UciOutput {
    /// One record per `info` segment, in line order.
    SearchInfo(Vec<SearchInfo>),
    BestMove(BestMove),
    /// Anything else (`id`, `option`, `uciok`, `readyok`, `ponder`, ...).
    Unrecognized,
}

/// How many records a physical `info` line may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InfoSplitting {
    /// Every `info` token starts a new record.
    #[default]
    PerSegment,
    /// The whole line is a single record.
    WholeLine,
}

/// Classify a UCI output line. Never fails; unmatched fields keep defaults.
pub fn classify(line: &str) -> UciOutput {
    classify_with(line, InfoSplitting::default())
}

pub fn classify_with(line: &str, splitting: InfoSplitting) -> UciOutput {
    match line.split_whitespace().next() {
        Some("info") => {
            let infos = match splitting {
                InfoSplitting::PerSegment => split_info_segments(line)
                    .iter()
                    .filter_map(|segment| parse_search_info(segment))
                    .collect(),
                InfoSplitting::WholeLine => parse_search_info(line).into_iter().collect(),
            };
            UciOutput::SearchInfo(infos)
        }
        Some("bestmove") => UciOutput::BestMove(parse_best_move(line)),
        _ => UciOutput::Unrecognized,
    }
}

/// Split a line on the `info` token and re-prefix each non-empty fragment.
///
/// `"info depth 1 info depth 2"` yields `["info depth 1", "info depth 2"]`.
pub fn split_info_segments(line: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in line.split_whitespace() {
        if token == "info" {
            if !current.is_empty() {
                segments.push(format!("info {}", current.join(" ")));
                current.clear();
            }
        } else {
            current.push(token);
        }
    }
    if !current.is_empty() {
        segments.push(format!("info {}", current.join(" ")));
    }

    segments
}

/// Parse one `info` fragment.
///
/// Returns `None` for `info string ...`, which carries free text rather than
/// search data. Each field is looked up independently; the first occurrence
/// of a keyword wins.
pub fn parse_search_info(fragment: &str) -> Option<SearchInfo> {
    let tokens: Vec<&str> = fragment
        .split_whitespace()
        .skip_while(|t| *t == "info")
        .collect();

    if tokens.first() == Some(&"string") {
        return None;
    }

    let mut fields = InfoFields::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => take_value(&tokens, &mut i, &mut fields.depth),
            "seldepth" => take_value(&tokens, &mut i, &mut fields.seldepth),
            "multipv" => take_value(&tokens, &mut i, &mut fields.multipv),
            "time" => take_value(&tokens, &mut i, &mut fields.time_ms),
            "nodes" => take_value(&tokens, &mut i, &mut fields.nodes),
            "nps" => take_value(&tokens, &mut i, &mut fields.nps),
            "hashfull" => take_value(&tokens, &mut i, &mut fields.hashfull),
            "tbhits" => take_value(&tokens, &mut i, &mut fields.tbhits),
            "currmovenumber" => take_value(&tokens, &mut i, &mut fields.currmovenumber),
            "currmove" => {
                let next = tokens.get(i + 1).copied();
                if let Some(mv) = next.filter(|t| !INFO_KEYWORDS.contains(t)) {
                    i += 1;
                    set_once(&mut fields.currmove, Some(mv.to_string()));
                }
            }
            "score" => {
                let kind = tokens.get(i + 1).copied();
                let value = tokens.get(i + 2).and_then(|s| s.parse::<i32>().ok());
                let score = match (kind, value) {
                    (Some("cp"), Some(v)) => Some(Score::Centipawns(v)),
                    (Some("mate"), Some(v)) => Some(Score::Mate(v)),
                    _ => None,
                };
                if score.is_some() {
                    i += 2;
                    if fields.score.is_none() {
                        fields.score = score;
                        fields.bound = match tokens.get(i + 1) {
                            Some(&"lowerbound") => Some(ScoreBound::Lower),
                            Some(&"upperbound") => Some(ScoreBound::Upper),
                            _ => None,
                        };
                    }
                }
            }
            "wdl" => {
                let values: Option<Vec<u32>> = (1..=3)
                    .map(|k| tokens.get(i + k).and_then(|s| s.parse().ok()))
                    .collect();
                if let Some(v) = values {
                    i += 3;
                    set_once(
                        &mut fields.wdl,
                        Some(Wdl {
                            win: v[0],
                            draw: v[1],
                            loss: v[2],
                        }),
                    );
                }
            }
            "pv" => {
                // Collect the run of move tokens
                i += 1;
                let start = i;
                while i < tokens.len() && is_move_token(tokens[i]) {
                    i += 1;
                }
                if fields.pv.is_none() {
                    fields.pv = Some(tokens[start..i].iter().map(|s| s.to_string()).collect());
                }
                continue; // Don't increment i again
            }
            "string" => break, // Free text runs to the end of the segment
            _ => {
                // Unknown keyword, skip
            }
        }
        i += 1;
    }

    Some(fields.finish())
}

/// Parse a `bestmove` line. The move is empty when the line has none.
pub fn parse_best_move(line: &str) -> BestMove {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"bestmove") => {
            let mv = tokens.get(1).map(|s| s.to_string()).unwrap_or_default();
            let ponder = match (tokens.get(2), tokens.get(3)) {
                (Some(&"ponder"), Some(p)) => Some(p.to_string()),
                _ => None,
            };
            BestMove { mv, ponder }
        }
        _ => BestMove::default(),
    }
}

/// A move token is built from square coordinates, optionally followed by a
/// promotion piece (`e2e4`, `e7e8q`).
fn is_move_token(token: &str) -> bool {
    let body = token
        .strip_suffix(['q', 'r', 'b', 'n'])
        .filter(|b| b.len() == 4)
        .unwrap_or(token);
    !body.is_empty() && body.chars().all(|c| matches!(c, 'a'..='h' | '1'..='8'))
}

const INFO_KEYWORDS: [&str; 17] = [
    "depth",
    "seldepth",
    "multipv",
    "time",
    "nodes",
    "nps",
    "hashfull",
    "tbhits",
    "currmove",
    "currmovenumber",
    "score",
    "lowerbound",
    "upperbound",
    "wdl",
    "pv",
    "string",
    "info",
];

/// Read the value after the keyword at `*i`. The cursor only moves past the
/// value when it parses, so a missing value never hides the next keyword.
fn take_value<T: std::str::FromStr>(tokens: &[&str], i: &mut usize, slot: &mut Option<T>) {
    if let Some(value) = tokens.get(*i + 1).and_then(|s| s.parse().ok()) {
        *i += 1;
        set_once(slot, Some(value));
    }
}

fn set_once<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

#[derive(Default)]
struct InfoFields {
    multipv: Option<u32>,
    depth: Option<u32>,
    seldepth: Option<u32>,
    time_ms: Option<u64>,
    nodes: Option<u64>,
    nps: Option<u64>,
    hashfull: Option<u32>,
    tbhits: Option<u64>,
    score: Option<Score>,
    bound: Option<ScoreBound>,
    wdl: Option<Wdl>,
    pv: Option<Vec<String>>,
    currmove: Option<String>,
    currmovenumber: Option<u32>,
}

impl InfoFields {
    fn finish(self) -> SearchInfo {
        let defaults = SearchInfo::default();
        SearchInfo {
            multipv: self.multipv.unwrap_or(defaults.multipv),
            depth: self.depth.unwrap_or(defaults.depth),
            seldepth: self.seldepth.unwrap_or(defaults.seldepth),
            time_ms: self.time_ms.unwrap_or(defaults.time_ms),
            pv: self.pv.unwrap_or_default(),
            score: self.score.unwrap_or(defaults.score),
            bound: self.bound,
            wdl: self.wdl,
            nodes: self.nodes,
            nps: self.nps,
            hashfull: self.hashfull,
            tbhits: self.tbhits,
            currmove: self.currmove,
            currmovenumber: self.currmovenumber,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bestmove() {
        let msg = classify("bestmove e7e5 ponder d2d4");
        match msg {
            UciOutput::BestMove(best) => {
                assert_eq!(best.mv, "e7e5");
                assert_eq!(best.ponder.as_deref(), Some("d2d4"));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_bestmove_none_and_missing() {
        assert_eq!(parse_best_move("bestmove (none)").mv, "(none)");
        let best = parse_best_move("bestmove");
        assert_eq!(best.mv, "");
        assert_eq!(best.ponder, None);
        assert_eq!(parse_best_move("bestmove   a7a8q  ").mv, "a7a8q");
    }

    #[test]
    fn test_parse_info() {
        let msg = classify("info depth 12 seldepth 18 multipv 1 score cp 34 time 102 pv e2e4 e7e5");
        let infos = match msg {
            UciOutput::SearchInfo(infos) => infos,
            _ => panic!("Wrong message type"),
        };
        assert_eq!(infos.len(), 1);
        let info = &infos[0];
        assert_eq!(info.depth, 12);
        assert_eq!(info.seldepth, 18);
        assert_eq!(info.multipv, 1);
        assert_eq!(info.score_centipawns(), 34);
        assert!(!info.is_mate());
        assert_eq!(info.time_ms, 102);
        assert_eq!(info.pv, vec!["e2e4", "e7e5"]);
        assert_eq!(info.wdl, None);
    }

    #[test]
    fn test_parse_info_defaults() {
        let info = parse_search_info("info nodes 15234").unwrap();
        assert_eq!(info.multipv, 1);
        assert_eq!(info.depth, 0);
        assert_eq!(info.seldepth, 0);
        assert_eq!(info.time_ms, 0);
        assert!(info.pv.is_empty());
        assert_eq!(info.score, Score::Centipawns(0));
        assert_eq!(info.nodes, Some(15234));
    }

    #[test]
    fn test_parse_mate_and_wdl() {
        let info = parse_search_info(
            "info depth 30 multipv 2 score mate -3 wdl 0 12 988 nodes 99 pv h7h8q g8h8 a1a8",
        )
        .unwrap();
        assert!(info.is_mate());
        assert_eq!(info.score_centipawns(), -3);
        assert_eq!(info.multipv, 2);
        assert_eq!(
            info.wdl,
            Some(Wdl {
                win: 0,
                draw: 12,
                loss: 988
            })
        );
        assert_eq!(info.pv, vec!["h7h8q", "g8h8", "a1a8"]);
    }

    #[test]
    fn test_score_bound() {
        let info = parse_search_info("info depth 5 score cp -20 upperbound nodes 10").unwrap();
        assert_eq!(info.score, Score::Centipawns(-20));
        assert_eq!(info.bound, Some(ScoreBound::Upper));
        assert_eq!(info.nodes, Some(10));
    }

    #[test]
    fn test_pv_stops_at_keyword() {
        let info = parse_search_info("info depth 3 pv e2e4 e7e5 bmc 0.5 hashfull 12").unwrap();
        assert_eq!(info.pv, vec!["e2e4", "e7e5"]);
        assert_eq!(info.hashfull, Some(12));
    }

    #[test]
    fn test_concatenated_segments() {
        let line = "info depth 10 multipv 1 score cp 20 pv d2d4 info depth 10 multipv 2 score cp 5 pv c2c4 e7e5";
        assert_eq!(
            split_info_segments(line),
            vec![
                "info depth 10 multipv 1 score cp 20 pv d2d4",
                "info depth 10 multipv 2 score cp 5 pv c2c4 e7e5",
            ]
        );

        let infos = match classify(line) {
            UciOutput::SearchInfo(infos) => infos,
            _ => panic!("Wrong message type"),
        };
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].multipv, 1);
        assert_eq!(infos[0].pv, vec!["d2d4"]);
        assert_eq!(infos[1].multipv, 2);
        assert_eq!(infos[1].score_centipawns(), 5);
        assert_eq!(infos[1].pv, vec!["c2c4", "e7e5"]);
    }

    #[test]
    fn test_whole_line_splitting() {
        let line = "info depth 10 multipv 1 pv d2d4 info depth 11 multipv 2";
        let infos = match classify_with(line, InfoSplitting::WholeLine) {
            UciOutput::SearchInfo(infos) => infos,
            _ => panic!("Wrong message type"),
        };
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].depth, 10);
        assert_eq!(infos[0].multipv, 1);
    }

    #[test]
    fn test_info_string_has_no_record() {
        assert_eq!(
            classify("info string NNUE evaluation using nn-1111.nnue"),
            UciOutput::SearchInfo(Vec::new())
        );
    }

    #[test]
    fn test_currmove_is_progress() {
        let info = parse_search_info("info depth 20 currmove g1f3 currmovenumber 3").unwrap();
        assert_eq!(info.currmove.as_deref(), Some("g1f3"));
        assert_eq!(info.currmovenumber, Some(3));
        assert!(info.is_progress_update());
    }

    #[test]
    fn test_malformed_fields_default() {
        let info = parse_search_info("info depth x score cp pv").unwrap();
        assert_eq!(info.depth, 0);
        assert_eq!(info.score, Score::Centipawns(0));
        assert!(info.pv.is_empty());
    }

    #[test]
    fn test_missing_value_keeps_next_field() {
        let info = parse_search_info("info depth pv e2e4 e7e5").unwrap();
        assert_eq!(info.depth, 0);
        assert_eq!(info.pv, vec!["e2e4", "e7e5"]);

        let info = parse_search_info("info time score cp 34 depth 3").unwrap();
        assert_eq!(info.time_ms, 0);
        assert_eq!(info.score, Score::Centipawns(34));
        assert_eq!(info.depth, 3);

        let info = parse_search_info("info nodes nps 900 hashfull tbhits 4").unwrap();
        assert_eq!(info.nodes, None);
        assert_eq!(info.nps, Some(900));
        assert_eq!(info.hashfull, None);
        assert_eq!(info.tbhits, Some(4));
    }

    #[test]
    fn test_currmove_without_move() {
        let info = parse_search_info("info currmove currmovenumber 2 depth 7").unwrap();
        assert_eq!(info.currmove, None);
        assert_eq!(info.currmovenumber, Some(2));
        assert_eq!(info.depth, 7);
        assert!(!info.is_progress_update());
    }

    #[test]
    fn test_unrecognized_lines() {
        assert_eq!(classify("option name Hash type spin"), UciOutput::Unrecognized);
        assert_eq!(classify("ponder e2e4"), UciOutput::Unrecognized);
        assert_eq!(classify("readyok"), UciOutput::Unrecognized);
        assert_eq!(classify(""), UciOutput::Unrecognized);
    }
}
