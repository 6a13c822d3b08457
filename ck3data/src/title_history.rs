//! Title history from `history/titles`.
//!
//! ```text
//! c_winchester = {
//!     1000.1.1 = { holder = 1234 }
//!     1050.6.3 = {
//!         holder = 5678
//!         liege = k_england
//!     }
//! }
//! ```

use crate::titles::{OpenTitle, scalar_assignment, sorted_txt_files, title_opening};
use ck3txt::{Ck3Txt, Ck3TxtToken, DefaultCk3Txt};
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

pub const TITLE_HISTORY_PATH: &str = "history/titles";

static RE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").unwrap());

/// Year of a `Y.M.D` date token.
pub fn date_year(token: &str) -> Option<i32> {
    RE_DATE.captures(token)?.get(1)?.as_str().parse().ok()
}

/// A dated value: a holder character id or a liege title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEvent {
    pub year: i32,
    pub value: String,
}

impl HistoryEvent {
    pub fn new(year: i32, value: impl Into<String>) -> Self {
        Self {
            year,
            value: value.into(),
        }
    }
}

/// Chronological holder and liege changes of one title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleEvents {
    pub holders: Vec<HistoryEvent>,
    pub lieges: Vec<HistoryEvent>,
}

impl TitleEvents {
    /// Stable sort by year; same-year events keep file order.
    pub fn sort(&mut self) {
        self.holders.sort_by_key(|e| e.year);
        self.lieges.sort_by_key(|e| e.year);
    }

    pub fn holder_at(&self, year: i32) -> Option<&str> {
        value_at(&self.holders, year)
    }

    pub fn liege_at(&self, year: i32) -> Option<&str> {
        value_at(&self.lieges, year)
    }
}

/// Value of the last event with `event.year <= year`, or `None` if every
/// event is later (or there are none). `events` must be sorted by year.
pub fn value_at(events: &[HistoryEvent], year: i32) -> Option<&str> {
    let idx = events.partition_point(|e| e.year <= year);
    idx.checked_sub(1).map(|i| events[i].value.as_str())
}

/// Holder in effect at `year` for a title's history.
pub fn holder_at(history: &TitleEvents, year: i32) -> Option<&str> {
    history.holder_at(year)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleHistory {
    titles: HashMap<String, TitleEvents>,
}

impl TitleHistory {
    /// Parses one history file. A title repeated in the same file keeps only
    /// its last block.
    pub fn from_tokens(tokens: &[Ck3TxtToken]) -> Self {
        let mut titles: HashMap<String, TitleEvents> = HashMap::new();
        let mut stack: Vec<OpenTitle> = Vec::new();
        let mut current_year: Option<i32> = None;
        let mut depth = 0usize;
        let mut pos = 0;

        while pos < tokens.len() {
            if let Some(name) = title_opening(tokens, pos) {
                titles.insert(name.to_string(), TitleEvents::default());
                stack.push(OpenTitle {
                    name: name.to_string(),
                    depth,
                });
                current_year = None;
                depth += 1;
                pos += 3;
                continue;
            }

            if let Some(year) = tokens[pos].as_identifier().and_then(date_year) {
                if !stack.is_empty() {
                    current_year = Some(year);
                }
                pos += 1;
                continue;
            }

            let assignment = scalar_assignment(tokens, pos, "holder")
                .map(|v| (true, v))
                .or_else(|| scalar_assignment(tokens, pos, "liege").map(|v| (false, v)));
            if let Some((is_holder, value)) = assignment {
                if let (Some(title), Some(year), Some(value)) =
                    (stack.last(), current_year, value.scalar_value())
                    && let Some(events) = titles.get_mut(&title.name)
                {
                    let event = HistoryEvent::new(year, value);
                    if is_holder {
                        events.holders.push(event);
                    } else {
                        events.lieges.push(event);
                    }
                }
                pos += 3;
                continue;
            }

            match tokens[pos] {
                Ck3TxtToken::LeftBrace => depth += 1,
                Ck3TxtToken::RightBrace => {
                    depth = depth.saturating_sub(1);
                    while stack.last().is_some_and(|t| t.depth >= depth) {
                        stack.pop();
                        current_year = None;
                    }
                }
                _ => {}
            }
            pos += 1;
        }

        let mut history = Self { titles };
        history.sort();
        history
    }

    pub fn parse(text: &str) -> Self {
        Self::from_tokens(&DefaultCk3Txt::tokenize(text))
    }

    /// Loads every `.txt` file directly inside `dir`, in sorted order.
    /// A title defined in a later file replaces the earlier definition
    /// wholesale. A missing directory yields empty history.
    pub fn load_dir(dir: &Path) -> Self {
        let mut history = Self::default();
        history.extend_from_dir(dir);
        history
    }

    /// Loads `history/titles` from the game, then from the mod, so the mod's
    /// titles replace the game's.
    pub fn load_overlay(game_root: &Path, mod_root: Option<&Path>) -> Self {
        let mut history = Self::load_dir(&game_root.join(TITLE_HISTORY_PATH));
        if let Some(mod_root) = mod_root {
            history.extend_from_dir(&mod_root.join(TITLE_HISTORY_PATH));
        }
        history
    }

    fn extend_from_dir(&mut self, dir: &Path) {
        if !dir.is_dir() {
            log::debug!("No title history at {:?}", dir);
            return;
        }
        let files = sorted_txt_files(dir, 1);

        let parsed: Vec<TitleHistory> = files
            .par_iter()
            .filter_map(|path| match DefaultCk3Txt::open_txt(path) {
                Ok(tokens) => Some(TitleHistory::from_tokens(&tokens)),
                Err(e) => {
                    log::warn!("Failed to read {:?}: {}", path, e);
                    None
                }
            })
            .collect();

        for file in parsed {
            self.titles.extend(file.titles);
        }
        log::info!(
            "Loaded history for {} titles from {:?} ({} files)",
            self.titles.len(),
            dir,
            files.len()
        );
    }

    fn sort(&mut self) {
        for events in self.titles.values_mut() {
            events.sort();
        }
    }

    pub fn get(&self, title: &str) -> Option<&TitleEvents> {
        self.titles.get(title)
    }

    pub fn holder_at(&self, title: &str, year: i32) -> Option<&str> {
        self.get(title)?.holder_at(year)
    }

    pub fn liege_at(&self, title: &str, year: i32) -> Option<&str> {
        self.get(title)?.liege_at(year)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}
