//! Title hierarchy from `common/landed_titles`.
//!
//! Only two relations survive parsing: barony -> province and
//! barony -> county. Duchies, kingdoms and empires are tracked while walking
//! the nesting but are not stored.

use crate::types::ProvinceId;
use ck3txt::{Ck3Txt, Ck3TxtToken, DefaultCk3Txt};
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Rank-prefixed title identifier: barony, county, duchy, kingdom, empire.
static RE_TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[bcdke]_\w+$").unwrap());

pub fn is_title_name(name: &str) -> bool {
    RE_TITLE.is_match(name)
}

pub fn is_barony(name: &str) -> bool {
    name.starts_with("b_") && is_title_name(name)
}

pub fn is_county(name: &str) -> bool {
    name.starts_with("c_") && is_title_name(name)
}

/// Title opened by `name = {` at brace depth `depth`.
#[derive(Debug)]
pub(crate) struct OpenTitle {
    pub name: String,
    pub depth: usize,
}

/// If `tokens[pos..]` starts with `<title> = {`, returns the title name.
pub(crate) fn title_opening(tokens: &[Ck3TxtToken], pos: usize) -> Option<&str> {
    let name = tokens.get(pos)?.as_identifier()?;
    if tokens.get(pos + 1) == Some(&Ck3TxtToken::Equals)
        && tokens.get(pos + 2) == Some(&Ck3TxtToken::LeftBrace)
        && is_title_name(name)
    {
        Some(name)
    } else {
        None
    }
}

/// If `tokens[pos..]` starts with `<key> = <scalar>`, returns the scalar token.
pub(crate) fn scalar_assignment<'a>(
    tokens: &'a [Ck3TxtToken],
    pos: usize,
    key: &str,
) -> Option<&'a Ck3TxtToken> {
    if tokens.get(pos)?.as_identifier()? != key || tokens.get(pos + 1)? != &Ck3TxtToken::Equals {
        return None;
    }
    match tokens.get(pos + 2)? {
        Ck3TxtToken::LeftBrace | Ck3TxtToken::RightBrace | Ck3TxtToken::Equals => None,
        value => Some(value),
    }
}

/// Barony bindings extracted from landed title files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleHierarchy {
    barony_by_province: HashMap<ProvinceId, String>,
    county_by_barony: HashMap<String, String>,
}

impl TitleHierarchy {
    /// Walks one file's tokens with a stack of open titles.
    pub fn from_tokens(tokens: &[Ck3TxtToken]) -> Self {
        let mut hierarchy = Self::default();
        let mut stack: Vec<OpenTitle> = Vec::new();
        let mut depth = 0usize;
        let mut pos = 0;

        while pos < tokens.len() {
            if let Some(name) = title_opening(tokens, pos) {
                stack.push(OpenTitle {
                    name: name.to_string(),
                    depth,
                });
                depth += 1;
                pos += 3;
                continue;
            }

            if let Some(value) = scalar_assignment(tokens, pos, "province") {
                if let Some(top) = stack.last().filter(|t| is_barony(&t.name)) {
                    match value.as_int().and_then(|n| ProvinceId::try_from(n).ok()) {
                        Some(id) if id > 0 => {
                            hierarchy.barony_by_province.insert(id, top.name.clone());
                            if let Some(county) = stack.iter().rev().find(|t| is_county(&t.name)) {
                                hierarchy
                                    .county_by_barony
                                    .insert(top.name.clone(), county.name.clone());
                            }
                        }
                        _ => log::debug!("Ignoring province binding {:?} in {}", value, top.name),
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
                    }
                }
                _ => {}
            }
            pos += 1;
        }

        hierarchy
    }

    pub fn parse(text: &str) -> Self {
        Self::from_tokens(&DefaultCk3Txt::tokenize(text))
    }

    /// Merges `other` into `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: TitleHierarchy) {
        self.barony_by_province.extend(other.barony_by_province);
        self.county_by_barony.extend(other.county_by_barony);
    }

    pub fn barony_for_province(&self, province: ProvinceId) -> Option<&str> {
        self.barony_by_province.get(&province).map(String::as_str)
    }

    pub fn county_for_barony(&self, barony: &str) -> Option<&str> {
        self.county_by_barony.get(barony).map(String::as_str)
    }

    pub fn county_for_province(&self, province: ProvinceId) -> Option<&str> {
        self.barony_for_province(province)
            .and_then(|barony| self.county_for_barony(barony))
    }

    pub fn barony_count(&self) -> usize {
        self.barony_by_province.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barony_by_province.is_empty() && self.county_by_barony.is_empty()
    }
}

/// All `.txt` files under `dir`, recursively, in lexicographic path order.
pub(crate) fn sorted_txt_files(dir: &Path, max_depth: usize) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect()
}

/// Loads every landed title file under `dir`.
///
/// Files are parsed in parallel and merged in sorted path order, so a later
/// file's binding for the same province or barony replaces an earlier one.
pub fn load_title_hierarchy(dir: &Path) -> TitleHierarchy {
    let files = sorted_txt_files(dir, usize::MAX);

    let parsed: Vec<TitleHierarchy> = files
        .par_iter()
        .filter_map(|path| match DefaultCk3Txt::open_txt(path) {
            Ok(tokens) => Some(TitleHierarchy::from_tokens(&tokens)),
            Err(e) => {
                log::warn!("Failed to read {:?}: {}", path, e);
                None
            }
        })
        .collect();

    let mut hierarchy = TitleHierarchy::default();
    for file in parsed {
        hierarchy.merge(file);
    }
    log::info!(
        "Loaded {} barony bindings from {} title files",
        hierarchy.barony_count(),
        files.len()
    );
    hierarchy
}
