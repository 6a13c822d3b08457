use crate::types::{ProvinceId, TerrainType};
use ck3txt::{Ck3Txt, Ck3TxtToken, DefaultCk3Txt};
use std::collections::BTreeSet;
use std::io;
use std::path::Path;

pub const SEA_ZONES: &str = "sea_zones";
pub const LAKES: &str = "lakes";
pub const RIVER_PROVINCES: &str = "river_provinces";
pub const IMPASSABLE_MOUNTAINS: &str = "impassable_mountains";
pub const IMPASSABLE_SEAS: &str = "impassable_seas";

/// Widest RANGE accepted. Real maps have a few tens of thousands of
/// provinces; anything wider is a typo.
pub const MAX_RANGE_SPAN: u32 = 1 << 20;

/// Province classification sets from `default.map`.
///
/// CK3's format:
/// ```text
/// sea_zones = RANGE { 8000 8200 }        # every id in [8000, 8200]
/// lakes = LIST { 1201 1202 1344 }        # explicit ids
/// impassable_mountains = LIST { 911 }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerrainClassification {
    pub sea_zones: BTreeSet<ProvinceId>,
    pub lakes: BTreeSet<ProvinceId>,
    pub river_provinces: BTreeSet<ProvinceId>,
    /// `impassable_mountains` and `impassable_seas` merged.
    pub impassable: BTreeSet<ProvinceId>,
}

impl TerrainClassification {
    pub fn from_tokens(tokens: &[Ck3TxtToken]) -> Self {
        let mut impassable = extract_category(tokens, IMPASSABLE_MOUNTAINS);
        impassable.extend(extract_category(tokens, IMPASSABLE_SEAS));
        Self {
            sea_zones: extract_category(tokens, SEA_ZONES),
            lakes: extract_category(tokens, LAKES),
            river_provinces: extract_category(tokens, RIVER_PROVINCES),
            impassable,
        }
    }

    pub fn parse(text: &str) -> Self {
        Self::from_tokens(&DefaultCk3Txt::tokenize(text))
    }

    /// Classifies a province. First match wins:
    /// sea, lake, river, impassable, then land. Colors without a province ID
    /// are unknown.
    pub fn classify(&self, id: Option<ProvinceId>) -> TerrainType {
        let Some(id) = id else {
            return TerrainType::Unknown;
        };
        if self.sea_zones.contains(&id) {
            TerrainType::Sea
        } else if self.lakes.contains(&id) {
            TerrainType::Lake
        } else if self.river_provinces.contains(&id) {
            TerrainType::River
        } else if self.impassable.contains(&id) {
            TerrainType::Impassable
        } else {
            TerrainType::Land
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    List,
    Range,
}

/// Collects every province ID declared under `keyword`.
///
/// Handles `keyword = LIST { ... }`, `keyword = RANGE { a b }` and a bare
/// `keyword = { ... }` (read as a list). Repeated declarations are unioned.
/// Non-integer tokens inside a block are ignored. A RANGE needs at least two
/// integers; anything after the second is ignored. Ranges spanning more
/// than [`MAX_RANGE_SPAN`] ids are dropped.
pub fn extract_category(tokens: &[Ck3TxtToken], keyword: &str) -> BTreeSet<ProvinceId> {
    let mut ids = BTreeSet::new();
    let mut pos = 0;

    while pos < tokens.len() {
        let is_keyword = tokens[pos].as_identifier() == Some(keyword)
            && tokens.get(pos + 1) == Some(&Ck3TxtToken::Equals);
        if !is_keyword {
            pos += 1;
            continue;
        }

        let mut open = pos + 2;
        let kind = match tokens.get(open).and_then(Ck3TxtToken::as_identifier) {
            Some(word) if word.eq_ignore_ascii_case("RANGE") => {
                open += 1;
                BlockKind::Range
            }
            Some(word) if word.eq_ignore_ascii_case("LIST") => {
                open += 1;
                BlockKind::List
            }
            _ => BlockKind::List,
        };

        let (inner, next) = match ck3txt::read_block(tokens, open) {
            Ok(block) => block,
            Err(e) => {
                log::debug!("Ignoring malformed '{}' declaration: {}", keyword, e);
                pos += 1;
                continue;
            }
        };

        let numbers: Vec<ProvinceId> = inner
            .iter()
            .filter_map(Ck3TxtToken::as_int)
            .filter_map(|n| ProvinceId::try_from(n).ok())
            .collect();

        match kind {
            BlockKind::List => ids.extend(numbers),
            BlockKind::Range => {
                if let [start, end, ..] = numbers[..] {
                    if end.saturating_sub(start) < MAX_RANGE_SPAN {
                        ids.extend(start..=end);
                    } else {
                        log::debug!(
                            "Ignoring '{}' RANGE {{ {} {} }}: too wide",
                            keyword,
                            start,
                            end
                        );
                    }
                } else {
                    log::debug!("Ignoring '{}' RANGE with {} bounds", keyword, numbers.len());
                }
            }
        }
        pos = next;
    }

    ids
}

/// Loads `default.map`.
pub fn load_default_map(path: &Path) -> io::Result<TerrainClassification> {
    let tokens = DefaultCk3Txt::open_txt(path)?;
    let classification = TerrainClassification::from_tokens(&tokens);
    log::info!(
        "Terrain classes: {} sea, {} lake, {} river, {} impassable",
        classification.sea_zones.len(),
        classification.lakes.len(),
        classification.river_provinces.len(),
        classification.impassable.len()
    );
    Ok(classification)
}
