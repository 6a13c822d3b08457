use crate::types::{Color, ProvinceId};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use thiserror::Error;

/// A row of `definition.csv`: a Province ID and its color on the map bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceDefinition {
    pub id: ProvinceId,
    pub color: Color,
    pub name: String,
}

/// Why a `definition.csv` row was skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("expected at least 5 fields, found {0}")]
    TooFewFields(usize),
    #[error("field {field} is not a valid number: {value:?}")]
    BadNumber { field: usize, value: String },
    #[error("province id 0 is reserved")]
    ReservedId,
}

/// Parsed province definitions with a reverse color index.
#[derive(Debug, Default)]
pub struct Definitions {
    by_id: HashMap<ProvinceId, ProvinceDefinition>,
    id_by_color: HashMap<Color, ProvinceId>,
    /// 1-based line numbers of skipped rows and the reason.
    pub skipped: Vec<(u64, RowError)>,
}

impl Definitions {
    pub fn get(&self, id: ProvinceId) -> Option<&ProvinceDefinition> {
        self.by_id.get(&id)
    }

    pub fn id_for_color(&self, color: Color) -> Option<ProvinceId> {
        self.id_by_color.get(&color).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProvinceDefinition> {
        self.by_id.values()
    }
}

/// Parses one semicolon-separated row: `id;r;g;b;name[;...]`.
pub fn parse_definition_row(record: &csv::StringRecord) -> Result<ProvinceDefinition, RowError> {
    if record.len() < 5 {
        return Err(RowError::TooFewFields(record.len()));
    }

    let number = |field: usize| -> Result<i64, RowError> {
        let value = record.get(field).unwrap_or("").trim();
        value.parse::<i64>().map_err(|_| RowError::BadNumber {
            field,
            value: value.to_string(),
        })
    };
    let channel = |field: usize| -> Result<u8, RowError> {
        let n = number(field)?;
        u8::try_from(n).map_err(|_| RowError::BadNumber {
            field,
            value: n.to_string(),
        })
    };

    let raw_id = number(0)?;
    let r = channel(1)?;
    let g = channel(2)?;
    let b = channel(3)?;

    if raw_id == 0 {
        return Err(RowError::ReservedId);
    }
    let id = ProvinceId::try_from(raw_id).map_err(|_| RowError::BadNumber {
        field: 0,
        value: raw_id.to_string(),
    })?;

    Ok(ProvinceDefinition {
        id,
        color: Color::new(r, g, b),
        name: record.get(4).unwrap_or("").trim().to_string(),
    })
}

/// Parses `definition.csv` text.
///
/// Blank lines and lines starting with `#` are ignored, malformed rows are
/// skipped and recorded in [`Definitions::skipped`]. A repeated ID replaces
/// the earlier row.
pub fn parse_definitions(text: &str) -> Definitions {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());

    let mut rows: Vec<ProvinceDefinition> = Vec::new();
    let mut skipped = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Unreadable definition row: {}", e);
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        match parse_definition_row(&record) {
            Ok(def) => rows.push(def),
            Err(e) => {
                log::debug!("Skipping definition line {}: {}", line, e);
                skipped.push((line, e));
            }
        }
    }

    // Later rows win; the color index only keeps rows that survived.
    let mut last_row: HashMap<ProvinceId, usize> = HashMap::new();
    for (idx, def) in rows.iter().enumerate() {
        last_row.insert(def.id, idx);
    }

    let mut by_id = HashMap::with_capacity(last_row.len());
    let mut id_by_color = HashMap::with_capacity(last_row.len());
    for (idx, def) in rows.into_iter().enumerate() {
        if last_row.get(&def.id) != Some(&idx) {
            continue;
        }
        id_by_color.insert(def.color, def.id);
        by_id.insert(def.id, def);
    }

    Definitions {
        by_id,
        id_by_color,
        skipped,
    }
}

/// Loads province definitions from `definition.csv`.
///
/// A missing file yields empty definitions; whether that is fatal is up to
/// the caller.
pub fn load_definitions(path: &Path) -> io::Result<Definitions> {
    if !path.is_file() {
        log::warn!("Definition file {:?} not found", path);
        return Ok(Definitions::default());
    }
    let text = ck3txt::read_text(path)?;
    let defs = parse_definitions(&text);
    log::info!(
        "Loaded {} province definitions ({} rows skipped)",
        defs.len(),
        defs.skipped.len()
    );
    Ok(defs)
}
