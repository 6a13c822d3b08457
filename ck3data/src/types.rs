//! Core value types shared by the map loaders.

use std::fmt;

pub type ProvinceId = u32;

/// RGB color of a province on the map bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs the color into a 24-bit key: `r << 16 | g << 8 | b`.
    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Inverse of [`Color::packed`]. Bits above 24 are ignored.
    pub const fn from_packed(key: u32) -> Self {
        Self {
            r: (key >> 16) as u8,
            g: (key >> 8) as u8,
            b: key as u8,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.r, self.g, self.b)
    }
}

/// Terrain classification of a province.
///
/// The discriminants are the on-disk LUT codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TerrainType {
    Land = 0,
    Sea = 1,
    Lake = 2,
    River = 3,
    Impassable = 4,
    Unknown = 5,
}

impl TerrainType {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Maps a LUT code back to a terrain type. Out-of-range codes read as
    /// [`TerrainType::Unknown`].
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => TerrainType::Land,
            1 => TerrainType::Sea,
            2 => TerrainType::Lake,
            3 => TerrainType::River,
            4 => TerrainType::Impassable,
            _ => TerrainType::Unknown,
        }
    }
}

impl fmt::Display for TerrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerrainType::Land => "land",
            TerrainType::Sea => "sea",
            TerrainType::Lake => "lake",
            TerrainType::River => "river",
            TerrainType::Impassable => "impassable",
            TerrainType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Name given to bitmap colors that have no definition row.
pub const UNKNOWN_PROVINCE_NAME: &str = "UNKNOWN";

/// A fully classified province, immutable once the map is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Province {
    /// `None` for bitmap colors missing from `definition.csv`.
    pub id: Option<ProvinceId>,
    pub color: Color,
    pub name: String,
    pub terrain: TerrainType,
}

impl Province {
    /// Placeholder for a bitmap color with no definition.
    pub fn unknown(color: Color) -> Self {
        Self {
            id: None,
            color,
            name: UNKNOWN_PROVINCE_NAME.to_string(),
            terrain: TerrainType::Unknown,
        }
    }
}
