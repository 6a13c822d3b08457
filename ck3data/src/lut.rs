//! Dense color -> terrain lookup table.
//!
//! One byte per 24-bit RGB value, indexed by [`Color::packed`]. Renderers
//! and border passes hit this once per pixel, so it avoids hashing entirely.

use crate::types::{Color, Province, TerrainType};

/// Number of entries: one per packable RGB color.
pub const LUT_SIZE: usize = 1 << 24;

/// Fill value for colors that belong to no defined province.
pub const LUT_DEFAULT: TerrainType = TerrainType::Unknown;

#[derive(Clone, PartialEq)]
pub struct TerrainLut {
    codes: Box<[u8]>,
}

impl TerrainLut {
    /// A table with every entry set to [`LUT_DEFAULT`].
    pub fn new() -> Self {
        Self {
            codes: vec![LUT_DEFAULT.code(); LUT_SIZE].into_boxed_slice(),
        }
    }

    /// Builds the table from classified provinces. Later provinces win if two
    /// share a color.
    pub fn build<'a>(provinces: impl IntoIterator<Item = &'a Province>) -> Self {
        let mut lut = Self::new();
        let mut touched = 0usize;
        for province in provinces {
            lut.set(province.color, province.terrain);
            touched += 1;
        }
        log::debug!("Built terrain LUT from {} colors", touched);
        lut
    }

    /// Wraps raw bytes. Returns `None` unless exactly [`LUT_SIZE`] long.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        (bytes.len() == LUT_SIZE).then(|| Self {
            codes: bytes.into_boxed_slice(),
        })
    }

    pub fn set(&mut self, color: Color, terrain: TerrainType) {
        self.codes[color.packed() as usize] = terrain.code();
    }

    /// Raw code for a packed key. Keys above 24 bits are masked.
    pub fn code(&self, key: u32) -> u8 {
        self.codes[(key & 0x00FF_FFFF) as usize]
    }

    pub fn terrain(&self, color: Color) -> TerrainType {
        TerrainType::from_code(self.codes[color.packed() as usize])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.codes
    }

    /// Count of entries differing from [`LUT_DEFAULT`].
    pub fn classified_count(&self) -> usize {
        self.codes
            .iter()
            .filter(|&&c| c != LUT_DEFAULT.code())
            .count()
    }
}

impl Default for TerrainLut {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TerrainLut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainLut")
            .field("classified", &self.classified_count())
            .finish()
    }
}
