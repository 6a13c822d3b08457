//! Province bitmap scanning.

use crate::types::{Color, ProvinceId};
use image::RgbImage;
use std::collections::HashMap;
use std::path::Path;

const COLOR_SPACE: usize = 1 << 24;

/// Loads the province bitmap as 8-bit RGB. Alpha, if any, is dropped.
pub fn load_bitmap(path: &Path) -> Result<RgbImage, image::ImageError> {
    log::info!("Loading province bitmap from {:?}", path);
    Ok(image::open(path)?.to_rgb8())
}

/// Enumerates the distinct colors of a bitmap, sorted by packed value.
///
/// Uses a 2 MiB bitset over the whole 24-bit color space rather than a hash
/// set, since real maps have tens of millions of pixels.
pub fn scan_palette(img: &RgbImage) -> Vec<Color> {
    let mut seen = vec![0u64; COLOR_SPACE / 64];
    for pixel in img.pixels() {
        let key = Color::new(pixel[0], pixel[1], pixel[2]).packed() as usize;
        seen[key / 64] |= 1u64 << (key % 64);
    }

    let mut colors = Vec::new();
    for (word_idx, &word) in seen.iter().enumerate() {
        let mut bits = word;
        while bits != 0 {
            let bit = bits.trailing_zeros() as usize;
            colors.push(Color::from_packed((word_idx * 64 + bit) as u32));
            bits &= bits - 1;
        }
    }
    log::debug!("Bitmap palette has {} distinct colors", colors.len());
    colors
}

/// Province ID of every bitmap pixel, row-major. `0` marks pixels whose
/// color has no definition.
#[derive(Debug, Clone)]
pub struct ProvinceIdMap {
    width: u32,
    height: u32,
    ids: Vec<ProvinceId>,
}

impl ProvinceIdMap {
    pub fn build(img: &RgbImage, id_by_color: &HashMap<Color, ProvinceId>) -> Self {
        let (width, height) = img.dimensions();
        let ids = img
            .pixels()
            .map(|p| {
                id_by_color
                    .get(&Color::new(p[0], p[1], p[2]))
                    .copied()
                    .unwrap_or(0)
            })
            .collect();
        Self { width, height, ids }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Province at a pixel; `None` outside the map or on undefined colors.
    pub fn province_at(&self, x: u32, y: u32) -> Option<ProvinceId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        match self.ids[(y * self.width + x) as usize] {
            0 => None,
            id => Some(id),
        }
    }

    /// Raw row-major IDs, `0` for undefined.
    pub fn as_slice(&self) -> &[ProvinceId] {
        &self.ids
    }

    /// True if any 4-neighbour of an interior pixel belongs to another
    /// province. Edge pixels never count as borders.
    pub fn is_border(&self, x: u32, y: u32) -> bool {
        if x == 0 || y == 0 || x + 1 >= self.width || y + 1 >= self.height {
            return false;
        }
        let w = self.width as usize;
        let idx = y as usize * w + x as usize;
        let id = self.ids[idx];
        id != self.ids[idx - 1]
            || id != self.ids[idx + 1]
            || id != self.ids[idx - w]
            || id != self.ids[idx + w]
    }

    /// Number of pixels covered by `id`.
    pub fn pixel_count(&self, id: ProvinceId) -> usize {
        self.ids.iter().filter(|&&p| p == id).count()
    }
}
