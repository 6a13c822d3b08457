//! Terrain map rendering.

use crate::lut::TerrainLut;
use crate::palette::ProvinceIdMap;
use crate::types::{Color, ProvinceId, TerrainType};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel, Rgb, RgbImage, Rgba, RgbaImage};

pub const BORDER_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
pub const HIGHLIGHT_COLOR: Rgba<u8> = Rgba([255, 255, 0, 120]);

/// Display color for a terrain class.
pub fn terrain_color(terrain: TerrainType) -> Rgb<u8> {
    match terrain {
        TerrainType::Land => Rgb([235, 180, 60]),
        TerrainType::Sea => Rgb([80, 120, 255]),
        TerrainType::Lake => Rgb([60, 100, 230]),
        TerrainType::River => Rgb([100, 150, 255]),
        TerrainType::Impassable => Rgb([120, 120, 120]),
        TerrainType::Unknown => Rgb([0, 0, 0]),
    }
}

/// Colors every bitmap pixel by the terrain of its province.
pub fn render_terrain(bitmap: &RgbImage, lut: &TerrainLut) -> RgbImage {
    let (width, height) = bitmap.dimensions();
    let mut out = RgbImage::new(width, height);
    for (src, dst) in bitmap.pixels().zip(out.pixels_mut()) {
        let key = Color::new(src[0], src[1], src[2]).packed();
        *dst = terrain_color(TerrainType::from_code(lut.code(key)));
    }
    out
}

/// Paints province borders onto a full-resolution render.
pub fn draw_borders(img: &mut RgbImage, ids: &ProvinceIdMap) {
    debug_assert_eq!(img.dimensions(), (ids.width(), ids.height()));
    let mut drawn = 0usize;
    for y in 0..ids.height() {
        for x in 0..ids.width() {
            if ids.is_border(x, y) {
                img.put_pixel(x, y, BORDER_COLOR);
                drawn += 1;
            }
        }
    }
    log::debug!("Drew {} border pixels", drawn);
}

/// Downscales by two in each direction with a smooth filter.
pub fn downscale_half<P>(img: &ImageBuffer<P, Vec<u8>>) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (width, height) = img.dimensions();
    imageops::resize(
        img,
        (width / 2).max(1),
        (height / 2).max(1),
        FilterType::Triangle,
    )
}

/// Half-scale overlay with `target` painted in [`HIGHLIGHT_COLOR`] and
/// everything else transparent.
pub fn render_highlight(ids: &ProvinceIdMap, target: ProvinceId) -> RgbaImage {
    let mut full = RgbaImage::new(ids.width(), ids.height());
    for (id, px) in ids.as_slice().iter().zip(full.pixels_mut()) {
        if *id == target {
            *px = HIGHLIGHT_COLOR;
        }
    }
    downscale_half(&full)
}
