use crate::args::Pixel;
use anyhow::{Context, Result, bail};
use ck3data::map::BITMAP_PATH;
use ck3data::render;
use ck3data::{
    CacheStatus, Color, HolderResolution, MapCache, MapData, PathResolver, Province, ProvinceId,
    TitleHistory,
};
use std::fmt::Write as _;
use std::path::Path;

/// Normalize path for display - forward slashes read better in logs
fn display_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

/// How a province was looked up on the command line.
#[derive(Debug, Clone, Copy)]
pub enum ProvinceQuery {
    Id(ProvinceId),
    Color(Color),
    Pixel(Pixel),
}

pub fn find_province(map: &MapData, query: ProvinceQuery) -> Result<&Province> {
    let found = match query {
        ProvinceQuery::Id(id) => map.province_by_id(id),
        ProvinceQuery::Color(color) => map.province_by_color(color),
        ProvinceQuery::Pixel(Pixel { x, y }) => {
            let (w, h) = map.bitmap().dimensions();
            if x >= w || y >= h {
                bail!("Pixel ({}, {}) is outside the {}x{} bitmap", x, y, w, h);
            }
            map.province_at_pixel(x, y)
        }
    };
    found.with_context(|| format!("No province matches {:?}", query))
}

pub fn describe_province(map: &MapData, province: &Province) -> String {
    let mut out = String::new();
    match province.id {
        Some(id) => {
            let _ = writeln!(out, "Province {}", id);
        }
        None => {
            let _ = writeln!(out, "Province (undefined)");
        }
    }
    let _ = writeln!(out, "  Name:    {}", province.name);
    let _ = writeln!(out, "  Color:   {}", province.color);
    let _ = writeln!(out, "  Terrain: {}", province.terrain);
    if let Some(id) = province.id {
        let barony = map.barony_for_province(id);
        let county = map.county_for_province(id);
        let _ = writeln!(out, "  Barony:  {}", barony.unwrap_or("-"));
        let _ = writeln!(out, "  County:  {}", county.unwrap_or("-"));
    }
    out
}

pub fn describe_holder(
    map: &MapData,
    history: &TitleHistory,
    province: ProvinceId,
    year: i32,
) -> String {
    match map.holder_for_province(history, province, year) {
        HolderResolution::NoBarony => {
            format!("Province {} is not bound to any barony", province)
        }
        HolderResolution::NoCounty { barony } => {
            format!("Barony {} is not part of any county", barony)
        }
        HolderResolution::NoHistory { county, .. } => {
            format!("No history for {}", county)
        }
        HolderResolution::NoHolder { county, .. } => {
            format!("{} has no holder in {}", county, year)
        }
        HolderResolution::Holder {
            barony,
            county,
            holder,
        } => {
            let mut out = format!("{} ({}) in {}: holder {}", county, barony, year, holder);
            if let Some(liege) = history.liege_at(&county, year) {
                let _ = write!(out, ", liege {}", liege);
            }
            out
        }
    }
}

/// Writes the terrain map. Half scale without borders comes from the cache.
pub fn render_map(map: &MapData, output: &Path, borders: bool, full: bool) -> Result<()> {
    let img = match (full, borders) {
        (true, _) => map.render_terrain(borders),
        (false, false) => {
            let (img, status) = map.base_map_half()?;
            if status == CacheStatus::Hit {
                log::info!("Reused cached base map");
            }
            img
        }
        (false, true) => render::downscale_half(&map.render_terrain(true)),
    };
    img.save(output)
        .with_context(|| format!("Failed to write {}", display_path(output)))?;
    println!(
        "Wrote {}x{} map to {}",
        img.width(),
        img.height(),
        display_path(output)
    );
    Ok(())
}

pub fn render_highlight(map: &MapData, province: ProvinceId, output: &Path) -> Result<()> {
    if map.province_by_id(province).is_none() {
        bail!("Province {} is not defined", province);
    }
    let overlay = map.highlight(province);
    overlay
        .save(output)
        .with_context(|| format!("Failed to write {}", display_path(output)))?;
    println!(
        "Wrote highlight for province {} to {}",
        province,
        display_path(output)
    );
    Ok(())
}

/// Removes the cache folder beside the province bitmap.
pub fn clear_cache(resolver: &dyn PathResolver) -> Result<()> {
    let bitmap = resolver
        .resolve(Path::new(BITMAP_PATH))
        .with_context(|| format!("Could not find {}", BITMAP_PATH))?;
    let cache = MapCache::beside(&bitmap);
    cache
        .clear()
        .with_context(|| format!("Failed to clear {}", display_path(cache.dir())))?;
    println!("Cleared {}", display_path(cache.dir()));
    Ok(())
}
