//! Map loading: ties the bitmap, definitions, terrain classes and landed
//! titles together and answers province queries.

use crate::cache::{CacheStatus, MapCache, SourceHashes};
use crate::default_map::load_default_map;
use crate::definitions::load_definitions;
use crate::error::MapError;
use crate::lut::TerrainLut;
use crate::palette::{ProvinceIdMap, load_bitmap, scan_palette};
use crate::path::PathResolver;
use crate::render;
use crate::title_history::TitleHistory;
use crate::titles::{TitleHierarchy, load_title_hierarchy};
use crate::types::{Color, Province, ProvinceId, TerrainType};
use image::RgbImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const BITMAP_PATH: &str = "map_data/provinces.png";
pub const DEFINITION_PATH: &str = "map_data/definition.csv";
pub const DEFAULT_MAP_PATH: &str = "map_data/default.map";
pub const LANDED_TITLES_PATH: &str = "common/landed_titles";

/// Where each input was found.
#[derive(Debug, Clone)]
pub struct MapPaths {
    pub bitmap: PathBuf,
    pub definition: PathBuf,
    pub default_map: PathBuf,
    pub landed_titles: Option<PathBuf>,
}

impl MapPaths {
    /// Resolves all inputs. The bitmap, definitions and `default.map` are
    /// mandatory; landed titles are optional.
    pub fn resolve(resolver: &dyn PathResolver) -> Result<Self, MapError> {
        let required = |what: &'static str, relative: &str| {
            resolver
                .resolve(Path::new(relative))
                .filter(|p| p.is_file())
                .ok_or_else(|| MapError::MissingInput {
                    what,
                    path: PathBuf::from(relative),
                })
        };

        let paths = Self {
            bitmap: required("province bitmap", BITMAP_PATH)?,
            definition: required("province definitions", DEFINITION_PATH)?,
            default_map: required("terrain classification", DEFAULT_MAP_PATH)?,
            landed_titles: resolver
                .resolve(Path::new(LANDED_TITLES_PATH))
                .filter(|p| p.is_dir()),
        };
        Ok(paths)
    }
}

/// Outcome of walking province -> barony -> county -> holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolderResolution {
    NoBarony,
    NoCounty { barony: String },
    NoHistory { barony: String, county: String },
    NoHolder { barony: String, county: String },
    Holder {
        barony: String,
        county: String,
        holder: String,
    },
}

/// Loaded and classified map. Immutable once constructed.
pub struct MapData {
    paths: MapPaths,
    cache: MapCache,
    bitmap: RgbImage,
    by_id: HashMap<ProvinceId, Province>,
    by_color: HashMap<Color, Province>,
    id_by_color: HashMap<Color, ProvinceId>,
    titles: TitleHierarchy,
    lut: TerrainLut,
    lut_status: CacheStatus,
}

impl MapData {
    /// Loads the map with the cache folder next to the bitmap.
    pub fn load(resolver: &dyn PathResolver) -> Result<Self, MapError> {
        let paths = MapPaths::resolve(resolver)?;
        let cache = MapCache::beside(&paths.bitmap);
        Self::load_paths(paths, cache)
    }

    /// Loads the map using an explicit cache location.
    pub fn load_with_cache(resolver: &dyn PathResolver, cache: MapCache) -> Result<Self, MapError> {
        Self::load_paths(MapPaths::resolve(resolver)?, cache)
    }

    fn load_paths(paths: MapPaths, cache: MapCache) -> Result<Self, MapError> {
        let start = std::time::Instant::now();

        // 1. Bitmap palette
        let bitmap = load_bitmap(&paths.bitmap)?;
        let palette = scan_palette(&bitmap);
        log::info!(
            "Bitmap {}x{} uses {} colors",
            bitmap.width(),
            bitmap.height(),
            palette.len()
        );

        // 2. Definitions
        let definitions = load_definitions(&paths.definition)?;

        // 3. Titles (optional)
        let titles = match &paths.landed_titles {
            Some(dir) => load_title_hierarchy(dir),
            None => {
                log::warn!(
                    "Landed titles ({}) not found, barony and county lookups will be empty",
                    LANDED_TITLES_PATH
                );
                TitleHierarchy::default()
            }
        };

        // 4. Terrain classes
        let classification = load_default_map(&paths.default_map)?;

        // 5. Classified provinces, plus placeholders for undefined colors
        let by_id: HashMap<ProvinceId, Province> = definitions
            .iter()
            .map(|def| {
                let province = Province {
                    id: Some(def.id),
                    color: def.color,
                    name: def.name.clone(),
                    terrain: classification.classify(Some(def.id)),
                };
                (def.id, province)
            })
            .collect();

        // Colors shared by several definitions resolve the way the
        // definitions' own color index does.
        let id_by_color: HashMap<Color, ProvinceId> = by_id
            .values()
            .filter_map(|p| definitions.id_for_color(p.color).map(|id| (p.color, id)))
            .collect();
        let mut by_color: HashMap<Color, Province> = id_by_color
            .iter()
            .filter_map(|(color, id)| by_id.get(id).map(|p| (*color, p.clone())))
            .collect();
        let mut unknown = 0usize;
        for color in palette {
            by_color.entry(color).or_insert_with(|| {
                unknown += 1;
                Province::unknown(color)
            });
        }
        if unknown > 0 {
            log::warn!("{} bitmap colors have no province definition", unknown);
        }

        // 6. LUT
        let hashes = SourceHashes::for_lut(&paths.definition, &paths.default_map)?;
        let (lut, lut_status) =
            cache.load_or_build_lut(&hashes, || TerrainLut::build(by_color.values()));

        log::info!(
            "Map loaded in {:.2?}: {} provinces, {} colors",
            start.elapsed(),
            by_id.len(),
            by_color.len()
        );

        Ok(Self {
            paths,
            cache,
            bitmap,
            by_id,
            by_color,
            id_by_color,
            titles,
            lut,
            lut_status,
        })
    }

    pub fn paths(&self) -> &MapPaths {
        &self.paths
    }

    pub fn bitmap(&self) -> &RgbImage {
        &self.bitmap
    }

    pub fn lut(&self) -> &TerrainLut {
        &self.lut
    }

    /// Whether the LUT came from disk or was rebuilt during this load.
    pub fn lut_status(&self) -> CacheStatus {
        self.lut_status
    }

    pub fn titles(&self) -> &TitleHierarchy {
        &self.titles
    }

    pub fn province_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn province_by_color(&self, color: Color) -> Option<&Province> {
        self.by_color.get(&color)
    }

    pub fn province_by_id(&self, id: ProvinceId) -> Option<&Province> {
        self.by_id.get(&id)
    }

    /// Province under a bitmap pixel.
    pub fn province_at_pixel(&self, x: u32, y: u32) -> Option<&Province> {
        let px = self.bitmap.get_pixel_checked(x, y)?;
        self.province_by_color(Color::new(px[0], px[1], px[2]))
    }

    /// Terrain for any color via the LUT.
    pub fn terrain_at_color(&self, color: Color) -> TerrainType {
        self.lut.terrain(color)
    }

    pub fn barony_for_province(&self, province: ProvinceId) -> Option<&str> {
        self.titles.barony_for_province(province)
    }

    pub fn county_for_barony(&self, barony: &str) -> Option<&str> {
        self.titles.county_for_barony(barony)
    }

    pub fn county_for_province(&self, province: ProvinceId) -> Option<&str> {
        self.titles.county_for_province(province)
    }

    /// Resolves the holder of the county containing `province` at `year`.
    pub fn holder_for_province(
        &self,
        history: &TitleHistory,
        province: ProvinceId,
        year: i32,
    ) -> HolderResolution {
        let Some(barony) = self.barony_for_province(province) else {
            return HolderResolution::NoBarony;
        };
        let barony = barony.to_string();
        let Some(county) = self.county_for_barony(&barony) else {
            return HolderResolution::NoCounty { barony };
        };
        let county = county.to_string();
        let Some(events) = history.get(&county) else {
            return HolderResolution::NoHistory { barony, county };
        };
        match events.holder_at(year) {
            Some(holder) => HolderResolution::Holder {
                barony,
                county,
                holder: holder.to_string(),
            },
            None => HolderResolution::NoHolder { barony, county },
        }
    }

    /// Per-pixel province IDs.
    pub fn province_id_map(&self) -> ProvinceIdMap {
        ProvinceIdMap::build(&self.bitmap, &self.id_by_color)
    }

    /// Full-resolution terrain render, optionally with province borders.
    pub fn render_terrain(&self, borders: bool) -> RgbImage {
        let mut img = render::render_terrain(&self.bitmap, &self.lut);
        if borders {
            render::draw_borders(&mut img, &self.province_id_map());
        }
        img
    }

    /// Half-scale borderless terrain map, reused from the cache when the
    /// bitmap, definitions and `default.map` are unchanged.
    pub fn base_map_half(&self) -> Result<(RgbImage, CacheStatus), MapError> {
        let hashes = SourceHashes::for_base_map(
            &self.paths.bitmap,
            &self.paths.definition,
            &self.paths.default_map,
        )?;
        Ok(self.cache.load_or_render_base_map(&hashes, || {
            render::downscale_half(&self.render_terrain(false))
        }))
    }

    /// Half-scale highlight overlay for one province.
    pub fn highlight(&self, province: ProvinceId) -> image::RgbaImage {
        render::render_highlight(&self.province_id_map(), province)
    }
}
