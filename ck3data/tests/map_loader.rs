//! End-to-end map loading against a miniature game directory.

use ck3data::cache::CACHE_DIR_NAME;
use ck3data::map::{BITMAP_PATH, DEFAULT_MAP_PATH, DEFINITION_PATH, LANDED_TITLES_PATH};
use ck3data::{
    CacheStatus, Color, GameResolver, MapCache, MapData, MapError, ModOverlayResolver,
    TerrainType, TitleHistory,
};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DEFINITIONS: &str = "0;0;0;0;x;x;\n5;1;1;1;Coast;x\n6;2;2;2;Inland;x\n";

/// 2x2 bitmap: two sea pixels, one land pixel, one color with no definition.
fn write_game(root: &Path) {
    fs::create_dir_all(root.join("map_data")).unwrap();
    let mut img = RgbImage::from_pixel(2, 2, Rgb([1, 1, 1]));
    img.put_pixel(1, 0, Rgb([2, 2, 2]));
    img.put_pixel(0, 1, Rgb([3, 3, 3]));
    img.save(root.join(BITMAP_PATH)).unwrap();
    fs::write(root.join(DEFINITION_PATH), DEFINITIONS).unwrap();
    fs::write(root.join(DEFAULT_MAP_PATH), "sea_zones = LIST { 5 }\n").unwrap();
}

fn write_titles(root: &Path) {
    let dir = root.join(LANDED_TITLES_PATH);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("00_landed_titles.txt"),
        "e_x = {\n\tk_x = {\n\t\td_x = {\n\t\t\tc_inland = {\n\t\t\t\tb_inland = {\n\t\t\t\t\tprovince = 6\n\t\t\t\t}\n\t\t\t}\n\t\t}\n\t}\n}\n",
    )
    .unwrap();
}

#[test]
fn test_lut_codes_for_scenario() {
    let game = TempDir::new().unwrap();
    write_game(game.path());
    let map = MapData::load(&GameResolver::new(game.path())).unwrap();

    let lut = map.lut();
    assert_eq!(lut.code(0x010101), 1);
    assert_eq!(lut.code(0x020202), 0);
    assert_eq!(lut.code(0x030303), 5);
    assert_eq!(lut.code(0xFFFFFF), 5);
    assert_eq!(lut.classified_count(), 2);

    let unknown = map.province_by_color(Color::new(3, 3, 3)).unwrap();
    assert_eq!(unknown.id, None);
    assert_eq!(unknown.name, "UNKNOWN");
    assert_eq!(unknown.terrain, TerrainType::Unknown);
    assert_eq!(map.province_by_id(5).unwrap().terrain, TerrainType::Sea);
}

#[test]
fn test_cache_hit_on_second_load() {
    let game = TempDir::new().unwrap();
    write_game(game.path());
    let resolver = GameResolver::new(game.path());

    let first = MapData::load(&resolver).unwrap();
    assert_eq!(first.lut_status(), CacheStatus::Rebuilt);
    assert!(game.path().join("map_data").join(CACHE_DIR_NAME).is_dir());

    let second = MapData::load(&resolver).unwrap();
    assert_eq!(second.lut_status(), CacheStatus::Hit);
    assert!(first.lut() == second.lut());
}

#[test]
fn test_cache_invalidated_by_definition_change() {
    let game = TempDir::new().unwrap();
    write_game(game.path());
    let resolver = GameResolver::new(game.path());
    MapData::load(&resolver).unwrap();

    // One byte differs in the definitions.
    fs::write(
        game.path().join(DEFINITION_PATH),
        DEFINITIONS.replace("Inland", "Inlanc"),
    )
    .unwrap();
    let map = MapData::load(&resolver).unwrap();
    assert_eq!(map.lut_status(), CacheStatus::Rebuilt);

    fs::write(
        game.path().join(DEFAULT_MAP_PATH),
        "sea_zones = LIST { 5 }\nlakes = LIST { 6 }\n",
    )
    .unwrap();
    let map = MapData::load(&resolver).unwrap();
    assert_eq!(map.lut_status(), CacheStatus::Rebuilt);
    assert_eq!(map.lut().code(0x020202), 2);
}

#[test]
fn test_corrupt_cache_is_rebuilt() {
    let game = TempDir::new().unwrap();
    write_game(game.path());
    let resolver = GameResolver::new(game.path());
    MapData::load(&resolver).unwrap();

    let cache_dir = game.path().join("map_data").join(CACHE_DIR_NAME);
    fs::write(cache_dir.join("lut_types.bin"), b"short").unwrap();
    let map = MapData::load(&resolver).unwrap();
    assert_eq!(map.lut_status(), CacheStatus::Rebuilt);
    assert_eq!(map.lut().code(0x010101), 1);
}

#[test]
fn test_explicit_cache_dir() {
    let game = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write_game(game.path());

    let map = MapData::load_with_cache(
        &GameResolver::new(game.path()),
        MapCache::new(cache.path().join("cache")),
    )
    .unwrap();
    assert_eq!(map.lut_status(), CacheStatus::Rebuilt);
    assert!(cache.path().join("cache").join("lut_types.meta").is_file());
    assert!(!game.path().join("map_data").join(CACHE_DIR_NAME).exists());
}

#[test]
fn test_missing_definitions_fails_fast() {
    let game = TempDir::new().unwrap();
    write_game(game.path());
    fs::remove_file(game.path().join(DEFINITION_PATH)).unwrap();

    match MapData::load(&GameResolver::new(game.path())) {
        Err(MapError::MissingInput { what, .. }) => assert_eq!(what, "province definitions"),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("load should fail without definitions"),
    }
}

#[test]
fn test_titles_and_holder_chain() {
    let game = TempDir::new().unwrap();
    write_game(game.path());
    write_titles(game.path());
    let history_dir = game.path().join("history/titles");
    fs::create_dir_all(&history_dir).unwrap();
    fs::write(
        history_dir.join("k_x.txt"),
        "c_inland = {\n\t1000.1.1 = { holder = 100 }\n\t1050.6.1 = {\n\t\tholder = 200\n\t}\n}\n",
    )
    .unwrap();

    let map = MapData::load(&GameResolver::new(game.path())).unwrap();
    assert_eq!(map.barony_for_province(6), Some("b_inland"));
    assert_eq!(map.county_for_barony("b_inland"), Some("c_inland"));
    assert_eq!(map.county_for_province(6), Some("c_inland"));
    assert_eq!(map.barony_for_province(5), None);

    let history = TitleHistory::load_overlay(game.path(), None);
    assert_eq!(history.holder_at("c_inland", 999), None);
    assert_eq!(history.holder_at("c_inland", 1000), Some("100"));
    assert_eq!(history.holder_at("c_inland", 1049), Some("100"));
    assert_eq!(history.holder_at("c_inland", 1050), Some("200"));
}

#[test]
fn test_mod_overlay_replaces_definitions() {
    let game = TempDir::new().unwrap();
    let module = TempDir::new().unwrap();
    write_game(game.path());
    fs::create_dir_all(module.path().join("map_data")).unwrap();
    fs::write(
        module.path().join(DEFINITION_PATH),
        "5;1;1;1;Coast;x\n6;2;2;2;Inland;x\n7;3;3;3;Isle;x\n",
    )
    .unwrap();

    let cache = TempDir::new().unwrap();
    let map = MapData::load_with_cache(
        &ModOverlayResolver::new(module.path(), game.path()),
        MapCache::new(cache.path()),
    )
    .unwrap();
    assert_eq!(map.paths().bitmap, game.path().join(BITMAP_PATH));
    assert_eq!(map.paths().definition, module.path().join(DEFINITION_PATH));
    assert_eq!(map.province_by_color(Color::new(3, 3, 3)).unwrap().id, Some(7));
    assert_eq!(map.lut().code(0x030303), 0);
}
