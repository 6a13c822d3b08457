use crate::error::MapError;
use crate::lut::TerrainLut;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Cache folder created next to the province bitmap.
pub const CACHE_DIR_NAME: &str = "ck3_map_cache";

const LUT_BLOB: &str = "lut_types.bin";
const LUT_META: &str = "lut_types.meta";
const BASE_MAP_IMAGE: &str = "base_map_half.png";
const BASE_MAP_META: &str = "base_map_half.meta";

/// Whether a cached artifact was reused or rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Rebuilt,
}

/// Content hashes of the source files an artifact was built from.
///
/// Hashes rather than mtimes: some editors preserve timestamps on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHashes {
    pub definition_hash: String,
    pub default_map_hash: String,
    /// Only recorded for artifacts derived from the bitmap pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provinces_hash: Option<String>,
}

impl SourceHashes {
    /// Hashes the inputs of the terrain LUT.
    pub fn for_lut(definition: &Path, default_map: &Path) -> io::Result<Self> {
        Ok(Self {
            definition_hash: compute_file_hash(definition)?,
            default_map_hash: compute_file_hash(default_map)?,
            provinces_hash: None,
        })
    }

    /// Hashes the inputs of the rendered base map.
    pub fn for_base_map(bitmap: &Path, definition: &Path, default_map: &Path) -> io::Result<Self> {
        let mut hashes = Self::for_lut(definition, default_map)?;
        hashes.provinces_hash = Some(compute_file_hash(bitmap)?);
        Ok(hashes)
    }
}

/// On-disk cache for derived map artifacts.
///
/// Every artifact is stored next to a JSON manifest of [`SourceHashes`].
/// An artifact is reused only when its manifest matches the current hashes
/// exactly and the payload reads back intact; any other outcome is a miss.
#[derive(Debug, Clone)]
pub struct MapCache {
    dir: PathBuf,
}

impl MapCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache folder beside the given bitmap.
    pub fn beside(bitmap: &Path) -> Self {
        let parent = bitmap.parent().unwrap_or_else(|| Path::new("."));
        Self::new(parent.join(CACHE_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_manifest(&self, name: &str) -> Option<SourceHashes> {
        let path = self.dir.join(name);
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(hashes) => Some(hashes),
            Err(e) => {
                log::warn!("Unreadable cache manifest {:?} ({}), ignoring", path, e);
                None
            }
        }
    }

    /// Writes `payload` then its manifest. The old manifest is removed first
    /// so an interrupted write cannot pair new hashes with an old payload.
    fn store(
        &self,
        meta_name: &str,
        hashes: &SourceHashes,
        payload: impl FnOnce(&Path) -> Result<(), MapError>,
    ) -> Result<(), MapError> {
        fs::create_dir_all(&self.dir)?;
        let meta_path = self.dir.join(meta_name);
        match fs::remove_file(&meta_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        payload(&self.dir)?;
        fs::write(&meta_path, serde_json::to_string_pretty(hashes)?)?;
        Ok(())
    }

    pub fn load_lut(&self, expected: &SourceHashes) -> Option<TerrainLut> {
        if self.read_manifest(LUT_META).as_ref() != Some(expected) {
            return None;
        }
        let path = self.dir.join(LUT_BLOB);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to read cached LUT {:?}: {}", path, e);
                return None;
            }
        };
        let len = bytes.len();
        let lut = TerrainLut::from_bytes(bytes);
        if lut.is_none() {
            log::warn!("Cached LUT {:?} has wrong size ({} bytes)", path, len);
        }
        lut
    }

    pub fn store_lut(&self, lut: &TerrainLut, hashes: &SourceHashes) -> Result<(), MapError> {
        self.store(LUT_META, hashes, |dir| {
            fs::write(dir.join(LUT_BLOB), lut.as_bytes())?;
            Ok(())
        })
    }

    /// Returns the cached LUT if it is still valid, otherwise builds and
    /// persists a new one. Failing to persist is logged, not returned.
    pub fn load_or_build_lut(
        &self,
        expected: &SourceHashes,
        build: impl FnOnce() -> TerrainLut,
    ) -> (TerrainLut, CacheStatus) {
        if let Some(lut) = self.load_lut(expected) {
            log::info!("Using cached terrain LUT from {:?}", self.dir);
            return (lut, CacheStatus::Hit);
        }

        log::info!("Terrain LUT cache missing or stale, rebuilding");
        let lut = build();
        if let Err(e) = self.store_lut(&lut, expected) {
            log::warn!("Failed to write terrain LUT cache to {:?}: {}", self.dir, e);
        }
        (lut, CacheStatus::Rebuilt)
    }

    pub fn load_base_map(&self, expected: &SourceHashes) -> Option<RgbImage> {
        if self.read_manifest(BASE_MAP_META).as_ref() != Some(expected) {
            return None;
        }
        let path = self.dir.join(BASE_MAP_IMAGE);
        match image::open(&path) {
            Ok(img) => Some(img.to_rgb8()),
            Err(e) => {
                log::warn!("Failed to read cached base map {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn store_base_map(&self, img: &RgbImage, hashes: &SourceHashes) -> Result<(), MapError> {
        self.store(BASE_MAP_META, hashes, |dir| {
            img.save(dir.join(BASE_MAP_IMAGE))?;
            Ok(())
        })
    }

    /// Same protocol as [`MapCache::load_or_build_lut`], for the rendered
    /// half-scale base map.
    pub fn load_or_render_base_map(
        &self,
        expected: &SourceHashes,
        render: impl FnOnce() -> RgbImage,
    ) -> (RgbImage, CacheStatus) {
        if let Some(img) = self.load_base_map(expected) {
            log::info!("Using cached base map from {:?}", self.dir);
            return (img, CacheStatus::Hit);
        }

        log::info!("Base map cache missing or stale, rendering");
        let img = render();
        if let Err(e) = self.store_base_map(&img, expected) {
            log::warn!("Failed to write base map cache to {:?}: {}", self.dir, e);
        }
        (img, CacheStatus::Rebuilt)
    }

    /// Deletes the cache folder. A missing folder is not an error.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                log::info!("Cleared cache {:?}", self.dir);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Compute SHA256 hash of a file, as lowercase hex.
pub fn compute_file_hash(path: &Path) -> io::Result<String> {
    use sha2::{Digest, Sha256};

    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    let hash = hasher.finalize();
    Ok(format!("{:x}", hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lut::LUT_SIZE;
    use crate::types::{Color, TerrainType};
    use image::Rgb;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn sources(temp: &TempDir) -> (PathBuf, PathBuf) {
        let def = temp.path().join("definition.csv");
        let map = temp.path().join("default.map");
        fs::write(&def, "1;1;1;1;a\n").unwrap();
        fs::write(&map, "sea_zones = LIST { 1 }\n").unwrap();
        (def, map)
    }

    fn sea_lut() -> TerrainLut {
        let mut lut = TerrainLut::new();
        lut.set(Color::new(1, 1, 1), TerrainType::Sea);
        lut
    }

    #[test]
    fn test_compute_file_hash() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("test.txt");
        fs::write(&file, b"hello world").unwrap();

        let hash = compute_file_hash(&file).unwrap();

        // SHA256 of "hello world"
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_lut_manifest_json_layout() {
        let temp = TempDir::new().unwrap();
        let (def, map) = sources(&temp);
        let hashes = SourceHashes::for_lut(&def, &map).unwrap();
        let cache = MapCache::new(temp.path().join(CACHE_DIR_NAME));
        cache.store_lut(&sea_lut(), &hashes).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(cache.dir().join(LUT_META)).unwrap())
                .unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["definition_hash"], hashes.definition_hash.as_str());
        assert_eq!(obj["default_map_hash"], hashes.default_map_hash.as_str());
        assert_eq!(
            fs::metadata(cache.dir().join(LUT_BLOB)).unwrap().len(),
            LUT_SIZE as u64
        );
    }

    #[test]
    fn test_lut_cache_hit_after_build() {
        let temp = TempDir::new().unwrap();
        let (def, map) = sources(&temp);
        let hashes = SourceHashes::for_lut(&def, &map).unwrap();
        let cache = MapCache::new(temp.path().join(CACHE_DIR_NAME));

        let (first, status) = cache.load_or_build_lut(&hashes, sea_lut);
        assert_eq!(status, CacheStatus::Rebuilt);

        let built = Cell::new(false);
        let (second, status) = cache.load_or_build_lut(&hashes, || {
            built.set(true);
            TerrainLut::new()
        });
        assert_eq!(status, CacheStatus::Hit);
        assert!(!built.get());
        assert!(first == second);
    }

    #[test]
    fn test_lut_cache_invalidated_by_source_change() {
        let temp = TempDir::new().unwrap();
        let (def, map) = sources(&temp);
        let cache = MapCache::new(temp.path().join(CACHE_DIR_NAME));
        let hashes = SourceHashes::for_lut(&def, &map).unwrap();
        cache.load_or_build_lut(&hashes, sea_lut);

        fs::write(&def, "1;1;1;2;a\n").unwrap();
        let changed = SourceHashes::for_lut(&def, &map).unwrap();
        assert_ne!(changed, hashes);
        assert!(cache.load_lut(&changed).is_none());

        let (_, status) = cache.load_or_build_lut(&changed, TerrainLut::new);
        assert_eq!(status, CacheStatus::Rebuilt);
        assert!(cache.load_lut(&changed).is_some());
        assert!(cache.load_lut(&hashes).is_none());
    }

    #[test]
    fn test_truncated_blob_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let (def, map) = sources(&temp);
        let hashes = SourceHashes::for_lut(&def, &map).unwrap();
        let cache = MapCache::new(temp.path().join(CACHE_DIR_NAME));
        cache.store_lut(&sea_lut(), &hashes).unwrap();

        fs::write(cache.dir().join(LUT_BLOB), vec![0u8; 1024]).unwrap();
        assert!(cache.load_lut(&hashes).is_none());

        let (lut, status) = cache.load_or_build_lut(&hashes, sea_lut);
        assert_eq!(status, CacheStatus::Rebuilt);
        assert_eq!(lut.terrain(Color::new(1, 1, 1)), TerrainType::Sea);
        assert!(cache.load_lut(&hashes).is_some());
    }

    #[test]
    fn test_corrupt_manifest_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let (def, map) = sources(&temp);
        let hashes = SourceHashes::for_lut(&def, &map).unwrap();
        let cache = MapCache::new(temp.path().join(CACHE_DIR_NAME));
        cache.store_lut(&sea_lut(), &hashes).unwrap();

        fs::write(cache.dir().join(LUT_META), "{ not json").unwrap();
        assert!(cache.load_lut(&hashes).is_none());
    }

    #[test]
    fn test_base_map_round_trip_requires_bitmap_hash() {
        let temp = TempDir::new().unwrap();
        let (def, map) = sources(&temp);
        let bitmap = temp.path().join("provinces.png");
        RgbImage::from_pixel(2, 2, Rgb([1, 1, 1])).save(&bitmap).unwrap();

        let hashes = SourceHashes::for_base_map(&bitmap, &def, &map).unwrap();
        assert!(hashes.provinces_hash.is_some());
        let cache = MapCache::beside(&bitmap);
        assert_eq!(cache.dir(), temp.path().join(CACHE_DIR_NAME));

        let img = RgbImage::from_pixel(1, 1, Rgb([80, 120, 255]));
        let (_, status) = cache.load_or_render_base_map(&hashes, || img.clone());
        assert_eq!(status, CacheStatus::Rebuilt);
        let (cached, status) = cache.load_or_render_base_map(&hashes, || unreachable!());
        assert_eq!(status, CacheStatus::Hit);
        assert_eq!(cached, img);

        RgbImage::from_pixel(2, 2, Rgb([2, 2, 2])).save(&bitmap).unwrap();
        let changed = SourceHashes::for_base_map(&bitmap, &def, &map).unwrap();
        assert!(cache.load_base_map(&changed).is_none());
        // The LUT manifest shape never matches a base map manifest.
        assert!(cache.load_lut(&changed).is_none());
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let cache = MapCache::new(temp.path().join(CACHE_DIR_NAME));
        cache.clear().unwrap();
        let (def, map) = sources(&temp);
        let hashes = SourceHashes::for_lut(&def, &map).unwrap();
        cache.store_lut(&TerrainLut::new(), &hashes).unwrap();
        assert!(cache.dir().exists());
        cache.clear().unwrap();
        assert!(!cache.dir().exists());
    }
}
