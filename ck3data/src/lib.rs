pub mod cache;
pub mod default_map;
pub mod definitions;
pub mod error;
pub mod lut;
pub mod map;
pub mod palette;
pub mod path;
pub mod render;
pub mod title_history;
pub mod titles;
pub mod types;

pub use cache::{CacheStatus, MapCache};
pub use error::MapError;
pub use lut::TerrainLut;
pub use map::{HolderResolution, MapData};
pub use path::{GameResolver, ModOverlayResolver, PathResolver};
pub use title_history::TitleHistory;
pub use types::{Color, Province, ProvinceId, TerrainType};
