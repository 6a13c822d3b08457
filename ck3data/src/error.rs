use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a map load.
///
/// Malformed lines and stale caches never show up here: the former are
/// skipped, the latter are rebuilt.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("Required map input not found: {what} ({})", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
