//! Locating game files.
//!
//! Map inputs are looked up by path relative to the game's `game/` folder
//! (e.g. `map_data/definition.csv`). A [`PathResolver`] decides where that
//! relative path actually lives, which lets a mod shadow base game files.

use std::path::{Path, PathBuf};

/// Strategy for turning a game-relative path into a real one.
pub trait PathResolver {
    /// Returns the existing file or directory for `relative`, or `None`.
    fn resolve(&self, relative: &Path) -> Option<PathBuf>;
}

impl<F> PathResolver for F
where
    F: Fn(&Path) -> Option<PathBuf>,
{
    fn resolve(&self, relative: &Path) -> Option<PathBuf> {
        self(relative)
    }
}

/// Resolves against the base game only.
#[derive(Debug, Clone)]
pub struct GameResolver {
    game_root: PathBuf,
}

impl GameResolver {
    pub fn new(game_root: impl Into<PathBuf>) -> Self {
        Self {
            game_root: game_root.into(),
        }
    }
}

impl PathResolver for GameResolver {
    fn resolve(&self, relative: &Path) -> Option<PathBuf> {
        let full = self.game_root.join(relative);
        full.exists().then_some(full)
    }
}

/// Resolves against a mod first, falling back to the base game.
#[derive(Debug, Clone)]
pub struct ModOverlayResolver {
    mod_root: PathBuf,
    game: GameResolver,
}

impl ModOverlayResolver {
    pub fn new(mod_root: impl Into<PathBuf>, game_root: impl Into<PathBuf>) -> Self {
        Self {
            mod_root: mod_root.into(),
            game: GameResolver::new(game_root),
        }
    }
}

impl PathResolver for ModOverlayResolver {
    fn resolve(&self, relative: &Path) -> Option<PathBuf> {
        let mod_path = self.mod_root.join(relative);
        if mod_path.exists() {
            return Some(mod_path);
        }
        self.game.resolve(relative)
    }
}

/// Detects the Crusader Kings III `game/` folder.
///
/// Checks common Steam installation directories on Windows, Linux, and macOS.
pub fn detect_game_path() -> Option<PathBuf> {
    let candidates = [
        // Windows
        r"C:\Program Files (x86)\Steam\steamapps\common\Crusader Kings III\game",
        // Linux
        ".local/share/Steam/steamapps/common/Crusader Kings III/game",
        // macOS
        "Library/Application Support/Steam/steamapps/common/Crusader Kings III/game",
    ];

    for candidate in candidates {
        let path = if candidate.starts_with("C:") {
            PathBuf::from(candidate)
        } else {
            match dirs::home_dir() {
                Some(home) => home.join(candidate),
                None => continue,
            }
        };

        if path.exists() {
            return Some(path);
        }
    }

    None
}
