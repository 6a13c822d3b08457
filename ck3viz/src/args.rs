use ck3data::{Color, ProvinceId};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ck3viz")]
#[command(version, about = "Inspect and render Crusader Kings III province maps")]
pub struct Cli {
    /// Path to the CK3 `game` folder (auto-detected if omitted)
    #[arg(long, global = true)]
    pub game_root: Option<PathBuf>,

    /// Mod folder whose files take priority over the game's
    #[arg(long, global = true)]
    pub mod_root: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); `RUST_LOG` overrides it
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up a province by id, bitmap color or pixel
    #[command(group(ArgGroup::new("target").required(true).args(["id", "color", "pixel"])))]
    Province {
        #[arg(long)]
        id: Option<ProvinceId>,

        /// Bitmap color as R,G,B
        #[arg(long, value_parser = parse_color)]
        color: Option<Color>,

        /// Bitmap coordinate as X,Y
        #[arg(long, value_parser = parse_pixel)]
        pixel: Option<Pixel>,
    },

    /// Show who holds the county of a province in a given year
    Holder {
        province: ProvinceId,

        #[arg(long)]
        year: i32,
    },

    /// Render the terrain map to a PNG
    Render {
        #[arg(short, long)]
        output: PathBuf,

        /// Draw province borders
        #[arg(long)]
        borders: bool,

        /// Keep the bitmap's full resolution instead of halving it
        #[arg(long)]
        full: bool,
    },

    /// Render a transparent overlay highlighting one province
    Highlight {
        province: ProvinceId,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Delete the map cache folder
    ClearCache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
}

fn split_numbers<T: std::str::FromStr>(s: &str, count: usize) -> Result<Vec<T>, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != count {
        return Err(format!("expected {} comma-separated numbers, got {:?}", count, s));
    }
    parts
        .iter()
        .map(|p| p.parse::<T>().map_err(|_| format!("invalid number {:?}", p)))
        .collect()
}

pub fn parse_color(s: &str) -> Result<Color, String> {
    let c = split_numbers::<u8>(s, 3)?;
    Ok(Color::new(c[0], c[1], c[2]))
}

pub fn parse_pixel(s: &str) -> Result<Pixel, String> {
    let p = split_numbers::<u32>(s, 2)?;
    Ok(Pixel { x: p[0], y: p[1] })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("1,2,3"), Ok(Color::new(1, 2, 3)));
        assert_eq!(parse_color(" 255, 0 ,7"), Ok(Color::new(255, 0, 7)));
        assert!(parse_color("1,2").is_err());
        assert!(parse_color("1,2,256").is_err());
    }

    #[test]
    fn test_parse_pixel() {
        assert_eq!(parse_pixel("10,20"), Ok(Pixel { x: 10, y: 20 }));
        assert!(parse_pixel("-1,0").is_err());
        assert!(parse_pixel("1,2,3").is_err());
    }

    #[test]
    fn test_province_requires_target() {
        assert!(Cli::try_parse_from(["ck3viz", "province"]).is_err());
        assert!(
            Cli::try_parse_from(["ck3viz", "province", "--id", "1", "--pixel", "0,0"]).is_err()
        );
        let cli = Cli::try_parse_from(["ck3viz", "province", "--color", "1,1,1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Province { color: Some(_), id: None, pixel: None }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["ck3viz", "clear-cache", "--game-root", "/tmp/ck3"]).unwrap();
        assert_eq!(cli.game_root, Some(PathBuf::from("/tmp/ck3")));
        assert_eq!(cli.log_level, "info");
    }
}
