use anyhow::{Context, Result};
use ck3data::{GameResolver, MapData, ModOverlayResolver, PathResolver, TitleHistory};
use clap::Parser;
use std::path::PathBuf;

mod args;
mod ops;

use args::{Cli, Commands};
use ops::ProvinceQuery;

fn game_root(args: &Cli) -> Result<PathBuf> {
    if let Some(p) = &args.game_root {
        return Ok(p.clone());
    }
    let p = ck3data::path::detect_game_path()
        .context("Could not detect CK3 installation. Please provide --game-root.")?;
    log::info!("Auto-detected CK3 path: {:?}", p);
    Ok(p)
}

fn run(args: Cli) -> Result<()> {
    let game_root = game_root(&args)?;
    let resolver: Box<dyn PathResolver> = match &args.mod_root {
        Some(mod_root) => Box::new(ModOverlayResolver::new(mod_root, &game_root)),
        None => Box::new(GameResolver::new(&game_root)),
    };

    let load = || MapData::load(resolver.as_ref()).context("Failed to load map");

    match args.command {
        Commands::Province { id, color, pixel } => {
            let query = match (id, color, pixel) {
                (Some(id), _, _) => ProvinceQuery::Id(id),
                (_, Some(color), _) => ProvinceQuery::Color(color),
                (_, _, Some(pixel)) => ProvinceQuery::Pixel(pixel),
                _ => anyhow::bail!("Specify one of --id, --color or --pixel"),
            };
            let map = load()?;
            let province = ops::find_province(&map, query)?;
            print!("{}", ops::describe_province(&map, province));
        }
        Commands::Holder { province, year } => {
            let map = load()?;
            let history = TitleHistory::load_overlay(&game_root, args.mod_root.as_deref());
            println!("{}", ops::describe_holder(&map, &history, province, year));
        }
        Commands::Render {
            output,
            borders,
            full,
        } => ops::render_map(&load()?, &output, borders, full)?,
        Commands::Highlight { province, output } => {
            ops::render_highlight(&load()?, province, &output)?
        }
        Commands::ClearCache => ops::clear_cache(resolver.as_ref())?,
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    run(args)
}
