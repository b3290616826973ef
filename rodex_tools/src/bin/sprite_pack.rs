use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rodex_tools::sprite::{self, PackConfig, DEFAULT_ICONS_PER_ROW, DEFAULT_ICON_SIZE};

#[derive(Parser, Debug)]
#[command(about = "Pack item icons into a single sprite sheet", version)]
struct Args {
    /// Directory of <id>.png icon files
    #[arg(long, value_name = "DIR", default_value = "image/item")]
    icon_dir: PathBuf,

    /// Destination atlas image
    #[arg(long, value_name = "FILE", default_value = "image/item_sprite.png")]
    atlas: PathBuf,

    /// Destination sprite map JSON
    #[arg(long, value_name = "FILE", default_value = "data/sprite_map.json")]
    map: PathBuf,

    /// Icon edge length in pixels
    #[arg(long, value_name = "PX", default_value_t = DEFAULT_ICON_SIZE)]
    icon_size: u32,

    /// Icons placed per atlas row
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ICONS_PER_ROW)]
    icons_per_row: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let summary = sprite::run_pack(&PackConfig {
        icon_dir: args.icon_dir,
        atlas_output: args.atlas.clone(),
        map_output: args.map.clone(),
        icon_size: args.icon_size,
        icons_per_row: args.icons_per_row,
    })?;

    println!("\nSprite sheet saved to {}", args.atlas.display());
    println!("Sprite map saved to {}", args.map.display());
    println!(
        "Placed {}/{} icons ({} resized, {} failed) on a {}x{} atlas",
        summary.placed,
        summary.total_icons,
        summary.resized,
        summary.failed,
        summary.atlas_width,
        summary.atlas_height
    );

    Ok(())
}
