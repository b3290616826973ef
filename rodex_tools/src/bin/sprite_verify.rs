use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use rodex_tools::sprite::{self, VerifyConfig};

#[derive(Parser, Debug)]
#[command(about = "Cross-check a sprite sheet against its map and source icons", version)]
struct Args {
    /// Atlas image to verify
    #[arg(long, value_name = "FILE", default_value = "image/item_sprite.png")]
    atlas: PathBuf,

    /// Sprite map JSON to verify
    #[arg(long, value_name = "FILE", default_value = "data/sprite_map.json")]
    map: PathBuf,

    /// Directory of source <id>.png icons
    #[arg(long, value_name = "DIR", default_value = "image/item")]
    icon_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let report = sprite::run_verify(&VerifyConfig {
        atlas: args.atlas,
        map: args.map,
        icon_dir: args.icon_dir,
    })?;

    println!("\nVerification summary:");
    if report.errors.is_empty() {
        println!("  All critical checks passed");
    } else {
        println!("  {} error(s):", report.errors.len());
        for error in &report.errors {
            println!("    error: {error}");
        }
    }
    if !report.warnings.is_empty() {
        println!("  {} warning(s):", report.warnings.len());
        for warning in &report.warnings {
            println!("    warning: {warning}");
        }
    }

    if !report.passed() {
        bail!("sprite verification failed with {} error(s)", report.errors.len());
    }
    Ok(())
}
