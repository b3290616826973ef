use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rodex_tools::icons::{self, IconListConfig};

#[derive(Parser, Debug)]
#[command(about = "List the item ids that have a rendered icon", version)]
struct Args {
    /// Directory of <id>.png icon files
    #[arg(long, value_name = "DIR", default_value = "image/item")]
    icon_dir: PathBuf,

    /// Destination icon list JSON
    #[arg(long, value_name = "FILE", default_value = "data/item_icons.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Scanning {} for item icons...", args.icon_dir.display());
    let count = icons::run_list(&IconListConfig {
        icon_dir: args.icon_dir,
        output: args.output.clone(),
    })?;

    println!("Found {count} item icons -> {}", args.output.display());
    Ok(())
}
