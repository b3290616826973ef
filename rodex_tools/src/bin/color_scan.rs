use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rodex_tools::colors::{self, ColorScanConfig};

#[derive(Parser, Debug)]
#[command(about = "List the unique ^RRGGBB color codes used in item descriptions", version)]
struct Args {
    /// Item database JSON
    #[arg(long, value_name = "FILE", default_value = "data/items.json")]
    items: PathBuf,

    /// Optional destination JSON array
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let colors = colors::run(&ColorScanConfig {
        items: args.items,
        output: args.output.clone(),
    })?;

    println!("{} unique description colors:", colors.len());
    for color in &colors {
        println!("  #{color}");
    }
    if let Some(path) = args.output {
        println!("Written to {}", path.display());
    }

    Ok(())
}
