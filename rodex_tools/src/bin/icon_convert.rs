use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use rodex_tools::icons::{self, ConvertConfig};

#[derive(Parser, Debug)]
#[command(about = "Convert client BMP icons to transparent PNGs named by item id", version)]
struct Args {
    /// Item table file carrying the resource-name mappings
    #[arg(long, value_name = "FILE", default_value = "itemInfo.lua")]
    input: PathBuf,

    /// Directory of source .bmp icons
    #[arg(long, value_name = "DIR", default_value = "item")]
    bmp_dir: PathBuf,

    /// Destination directory for <id>.png files
    #[arg(long, value_name = "DIR", default_value = "item_png")]
    output_dir: PathBuf,

    /// Log file for source bitmaps no item references
    #[arg(long, value_name = "FILE", default_value = "unreferenced_bmps.txt")]
    unreferenced_log: PathBuf,

    /// Background color treated as transparent, as RRGGBB hex
    #[arg(long, value_name = "RRGGBB", default_value = "ff00ff", value_parser = parse_color)]
    transparent_key: [u8; 3],

    /// Candidate encoding, tried in order (may repeat)
    #[arg(long = "encoding", value_name = "LABEL")]
    encodings: Vec<String>,
}

fn parse_color(raw: &str) -> Result<[u8; 3]> {
    let hex = raw.trim_start_matches('#');
    if hex.len() != 6 {
        return Err(anyhow!("expected 6 hex digits, got '{raw}'"));
    }
    let value = u32::from_str_radix(hex, 16).map_err(|_| anyhow!("invalid hex color '{raw}'"))?;
    Ok([(value >> 16) as u8, (value >> 8) as u8, value as u8])
}

fn main() -> Result<()> {
    let args = Args::parse();

    let summary = icons::run_convert(&ConvertConfig {
        table_file: args.input,
        bmp_dir: args.bmp_dir,
        output_dir: args.output_dir.clone(),
        unreferenced_log: args.unreferenced_log,
        transparent_key: args.transparent_key,
        encodings: args.encodings,
    })?;

    println!("\nConversion complete:");
    println!("  Converted: {}", summary.converted);
    println!("  Used unidentified fallback: {}", summary.fallback_used);
    println!("  Missing BMPs: {}", summary.missing);
    println!("  Failed conversions: {}", summary.failed);
    println!("  Unreferenced BMPs: {}", summary.unreferenced);
    println!("  Output directory: {}", args.output_dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodex_tools::icons::DEFAULT_TRANSPARENT_KEY;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("ff00ff").unwrap(), DEFAULT_TRANSPARENT_KEY);
        assert_eq!(parse_color("#102030").unwrap(), [16, 32, 48]);
        assert!(parse_color("f0f").is_err());
        assert!(parse_color("zzzzzz").is_err());
    }
}
