use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rodex_tools::search::{self, IndexConfig};

#[derive(Parser, Debug)]
#[command(about = "Generate name and description search indices", version)]
struct Args {
    /// Item database JSON
    #[arg(long, value_name = "FILE", default_value = "data/items.json")]
    items: PathBuf,

    /// Destination for the name index
    #[arg(long, value_name = "FILE", default_value = "data/search_index_name.json")]
    name_output: PathBuf,

    /// Destination for the description index
    #[arg(long, value_name = "FILE", default_value = "data/search_index_desc.json")]
    desc_output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Generating search indices...");
    let summary = search::run(&IndexConfig {
        items: args.items,
        name_output: args.name_output.clone(),
        desc_output: args.desc_output.clone(),
    })?;

    println!(
        "{}: {} terms",
        args.name_output.display(),
        summary.name_terms
    );
    println!(
        "{}: {} terms",
        args.desc_output.display(),
        summary.desc_terms
    );

    Ok(())
}
