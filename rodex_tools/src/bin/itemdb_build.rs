use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rodex_tools::itemdb::{self, BuildConfig};

#[derive(Parser, Debug)]
#[command(about = "Convert a client item table into the browsing database", version)]
struct Args {
    /// Item table file exported from the client
    #[arg(long, value_name = "FILE", default_value = "itemInfo.lua")]
    input: PathBuf,

    /// Destination item database JSON
    #[arg(long, value_name = "FILE", default_value = "data/items.json")]
    output: PathBuf,

    /// Existing database snapshot used to compute newly added ids
    #[arg(long, value_name = "FILE")]
    prior: Option<PathBuf>,

    /// Destination for the new-id list
    #[arg(long, value_name = "FILE", requires = "prior")]
    new_ids: Option<PathBuf>,

    /// Candidate encoding, tried in order (may repeat)
    #[arg(long = "encoding", value_name = "LABEL")]
    encodings: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let summary = itemdb::run(&BuildConfig {
        input: args.input,
        output: args.output.clone(),
        prior: args.prior,
        new_ids_output: args.new_ids.clone(),
        encodings: args.encodings,
    })?;

    println!(
        "\nConverted {} of {} records -> {}",
        summary.kept,
        summary.scanned,
        args.output.display()
    );
    if let Some(path) = args.new_ids {
        println!("{} new items -> {}", summary.new_ids, path.display());
    }

    Ok(())
}
