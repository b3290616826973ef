use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rodex_tools::quests::{self, UsageConfig};

#[derive(Parser, Debug)]
#[command(about = "Analyze item usage across the quest database", version)]
struct Args {
    /// Quest database JSON
    #[arg(long, value_name = "FILE", default_value = "data/quests.json")]
    quests: PathBuf,

    /// Item database JSON used to resolve item names
    #[arg(long, value_name = "FILE", default_value = "data/items.json")]
    items: PathBuf,

    /// Destination usage report JSON
    #[arg(long, value_name = "FILE", default_value = "data/item_usage.json")]
    output: PathBuf,

    /// Quest group to exclude from the analysis (may repeat)
    #[arg(long = "exclude-group", value_name = "NAME")]
    exclude_groups: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    for group in &args.exclude_groups {
        println!("Excluding '{group}' group from analysis");
    }
    println!("Analyzing item usage in quests...");

    let report = quests::run(&UsageConfig {
        quests: args.quests,
        items: args.items,
        output: args.output.clone(),
        exclude_groups: args.exclude_groups,
    })?;

    println!(
        "\nGenerated {} ({} unique items)",
        args.output.display(),
        report.items.len()
    );

    let summary = &report.summary;
    println!("\nSummary statistics:");
    println!("  Total unique items used: {}", summary.total_unique_items);
    println!(
        "  Total item requirements: {}",
        summary.total_item_requirements
    );
    println!("  Total items needed: {}", summary.total_items_needed);

    println!("\nTop items by quest count:");
    for (i, entry) in summary.top_by_quest_count.iter().enumerate() {
        println!(
            "  {}. {} - used in {} quests",
            i + 1,
            entry.name,
            entry.quest_count
        );
    }

    println!("\nTop items by total volume:");
    for (i, entry) in summary.top_by_total_amount.iter().enumerate() {
        println!(
            "  {}. {} - {} total needed",
            i + 1,
            entry.name,
            entry.total_amount
        );
    }

    println!("\nTop items by average amount per quest:");
    for (i, entry) in summary.top_by_avg_amount.iter().enumerate() {
        println!(
            "  {}. {} - avg {:.1} per quest ({} quests)",
            i + 1,
            entry.name,
            entry.avg_amount,
            entry.quest_count
        );
    }

    Ok(())
}
