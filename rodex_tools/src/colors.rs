use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::itemdb::ItemDb;

// Descriptions embed `^RRGGBB` markup for the client's colored text.
static COLOR_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\^([0-9A-Fa-f]{6})").unwrap());

/// Unique color codes used across all item descriptions, uppercased and
/// sorted. Feeds palette/theming work on the browsing site.
pub fn collect_desc_colors(items: &ItemDb) -> Vec<String> {
    let mut colors = BTreeSet::new();
    for entry in items.values() {
        for caps in COLOR_CODE_RE.captures_iter(&entry.desc) {
            colors.insert(caps[1].to_uppercase());
        }
    }
    colors.into_iter().collect()
}

#[derive(Debug, Clone)]
pub struct ColorScanConfig {
    pub items: PathBuf,
    pub output: Option<PathBuf>,
}

pub fn run(config: &ColorScanConfig) -> Result<Vec<String>> {
    let items = crate::itemdb::load_items(&config.items)?;
    let colors = collect_desc_colors(&items);

    if let Some(path) = config.output.as_deref() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("creating color list {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), &colors)
            .with_context(|| format!("writing color list {}", path.display()))?;
    }

    Ok(colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itemdb::ItemEntry;

    #[test]
    fn collects_unique_uppercased_codes() {
        let mut items = ItemDb::new();
        items.insert(
            1,
            ItemEntry {
                name: "A".to_string(),
                desc: "^ff0000Attack^000000 +10\n^FF0000More".to_string(),
                slot: None,
                costume: None,
            },
        );
        items.insert(
            2,
            ItemEntry {
                name: "B".to_string(),
                desc: "^00ff00Defense".to_string(),
                slot: None,
                costume: None,
            },
        );
        let colors = collect_desc_colors(&items);
        assert_eq!(colors, vec!["000000", "00FF00", "FF0000"]);
    }

    #[test]
    fn ignores_short_or_invalid_codes() {
        let mut items = ItemDb::new();
        items.insert(
            1,
            ItemEntry {
                name: "A".to_string(),
                desc: "^12345 and ^GGGGGG".to_string(),
                slot: None,
                costume: None,
            },
        );
        assert!(collect_desc_colors(&items).is_empty());
    }
}
