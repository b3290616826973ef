use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::itemdb::{ItemDb, ItemEntry};

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// Token -> ascending, duplicate-free item id list.
pub type SearchIndex = BTreeMap<String, Vec<u32>>;

/// The one tokenization rule shared by index build and lookup: alphanumeric
/// runs, case-folded. No stemming.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn build_index<F>(items: &ItemDb, text_of: F) -> SearchIndex
where
    F: Fn(&ItemEntry) -> &str,
{
    let mut index: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
    for (id, entry) in items {
        for token in tokenize(text_of(entry)) {
            index.entry(token).or_default().insert(*id);
        }
    }
    index
        .into_iter()
        .map(|(token, ids)| (token, ids.into_iter().collect()))
        .collect()
}

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub items: PathBuf,
    pub name_output: PathBuf,
    pub desc_output: PathBuf,
}

#[derive(Debug, Default)]
pub struct IndexSummary {
    pub items: usize,
    pub name_terms: usize,
    pub desc_terms: usize,
}

pub fn run(config: &IndexConfig) -> Result<IndexSummary> {
    let items = crate::itemdb::load_items(&config.items)?;
    println!("Loaded {} items", items.len());

    let name_index = build_index(&items, |entry| entry.name.as_str());
    let desc_index = build_index(&items, |entry| entry.desc.as_str());

    write_index(&config.name_output, &name_index)?;
    write_index(&config.desc_output, &desc_index)?;

    Ok(IndexSummary {
        items: items.len(),
        name_terms: name_index.len(),
        desc_terms: desc_index.len(),
    })
}

fn write_index(path: &Path, index: &SearchIndex) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("creating search index {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), index)
        .with_context(|| format!("writing search index {}", path.display()))?;
    Ok(())
}
