use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rodex_formats::{decode_text, scan_records, Record, ScanOptions, Value};
use serde::{Deserialize, Serialize};

/// One normalized item in the browsing database. `slot` is omitted from the
/// JSON when the source reports zero slots and `costume` only appears when
/// the flag is actually set, keeping the serialized entries minimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEntry {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub costume: Option<bool>,
}

/// Item id -> entry. `BTreeMap` keeps serialized keys in ascending numeric
/// order, which is what makes database diffs reproducible.
pub type ItemDb = BTreeMap<u32, ItemEntry>;

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Existing database used to compute the list of newly added ids.
    pub prior: Option<PathBuf>,
    pub new_ids_output: Option<PathBuf>,
    pub encodings: Vec<String>,
}

#[derive(Debug, Default)]
pub struct BuildSummary {
    pub encoding: &'static str,
    pub scanned: usize,
    pub kept: usize,
    pub new_ids: usize,
}

/// Project one scanned record into an [`ItemEntry`]. Returns `None` for
/// records without a display name; identified fields win over their
/// unidentified counterparts.
pub fn project_entry(record: &Record) -> Option<ItemEntry> {
    let name = string_field(record, "identifiedDisplayName")
        .or_else(|| string_field(record, "unidentifiedDisplayName"))?;

    let desc = record
        .get("identifiedDescriptionName")
        .or_else(|| record.get("unidentifiedDescriptionName"))
        .and_then(text_lines)
        .map(|lines| lines.join("\n"))
        .unwrap_or_default();

    let slot = match record.get("slotCount") {
        Some(Value::Int(n)) if *n > 0 => Some(*n),
        Some(Value::Str(s)) => s.trim().parse::<i64>().ok().filter(|n| *n > 0),
        _ => None,
    };

    let costume = matches!(record.get("costume"), Some(Value::Bool(true))).then_some(true);

    Some(ItemEntry {
        name,
        desc,
        slot,
        costume,
    })
}

pub fn build_items(records: &BTreeMap<u32, Record>) -> ItemDb {
    records
        .iter()
        .filter_map(|(id, record)| project_entry(record).map(|entry| (*id, entry)))
        .collect()
}

/// Ids present in `items` but not in the prior snapshot, ascending.
pub fn new_ids(items: &ItemDb, prior: &BTreeSet<u32>) -> Vec<u32> {
    items
        .keys()
        .filter(|id| !prior.contains(id))
        .copied()
        .collect()
}

/// The diff only needs the prior key set, so any entry shape older builds
/// produced is accepted.
pub fn load_prior_ids(path: &Path) -> Result<BTreeSet<u32>> {
    let data = fs::read(path)
        .with_context(|| format!("reading prior item database {}", path.display()))?;
    let prior: BTreeMap<u32, serde_json::Value> = serde_json::from_slice(&data)
        .with_context(|| format!("parsing prior item database {}", path.display()))?;
    Ok(prior.into_keys().collect())
}

pub fn load_items(path: &Path) -> Result<ItemDb> {
    let data =
        fs::read(path).with_context(|| format!("reading item database {}", path.display()))?;
    serde_json::from_slice(&data)
        .with_context(|| format!("parsing item database {}", path.display()))
}

pub fn write_items(path: &Path, items: &ItemDb) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("creating item database {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), items)
        .with_context(|| format!("writing item database {}", path.display()))?;
    Ok(())
}

/// Run the full database build: decode, scan, normalize, diff, write.
/// All inputs are read before the first output file is created.
pub fn run(config: &BuildConfig) -> Result<BuildSummary> {
    let bytes = fs::read(&config.input)
        .with_context(|| format!("reading {}", config.input.display()))?;
    let labels: Vec<&str> = if config.encodings.is_empty() {
        rodex_formats::DEFAULT_ENCODING_LABELS.to_vec()
    } else {
        config.encodings.iter().map(String::as_str).collect()
    };
    let (text, encoding) = decode_text(&bytes, &labels)
        .with_context(|| format!("decoding {}", config.input.display()))?;
    println!("Read {} as {encoding}", config.input.display());

    let options = ScanOptions {
        bare_tokens: true,
        salvage_strings: true,
    };
    let records = scan_records(&text, &options);
    if records.is_empty() {
        eprintln!(
            "[rodex_tools] warning: no records scanned from {}",
            config.input.display()
        );
    }

    let items = build_items(&records);

    let prior = match config.prior.as_deref() {
        Some(path) if path.exists() => {
            let ids = load_prior_ids(path)?;
            println!("Loaded {} existing items from {}", ids.len(), path.display());
            ids
        }
        Some(path) => {
            eprintln!(
                "[rodex_tools] warning: prior database {} not found, treating all ids as new",
                path.display()
            );
            BTreeSet::new()
        }
        None => BTreeSet::new(),
    };
    let added = new_ids(&items, &prior);

    write_items(&config.output, &items)?;

    if let Some(path) = config.new_ids_output.as_deref() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("creating new-id list {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), &added)
            .with_context(|| format!("writing new-id list {}", path.display()))?;
    }

    print_samples(&items, &added);

    Ok(BuildSummary {
        encoding,
        scanned: records.len(),
        kept: items.len(),
        new_ids: added.len(),
    })
}

/// A handful of evenly spaced entries so a run can be eyeballed without
/// opening the output file.
fn print_samples(items: &ItemDb, added: &[u32]) {
    if items.is_empty() {
        return;
    }
    let ids: Vec<u32> = items.keys().copied().collect();
    let count = ids.len().min(10);
    let step = ids.len() / count;

    println!("\nSamples:");
    for slot in 0..count {
        let id = ids[slot * step];
        let entry = &items[&id];
        let slot_text = entry
            .slot
            .map(|n| format!(" [{n} slot(s)]"))
            .unwrap_or_default();
        let new_mark = if added.binary_search(&id).is_ok() {
            " [NEW]"
        } else {
            ""
        };
        println!("  {id}: {}{slot_text}{new_mark}", entry.name);
    }
}

fn string_field(record: &Record, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

fn text_lines(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::List(items) => Some(items.clone()),
        Value::Str(s) => Some(vec![s.clone()]),
        _ => None,
    }
}
