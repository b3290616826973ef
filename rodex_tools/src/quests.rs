use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::itemdb::ItemDb;

/// Quest database as exported for the browsing site: groups of subgroups of
/// quests, each quest carrying a requirement list. Unknown fields are
/// tolerated so exporter additions never break the analyzer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestDb {
    #[serde(default)]
    pub groups: Vec<QuestGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subgroups: Vec<QuestSubgroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestSubgroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quests: Vec<Quest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quest {
    #[serde(default = "unknown_quest_name")]
    pub name: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

fn unknown_quest_name() -> String {
    "Unknown Quest".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Requirement {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<RequirementId>,
    #[serde(default = "default_amount")]
    pub amount: i64,
}

fn default_amount() -> i64 {
    1
}

/// Exported requirement ids show up both as JSON numbers and as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequirementId {
    Num(u32),
    Text(String),
}

impl RequirementId {
    pub fn as_item_id(&self) -> Option<u32> {
        match self {
            RequirementId::Num(n) => Some(*n),
            RequirementId::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestRef {
    pub quest: String,
    pub amount: i64,
    pub group: String,
    pub subgroup: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageEntry {
    pub item_id: u32,
    pub name: String,
    pub quest_count: usize,
    pub total_amount: i64,
    pub avg_amount: f64,
    pub quests: Vec<QuestRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankByCount {
    pub item_id: u32,
    pub name: String,
    pub quest_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankByTotal {
    pub item_id: u32,
    pub name: String,
    pub total_amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankByAvg {
    pub item_id: u32,
    pub name: String,
    pub avg_amount: f64,
    pub quest_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageSummary {
    pub total_unique_items: usize,
    pub total_item_requirements: usize,
    pub total_items_needed: i64,
    pub top_by_quest_count: Vec<RankByCount>,
    pub top_by_total_amount: Vec<RankByTotal>,
    pub top_by_avg_amount: Vec<RankByAvg>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub summary: UsageSummary,
    pub items: BTreeMap<u32, UsageEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCounts {
    pub processed: usize,
    pub skipped: usize,
}

const TOP_LIMIT: usize = 10;

/// Walk every quest requirement of kind `item` and accumulate per-item usage.
/// Groups named in `exclude` are dropped wholesale before traversal.
pub fn analyze_usage(
    quests: &QuestDb,
    items: &ItemDb,
    exclude: &HashSet<String>,
) -> (BTreeMap<u32, UsageEntry>, GroupCounts) {
    struct Accumulator {
        quest_count: usize,
        total_amount: i64,
        quests: Vec<QuestRef>,
    }

    let mut usage: BTreeMap<u32, Accumulator> = BTreeMap::new();
    let mut counts = GroupCounts::default();

    for group in &quests.groups {
        if exclude.contains(&group.name) {
            counts.skipped += 1;
            continue;
        }
        counts.processed += 1;

        for subgroup in &group.subgroups {
            for quest in &subgroup.quests {
                for requirement in &quest.requirements {
                    if requirement.kind != "item" {
                        continue;
                    }
                    let Some(item_id) = requirement.id.as_ref().and_then(RequirementId::as_item_id)
                    else {
                        continue;
                    };

                    let entry = usage.entry(item_id).or_insert_with(|| Accumulator {
                        quest_count: 0,
                        total_amount: 0,
                        quests: Vec::new(),
                    });
                    entry.quest_count += 1;
                    entry.total_amount += requirement.amount;
                    entry.quests.push(QuestRef {
                        quest: quest.name.clone(),
                        amount: requirement.amount,
                        group: group.name.clone(),
                        subgroup: subgroup.name.clone(),
                    });
                }
            }
        }
    }

    let entries = usage
        .into_iter()
        .map(|(item_id, acc)| {
            let name = items
                .get(&item_id)
                .map(|item| item.name.clone())
                .unwrap_or_else(|| format!("Unknown Item ({item_id})"));
            let avg_amount = round2(acc.total_amount as f64 / acc.quest_count as f64);
            (
                item_id,
                UsageEntry {
                    item_id,
                    name,
                    quest_count: acc.quest_count,
                    total_amount: acc.total_amount,
                    avg_amount,
                    quests: acc.quests,
                },
            )
        })
        .collect();

    (entries, counts)
}

pub fn build_summary(entries: &BTreeMap<u32, UsageEntry>) -> UsageSummary {
    let mut by_count: Vec<&UsageEntry> = entries.values().collect();
    by_count.sort_by(|a, b| b.quest_count.cmp(&a.quest_count));

    let mut by_total: Vec<&UsageEntry> = entries.values().collect();
    by_total.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));

    let mut by_avg: Vec<&UsageEntry> = entries.values().collect();
    by_avg.sort_by(|a, b| b.avg_amount.total_cmp(&a.avg_amount));

    UsageSummary {
        total_unique_items: entries.len(),
        total_item_requirements: entries.values().map(|e| e.quest_count).sum(),
        total_items_needed: entries.values().map(|e| e.total_amount).sum(),
        top_by_quest_count: by_count
            .iter()
            .take(TOP_LIMIT)
            .map(|e| RankByCount {
                item_id: e.item_id,
                name: e.name.clone(),
                quest_count: e.quest_count,
            })
            .collect(),
        top_by_total_amount: by_total
            .iter()
            .take(TOP_LIMIT)
            .map(|e| RankByTotal {
                item_id: e.item_id,
                name: e.name.clone(),
                total_amount: e.total_amount,
            })
            .collect(),
        top_by_avg_amount: by_avg
            .iter()
            .take(TOP_LIMIT)
            .map(|e| RankByAvg {
                item_id: e.item_id,
                name: e.name.clone(),
                avg_amount: e.avg_amount,
                quest_count: e.quest_count,
            })
            .collect(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn load_quests(path: &Path) -> Result<QuestDb> {
    let data =
        fs::read(path).with_context(|| format!("reading quest database {}", path.display()))?;
    serde_json::from_slice(&data)
        .with_context(|| format!("parsing quest database {}", path.display()))
}

#[derive(Debug, Clone)]
pub struct UsageConfig {
    pub quests: PathBuf,
    pub items: PathBuf,
    pub output: PathBuf,
    pub exclude_groups: Vec<String>,
}

pub fn run(config: &UsageConfig) -> Result<UsageReport> {
    let quests = load_quests(&config.quests)?;

    let items = if config.items.exists() {
        crate::itemdb::load_items(&config.items)?
    } else {
        eprintln!(
            "[rodex_tools] warning: item database {} not found, item names will be unknown",
            config.items.display()
        );
        ItemDb::new()
    };

    let exclude: HashSet<String> = config.exclude_groups.iter().cloned().collect();
    let (entries, counts) = analyze_usage(&quests, &items, &exclude);
    if !exclude.is_empty() {
        println!(
            "Processed {} groups, skipped {} groups",
            counts.processed, counts.skipped
        );
    }

    let report = UsageReport {
        summary: build_summary(&entries),
        items: entries,
    };

    if let Some(parent) = config.output.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(&config.output)
        .with_context(|| format!("creating usage report {}", config.output.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report)
        .with_context(|| format!("writing usage report {}", config.output.display()))?;

    Ok(report)
}
