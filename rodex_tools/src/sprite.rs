use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use image::imageops::{self, FilterType};
use image::{ColorType, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::icons::available_icon_ids;

pub const SPRITE_MAP_VERSION: u32 = 1;
pub const DEFAULT_ICON_SIZE: u32 = 24;
pub const DEFAULT_ICONS_PER_ROW: u32 = 128;

/// Atlases past this size suggest the icon set should be split or the PNG
/// recompressed; the verifier flags it, nothing enforces it.
const ATLAS_SIZE_WARN_BYTES: u64 = 5 * 1024 * 1024;

/// Header plus id -> `[col, row]` grid coordinates for one packed atlas.
/// An icon's rank in ascending id order equals `row * icons_per_row + col`,
/// and the atlas dimensions follow from the header fields alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteMap {
    pub version: u32,
    pub icon_size: u32,
    pub icons_per_row: u32,
    pub total_icons: usize,
    #[serde(default)]
    pub sprite_width: u32,
    #[serde(default)]
    pub sprite_height: u32,
    pub map: BTreeMap<u32, [u32; 2]>,
}

/// Compute the grid placement for a sorted id list. `icons_per_row` and
/// `icon_size` must be nonzero.
pub fn layout(ids: &[u32], icon_size: u32, icons_per_row: u32) -> SpriteMap {
    let total = ids.len();
    let rows_needed = (total as u32).div_ceil(icons_per_row);

    let map = ids
        .iter()
        .enumerate()
        .map(|(rank, id)| {
            let rank = rank as u32;
            (*id, [rank % icons_per_row, rank / icons_per_row])
        })
        .collect();

    SpriteMap {
        version: SPRITE_MAP_VERSION,
        icon_size,
        icons_per_row,
        total_icons: total,
        sprite_width: icons_per_row * icon_size,
        sprite_height: rows_needed * icon_size,
        map,
    }
}

#[derive(Debug, Clone)]
pub struct PackConfig {
    pub icon_dir: PathBuf,
    pub atlas_output: PathBuf,
    pub map_output: PathBuf,
    pub icon_size: u32,
    pub icons_per_row: u32,
}

#[derive(Debug, Default)]
pub struct PackSummary {
    pub total_icons: usize,
    pub placed: usize,
    pub resized: usize,
    pub failed: usize,
    pub atlas_width: u32,
    pub atlas_height: u32,
}

pub fn run_pack(config: &PackConfig) -> Result<PackSummary> {
    ensure!(config.icon_size > 0, "icon size must be positive");
    ensure!(config.icons_per_row > 0, "icons per row must be positive");

    let ids = available_icon_ids(&config.icon_dir)?;
    ensure!(
        !ids.is_empty(),
        "no icon files found in {}",
        config.icon_dir.display()
    );
    println!("Found {} icon files", ids.len());

    let mut sprite_map = layout(&ids, config.icon_size, config.icons_per_row);
    println!(
        "Creating sprite sheet: {}x{}px ({} rows)",
        sprite_map.sprite_width,
        sprite_map.sprite_height,
        sprite_map.sprite_height / config.icon_size
    );

    let mut atlas = RgbaImage::new(sprite_map.sprite_width, sprite_map.sprite_height);
    let mut summary = PackSummary {
        total_icons: ids.len(),
        atlas_width: sprite_map.sprite_width,
        atlas_height: sprite_map.sprite_height,
        ..PackSummary::default()
    };

    let size = config.icon_size;
    for (rank, id) in ids.iter().enumerate() {
        let icon_path = config.icon_dir.join(format!("{id}.png"));
        let icon = match image::open(&icon_path) {
            Ok(img) => img.to_rgba8(),
            Err(error) => {
                summary.failed += 1;
                sprite_map.map.remove(id);
                eprintln!("[rodex_tools] warning: icon {id}: {error}");
                continue;
            }
        };

        let icon = if icon.dimensions() != (size, size) {
            eprintln!(
                "[rodex_tools] warning: icon {id} is {}x{}, expected {size}x{size}, resizing",
                icon.width(),
                icon.height()
            );
            summary.resized += 1;
            imageops::resize(&icon, size, size, FilterType::Nearest)
        } else {
            icon
        };

        let [col, row] = sprite_map.map[id];
        imageops::replace(&mut atlas, &icon, (col * size) as i64, (row * size) as i64);
        summary.placed += 1;

        if (rank + 1) % 500 == 0 {
            println!("Processed {}/{} icons...", rank + 1, ids.len());
        }
    }

    if let Some(parent) = config.atlas_output.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    atlas
        .save(&config.atlas_output)
        .with_context(|| format!("writing atlas {}", config.atlas_output.display()))?;

    if let Some(parent) = config.map_output.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(&config.map_output)
        .with_context(|| format!("creating sprite map {}", config.map_output.display()))?;
    serde_json::to_writer(BufWriter::new(file), &sprite_map)
        .with_context(|| format!("writing sprite map {}", config.map_output.display()))?;

    Ok(summary)
}

#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub atlas: PathBuf,
    pub map: PathBuf,
    pub icon_dir: PathBuf,
}

#[derive(Debug, Default)]
pub struct VerifyReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl VerifyReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

const REQUIRED_MAP_KEYS: &[&str] = &["version", "iconSize", "iconsPerRow", "totalIcons", "map"];

/// Cross-check the sprite map, the atlas image, and the source icon
/// directory. Dimension and placement faults are errors; count drift and
/// cosmetic issues are warnings.
pub fn run_verify(config: &VerifyConfig) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();

    if !config.map.exists() {
        report
            .errors
            .push(format!("sprite map not found: {}", config.map.display()));
    }
    if !config.atlas.exists() {
        report
            .errors
            .push(format!("sprite atlas not found: {}", config.atlas.display()));
    }
    if !report.errors.is_empty() {
        return Ok(report);
    }

    let data = fs::read(&config.map)
        .with_context(|| format!("reading sprite map {}", config.map.display()))?;
    let raw: serde_json::Value = match serde_json::from_slice(&data) {
        Ok(value) => value,
        Err(error) => {
            report
                .errors
                .push(format!("invalid JSON in sprite map: {error}"));
            return Ok(report);
        }
    };
    for key in REQUIRED_MAP_KEYS {
        if raw.get(key).is_none() {
            report.errors.push(format!("sprite map missing key: {key}"));
        }
    }
    if !report.errors.is_empty() {
        return Ok(report);
    }

    let sprite_map: SpriteMap = match serde_json::from_value(raw) {
        Ok(map) => map,
        Err(error) => {
            report
                .errors
                .push(format!("sprite map has unexpected shape: {error}"));
            return Ok(report);
        }
    };
    println!("Map version: {}", sprite_map.version);
    println!("Icon size: {}px", sprite_map.icon_size);
    println!("Icons per row: {}", sprite_map.icons_per_row);
    println!("Total icons: {}", sprite_map.total_icons);
    println!("Map entries: {}", sprite_map.map.len());

    if sprite_map.total_icons != sprite_map.map.len() {
        report.warnings.push(format!(
            "total icons ({}) doesn't match map entries ({})",
            sprite_map.total_icons,
            sprite_map.map.len()
        ));
    }

    let atlas = image::open(&config.atlas)
        .with_context(|| format!("reading atlas {}", config.atlas.display()))?;
    let (width, height) = (atlas.width(), atlas.height());
    println!("Atlas size: {width}x{height}px");

    if atlas.color() != ColorType::Rgba8 {
        report
            .warnings
            .push(format!("expected RGBA atlas, got {:?}", atlas.color()));
    }

    let expected_width = sprite_map.icons_per_row * sprite_map.icon_size;
    if width != expected_width {
        report.errors.push(format!(
            "atlas width mismatch: expected {expected_width}px, got {width}px"
        ));
    }

    // Ascending map order is rank order, so placement arithmetic can be
    // checked entry by entry without the source icons.
    let mut placement_faults = 0usize;
    for (rank, (id, [col, row])) in sprite_map.map.iter().enumerate() {
        let rank = rank as u32;
        let expected = [
            rank % sprite_map.icons_per_row,
            rank / sprite_map.icons_per_row,
        ];
        let in_bounds = (col + 1) * sprite_map.icon_size <= width
            && (row + 1) * sprite_map.icon_size <= height;
        if [*col, *row] != expected || !in_bounds {
            placement_faults += 1;
            if placement_faults <= 5 {
                report.errors.push(format!(
                    "icon {id}: position [{col}, {row}] invalid (rank {rank} expects [{}, {}])",
                    expected[0], expected[1]
                ));
            }
        }
    }
    if placement_faults > 5 {
        report.errors.push(format!(
            "... {} more placement faults",
            placement_faults - 5
        ));
    }

    match available_icon_ids(&config.icon_dir) {
        Ok(ids) => {
            println!("Source icons: {}", ids.len());
            let map_count = sprite_map.map.len();
            if ids.len() > map_count {
                report.warnings.push(format!(
                    "some source icons not in sprite ({} missing)",
                    ids.len() - map_count
                ));
            } else if map_count > ids.len() {
                report.warnings.push(format!(
                    "sprite has more icons than source ({} extra)",
                    map_count - ids.len()
                ));
            }
        }
        Err(error) => {
            report.warnings.push(format!("{error:#}"));
        }
    }

    let atlas_bytes = fs::metadata(&config.atlas).map(|meta| meta.len()).unwrap_or(0);
    if atlas_bytes > ATLAS_SIZE_WARN_BYTES {
        report.warnings.push(format!(
            "large atlas file: {:.2} MB (consider compression)",
            atlas_bytes as f64 / (1024.0 * 1024.0)
        ));
    }

    Ok(report)
}
