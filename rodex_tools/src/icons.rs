use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::Rgba;
use rodex_formats::{decode_text, scan_records, Record, ScanOptions, Value};
use walkdir::WalkDir;

/// Magenta, the client's color key for icon backgrounds.
pub const DEFAULT_TRANSPARENT_KEY: [u8; 3] = [255, 0, 255];

/// Scan a directory of rendered icons and return the ascending ids of every
/// `<id>.png` present. Non-numeric stems are reported and skipped.
pub fn available_icon_ids(dir: &Path) -> Result<Vec<u32>> {
    if !dir.is_dir() {
        bail!("icon directory not found: {}", dir.display());
    }

    let mut ids = Vec::new();
    for entry in WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|res| res.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !has_extension(path, "png") {
            continue;
        }
        match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) if stem.chars().all(|c| c.is_ascii_digit()) && !stem.is_empty() => {
                if let Ok(id) = stem.parse::<u32>() {
                    ids.push(id);
                }
            }
            _ => {
                eprintln!(
                    "[rodex_tools] warning: skipping non-numeric icon file {}",
                    path.display()
                );
            }
        }
    }

    ids.sort_unstable();
    Ok(ids)
}

#[derive(Debug, Clone)]
pub struct IconListConfig {
    pub icon_dir: PathBuf,
    pub output: PathBuf,
}

pub fn run_list(config: &IconListConfig) -> Result<usize> {
    let ids = available_icon_ids(&config.icon_dir)?;
    if ids.is_empty() {
        eprintln!("[rodex_tools] warning: no valid item icons found");
    }

    if let Some(parent) = config.output.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(&config.output)
        .with_context(|| format!("creating icon list {}", config.output.display()))?;
    serde_json::to_writer(BufWriter::new(file), &ids)
        .with_context(|| format!("writing icon list {}", config.output.display()))?;

    Ok(ids.len())
}

/// Bitmap names recorded against an item id. The identified name is
/// preferred; the unidentified one is the fallback for items whose
/// identified sprite was never shipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceNames {
    pub identified: Option<String>,
    pub unidentified: Option<String>,
}

/// Pull id -> resource-name pairs out of scanned records, keeping only ids
/// that carry at least one name.
pub fn resource_names(records: &BTreeMap<u32, Record>) -> BTreeMap<u32, ResourceNames> {
    records
        .iter()
        .filter_map(|(id, record)| {
            let names = ResourceNames {
                identified: string_field(record, "identifiedResourceName"),
                unidentified: string_field(record, "unidentifiedResourceName"),
            };
            (names.identified.is_some() || names.unidentified.is_some()).then_some((*id, names))
        })
        .collect()
}

fn string_field(record: &Record, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// Recolor every pixel matching the transparent key to alpha zero and write
/// the result as a PNG. RGB channels are preserved either way; opaque
/// sources gain a full alpha channel.
pub fn convert_bmp_file(bmp_path: &Path, png_path: &Path, transparent_key: [u8; 3]) -> Result<()> {
    let source = image::open(bmp_path)
        .with_context(|| format!("decoding bitmap {}", bmp_path.display()))?;
    let mut rgba = source.to_rgba8();

    for pixel in rgba.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        if [r, g, b] == transparent_key {
            *pixel = Rgba([r, g, b, 0]);
        }
    }

    rgba.save(png_path)
        .with_context(|| format!("writing {}", png_path.display()))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub table_file: PathBuf,
    pub bmp_dir: PathBuf,
    pub output_dir: PathBuf,
    pub unreferenced_log: PathBuf,
    pub transparent_key: [u8; 3],
    pub encodings: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ConvertSummary {
    pub converted: usize,
    pub fallback_used: usize,
    pub missing: usize,
    pub failed: usize,
    pub unreferenced: usize,
}

pub fn run_convert(config: &ConvertConfig) -> Result<ConvertSummary> {
    let bytes = fs::read(&config.table_file)
        .with_context(|| format!("reading {}", config.table_file.display()))?;
    let labels: Vec<&str> = if config.encodings.is_empty() {
        rodex_formats::DEFAULT_ENCODING_LABELS.to_vec()
    } else {
        config.encodings.iter().map(String::as_str).collect()
    };
    let (text, encoding) = decode_text(&bytes, &labels)
        .with_context(|| format!("decoding {}", config.table_file.display()))?;
    println!("Read {} as {encoding}", config.table_file.display());

    let records = scan_records(&text, &ScanOptions::default());
    let mappings = resource_names(&records);
    println!("Found {} items with resource names", mappings.len());

    // Case-insensitive stem -> on-disk stem, since the table mixes cases
    // freely while the bitmap files do not.
    let mut bmp_lookup: BTreeMap<String, String> = BTreeMap::new();
    for entry in WalkDir::new(&config.bmp_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|res| res.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && has_extension(path, "bmp") {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                bmp_lookup.insert(stem.to_lowercase(), stem.to_string());
            }
        }
    }
    if bmp_lookup.is_empty() {
        bail!("no .bmp files found in {}", config.bmp_dir.display());
    }
    println!(
        "Found {} BMP files in {}",
        bmp_lookup.len(),
        config.bmp_dir.display()
    );

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    let mut summary = ConvertSummary::default();
    let mut used: BTreeSet<String> = BTreeSet::new();

    for (id, names) in &mappings {
        let mut fallback = false;
        let mut stem = names
            .identified
            .as_deref()
            .and_then(|name| bmp_lookup.get(&name.to_lowercase()));
        if stem.is_none() {
            stem = names
                .unidentified
                .as_deref()
                .and_then(|name| bmp_lookup.get(&name.to_lowercase()));
            fallback = stem.is_some();
        }

        let Some(stem) = stem else {
            summary.missing += 1;
            continue;
        };
        used.insert(stem.clone());

        let bmp_path = config.bmp_dir.join(format!("{stem}.bmp"));
        let png_path = config.output_dir.join(format!("{id}.png"));
        match convert_bmp_file(&bmp_path, &png_path, config.transparent_key) {
            Ok(()) => {
                summary.converted += 1;
                if fallback {
                    summary.fallback_used += 1;
                }
            }
            Err(error) => {
                summary.failed += 1;
                eprintln!("[rodex_tools] warning: icon {id}: {error:#}");
            }
        }
    }

    let unreferenced: Vec<&String> = bmp_lookup
        .values()
        .filter(|stem| !used.contains(*stem))
        .collect();
    summary.unreferenced = unreferenced.len();
    if !unreferenced.is_empty() {
        write_unreferenced_log(&config.unreferenced_log, &unreferenced)?;
        println!(
            "Unreferenced BMPs logged to {}",
            config.unreferenced_log.display()
        );
    }

    Ok(summary)
}

fn write_unreferenced_log(path: &Path, stems: &[&String]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "Unreferenced BMP files ({} total)", stems.len())?;
    writeln!(writer, "{}", "=".repeat(60))?;
    writeln!(writer)?;
    for stem in stems {
        writeln!(writer, "{stem}.bmp")?;
    }
    Ok(())
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodex_formats::scan_records;

    #[test]
    fn resource_names_prefer_nothing_but_record_both() {
        let text = "[501] = {\n\tidentifiedResourceName = \"RedPotion\",\n\tunidentifiedResourceName = \"Potion\",\n},\n[502] = {\n\tClassNum = 1,\n},\n";
        let records = scan_records(text, &ScanOptions::default());
        let names = resource_names(&records);
        assert_eq!(names.len(), 1);
        assert_eq!(names[&501].identified.as_deref(), Some("RedPotion"));
        assert_eq!(names[&501].unidentified.as_deref(), Some("Potion"));
    }

    #[test]
    fn lists_only_numeric_png_stems() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["501.png", "1101.png", "22.PNG", "readme.png", "33.bmp"] {
            fs::write(dir.path().join(name), b"stub").unwrap();
        }
        let ids = available_icon_ids(dir.path()).unwrap();
        assert_eq!(ids, vec![22, 501, 1101]);
    }

    #[test]
    fn missing_icon_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(available_icon_ids(&missing).is_err());
    }

    #[test]
    fn color_key_becomes_transparent() {
        let dir = tempfile::tempdir().unwrap();
        let bmp_path = dir.path().join("icon.bmp");
        let png_path = dir.path().join("501.png");

        let mut source = image::RgbImage::new(2, 1);
        source.put_pixel(0, 0, image::Rgb([255, 0, 255]));
        source.put_pixel(1, 0, image::Rgb([10, 20, 30]));
        source.save(&bmp_path).unwrap();

        convert_bmp_file(&bmp_path, &png_path, DEFAULT_TRANSPARENT_KEY).unwrap();

        let converted = image::open(&png_path).unwrap().to_rgba8();
        assert_eq!(converted.get_pixel(0, 0).0, [255, 0, 255, 0]);
        assert_eq!(converted.get_pixel(1, 0).0, [10, 20, 30, 255]);
    }
}
