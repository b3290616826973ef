use std::fs;
use std::path::Path;

use rodex_tools::sprite::{run_pack, run_verify, PackConfig, SpriteMap, VerifyConfig};

fn write_icon(dir: &Path, id: u32, size: u32, color: [u8; 4]) {
    let mut icon = image::RgbaImage::new(size, size);
    for pixel in icon.pixels_mut() {
        *pixel = image::Rgba(color);
    }
    icon.save(dir.join(format!("{id}.png"))).unwrap();
}

#[test]
fn packs_icons_and_passes_verification() {
    let dir = tempfile::tempdir().unwrap();
    let icon_dir = dir.path().join("icons");
    fs::create_dir(&icon_dir).unwrap();

    write_icon(&icon_dir, 501, 24, [255, 0, 0, 255]);
    write_icon(&icon_dir, 1101, 24, [0, 255, 0, 255]);
    // Wrong size on purpose; the packer resizes it.
    write_icon(&icon_dir, 2199, 16, [0, 0, 255, 255]);

    let atlas_path = dir.path().join("item_sprite.png");
    let map_path = dir.path().join("sprite_map.json");

    let summary = run_pack(&PackConfig {
        icon_dir: icon_dir.clone(),
        atlas_output: atlas_path.clone(),
        map_output: map_path.clone(),
        icon_size: 24,
        icons_per_row: 2,
    })
    .unwrap();

    assert_eq!(summary.total_icons, 3);
    assert_eq!(summary.placed, 3);
    assert_eq!(summary.resized, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!((summary.atlas_width, summary.atlas_height), (48, 48));

    let sprite_map: SpriteMap =
        serde_json::from_slice(&fs::read(&map_path).unwrap()).unwrap();
    assert_eq!(sprite_map.map[&501], [0, 0]);
    assert_eq!(sprite_map.map[&1101], [1, 0]);
    assert_eq!(sprite_map.map[&2199], [0, 1]);

    // Each icon's top-left pixel lands at its grid offset.
    let atlas = image::open(&atlas_path).unwrap().to_rgba8();
    assert_eq!(atlas.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(atlas.get_pixel(24, 0).0, [0, 255, 0, 255]);
    assert_eq!(atlas.get_pixel(0, 24).0, [0, 0, 255, 255]);
    // The slot next to the resized icon stays transparent.
    assert_eq!(atlas.get_pixel(24, 24).0, [0, 0, 0, 0]);

    let report = run_verify(&VerifyConfig {
        atlas: atlas_path,
        map: map_path,
        icon_dir,
    })
    .unwrap();
    assert!(report.passed(), "unexpected errors: {:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[test]
fn verifier_flags_header_dimension_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let icon_dir = dir.path().join("icons");
    fs::create_dir(&icon_dir).unwrap();
    write_icon(&icon_dir, 1, 24, [9, 9, 9, 255]);
    write_icon(&icon_dir, 2, 24, [9, 9, 9, 255]);

    let atlas_path = dir.path().join("atlas.png");
    let map_path = dir.path().join("map.json");
    run_pack(&PackConfig {
        icon_dir: icon_dir.clone(),
        atlas_output: atlas_path.clone(),
        map_output: map_path.clone(),
        icon_size: 24,
        icons_per_row: 2,
    })
    .unwrap();

    // Tamper with the header so the derived width no longer matches the
    // atlas image.
    let mut tampered: serde_json::Value =
        serde_json::from_slice(&fs::read(&map_path).unwrap()).unwrap();
    tampered["iconsPerRow"] = serde_json::json!(4);
    fs::write(&map_path, serde_json::to_vec(&tampered).unwrap()).unwrap();

    let report = run_verify(&VerifyConfig {
        atlas: atlas_path,
        map: map_path,
        icon_dir,
    })
    .unwrap();
    assert!(!report.passed());
    assert!(report
        .errors
        .iter()
        .any(|error| error.contains("width mismatch")));
}

#[test]
fn verifier_reports_missing_inputs_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_verify(&VerifyConfig {
        atlas: dir.path().join("missing.png"),
        map: dir.path().join("missing.json"),
        icon_dir: dir.path().join("icons"),
    })
    .unwrap();
    assert_eq!(report.errors.len(), 2);
}
