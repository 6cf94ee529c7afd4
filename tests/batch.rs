use std::path::Path;

use banana_editor_core::{
    save_image, EmbedOutcome, ProcessOptions, WatermarkEngine, DEFAULT_WATERMARK_TEXT,
};
use image::{Rgba, RgbaImage};

fn write_image(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 255]));
    save_image(&img, path).unwrap();
}

#[test]
fn process_file_writes_extractable_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("generated.png");
    let output = dir.path().join("out").join("generated_marked.png");
    write_image(&input, 32, 32);

    let engine = WatermarkEngine::default();
    let result = engine.process_file(&input, &output, &ProcessOptions::default());
    assert!(result.success, "{}", result.message);
    assert!(!result.skipped);
    assert!(matches!(result.outcome, Some(EmbedOutcome::Embedded { .. })));

    let text = WatermarkEngine::extract_file(&output).unwrap();
    assert_eq!(text.as_deref(), Some(DEFAULT_WATERMARK_TEXT));
}

#[test]
fn process_file_skips_small_images_unless_strict() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tiny.png");
    let output = dir.path().join("tiny_marked.png");
    write_image(&input, 4, 4);

    let engine = WatermarkEngine::default();
    let result = engine.process_file(&input, &output, &ProcessOptions::default());
    assert!(result.success);
    assert!(result.skipped);
    assert!(result.message.contains("bits"), "{}", result.message);
    assert!(!output.exists());

    let strict = ProcessOptions {
        strict: true,
        ..ProcessOptions::default()
    };
    let result = engine.process_file(&input, &output, &strict);
    assert!(!result.success);
    assert!(!result.skipped);
}

#[test]
fn process_file_reports_undecodable_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.png");
    std::fs::write(&input, b"not a png").unwrap();

    let result = WatermarkEngine::default().process_file(
        &input,
        &dir.path().join("x.png"),
        &ProcessOptions::default(),
    );
    assert!(!result.success);
    assert!(result.message.starts_with("Failed to load"));
}

#[test]
fn process_file_refuses_lossy_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.png");
    write_image(&input, 32, 32);

    let result = WatermarkEngine::default().process_file(
        &input,
        &dir.path().join("a.jpg"),
        &ProcessOptions::default(),
    );
    assert!(!result.success);
    assert!(result.message.contains("lossy"), "{}", result.message);
}

#[test]
fn process_directory_handles_every_supported_image() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    write_image(&input_dir.path().join("one.png"), 20, 20);
    write_image(&input_dir.path().join("two.bmp"), 20, 20);
    write_image(&input_dir.path().join("three.v2.png"), 2, 2);
    std::fs::write(input_dir.path().join("notes.txt"), "ignored").unwrap();

    let engine = WatermarkEngine::new("batch");
    let results = engine.process_directory(
        input_dir.path(),
        output_dir.path(),
        &ProcessOptions::default(),
    );
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.success));
    assert_eq!(results.iter().filter(|r| r.skipped).count(), 1);

    for name in ["one.png", "two_bmp.png"] {
        let text = WatermarkEngine::extract_file(&output_dir.path().join(name)).unwrap();
        assert_eq!(text.as_deref(), Some("batch"), "{name}");
    }
    assert!(!output_dir.path().join("three.v2.png").exists());
}

#[test]
fn process_directory_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let results = WatermarkEngine::default().process_directory(
        &dir.path().join("missing"),
        &dir.path().join("out"),
        &ProcessOptions::default(),
    );
    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
}

#[test]
fn same_stem_inputs_get_separate_outputs() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    write_image(&input_dir.path().join("photo.png"), 20, 20);
    write_image(&input_dir.path().join("photo.bmp"), 30, 30);

    let results = WatermarkEngine::default().process_directory(
        input_dir.path(),
        output_dir.path(),
        &ProcessOptions::default(),
    );
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success && !r.skipped));

    let written = std::fs::read_dir(output_dir.path()).unwrap().count();
    assert_eq!(written, 2, "every success should leave its own file");
    for (name, width) in [("photo.png", 20), ("photo_bmp.png", 30)] {
        let bytes = std::fs::read(output_dir.path().join(name)).unwrap();
        assert_eq!(image::load_from_memory(&bytes).unwrap().width(), width, "{name}");
        let text = WatermarkEngine::extract_bytes(&bytes).unwrap();
        assert_eq!(text.as_deref(), Some(DEFAULT_WATERMARK_TEXT), "{name}");
    }
}

#[test]
fn colliding_output_names_fail_instead_of_overwriting() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    // Both map to photo_bmp.png.
    write_image(&input_dir.path().join("photo.bmp"), 20, 20);
    write_image(&input_dir.path().join("photo_bmp.png"), 30, 30);

    let results = WatermarkEngine::default().process_directory(
        input_dir.path(),
        output_dir.path(),
        &ProcessOptions::default(),
    );
    assert_eq!(results.len(), 2);
    let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with("photo_bmp.png"));
    assert!(failed[0].message.contains("already written"), "{}", failed[0].message);

    let bytes = std::fs::read(output_dir.path().join("photo_bmp.png")).unwrap();
    assert_eq!(image::load_from_memory(&bytes).unwrap().width(), 20);
}
