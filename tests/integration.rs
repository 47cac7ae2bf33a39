use assert_fs::prelude::*;
use assert_fs::TempDir;
use image::{GenericImageView, Rgb, RgbImage, Rgba};
use imgbatch::prelude::*;
use imgbatch::{
    AnchorPosition, BatchResult, CropIntent, EmptyBatchPolicy, GeometryError, ImageToolError,
    OutputFormat,
};
use std::fs;
use std::path::Path;

fn write_image(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
    .save(path)
    .unwrap();
}

fn batch(threads: usize) -> BatchProcessor {
    BatchProcessor::new(BatchOptions {
        threads,
        ..Default::default()
    })
    .unwrap()
}

// ===========================================================================
// Single-file operations
// ===========================================================================

#[test]
fn resize_keeps_aspect_ratio_on_disk() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("wide.png");
    write_image(input.path(), 400, 200);
    let output = temp.child("out/wide.png");

    let dims = Resizer::new(Some(100), None, ResizeMode::KeepAspectRatio)
        .resize_file(input.path(), output.path(), Quality::default())
        .unwrap();
    assert_eq!((dims.width, dims.height), (100, 50));

    let saved = image::open(output.path()).unwrap();
    assert_eq!(saved.dimensions(), (100, 50));
}

#[test]
fn resize_truncates_derived_axis() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("photo.png");
    write_image(input.path(), 300, 200);
    let output = temp.child("photo_small.png");

    Resizer::new(Some(100), None, ResizeMode::KeepAspectRatio)
        .resize_file(input.path(), output.path(), Quality::default())
        .unwrap();
    assert_eq!(image::open(output.path()).unwrap().dimensions(), (100, 66));
}

#[test]
fn crop_mode_without_both_targets_fails_before_io() {
    let err = Resizer::new(Some(100), None, ResizeMode::Crop)
        .resize_file(Path::new("missing.png"), Path::new("out.png"), Quality::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ImageToolError::Geometry(GeometryError::MissingTarget(ResizeMode::Crop))
    ));
}

#[test]
fn absolute_crop_overflow_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("small.png");
    write_image(input.path(), 100, 100);
    let output = temp.child("cropped.png");

    let cropper = Cropper::new(CropIntent::Absolute {
        x: 50,
        y: 50,
        width: 60,
        height: 10,
    });
    let err = cropper
        .process_one(input.path(), output.path(), Quality::default())
        .unwrap_err();
    assert!(err.is_validation());
    assert!(!output.path().exists());
}

#[test]
fn watermark_lands_bottom_right() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("white.png");
    RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]))
        .save(input.path())
        .unwrap();

    let mark = image::RgbaImage::from_pixel(50, 50, Rgba([0, 0, 255, 255]));
    let op = Watermarker::image(mark, None)
        .unwrap()
        .with_anchor(AnchorPosition::BottomRight);
    let output = op.target_path(input.path(), temp.path());
    assert!(output.ends_with("white_watermarked.png"));
    op.process_one(input.path(), &output, Quality::default()).unwrap();

    let out = image::open(&output).unwrap().to_rgb8();
    assert_eq!(out.get_pixel(130, 130), &Rgb([0, 0, 255]));
    assert_eq!(out.get_pixel(129, 130), &Rgb([255, 255, 255]));
}

#[test]
fn square_thumbnail_from_request() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("tall.png");
    write_image(input.path(), 120, 300);

    let request =
        OperationRequest::from_json("thumbnail", serde_json::json!({"size": 64, "square": true}))
            .unwrap();
    let op = request.build(&Settings::default()).unwrap();
    let output = op.target_path(input.path(), temp.path());
    op.process_one(input.path(), &output, Quality::default()).unwrap();

    assert!(output.ends_with("tall_thumb.png"));
    assert_eq!(image::open(&output).unwrap().dimensions(), (64, 64));
}

#[test]
fn convert_png_to_webp_and_back() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("pic.png");
    write_image(input.path(), 32, 16);

    let to_webp = Converter::new(OutputFormat::WebP);
    let webp = to_webp.target_path(input.path(), &temp.path().join("webp"));
    to_webp.process_one(input.path(), &webp, Quality::default()).unwrap();
    assert!(webp.ends_with("pic.webp"));

    let to_png = Converter::new(OutputFormat::Png);
    let png = to_png.target_path(&webp, &temp.path().join("png"));
    to_png.process_one(&webp, &png, Quality::default()).unwrap();
    assert_eq!(image::open(&png).unwrap().dimensions(), (32, 16));
}

// ===========================================================================
// Batch runs
// ===========================================================================

fn mixed_source(temp: &TempDir) -> std::path::PathBuf {
    let source = temp.child("in");
    source.create_dir_all().unwrap();
    write_image(&source.path().join("a.jpg"), 40, 20);
    write_image(&source.path().join("b.jpg"), 60, 30);
    source.child("c.jpg").write_binary(b"definitely not a jpeg").unwrap();
    source.child("notes.txt").write_str("ignored").unwrap();
    source.path().to_path_buf()
}

fn assert_two_of_three(result: &BatchResult, output: &Path) {
    assert_eq!(result.total_files, 3);
    assert_eq!(result.success_count, 2);
    assert_eq!(result.failure_count, 1);
    assert_eq!(result.total_files, result.success_count + result.failure_count);
    assert!(result.error_message.is_none());
    assert!(!result.is_success());

    assert!(output.join("a_resized.jpg").is_file());
    assert!(output.join("b_resized.jpg").is_file());
    assert!(!output.join("c_resized.jpg").exists());
    assert_eq!(result.failed_paths.len(), 1);
    assert!(result.failed_paths[0].ends_with("c.jpg"));
}

#[test]
fn batch_isolates_corrupt_files() {
    let temp = TempDir::new().unwrap();
    let source = mixed_source(&temp);
    let output = temp.path().join("out");

    let op = Resizer::new(Some(10), None, ResizeMode::KeepAspectRatio);
    let result = batch(1).run(&source, &output, &op);
    assert_two_of_three(&result, &output);

    let sources: Vec<_> = result.outcomes.iter().map(|o| o.source.clone()).collect();
    let mut sorted = sources.clone();
    sorted.sort();
    assert_eq!(sources, sorted);
}

#[test]
fn parallel_batch_matches_sequential() {
    let temp = TempDir::new().unwrap();
    let source = mixed_source(&temp);
    let op = Resizer::new(Some(10), None, ResizeMode::KeepAspectRatio);

    let sequential = batch(1).run(&source, &temp.path().join("seq"), &op);
    let parallel = batch(4).run(&source, &temp.path().join("par"), &op);
    assert_two_of_three(&parallel, &temp.path().join("par"));

    let names = |r: &BatchResult| -> Vec<_> {
        r.outcomes
            .iter()
            .map(|o| (o.source.clone(), o.success))
            .collect()
    };
    assert_eq!(names(&sequential), names(&parallel));
}

#[test]
fn recursive_batch_mirrors_subdirectories() {
    let temp = TempDir::new().unwrap();
    let source = temp.child("in");
    source.child("nested").create_dir_all().unwrap();
    write_image(&source.path().join("top.png"), 8, 8);
    write_image(&source.path().join("nested/deep.png"), 8, 8);
    let output = temp.path().join("out");

    let flat = batch(1).run(source.path(), &output, &MetadataProcessor::new());
    assert_eq!(flat.total_files, 1);

    let processor = BatchProcessor::new(BatchOptions {
        recursive: true,
        ..Default::default()
    })
    .unwrap();
    let deep = processor.run(source.path(), &output, &MetadataProcessor::new());
    assert_eq!(deep.success_count, 2);
    assert!(output.join("nested/deep.png").is_file());
}

#[test]
fn empty_batch_follows_operation_policy() {
    let temp = TempDir::new().unwrap();
    let source = temp.child("empty");
    source.create_dir_all().unwrap();
    let output = temp.path().join("out");

    let resize = Resizer::new(Some(10), None, ResizeMode::KeepAspectRatio);
    assert_eq!(resize.empty_batch_policy(), EmptyBatchPolicy::Error);
    let failed = batch(1).run(source.path(), &output, &resize);
    assert_eq!(failed.total_files, 0);
    assert!(failed.error_message.is_some());

    let convert = Converter::new(OutputFormat::Png);
    let empty = batch(1).run(source.path(), &output, &convert);
    assert_eq!(empty.total_files, 0);
    assert!(empty.is_success());
}

#[test]
fn batch_directory_errors_are_reported_not_raised() {
    let temp = TempDir::new().unwrap();
    let op = CompressOperation::default();

    let missing = batch(1).run(&temp.path().join("nope"), &temp.path().join("out"), &op);
    assert!(missing.error_message.is_some());

    let same = batch(1).run(temp.path(), temp.path(), &op);
    assert!(same
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("same"));

    let traversal = batch(1).run(Path::new("../elsewhere"), &temp.path().join("out"), &op);
    assert!(traversal
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("traversal"));
    assert!(!temp.path().join("out").exists());
}

#[test]
fn compress_batch_keeps_file_names() {
    let temp = TempDir::new().unwrap();
    let source = temp.child("in");
    source.create_dir_all().unwrap();
    write_image(&source.path().join("one.png"), 64, 64);
    write_image(&source.path().join("two.jpg"), 64, 64);
    let output = temp.path().join("out");

    let result = batch(0).run(source.path(), &output, &CompressOperation::new(4));
    assert!(result.is_success());
    assert!(output.join("one.png").is_file());
    assert!(output.join("two.jpg").is_file());
    assert!(fs::metadata(output.join("one.png")).unwrap().len() > 0);
}
