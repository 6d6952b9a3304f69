//! End-to-end runs: scan a folder of real images, push it through the pool
//! with the production backend, and check what lands on disk.

use batch_resize::config::ScanConfig;
use batch_resize::imaging::{Rotation, RustBackend, TargetSize};
use batch_resize::pool::{PoolEvent, PoolOptions, WorkerPool};
use batch_resize::scan::scan;
use batch_resize::transcode::{TranscodeSettings, Transcoder};
use batch_resize::types::{ItemStatus, TranscodeResult};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, Rgb, RgbImage};
use std::path::Path;
use std::thread;
use tempfile::TempDir;

fn write_image(path: &Path, width: u32, height: u32, format: ImageFormat) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    });
    img.save_with_format(path, format).unwrap();
}

/// A complete noisy JPEG cut off halfway through its entropy-coded data.
fn write_half_jpeg(path: &Path) {
    let mut seed = 0x2545_f491_u32;
    let img = RgbImage::from_fn(256, 256, |_, _| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let [r, g, b, _] = seed.to_le_bytes();
        Rgb([r, g, b])
    });
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 90)
        .write_image(img.as_raw(), 256, 256, ExtendedColorType::Rgb8)
        .unwrap();
    std::fs::write(path, &bytes[..bytes.len() / 2]).unwrap();
}

fn dimensions(path: &Path) -> (u32, u32) {
    let img = ImageReader::open(path).unwrap().decode().unwrap();
    (img.width(), img.height())
}

fn result_for<'a>(results: &'a [TranscodeResult], name: &str) -> &'a TranscodeResult {
    results
        .iter()
        .find(|r| r.item.name == name)
        .unwrap_or_else(|| panic!("no result for {name}"))
}

/// Three good images and one truncated JPEG in `dir`.
fn mixed_folder(dir: &Path) {
    write_image(&dir.join("wide.png"), 200, 100, ImageFormat::Png);
    write_image(&dir.join("square.jpg"), 120, 120, ImageFormat::Jpeg);
    write_image(&dir.join("small.gif"), 40, 20, ImageFormat::Gif);
    write_half_jpeg(&dir.join("broken.jpg"));
    std::fs::write(dir.join("notes.txt"), "not an image").unwrap();
}

#[test]
fn three_valid_one_corrupt() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    mixed_folder(src.path());

    let items = scan(src.path(), &ScanConfig::default()).unwrap();
    assert_eq!(items.len(), 4);

    let settings = TranscodeSettings {
        output_dir: out.path().to_path_buf(),
        ..TranscodeSettings::default()
    };
    let mut pool = WorkerPool::start(RustBackend::new(), PoolOptions::default()).unwrap();
    let mut batch = pool.submit_batch(settings, items).unwrap();
    let results: Vec<_> = batch.by_ref().collect();
    let summary = batch.finish().unwrap();
    pool.shutdown();

    assert_eq!(results.len(), 4);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 1);
    assert!(!summary.is_clean());

    let ItemStatus::Failed { reason } = &result_for(&results, "broken.jpg").item.status else {
        panic!("truncated jpeg was not rejected");
    };
    assert!(reason.starts_with("Cannot decode"), "{reason}");
    for name in ["wide.png", "square.jpg", "small.gif"] {
        let result = result_for(&results, name);
        let ItemStatus::Done { output_size } = result.item.status else {
            panic!("{name} did not succeed: {}", result.item.status);
        };
        let output = result.output.as_ref().unwrap();
        assert_eq!(std::fs::metadata(output).unwrap().len(), output_size);
    }

    assert_eq!(dimensions(&out.path().join("wide_resized.jpg")), (200, 100));
    assert_eq!(dimensions(&out.path().join("small_resized.jpg")), (40, 20));
    assert!(!out.path().join("broken_resized.jpg").exists());
}

#[test]
fn resize_then_rotate_across_batch() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_image(&src.path().join("a.png"), 200, 100, ImageFormat::Png);
    write_image(&src.path().join("b.png"), 400, 200, ImageFormat::Png);

    let items = scan(src.path(), &ScanConfig::default()).unwrap();
    let settings = TranscodeSettings {
        output_dir: out.path().join("nested/deeper"),
        size: TargetSize::new(100, 0),
        rotation: Rotation::Cw90,
        overwrite: true,
        ..TranscodeSettings::default()
    };
    let mut pool = WorkerPool::start(RustBackend::new(), PoolOptions::default()).unwrap();
    let summary = pool.submit_batch(settings, items).unwrap().finish().unwrap();

    assert_eq!(summary.succeeded, 2);
    let nested = out.path().join("nested/deeper");
    assert_eq!(dimensions(&nested.join("a.jpg")), (50, 100));
    assert_eq!(dimensions(&nested.join("b.jpg")), (50, 100));
}

#[test]
fn raw_queue_sees_every_item_then_batch_done() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    for i in 0..7 {
        write_image(
            &src.path().join(format!("img{i}.png")),
            32 + i,
            16,
            ImageFormat::Png,
        );
    }
    let items = scan(src.path(), &ScanConfig::default()).unwrap();
    let settings = TranscodeSettings {
        output_dir: out.path().to_path_buf(),
        ..TranscodeSettings::default()
    };

    let pool = WorkerPool::start(RustBackend::new(), PoolOptions::default()).unwrap();
    let (names, done_total) = thread::scope(|s| {
        let submitter = s.spawn(|| pool.submit(settings, items));
        let mut names = Vec::new();
        let done_total = loop {
            match pool.results().recv().unwrap() {
                PoolEvent::Item(result) => names.push(result.item.name),
                PoolEvent::BatchDone { total, .. } => break total,
            }
        };
        submitter.join().unwrap().unwrap();
        (names, done_total)
    });
    pool.shutdown();

    assert_eq!(done_total, 7);
    let mut names = names;
    names.sort();
    let expected: Vec<String> = (0..7).map(|i| format!("img{i}.png")).collect();
    assert_eq!(names, expected);
}

#[test]
fn transcoder_reconfiguration_does_not_touch_submitted_batch() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_image(&src.path().join("photo.png"), 200, 100, ImageFormat::Png);
    let items = scan(src.path(), &ScanConfig::default()).unwrap();

    let mut transcoder = Transcoder::new();
    transcoder.set_output_dir(out.path());
    transcoder.set_width(50);

    let mut pool = WorkerPool::start(RustBackend::new(), PoolOptions::default()).unwrap();
    let batch = pool
        .submit_batch(transcoder.settings().clone(), items)
        .unwrap();
    transcoder.set_width(10);
    transcoder.set_overwrite(true);
    let summary = batch.finish().unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(dimensions(&out.path().join("photo_resized.jpg")), (50, 25));
    assert!(!out.path().join("photo.jpg").exists());

    // The reconfigured transcoder applies to the next call.
    let output = transcoder.transcode(&src.path().join("photo.png")).unwrap();
    assert_eq!(output, out.path().join("photo.jpg"));
    assert_eq!(dimensions(&output), (10, 5));
}
