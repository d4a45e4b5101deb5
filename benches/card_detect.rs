use card_rectify::config::{DetectorConfig, ScanConfig};
use card_rectify::detector::edges::{canny_edges, sobel_edges};
use card_rectify::detector::segment::segment_card_colors;
use card_rectify::vision::Vision;
use card_rectify::{CardDetector, CardScanner, ContourDetector, HoughDetector, RgbaRaster, detect_card};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

fn synthetic_card(width: usize, height: usize) -> RgbaRaster {
    let mut raster = RgbaRaster::filled(width, height, [30, 32, 40, 255]);
    let card_w = width * 3 / 5;
    let card_h = (card_w as f32 / 1.586) as usize;
    let (x0, y0) = ((width - card_w) / 2, (height - card_h) / 2);
    for y in y0..y0 + card_h {
        for x in x0..x0 + card_w {
            raster.put_pixel(x, y, [230, 228, 220, 255]);
        }
    }
    raster
}

fn bench_segment_medium(c: &mut Criterion) {
    let image = synthetic_card(640, 480);
    let config = DetectorConfig::default();
    c.bench_function("segment_640x480", |b| {
        b.iter(|| segment_card_colors(black_box(&image), &config.colors))
    });
}

fn bench_sobel_medium(c: &mut Criterion) {
    let image = synthetic_card(640, 480);
    c.bench_function("sobel_640x480", |b| b.iter(|| sobel_edges(black_box(&image), 60.0)));
}

fn bench_canny_software(c: &mut Criterion) {
    let image = synthetic_card(640, 480);
    let vision = Vision::software();
    let params = DetectorConfig::default().canny;
    c.bench_function("canny_software_640x480", |b| {
        b.iter(|| canny_edges(black_box(&image), &params, vision.backend()))
    });
}

fn bench_contour_detect_medium(c: &mut Criterion) {
    let image = synthetic_card(640, 480);
    let detector = ContourDetector::default();
    c.bench_function("contour_detect_640x480", |b| b.iter(|| detector.detect(black_box(&image))));
}

fn bench_contour_detect_large(c: &mut Criterion) {
    let image = synthetic_card(1920, 1080);
    c.bench_function("contour_detect_1920x1080", |b| b.iter(|| detect_card(black_box(&image))));
}

fn bench_hough_detect_medium(c: &mut Criterion) {
    let image = synthetic_card(640, 480);
    let detector = HoughDetector::new(DetectorConfig::default(), Arc::new(Vision::software()));
    c.bench_function("hough_detect_software_640x480", |b| {
        b.iter(|| detector.detect(black_box(&image)))
    });
}

fn bench_fallback_blank(c: &mut Criterion) {
    let image = RgbaRaster::filled(640, 480, [0, 0, 0, 255]);
    c.bench_function("detect_blank_640x480", |b| b.iter(|| detect_card(black_box(&image))));
}

fn bench_scan_large(c: &mut Criterion) {
    let image = synthetic_card(1920, 1080);
    let scanner = CardScanner::with_vision(ScanConfig::default(), Arc::new(Vision::software()));
    c.bench_function("scan_1920x1080", |b| b.iter(|| scanner.scan(black_box(&image))));
}

criterion_group!(
    benches,
    bench_segment_medium,
    bench_sobel_medium,
    bench_canny_software,
    bench_contour_detect_medium,
    bench_contour_detect_large,
    bench_hough_detect_medium,
    bench_fallback_blank,
    bench_scan_large
);
criterion_main!(benches);
