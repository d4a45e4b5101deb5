use card_rectify::config::{DetectorKind, ScanConfig};
use card_rectify::detector::edges::sobel_edges;
use card_rectify::detector::segment::segment_card_colors;
use card_rectify::rectify::render_overlay;
use card_rectify::tools::{collect_images, gray_stats, load_rgba, mask_stats, save_png};
use card_rectify::vision::{BackendKind, Vision};
use card_rectify::{CardScanner, DetectionResult, RgbaRaster};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "cardtool", version, about = "ID card detection and rectification tools")]
struct Cli {
    /// Strategy-1 detector
    #[arg(long, value_enum, default_value_t = DetectorArg::Contour, global = true)]
    detector: DetectorArg,
    /// Image-processing backend for the Hough detector
    #[arg(long, value_enum, default_value_t = BackendArg::Native, global = true)]
    backend: BackendArg,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum DetectorArg {
    Contour,
    Hough,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Software,
    Native,
}

#[derive(Subcommand)]
enum Command {
    /// Run card detection on an image or every image under a directory
    Detect {
        #[arg(long)]
        image: PathBuf,
        /// Also print luminance and mask statistics
        #[arg(long)]
        verbose: bool,
    },
    /// Detect, warp and enhance a card, writing PNG output
    Rectify {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Output width; defaults to 1000
        #[arg(long)]
        width: Option<u32>,
        /// Keep the measured card width instead of a fixed output width
        #[arg(long, conflicts_with = "width")]
        native_width: bool,
        /// Skip sharpening and contrast
        #[arg(long)]
        no_enhance: bool,
        /// Also write the binarized text variant here
        #[arg(long)]
        binarized: Option<PathBuf>,
    },
    /// Draw the detection result on the input photo
    Overlay {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = ScanConfig::default();
    config.detector = match cli.detector {
        DetectorArg::Contour => DetectorKind::Contour,
        DetectorArg::Hough => DetectorKind::Hough,
    };
    let backend = match cli.backend {
        BackendArg::Software => BackendKind::Software,
        BackendArg::Native => BackendKind::Native,
    };
    let vision = Arc::new(Vision::new(backend));

    let outcome = match cli.command {
        Command::Detect { image, verbose } => {
            detect_cmd(&CardScanner::with_vision(config, vision), &image, verbose)
        }
        Command::Rectify {
            image,
            output,
            width,
            native_width,
            no_enhance,
            binarized,
        } => {
            if native_width {
                config.output_width = None;
            } else if width.is_some() {
                config.output_width = width;
            }
            if no_enhance {
                config.enhance = None;
            }
            config.binarize = binarized.is_some();
            let scanner = CardScanner::with_vision(config, vision);
            rectify_cmd(&scanner, &image, &output, binarized.as_deref())
        }
        Command::Overlay { image, output } => {
            overlay_cmd(&CardScanner::with_vision(config, vision), &image, &output)
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn load(image: &Path) -> Result<RgbaRaster, String> {
    load_rgba(image).map_err(|err| format!("Failed to load image {}: {}", image.display(), err))
}

fn print_detection(image: &Path, result: &DetectionResult, elapsed_ms: f64) {
    println!(
        "Image: {} ({}x{})",
        image.display(),
        result.image_width,
        result.image_height
    );
    println!(
        "  method={} success={} confidence={:.3} aspect={:.3} time={:.1}ms",
        result.method, result.success, result.confidence, result.detected_aspect_ratio, elapsed_ms
    );
    if let Some(corners) = result.corners {
        let labels = ["TL", "TR", "BR", "BL"];
        for (label, c) in labels.iter().zip(corners.iter()) {
            println!("  {}: ({:.1}, {:.1})", label, c.x, c.y);
        }
    }
}

fn detect_cmd(scanner: &CardScanner, input: &Path, verbose: bool) -> Result<(), String> {
    let images = collect_images(input);
    if images.is_empty() {
        return Err(format!("No images found at {}", input.display()));
    }

    let mut found = 0usize;
    for path in &images {
        let raster = match load(path) {
            Ok(raster) => raster,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        };
        let start = Instant::now();
        let result = scanner.detect(&raster);
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        print_detection(path, &result, elapsed);
        if result.success {
            found += 1;
        }

        if verbose {
            let gray = gray_stats(&raster);
            println!(
                "  Luminance range: {}-{}, average: {}",
                gray.min, gray.max, gray.avg
            );
            let colors = mask_stats(&segment_card_colors(&raster, &scanner.config().detection.colors));
            let edges = mask_stats(&sobel_edges(&raster, scanner.config().detection.sobel_threshold));
            println!(
                "  Card colors: {:.2}%  Sobel edges: {:.2}%",
                colors.ratio * 100.0,
                edges.ratio * 100.0
            );
        }
    }

    if images.len() > 1 {
        println!(
            "Detected {}/{} ({:.1}%)",
            found,
            images.len(),
            found as f64 * 100.0 / images.len() as f64
        );
    }
    Ok(())
}

fn rectify_cmd(
    scanner: &CardScanner,
    image: &Path,
    output: &Path,
    binarized: Option<&Path>,
) -> Result<(), String> {
    let raster = load(image)?;
    let start = Instant::now();
    let scan = scanner
        .scan(&raster)
        .map_err(|err| format!("Scan failed for {}: {}", image.display(), err))?;
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
    print_detection(image, &scan.detection, elapsed);
    if !scan.warped {
        println!("  Perspective warp failed, wrote axis-aligned crop");
    }

    save_png(&scan.rectified, output)
        .map_err(|err| format!("Failed to write {}: {}", output.display(), err))?;
    println!(
        "Wrote {} ({}x{})",
        output.display(),
        scan.rectified.width(),
        scan.rectified.height()
    );

    if let (Some(path), Some(bin)) = (binarized, scan.binarized.as_ref()) {
        save_png(bin, path).map_err(|err| format!("Failed to write {}: {}", path.display(), err))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn overlay_cmd(scanner: &CardScanner, image: &Path, output: &Path) -> Result<(), String> {
    let raster = load(image)?;
    let start = Instant::now();
    let result = scanner.detect(&raster);
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
    print_detection(image, &result, elapsed);

    let drawn = render_overlay(&raster, &result).map_err(|err| format!("Overlay failed: {}", err))?;
    save_png(&drawn, output)
        .map_err(|err| format!("Failed to write {}: {}", output.display(), err))?;
    println!("Wrote {}", output.display());
    Ok(())
}
