use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use facescope_core::capture::domain::frame_source::FrameSource;
use facescope_core::capture::infrastructure::image_file_source::ImageFileSource;
use facescope_core::capture::infrastructure::jpeg_encoder;
use facescope_core::capture::infrastructure::nokhwa_source::NokhwaSource;
use facescope_core::detection::domain::face_detector::FaceDetector;
use facescope_core::detection::infrastructure::gemini_config::{GeminiConfig, DEFAULT_MODEL};
use facescope_core::detection::infrastructure::gemini_detector::GeminiFaceDetector;
use facescope_core::pipeline::detection_loop::{DetectionLoop, LoopConfig, LoopEvent};
use facescope_core::shared::constants::{CAPTURE_HEIGHT, CAPTURE_WIDTH};

/// Live face detection against the Gemini API, one JSON line per cycle.
#[derive(Parser)]
#[command(name = "facescope")]
struct Cli {
    /// Camera device index.
    #[arg(long, default_value = "0")]
    camera: u32,

    /// Milliseconds between detection cycles.
    #[arg(long, default_value = "2000")]
    period_ms: u64,

    /// Model used for detection.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// JPEG quality for frames sent to the service (1-100).
    #[arg(long, default_value = "80")]
    quality: u8,

    /// Stop after this many detection results (0 = run until killed).
    #[arg(long, default_value = "0")]
    cycles: usize,

    /// Detect faces in a single image file and exit.
    #[arg(long)]
    image: Option<PathBuf>,

    /// List available cameras and exit.
    #[arg(long)]
    list_cameras: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if cli.list_cameras {
        for line in NokhwaSource::list()? {
            println!("{line}");
        }
        return Ok(());
    }

    let config = GeminiConfig::from_env()?.with_model(cli.model.clone());
    let detector = GeminiFaceDetector::new(config);

    if let Some(path) = &cli.image {
        run_once(path, detector, cli.quality)
    } else {
        run_live(&cli, detector)
    }
}

/// One sample-detect cycle on an image file, pretty JSON to stdout.
fn run_once(
    path: &std::path::Path,
    mut detector: GeminiFaceDetector,
    quality: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = ImageFileSource::open(path)?;
    let frame = source
        .grab()?
        .ok_or_else(|| format!("no frame in {}", path.display()))?;
    source.close();

    let image = jpeg_encoder::encode_base64(&frame, quality)?;
    let faces = detector.detect(&image)?;
    println!("{}", serde_json::to_string_pretty(&faces)?);
    log::info!("detected {} face(s) in {}", faces.len(), path.display());
    Ok(())
}

fn run_live(cli: &Cli, detector: GeminiFaceDetector) -> Result<(), Box<dyn std::error::Error>> {
    let source = NokhwaSource::open(cli.camera, CAPTURE_WIDTH, CAPTURE_HEIGHT)?;
    log::info!("camera {} open, detecting every {} ms", cli.camera, cli.period_ms);

    let (rx, mut handle) = DetectionLoop::spawn(
        Box::new(source),
        Box::new(detector),
        LoopConfig {
            detect_period: Duration::from_millis(cli.period_ms),
            preview_period: None,
            jpeg_quality: cli.quality,
        },
    );

    let mut seen = 0usize;
    for event in rx.iter() {
        match event {
            LoopEvent::Detections(faces) => {
                println!("{}", serde_json::to_string(&faces)?);
                seen += 1;
                if cli.cycles > 0 && seen >= cli.cycles {
                    break;
                }
            }
            LoopEvent::Error(message) => eprintln!("{message}"),
            LoopEvent::CycleStarted => log::debug!("cycle dispatched"),
            LoopEvent::Preview(_) => {}
            LoopEvent::Stopped => break,
        }
    }
    handle.stop();
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.quality == 0 || cli.quality > 100 {
        return Err(format!("Quality must be between 1 and 100, got {}", cli.quality).into());
    }
    if cli.period_ms == 0 {
        return Err("Period must be at least 1 ms".into());
    }
    Ok(())
}
