//! Scanview demo CLI.
//!
//! Drives the scan pipeline against the mock capture backend and mock
//! presenter: a few empty batches, one decoded QR hit, the one-shot frame
//! snapshot, and the overlay transition, narrated through the result
//! channel.

use clap::Parser;
use scanview::geometry::{Point, Quad, Rect};
use scanview::{
    CompletionHandler, FileConfig, Frame, MetadataObject, MockBackend, MockPresenter,
    PixelFormat, Presenter, ScanConfiguration, ScanDelegate, ScanError, Scanner,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "scanview", about = "Demonstrates the scan pipeline with mock collaborators")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Empty batches delivered before the hit, each reported as a read
    /// failure.
    #[arg(long, default_value_t = 3)]
    empty_batches: u32,

    /// Keep the scanner armed until interrupted instead of scripting a hit.
    #[arg(long)]
    continuous: bool,
}

struct LogDelegate;

impl ScanDelegate for LogDelegate {
    fn did_success(&self, code: &str) {
        info!(code, "scan succeeded");
    }

    fn did_fail(&self, error: &ScanError) {
        warn!(%error, "scan failure");
    }

    fn did_change_torch(&self, is_on: bool) {
        info!(is_on, "torch toggled");
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Scanview v{}", scanview::VERSION);
    info!("This is a demonstration using the mock capture backend");

    let configuration = match &args.config {
        Some(path) => {
            let loaded = FileConfig::from_file(path).and_then(|file| file.resolve());
            match loaded {
                Ok(configuration) => configuration,
                Err(error) => {
                    eprintln!("Failed to load configuration: {error}");
                    std::process::exit(1);
                }
            }
        }
        None => ScanConfiguration::default(),
    };

    let view_bounds = Rect::new(0.0, 0.0, 390.0, 844.0);
    let presenter = Arc::new(MockPresenter::new(view_bounds));
    let scanner = Scanner::new(MockBackend::new(), presenter.clone() as Arc<dyn Presenter>);

    let completion: CompletionHandler = Box::new(|succeeded, code, _error| {
        if succeeded {
            println!("decoded: {}", code.unwrap_or_default());
        }
    });
    scanner.configure(Some(Arc::new(LogDelegate)), configuration, Some(completion));
    scanner.start_running();
    scanner.flush();

    if args.continuous {
        run_continuous(&scanner);
    } else {
        run_scripted(&scanner, &presenter, args.empty_batches);
    }
}

/// A plausible code quadrilateral inside the focus area.
fn sample_quad() -> Quad {
    Quad::new([
        Point::new(120.0, 300.0),
        Point::new(270.0, 310.0),
        Point::new(260.0, 460.0),
        Point::new(110.0, 450.0),
    ])
}

fn run_scripted(scanner: &Scanner, presenter: &MockPresenter, empty_batches: u32) {
    let Some(metadata) = scanner.metadata_output() else {
        warn!("no metadata output attached; session setup failed");
        return;
    };

    info!(count = empty_batches, "delivering empty batches");
    for _ in 0..empty_batches {
        metadata.deliver(Vec::new());
    }
    scanner.flush();

    info!("delivering a decoded QR hit");
    metadata.deliver(vec![MetadataObject::qr(
        "https://example.com/ticket/42",
        sample_quad(),
    )]);
    scanner.flush();

    // The raw-frame sink is armed for exactly one frame after the hit.
    if let Some(video) = scanner.video_data_output() {
        let frame = Frame::new(vec![200u8; 390 * 844], 390, 844, PixelFormat::Luma8, 1);
        video.deliver(frame);
    }
    scanner.flush();

    while presenter.complete_next_animation() {}
    scanner.flush();

    info!(
        thumbnail = presenter.thumbnail_image().is_some(),
        "scan cycle complete"
    );
}

fn run_continuous(scanner: &Scanner) {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    if let Err(error) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!(%error, "ctrl-c handler unavailable");
    }

    info!("scanning continuously; press ctrl-c to stop");
    let Some(metadata) = scanner.metadata_output() else {
        return;
    };
    while !stop.load(Ordering::SeqCst) {
        metadata.deliver(Vec::new());
        scanner.flush();
        std::thread::sleep(std::time::Duration::from_millis(500));
    }

    scanner.stop_running();
    scanner.flush();
    info!("stopped");
}
