use batch_resize::config::{self, BatchConfig};
use batch_resize::imaging::RustBackend;
use batch_resize::pool::{PoolOptions, WorkerPool};
use batch_resize::transcode::TranscodeSettings;
use batch_resize::{output, scan};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "batch-resize")]
#[command(about = "Resize, rotate and re-encode a folder of images to JPEG")]
#[command(long_about = "\
Resize, rotate and re-encode a folder of images to JPEG

Every png, jpg, jpeg and gif file directly inside DIR is decoded, resized,
rotated and written as a JPEG. Subdirectories are not descended into.

Sizing:
  --width 800               scale proportionally to 800 pixels wide
  --height 600              scale proportionally to 600 pixels high
  --width 800 --height 600  force 800x600 (may distort)
  neither                   keep the original dimensions

Rotation is applied after resizing, clockwise, in quarter turns.

Output names:
  photo.png  →  photo_resized.jpg   (default)
  photo.png  →  photo.jpg           (--overwrite)

Settings are read from ./batch-resize.toml (or --config FILE); flags
override the file. Run 'batch-resize gen-config' to generate a documented
config file.")]
#[command(version = env!("BATCH_RESIZE_VERSION"))]
struct Cli {
    /// Config file (default: ./batch-resize.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log per-item progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the images a run would process
    Scan {
        /// Folder to scan
        dir: PathBuf,
        /// Skip files smaller than this (e.g. 500KB, 2MB)
        #[arg(long, value_parser = config::parse_size)]
        min_size: Option<u64>,
    },
    /// Transcode every image in a folder
    Run(RunArgs),
    /// Print a stock batch-resize.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Folder of source images
    dir: PathBuf,
    /// Output folder, created if missing (default: the source folder)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Target width in pixels (0 = derive from height)
    #[arg(long)]
    width: Option<u32>,
    /// Target height in pixels (0 = derive from width)
    #[arg(long)]
    height: Option<u32>,
    /// JPEG quality, 1-100
    #[arg(short, long)]
    quality: Option<u32>,
    /// Clockwise rotation: 0, 90, 180 or 270
    #[arg(long)]
    rotate: Option<u32>,
    /// Write <name>.jpg instead of <name>_resized.jpg
    #[arg(long)]
    overwrite: bool,
    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,
    /// Skip files smaller than this (e.g. 500KB, 2MB)
    #[arg(long, value_parser = config::parse_size)]
    min_size: Option<u64>,
    /// Print a JSON report instead of per-image lines
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    /// Layer command-line flags over the loaded config.
    fn apply(&self, config: &mut BatchConfig) {
        let transform = &mut config.transform;
        if let Some(dir) = &self.output {
            transform.output_dir = Some(dir.clone());
        }
        if let Some(width) = self.width {
            transform.width = width;
        }
        if let Some(height) = self.height {
            transform.height = height;
        }
        if let Some(quality) = self.quality {
            transform.quality = quality;
        }
        if let Some(rotate) = self.rotate {
            transform.rotate = rotate;
        }
        if self.overwrite {
            transform.overwrite = true;
        }
        if let Some(workers) = self.workers {
            config.pool.workers = workers;
        }
        if let Some(min_size) = self.min_size {
            config.scan.min_size = min_size;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Scan { dir, min_size } => {
            let mut config = config::load_config(cli.config.as_deref())?;
            if let Some(min_size) = min_size {
                config.scan.min_size = min_size;
            }
            let items = scan::scan(&dir, &config.scan)?;
            output::print_scan_output(&items);
        }
        Command::Run(args) => {
            let mut config = config::load_config(cli.config.as_deref())?;
            args.apply(&mut config);
            config.validate()?;

            let items = scan::scan(&args.dir, &config.scan)?;
            let settings = TranscodeSettings::from_config(&config.transform, &args.dir)?;
            let mut pool = WorkerPool::start(RustBackend::new(), PoolOptions::from(&config.pool))?;

            let mut batch = pool.submit_batch(settings, items)?;
            let batch_id = batch.id();
            let mut results = Vec::with_capacity(batch.total());
            for result in batch.by_ref() {
                if !args.json {
                    output::print_result(&result);
                }
                results.push(result);
            }
            let summary = batch.finish()?;
            pool.shutdown();

            if args.json {
                println!(
                    "{}",
                    output::format_json_report(batch_id, &summary, &results)?
                );
            } else {
                output::print_summary(&summary);
            }

            if !summary.is_clean() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for listings and JSON reports.
///
/// `RUST_LOG` is honoured unless `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("batch_resize=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("batch_resize=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
