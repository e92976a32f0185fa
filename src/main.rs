use clap::{Parser, Subcommand};
use std::path::PathBuf;
use travel_atlas::imaging::RustBackend;
use travel_atlas::interact::{ITermPreview, StdinPrompt};
use travel_atlas::writer::{CaptionWriter, ExifToolCapability};
use travel_atlas::{config, ingest, output, process, rename};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "travel-atlas")]
#[command(about = "Turn a folder of geotagged travel photos into map-ready images and data.json")]
#[command(long_about = "\
Turn a folder of geotagged travel photos into map-ready images and data.json

Every photo with GPS coordinates in its EXIF gets a thumbnail and a large
JPEG, and one entry in the manifest the map web app loads. Photos without a
position are left out.

Layout:

  photos/                          # --source
  ├── config.toml                  # optional, see 'travel-atlas gen-config'
  ├── IMG_0001.jpg                 # jpg, jpeg, png, webp, heic, dng
  └── IMG_0002.HEIC
  public/                          # --output
  ├── data.json                    # [{id, lat, lng, thumb, large, originalName, caption}]
  └── photos/
      ├── IMG_0001_thumb.jpg       # fits 300x300
      └── IMG_0001_large.jpg       # fits 1600x1600

Captions are read from ImageDescription, then UserComment. Use 'ingest' to
add missing captions before processing.

Set RUST_LOG=debug to see why individual files were skipped.")]
#[command(version)]
struct Cli {
    /// Directory of source photos
    #[arg(long, default_value = "photos", global = true)]
    source: PathBuf,

    /// Public directory receiving data.json and photos/
    #[arg(long, default_value = "public", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate thumbnails, large images and data.json
    Process,
    /// Interactively add captions to photos that have none
    Ingest,
    /// Interactively rename photos to region-landmark names, with preview
    Rename {
        /// Directory to rename in
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Process => {
            let atlas_config = config::load_config(&cli.source)?;
            init_thread_pool(&atlas_config.processing);
            let process_config = process::ProcessConfig::from_config(&atlas_config);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(&cli.source, &cli.output, &process_config, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let report = result?;
            output::print_process_summary(&report, &cli.output.join(process::MANIFEST_FILE));
        }
        Command::Ingest => {
            let capability = ExifToolCapability::detect();
            output::print_ingest_header(capability.is_available());
            let writer = CaptionWriter::new(capability);
            let mut prompt = StdinPrompt::stdin();
            let report = ingest::ingest(
                &RustBackend::new(),
                &writer,
                &mut prompt,
                &cli.source,
                output::print_ingest_event,
            )?;
            output::print_ingest_summary(&report);
        }
        Command::Rename { dir } => {
            let mut prompt = StdinPrompt::stdin();
            let mut preview = ITermPreview::stdout();
            let report = rename::rename_interactive(
                &dir,
                &mut prompt,
                &mut preview,
                output::print_rename_event,
            )?;
            output::print_rename_summary(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Size the global rayon pool from `[processing] max_processes`, capped at the core count.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
