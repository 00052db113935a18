use std::path::PathBuf;

use clap::Parser;
use exif_dissect::{ExifDissector, Limits, Severity};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// List the labelled byte ranges of the Exif metadata in a file.
#[derive(Parser, Debug)]
#[command(name = "exif-ls")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// A JPEG file, or a bare TIFF structure with `--tiff`.
    path: PathBuf,

    /// Treat the input as TIFF data rather than a JPEG file.
    #[arg(long)]
    tiff: bool,

    /// Render every value element instead of the first 1024 of each entry.
    #[arg(long)]
    all_values: bool,

    /// Require the TIFF fixed value to be 42.
    #[arg(long)]
    check_magic: bool,

    /// Stop at directories that were already walked.
    #[arg(long)]
    revisit_guard: bool,

    /// Log every directory and finding.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let data = std::fs::read(&args.path)?;

    let limits = if args.all_values {
        Limits::unlimited()
    } else {
        Limits::default()
    };
    let dissector = ExifDissector::new()
        .with_limits(limits)
        .with_magic_check(args.check_magic)
        .with_revisit_guard(args.revisit_guard);

    let dissection = if args.tiff {
        dissector.dissect_tiff(&data)
    } else {
        dissector.dissect_jpeg(&data)
    };

    print!("{dissection}");

    let errors = dissection
        .findings
        .iter()
        .filter(|finding| finding.severity == Severity::Error)
        .count();
    if errors > 0 {
        eprintln!("{errors} structural error(s) in {}", args.path.display());
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "exif_dissect=debug"
    } else {
        "exif_dissect=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
