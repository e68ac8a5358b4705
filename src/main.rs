use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use concert_export::config::ExportConfig;
use concert_export::export;
use concert_export::progress::{format_duration, set_log_only};
use concert_export::safety::validate_output_dir;

#[derive(Parser)]
#[command(name = "concert-export")]
#[command(about = "Export the concert database to static JSON files for the website")]
struct Args {
    /// Concert database snapshot (SQLite)
    #[arg(long, env = "CONCERT_EXPORT_DATABASE")]
    source: Option<PathBuf>,

    /// Output directory (defaults to website/data)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print progress as log lines instead of progress bars
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    set_log_only(args.log_only);

    let start = Instant::now();

    let config = match ExportConfig::resolve(args.source, args.output) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, e.remediation());
            std::process::exit(1);
        }
    };
    let store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, e.remediation());
            std::process::exit(1);
        }
    };
    validate_output_dir(&config.output_dir, &config.source)?;

    println!("Source database: {:?}", config.source);
    let summary = export::run(&store, &config.output_dir)?;

    println!("\n{:=<60}", "");
    println!("Export complete!");
    println!("  Concerts: {}", summary.concerts);
    println!("  Concert details: {}", summary.concert_details);
    println!("  Artists: {}", summary.artists);
    println!("  Venues: {}", summary.venues);
    println!("  Unique songs: {}", summary.unique_songs);
    if summary.skipped_files > 0 {
        println!("  Detail files skipped (unusable ids): {}", summary.skipped_files);
    }
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("\nFiles written to: {}", config.output_dir.display());
    println!("{:=<60}", "");

    Ok(())
}
