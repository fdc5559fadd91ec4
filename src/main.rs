//! Plan-Ville main entry point
//!
//! This is the command-line interface for the Plan-Ville grid crawler.

use clap::Parser;
use plan_ville::config::{load_api_key, load_config_with_hash, Config};
use plan_ville::crawler::Coordinator;
use plan_ville::output::print_grid_info;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Plan-Ville: a resumable grid crawler for place-search providers
///
/// Plan-Ville covers a circular area with a lattice of search points,
/// queries the provider around each one and stores every place it finds.
/// Interrupted crawls resume from the last saved checkpoint.
#[derive(Parser, Debug)]
#[command(name = "plan-ville")]
#[command(version = "1.0.0")]
#[command(about = "A resumable grid crawler for place-search providers", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard the checkpoint and start from the first batch
    #[arg(long)]
    fresh: bool,

    /// Validate config and show the grid and cost estimate without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, config_hash, &cli).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("plan_ville=info,warn"),
            1 => EnvFilter::new("plan_ville=debug,info"),
            2 => EnvFilter::new("plan_ville=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use plan_ville::output::{load_statistics, print_statistics};
    use plan_ville::storage::open_storage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, config.search.radius_meters)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the crawl, including --dry-run
///
/// The credential is checked before any crawl state is touched.
async fn handle_crawl(
    config: Config,
    config_hash: String,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = load_api_key(&config.search.api_key_env)?;

    print_area(&config);

    let checkpoint_path = config.output.checkpoint_path.clone();
    let mut coordinator =
        Coordinator::new(config, api_key, cli.fresh)?.with_config_hash(config_hash);

    let info = coordinator.grid_info()?;
    print_grid_info(&info);
    println!();

    if cli.dry_run {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    if info.remaining_points == 0 {
        println!("✓ Every grid point has already been searched");
        return Ok(());
    }

    if !cli.yes && !confirm("Proceed with crawl? (yes/no): ")? {
        println!("Aborted");
        return Ok(());
    }

    match coordinator.run().await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            println!(
                "✓ Searched {} points ({} skipped), stored {} places",
                report.points_searched, report.points_skipped, report.places_stored
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            if e.is_retryable() {
                eprintln!(
                    "Progress was saved to {}. Re-run the same command to resume.",
                    checkpoint_path
                );
            }
            Err(e.into())
        }
    }
}

fn print_area(config: &Config) {
    println!("=== Plan-Ville ===\n");
    println!("Area:");
    println!(
        "  Center: {}, {}",
        config.area.center_lat, config.area.center_lng
    );
    println!("  Radius: {} km", config.area.radius_km);
    println!("  Grid spacing: {} m", config.grid.spacing_meters);
    println!("  Search radius: {} m", config.search.radius_meters);
    println!();
}

/// Asks a yes/no question on stdin
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;

    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
