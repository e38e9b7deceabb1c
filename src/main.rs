//! trailgrab CLI
//!
//! Local execution entry point. Needs a running chromedriver (see the
//! `webdriver` section of config.toml for the endpoint).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trailgrab::{
    error::Result,
    models::Config,
    pipeline,
    session::Session,
    storage::LocalStore,
};

/// trailgrab - YAMAP model-course GPX collector
#[derive(Parser, Debug)]
#[command(
    name = "trailgrab",
    version,
    about = "Scrapes YAMAP mountain guides and downloads activity GPX tracks"
)]
struct Cli {
    /// Path to data directory containing config and outputs
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape the mountain / course / activity hierarchy
    Scrape {
        /// Only scrape the first N mountains
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Download GPX tracks for a previously scraped hierarchy
    Download,

    /// Run full pipeline: Scrape then Download
    Pipeline {
        /// Only scrape the first N mountains
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Validate the configuration file
    Validate,

    /// Show current scrape state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Run one browser-backed command, then shut the session down no matter
/// how the command ended.
async fn with_session<F>(config: &Config, run: F) -> Result<()>
where
    F: AsyncFnOnce(&Session) -> Result<()>,
{
    let session = Session::connect(config).await?;
    let result = run(&session).await;
    if let Err(e) = session.quit().await {
        log::warn!("Failed to shut down browser session: {e}");
    }
    result
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("trailgrab starting...");

    let config_path = cli.data_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);

    log::info!("Loaded configuration from {}", cli.data_dir.display());

    let store = LocalStore::new(&cli.data_dir);

    match cli.command {
        Command::Scrape { limit } => {
            with_session(&config, async |session| {
                pipeline::run_scrape(&config, session, &store, limit).await
            })
            .await?;

            log::info!("Scrape complete!");
        }

        Command::Download => {
            with_session(&config, async |session| {
                pipeline::run_download(&config, session, &store).await?;
                Ok(())
            })
            .await?;

            log::info!("Download complete!");
        }

        Command::Pipeline { limit } => {
            with_session(&config, async |session| {
                log::info!("Step 1/2: Scraping hierarchy...");
                pipeline::run_scrape(&config, session, &store, limit).await?;

                log::info!("Step 2/2: Downloading GPX tracks...");
                pipeline::run_download(&config, session, &store).await?;
                Ok(())
            })
            .await?;

            log::info!("Pipeline complete!");
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (webdriver, crawler, pacing, and paths)");

            let cookie_path = store.path(&config.paths.cookie_file);
            if cookie_path.exists() {
                log::info!("✓ Cookie file present at {}", cookie_path.display());
            } else {
                log::warn!(
                    "Cookie file not found at {}. Export it before scraping.",
                    cookie_path.display()
                );
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Data directory: {}", cli.data_dir.display());

            let hierarchy_path = store.path(&config.paths.hierarchy_file);
            if hierarchy_path.exists() {
                if let Ok(content) = std::fs::read_to_string(&hierarchy_path) {
                    if let Ok(tree) = serde_json::from_str::<serde_json::Value>(&content) {
                        if let Some(scraped_at) = tree.get("scraped_at") {
                            log::info!("Last scraped: {}", scraped_at);
                        }
                        if let Some(total) = tree.get("total_mountains") {
                            log::info!("Mountains: {}", total);
                        }
                    }
                }
            } else {
                log::info!("No hierarchy scraped yet.");
            }

            let output_dir = store.path(&config.paths.output_dir);
            log::info!(
                "GPX output: {} ({})",
                output_dir.display(),
                if output_dir.exists() {
                    "exists"
                } else {
                    "not created"
                }
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
