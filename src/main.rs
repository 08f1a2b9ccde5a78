//! FileHarvest: discover downloadable files on web pages

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{OutputFormat, ScanArgs};
use fileharvest::config::{Config, LogFormat, DEFAULT_CONFIG_FILE};
use fileharvest::types::Category;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "fileharvest")]
#[command(about = "Discover, classify and filter downloadable files on web pages")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a page for downloadable files
    Scan {
        /// Page URL
        url: String,

        /// Use the generative AI scan instead of markup extraction
        #[arg(long)]
        ai: bool,

        /// Only keep files of this category (repeatable)
        #[arg(long = "category")]
        categories: Vec<Category>,

        /// Minimum file size in bytes
        #[arg(long)]
        min_size: Option<u64>,

        /// Maximum file size in bytes
        #[arg(long)]
        max_size: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Print scan metrics in Prometheus text format
        #[arg(long)]
        metrics: bool,
    },

    /// Print the category of URLs or file extensions
    Classify {
        /// URLs, file names or extensions
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init needs no configuration
    if let Commands::Init { path, force } = cli.command {
        init_logging(&Config::default(), cli.verbose)?;
        return commands::init_config(path, force).await;
    }

    let config = Config::load_or_default(&cli.config)?;
    init_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Scan {
            url,
            ai,
            categories,
            min_size,
            max_size,
            format,
            metrics,
        } => {
            let args = ScanArgs {
                url,
                ai,
                categories,
                min_size,
                max_size,
                format,
                metrics,
            };
            commands::run_scan(config, args).await
        }
        Commands::Classify { inputs } => commands::classify_inputs(inputs).await,
        Commands::Init { .. } => Ok(()),
    }
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_logging(config: &Config, verbose: u8) -> Result<()> {
    let level = config.logging.level.raised_by(verbose);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    match config.logging.format {
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
