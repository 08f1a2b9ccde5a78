use anyhow::{Context, Result};
use fileharvest::{
    config::Config,
    scanning::ScanCoordinator,
    types::{Category, FileItem, ScanPreferences, ScanType},
    util::{format_size, truncate_str},
};
use tracing::info;

/// Scan result output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Options for one `scan` invocation
#[derive(Debug, Clone)]
pub struct ScanArgs {
    pub url: String,
    pub ai: bool,
    pub categories: Vec<Category>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub format: OutputFormat,
    pub metrics: bool,
}

impl ScanArgs {
    fn scan_type(&self) -> ScanType {
        if self.ai {
            ScanType::Ai
        } else {
            ScanType::Standard
        }
    }

    /// Command-line flags override the configured defaults field by field
    fn preferences(&self, defaults: &ScanPreferences) -> ScanPreferences {
        let mut prefs = defaults.clone();
        if !self.categories.is_empty() {
            prefs.categories = self.categories.iter().copied().collect();
        }
        if let Some(min_size) = self.min_size {
            prefs.min_size = min_size;
        }
        if let Some(max_size) = self.max_size {
            prefs.max_size = max_size;
        }
        prefs
    }
}

pub async fn run_scan(config: Config, args: ScanArgs) -> Result<()> {
    let coordinator =
        ScanCoordinator::from_config(&config).context("Failed to set up scanners")?;
    let scan_type = args.scan_type();
    let prefs = args.preferences(&config.preferences);
    let prefs = (!prefs.is_unrestricted()).then_some(prefs);

    info!("Running {} scan of {}", scan_type, args.url);
    let result = coordinator.scan(scan_type, &args.url, prefs.as_ref()).await;

    if let Ok(files) = &result {
        output_files(files, args.format)?;
    }
    if args.metrics {
        println!("{}", coordinator.metrics_prometheus());
    }

    let files = result.with_context(|| format!("{} scan of {} failed", scan_type, args.url))?;
    info!("Found {} files", files.len());
    Ok(())
}

fn output_files(files: &[FileItem], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(files)?);
        }
        OutputFormat::Text => {
            if files.is_empty() {
                println!("No files found.");
                return Ok(());
            }

            println!("\nFound {} files:\n", files.len());
            println!("{:<12} {:>12}  {:<40} URL", "CATEGORY", "SIZE", "NAME");
            for file in files {
                println!(
                    "{:<12} {:>12}  {:<40} {}",
                    file.category.as_str(),
                    format_size(file.size),
                    truncate_str(&file.name, 40),
                    file.url,
                );
            }
            println!();
        }
    }
    Ok(())
}
