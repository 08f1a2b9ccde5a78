//! Deterministic markup scan
//!
//! fetch -> parse -> extract -> dedup by URL -> resolve sizes -> filter

use std::sync::Arc;
use tokio::time::Instant;

use super::dedup::FileSet;
use super::error::ScanError;
use super::extractor::{FileReference, ReferenceExtractor};
use super::fetcher::ContentFetcher;
use super::filter::apply_preferences;
use super::metrics::ScanMetrics;
use super::sizes::SizeResolver;
use super::validate::validate_target;
use crate::types::{FileItem, ScanPreferences, ScanType};

/// Runs standard scans and records their outcome
#[derive(Debug, Clone)]
pub struct StandardScanner {
    fetcher: ContentFetcher,
    extractor: Arc<ReferenceExtractor>,
    sizes: Option<SizeResolver>,
    metrics: Arc<ScanMetrics>,
}

impl StandardScanner {
    pub fn new(
        fetcher: ContentFetcher,
        extractor: ReferenceExtractor,
        metrics: Arc<ScanMetrics>,
    ) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            sizes: None,
            metrics,
        }
    }

    /// Enable size resolution (builder pattern)
    pub fn with_size_resolver(mut self, resolver: SizeResolver) -> Self {
        self.sizes = Some(resolver);
        self
    }

    /// Scan `url`, optionally filtering by `preferences`
    pub async fn scan(
        &self,
        url: &str,
        preferences: Option<&ScanPreferences>,
    ) -> Result<Vec<FileItem>, ScanError> {
        let start = Instant::now();
        tracing::info!("Starting standard scan of {}", url);

        let result = self.run(url, preferences).await;
        match &result {
            Ok(files) => {
                tracing::info!("Standard scan of {} found {} files", url, files.len());
                self.metrics
                    .record_success(ScanType::Standard, files.len(), start.elapsed());
            }
            Err(e) => {
                tracing::warn!("Standard scan of {} failed: {}", url, e);
                self.metrics
                    .record_failure(ScanType::Standard, e, start.elapsed());
            }
        }
        result
    }

    /// Fetch and extract without sizes or filtering
    pub async fn discover(&self, url: &str) -> Result<Vec<FileItem>, ScanError> {
        Ok(self.collect(url).await?.into_vec())
    }

    async fn collect(&self, url: &str) -> Result<FileSet, ScanError> {
        let page_url = validate_target(url)?;
        let content = self.fetcher.fetch(page_url.as_str()).await?;

        let files: FileSet = self
            .extractor
            .extract(&content, &page_url)
            .into_iter()
            .map(FileReference::into_file_item)
            .collect();
        Ok(files)
    }

    async fn run(
        &self,
        url: &str,
        preferences: Option<&ScanPreferences>,
    ) -> Result<Vec<FileItem>, ScanError> {
        let mut files = self.collect(url).await?;

        if let Some(resolver) = &self.sizes {
            if !files.is_empty() {
                let sizes = resolver.resolve_sizes(&files.urls()).await;
                for file in files.iter_mut() {
                    file.size = sizes.get(&file.url).copied().unwrap_or(0);
                }
            }
        }

        Ok(apply_preferences(files.into_vec(), preferences))
    }
}
