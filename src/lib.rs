//! FileHarvest: downloadable file discovery for web pages
//!
//! Given a page URL, FileHarvest finds the files the page links to:
//! - Markup extraction from anchors, images and media sources
//! - Generative AI extraction constrained by a response schema
//! - Category classification by file extension
//! - Batched HEAD probes for file sizes
//! - Preference filtering by category and size
//! - SSRF-safe page fetching through a proxy with caching and retries

pub mod config;
pub mod scanning;
pub mod types;
pub mod util;

pub use config::Config;
pub use types::*;
