//! File discovery pipeline
//!
//! Two scan strategies share one fetcher, cache and metrics store:
//! - [`StandardScanner`]: parse the page and extract references from markup
//! - [`AiScanner`]: hand the page to a generative AI service with a schema
//!
//! Both collapse duplicates by URL and apply the same preference filter.

pub mod ai;
pub mod cache;
pub mod classify;
pub mod coordinator;
pub mod dedup;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod filter;
pub mod metrics;
pub mod sizes;
pub mod standard;
pub mod transport;
pub mod validate;

pub use ai::{AiScanner, CredentialSource, GenerativeBackend};
pub use cache::{CacheStats, ContentCache};
pub use classify::classify;
pub use coordinator::ScanCoordinator;
pub use dedup::FileSet;
pub use error::{ErrorKind, ScanError};
pub use extractor::{FileReference, ReferenceExtractor, ReferenceSource};
pub use fetcher::{ContentFetcher, FetcherConfig};
pub use filter::{apply_preferences, matches};
pub use metrics::{MetricsSnapshot, ScanMetrics};
pub use sizes::{ResolverConfig, SizeResolver};
pub use standard::StandardScanner;
pub use transport::{HttpTransport, ReqwestTransport, TransportError, TransportResponse};
pub use validate::validate_target;
