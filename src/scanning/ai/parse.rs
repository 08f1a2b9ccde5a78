//! Validation of the AI response payload
//!
//! The payload is untrusted: it must be a JSON array of objects carrying
//! `url`, `name`, `category` and `size`, with the category drawn from the
//! closed set. Any shape mismatch is a [`ScanError::Parse`]; nothing is
//! coerced.

use serde::Deserialize;
use serde_json::Number;
use url::Url;

use crate::scanning::dedup::FileSet;
use crate::scanning::error::ScanError;
use crate::scanning::extractor::{derive_name, UNKNOWN_FILE_NAME};
use crate::types::{Category, FileItem};

/// One file entry as returned by the model
#[derive(Debug, Deserialize)]
struct AiFileEntry {
    url: String,
    name: String,
    /// Older responses used `type` for this field
    #[serde(alias = "type")]
    category: Category,
    size: Number,
}

/// Parse the model's JSON text into deduplicated file items with absolute URLs
pub fn parse_ai_response(text: &str, page_url: &Url) -> Result<Vec<FileItem>, ScanError> {
    let json = strip_code_fence(text.trim());
    let entries: Vec<AiFileEntry> =
        serde_json::from_str(json).map_err(|e| ScanError::Parse(e.to_string()))?;

    let mut files = FileSet::new();
    for entry in entries {
        let size = byte_count(&entry.size)?;
        let url = absolutize(page_url, &entry.url);
        let name = if entry.name.trim().is_empty() {
            fallback_name(&url)
        } else {
            entry.name.trim().to_string()
        };
        files.insert(FileItem::new(url, name, entry.category).with_size(size));
    }

    Ok(files.into_vec())
}

/// Resolve against the page URL; malformed URLs pass through unchanged
fn absolutize(page_url: &Url, raw: &str) -> String {
    match page_url.join(raw.trim()) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!("Keeping unresolvable AI URL {:?}: {}", raw, e);
            raw.to_string()
        }
    }
}

fn fallback_name(url: &str) -> String {
    Url::parse(url)
        .map(|u| derive_name(&u, None, 0))
        .unwrap_or_else(|_| UNKNOWN_FILE_NAME.to_string())
}

/// Sizes must be non-negative whole numbers
fn byte_count(size: &Number) -> Result<u64, ScanError> {
    if let Some(n) = size.as_u64() {
        return Ok(n);
    }
    match size.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(ScanError::Parse(format!(
            "size {} is not a non-negative whole number of bytes",
            size
        ))),
    }
}

/// Accept a payload wrapped in a markdown code fence
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
