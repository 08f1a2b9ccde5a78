//! File reference extraction from HTML
//!
//! Three kinds of markup carry file references:
//! - `a[href]` links, classified by extension, named by link text
//! - `img[src]` images, always [`Category::Image`], named by alt text
//! - `video[src]`, `audio[src]`, `source[src]` media, classified by extension
//!
//! Every reference is resolved against the page URL. References that do
//! not resolve, or resolve to a non-http(s) URL, are skipped.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::classify::{classify_url, extension_of_url};
use crate::types::{Category, FileItem};

/// Placeholder used when neither markup nor URL yields a name
pub const UNKNOWN_FILE_NAME: &str = "Unknown File";

/// Default upper bound (exclusive) on link text or alt text used as a name
pub const DEFAULT_MAX_NAME_LENGTH: usize = 100;

/// Kind of markup a reference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSource {
    Anchor,
    Image,
    Media,
}

impl ReferenceSource {
    /// Category rule for this source
    pub fn categorize(&self, url: &Url) -> Category {
        match self {
            ReferenceSource::Image => Category::Image,
            ReferenceSource::Anchor | ReferenceSource::Media => classify_url(url),
        }
    }
}

/// A resolved file reference found in markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub url: Url,
    pub name: String,
    pub category: Category,
    pub source: ReferenceSource,
}

impl FileReference {
    /// Convert into a [`FileItem`] with unknown size
    pub fn into_file_item(self) -> FileItem {
        FileItem::new(self.url.to_string(), self.name, self.category)
    }
}

/// Extracts file references from parsed HTML
pub struct ReferenceExtractor {
    max_name_length: usize,
    anchors: Option<Selector>,
    images: Option<Selector>,
    media: Option<Selector>,
}

impl std::fmt::Debug for ReferenceExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceExtractor")
            .field("max_name_length", &self.max_name_length)
            .finish_non_exhaustive()
    }
}

impl ReferenceExtractor {
    pub fn new(max_name_length: usize) -> Self {
        Self {
            max_name_length,
            anchors: Selector::parse("a[href]").ok(),
            images: Selector::parse("img[src]").ok(),
            media: Selector::parse("video[src], audio[src], source[src]").ok(),
        }
    }

    /// Parse `html` and extract references relative to `base`
    pub fn extract(&self, html: &str, base: &Url) -> Vec<FileReference> {
        let document = Html::parse_document(html);
        self.extract_document(&document, base)
    }

    /// Extract references from an already parsed document.
    ///
    /// Order is anchors, then images, then media, each in document order.
    pub fn extract_document(&self, document: &Html, base: &Url) -> Vec<FileReference> {
        let mut refs = Vec::new();

        if let Some(selector) = &self.anchors {
            for element in document.select(selector) {
                let text = element.text().collect::<String>();
                self.push_reference(&mut refs, base, element, "href", ReferenceSource::Anchor, Some(&text));
            }
        }

        if let Some(selector) = &self.images {
            for element in document.select(selector) {
                let alt = element.value().attr("alt");
                self.push_reference(&mut refs, base, element, "src", ReferenceSource::Image, alt);
            }
        }

        if let Some(selector) = &self.media {
            for element in document.select(selector) {
                self.push_reference(&mut refs, base, element, "src", ReferenceSource::Media, None);
            }
        }

        tracing::debug!("Extracted {} file references from {}", refs.len(), base);
        refs
    }

    fn push_reference(
        &self,
        refs: &mut Vec<FileReference>,
        base: &Url,
        element: ElementRef<'_>,
        attr: &str,
        source: ReferenceSource,
        label: Option<&str>,
    ) {
        let Some(raw) = element.value().attr(attr) else {
            return;
        };
        let Some(url) = resolve_reference(base, raw) else {
            return;
        };

        let name = derive_name(&url, label, self.max_name_length);
        let category = source.categorize(&url);
        refs.push(FileReference {
            url,
            name,
            category,
            source,
        });
    }
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NAME_LENGTH)
    }
}

/// Resolve `raw` against `base`, keeping only http(s) results
pub fn resolve_reference(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let url = base.join(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Display name for a file.
///
/// A label (link text or alt text) wins when it is non-empty and shorter
/// than `max_len` characters; the file's extension is appended if the label
/// lacks it. Otherwise the percent-decoded last path segment is used.
pub fn derive_name(url: &Url, label: Option<&str>, max_len: usize) -> String {
    let label = label
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    if !label.is_empty() && label.chars().count() < max_len {
        return match extension_of_url(url) {
            Some(ext) if !label.to_ascii_lowercase().ends_with(&format!(".{}", ext)) => {
                format!("{}.{}", label, ext)
            }
            _ => label,
        };
    }

    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    if segment.is_empty() {
        return UNKNOWN_FILE_NAME.to_string();
    }

    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
