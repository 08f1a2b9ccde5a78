//! Core types for the file discovery pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// File Categories
// ============================================================================

/// Closed set of file categories shared by both scan paths and the
/// preference filter.
///
/// The serialized names are part of the AI response schema, so they must
/// stay exactly as written here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Font,
    Style,
    Script,
    Code,
    Model3D,
    Data,
    Executable,
    Other,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 13] = [
        Category::Image,
        Category::Video,
        Category::Audio,
        Category::Document,
        Category::Archive,
        Category::Font,
        Category::Style,
        Category::Script,
        Category::Code,
        Category::Model3D,
        Category::Data,
        Category::Executable,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Document => "Document",
            Self::Archive => "Archive",
            Self::Font => "Font",
            Self::Style => "Style",
            Self::Script => "Script",
            Self::Code => "Code",
            Self::Model3D => "Model3D",
            Self::Data => "Data",
            Self::Executable => "Executable",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a category
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Case-insensitive parse; `3d` and `model` are accepted for `Model3D`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let category = match lower.as_str() {
            "3d" | "model" => Category::Model3D,
            _ => Category::ALL
                .into_iter()
                .find(|c| c.as_str().eq_ignore_ascii_case(&lower))
                .ok_or_else(|| UnknownCategory(s.to_string()))?,
        };
        Ok(category)
    }
}

// ============================================================================
// Discovered Files
// ============================================================================

/// A discovered downloadable resource.
///
/// `url` is the identity key: one scan never returns two items with the
/// same URL. A `size` of zero means "unknown", not "empty file".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    /// Absolute URL
    pub url: String,
    /// Display name
    pub name: String,
    /// File category
    pub category: Category,
    /// Size in bytes, 0 when unknown
    pub size: u64,
}

impl FileItem {
    pub fn new(url: impl Into<String>, name: impl Into<String>, category: Category) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            category,
            size: 0,
        }
    }

    /// Set the size (builder pattern)
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Whether the size is known
    pub fn has_size(&self) -> bool {
        self.size > 0
    }
}

// ============================================================================
// Preferences
// ============================================================================

/// User-supplied filter applied after discovery.
///
/// An empty category set means no category restriction; a zero bound means
/// no bound on that side. Both bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanPreferences {
    /// Allowed categories (empty = all)
    pub categories: HashSet<Category>,
    /// Minimum size in bytes (0 = no lower bound)
    pub min_size: u64,
    /// Maximum size in bytes (0 = no upper bound)
    pub max_size: u64,
}

impl ScanPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given categories (builder pattern)
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    /// Set the inclusive size bounds (builder pattern)
    pub fn with_size_bounds(mut self, min_size: u64, max_size: u64) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// True when these preferences cannot reject anything
    pub fn is_unrestricted(&self) -> bool {
        self.categories.is_empty() && self.min_size == 0 && self.max_size == 0
    }
}

// ============================================================================
// Scan Types
// ============================================================================

/// Which discovery strategy produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Standard,
    Ai,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Ai => "ai",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
