//! Preference filtering

use crate::types::{FileItem, ScanPreferences};

/// Whether `file` passes `preferences`. No preferences matches everything.
pub fn matches(file: &FileItem, preferences: Option<&ScanPreferences>) -> bool {
    let Some(prefs) = preferences else {
        return true;
    };

    let category_ok = prefs.categories.is_empty() || prefs.categories.contains(&file.category);
    let min_ok = prefs.min_size == 0 || file.size >= prefs.min_size;
    let max_ok = prefs.max_size == 0 || file.size <= prefs.max_size;

    category_ok && min_ok && max_ok
}

/// Drop every file that fails `preferences`, keeping order
pub fn apply_preferences(files: Vec<FileItem>, preferences: Option<&ScanPreferences>) -> Vec<FileItem> {
    match preferences {
        Some(prefs) if !prefs.is_unrestricted() => {
            let before = files.len();
            let kept: Vec<FileItem> = files.into_iter().filter(|f| matches(f, Some(prefs))).collect();
            tracing::debug!("Preferences kept {} of {} files", kept.len(), before);
            kept
        }
        _ => files,
    }
}
