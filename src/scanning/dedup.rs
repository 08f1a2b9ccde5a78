//! URL-keyed file deduplication
//!
//! Within one scan a URL appears at most once. A later discovery of the
//! same URL replaces the earlier item but keeps the position where the URL
//! was first seen, so output order is deterministic for a given page.

use std::collections::HashMap;

use crate::types::FileItem;

/// Insertion-ordered set of files keyed by URL, last write wins
#[derive(Debug, Default)]
pub struct FileSet {
    items: Vec<FileItem>,
    index: HashMap<String, usize>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item`, replacing any earlier item with the same URL.
    /// Returns true when the URL was new.
    pub fn insert(&mut self, item: FileItem) -> bool {
        match self.index.get(&item.url) {
            Some(&pos) => {
                self.items[pos] = item;
                false
            }
            None => {
                self.index.insert(item.url.clone(), self.items.len());
                self.items.push(item);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn urls(&self) -> Vec<String> {
        self.items.iter().map(|item| item.url.clone()).collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FileItem> {
        self.items.iter_mut()
    }

    pub fn into_vec(self) -> Vec<FileItem> {
        self.items
    }
}

impl FromIterator<FileItem> for FileSet {
    fn from_iter<I: IntoIterator<Item = FileItem>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}
