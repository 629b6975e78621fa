//! Registry of installed libraries.

use std::sync::Arc;

use super::id::LibraryId;
use super::traits::Library;

/// Installed libraries, held in descending id order. Both compile scanning
/// and probe contests walk this order, so higher-id libraries shadow lower
/// ones and break probe-length ties.
#[derive(Default, Clone)]
pub struct LibraryRegistry {
    by_desc: Vec<Arc<dyn Library>>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a library, replacing any previous one with the same id.
    pub fn register(&mut self, lib: Arc<dyn Library>) {
        let id = lib.id();
        match self.by_desc.binary_search_by(|l| id.cmp(&l.id())) {
            Ok(i) => self.by_desc[i] = lib,
            Err(i) => self.by_desc.insert(i, lib),
        }
    }

    pub fn get(&self, id: u16) -> Option<&Arc<dyn Library>> {
        let id = LibraryId::new(id);
        self.by_desc
            .binary_search_by(|l| id.cmp(&l.id()))
            .ok()
            .map(|i| &self.by_desc[i])
    }

    /// Libraries in scan order: highest id first.
    pub fn iter_desc(&self) -> impl Iterator<Item = &Arc<dyn Library>> {
        self.by_desc.iter()
    }

    pub fn len(&self) -> usize {
        self.by_desc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_desc.is_empty()
    }
}
