//! In-memory catalog with a phonetic index.
//!
//! Used by the catalog scan (loaded once from SQLite, then shared across the
//! rayon pool) and by tests.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::models::{CandidateSummary, CatalogEntry, EntryId};
use crate::phonetic::DoubleMetaphone;
use crate::similarity::reaches_threshold;
use crate::store::{BatchFetch, PhoneticLookup, SimilarityProbe, SimilarityQuery};

pub struct MemoryCatalog {
    entries: Vec<CatalogEntry>,
    by_id: FxHashMap<EntryId, usize>,
    /// Primary phonetic code -> entry indices
    by_code: FxHashMap<String, Vec<usize>>,
    encoder: DoubleMetaphone,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::with_encoder(DoubleMetaphone::default())
    }

    pub fn with_encoder(encoder: DoubleMetaphone) -> Self {
        Self {
            entries: Vec::new(),
            by_id: FxHashMap::default(),
            by_code: FxHashMap::default(),
            encoder,
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Self::new();
        catalog.extend(entries);
        catalog
    }

    /// Insert or replace an entry by id.
    pub fn insert(&mut self, entry: CatalogEntry) {
        if let Some(&idx) = self.by_id.get(&entry.id) {
            self.unindex(idx);
            self.index(idx, &entry);
            self.entries[idx] = entry;
            return;
        }
        let idx = self.entries.len();
        self.index(idx, &entry);
        self.by_id.insert(entry.id.clone(), idx);
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = CatalogEntry>) {
        for entry in entries {
            self.insert(entry);
        }
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.by_id.get(id).map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct phonetic codes with at least two entries.
    pub fn cluster_count(&self) -> usize {
        self.by_code.values().filter(|v| v.len() >= 2).count()
    }

    fn code_of(&self, entry: &CatalogEntry) -> Option<String> {
        let code = self.encoder.primary(entry.title.as_deref()?);
        (!code.is_empty()).then_some(code)
    }

    fn index(&mut self, idx: usize, entry: &CatalogEntry) {
        if let Some(code) = self.code_of(entry) {
            self.by_code.entry(code).or_default().push(idx);
        }
    }

    fn unindex(&mut self, idx: usize) {
        if let Some(code) = self.code_of(&self.entries[idx]) {
            if let Some(members) = self.by_code.get_mut(&code) {
                members.retain(|&i| i != idx);
            }
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneticLookup for MemoryCatalog {
    fn by_phonetic_code(&self, title: &str) -> Result<Vec<EntryId>, StoreError> {
        let code = self.encoder.primary(title);
        if code.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .by_code
            .get(&code)
            .map(|members| members.iter().map(|&i| self.entries[i].id.clone()).collect())
            .unwrap_or_default())
    }
}

impl SimilarityQuery for MemoryCatalog {
    fn by_ids_with_similarity(
        &self,
        ids: &BTreeSet<EntryId>,
        probe: &SimilarityProbe<'_>,
    ) -> Result<Vec<CandidateSummary>, StoreError> {
        let summaries = ids
            .iter()
            .filter(|id| id.as_str() != probe.exclude)
            .filter_map(|id| self.get(id))
            .filter(|candidate| {
                reaches_threshold(candidate.title.as_deref(), Some(probe.title), probe.threshold)
                    && reaches_threshold(candidate.notes.as_deref(), Some(probe.notes), probe.threshold)
                    && reaches_threshold(
                        candidate.original_name.as_deref(),
                        probe.original_name,
                        probe.threshold,
                    )
            })
            .map(CandidateSummary::from_entry)
            .collect();
        Ok(summaries)
    }
}

impl BatchFetch for MemoryCatalog {
    fn by_ids(&self, ids: &[EntryId]) -> Result<Vec<CatalogEntry>, StoreError> {
        Ok(ids.iter().filter_map(|id| self.get(id)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe<'q>(exclude: &'q str, title: &'q str, notes: &'q str, name: Option<&'q str>) -> SimilarityProbe<'q> {
        SimilarityProbe {
            exclude,
            title,
            notes,
            original_name: name,
            threshold: 1.0,
        }
    }

    fn ids(list: &[&str]) -> BTreeSet<EntryId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_phonetic_lookup() {
        let catalog = MemoryCatalog::from_entries(vec![
            CatalogEntry::new("a", "Climate change dataset", "x"),
            CatalogEntry::new("b", "Climate data", "y"),
            CatalogEntry::new("c", "Random Dataset A", "z"),
        ]);
        let mut found = catalog.by_phonetic_code("Climate").unwrap();
        found.sort();
        assert_eq!(found, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(catalog.cluster_count(), 1);
    }

    #[test]
    fn test_empty_code_matches_nothing() {
        let catalog = MemoryCatalog::from_entries(vec![
            CatalogEntry::new("a", "2020", "x"),
            CatalogEntry::new("b", "2021", "y"),
        ]);
        assert!(catalog.by_phonetic_code("2020").unwrap().is_empty());
    }

    #[test]
    fn test_insert_replaces_and_reindexes() {
        let mut catalog = MemoryCatalog::new();
        catalog.insert(CatalogEntry::new("a", "Climate data", "x"));
        catalog.insert(CatalogEntry::new("a", "Random data", "x"));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.by_phonetic_code("Climate").unwrap().is_empty());
        assert_eq!(catalog.by_phonetic_code("Random").unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_similarity_requires_original_name() {
        let catalog = MemoryCatalog::from_entries(vec![
            CatalogEntry::new("a", "Dataset 1", "Notes 1").with_original_name("dataset-1"),
            CatalogEntry::new("b", "Dataset 1", "Notes 1").with_original_name("dataset-1"),
            CatalogEntry::new("c", "Dataset 1", "Notes 1"),
        ]);
        let found = catalog
            .by_ids_with_similarity(&ids(&["a", "b", "c"]), &probe("a", "Dataset 1", "Notes 1", Some("dataset-1")))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");

        let none = catalog
            .by_ids_with_similarity(&ids(&["a", "b", "c"]), &probe("a", "Dataset 1", "Notes 1", None))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_similarity_rejects_different_notes() {
        let catalog = MemoryCatalog::from_entries(vec![
            CatalogEntry::new("b", "Dataset 1", "Other notes").with_original_name("dataset-1"),
        ]);
        let found = catalog
            .by_ids_with_similarity(&ids(&["b"]), &probe("a", "Dataset 1", "Notes 1", Some("dataset-1")))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_batch_fetch_skips_unknown() {
        let catalog = MemoryCatalog::from_entries(vec![CatalogEntry::new("a", "T", "N")]);
        let fetched = catalog.by_ids(&["a".to_string(), "zz".to_string()]).unwrap();
        assert_eq!(fetched.len(), 1);
    }
}
