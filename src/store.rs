//! Catalog capabilities the detector reads through.
//!
//! Each detection makes at most one call to each capability. Implementations
//! must not write to the catalog while serving them.

use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::models::{CandidateSummary, CatalogEntry, EntryId};

/// Finds entries whose title shares a phonetic code with `title`.
pub trait PhoneticLookup {
    fn by_phonetic_code(&self, title: &str) -> Result<Vec<EntryId>, StoreError>;
}

/// The query side of a similarity refinement.
#[derive(Clone, Copy, Debug)]
pub struct SimilarityProbe<'q> {
    pub exclude: &'q str,
    pub title: &'q str,
    pub notes: &'q str,
    pub original_name: Option<&'q str>,
    pub threshold: f64,
}

/// Filters candidate ids down to those similar to the probe on title, notes
/// and original_name, returning a resource summary for each.
pub trait SimilarityQuery {
    fn by_ids_with_similarity(
        &self,
        ids: &BTreeSet<EntryId>,
        probe: &SimilarityProbe<'_>,
    ) -> Result<Vec<CandidateSummary>, StoreError>;
}

/// Loads full records for a set of ids. Unknown ids are skipped.
pub trait BatchFetch {
    fn by_ids(&self, ids: &[EntryId]) -> Result<Vec<CatalogEntry>, StoreError>;
}

/// Everything the detector needs.
pub trait CatalogStore: PhoneticLookup + SimilarityQuery + BatchFetch {}

impl<T: PhoneticLookup + SimilarityQuery + BatchFetch + ?Sized> CatalogStore for T {}
