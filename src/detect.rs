//! Duplicate detection pipeline.
//!
//! Four stages, each narrowing the candidate set:
//! 1. Phonetic cluster: entries whose title shares the query's phonetic code
//! 2. Similarity refine: strict similarity on title, notes and original_name
//! 3. Resource fingerprint: same resource count and format multiset
//! 4. Canonical resolve: lowest `duplicate_score` wins, ties by id
//!
//! Any stage coming up empty ends the run with the query as its own original.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::DetectorConfig;
use crate::error::{DetectError, Result};
use crate::models::{
    CandidateSummary, CatalogEntry, Detection, DuplicateResult, EntryId, PipelineExit,
};
use crate::store::{BatchFetch, CatalogStore, SimilarityProbe};

/// Minimum cluster size worth refining.
pub const MIN_CLUSTER_SIZE: usize = 2;

pub struct DuplicateDetector<'a, S: ?Sized> {
    store: &'a S,
    config: DetectorConfig,
}

impl<'a, S: CatalogStore + ?Sized> DuplicateDetector<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_config(store, DetectorConfig::default())
    }

    pub fn with_config(store: &'a S, config: DetectorConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Ids sharing the title's phonetic code. Empty when fewer than two.
    pub fn find_cluster(&self, title: &str) -> Result<BTreeSet<EntryId>> {
        let cluster: BTreeSet<EntryId> = self.store.by_phonetic_code(title)?.into_iter().collect();
        if cluster.len() < MIN_CLUSTER_SIZE {
            return Ok(BTreeSet::new());
        }
        Ok(cluster)
    }

    /// Cluster members, minus `excluding`, that match on all three attributes.
    pub fn refine(
        &self,
        candidate_ids: &BTreeSet<EntryId>,
        excluding: &str,
        title: &str,
        notes: &str,
        original_name: Option<&str>,
    ) -> Result<Vec<CandidateSummary>> {
        let mut ids = candidate_ids.clone();
        ids.remove(excluding);
        // Copies are linked through original_name; without it nothing can match.
        if ids.is_empty() || original_name.is_none() {
            return Ok(Vec::new());
        }

        let probe = SimilarityProbe {
            exclude: excluding,
            title,
            notes,
            original_name,
            threshold: self.config.similarity_threshold,
        };
        Ok(self.store.by_ids_with_similarity(&ids, &probe)?)
    }

    pub fn detect_duplicates(&self, entry: &CatalogEntry) -> Result<DuplicateResult> {
        Ok(self.detect_traced(entry)?.result)
    }

    /// Run the pipeline and report where it stopped.
    pub fn detect_traced(&self, entry: &CatalogEntry) -> Result<Detection> {
        let title = required(entry, entry.title.as_deref(), "title")?;
        let notes = required(entry, entry.notes.as_deref(), "notes")?;

        let cluster = self.find_cluster(title)?;
        tracing::debug!(id = %entry.id, cluster = cluster.len(), "phonetic cluster");
        if cluster.is_empty() {
            return Ok(stopped(entry, PipelineExit::NoCluster, 0, 0));
        }

        let similar = self.refine(&cluster, &entry.id, title, notes, entry.original_name.as_deref())?;
        let similar_count = similar.len();
        tracing::debug!(id = %entry.id, similar = similar_count, "similarity refine");
        if similar.is_empty() {
            return Ok(stopped(entry, PipelineExit::NoSimilarCandidates, cluster.len(), 0));
        }

        let matched = filter_by_resources(entry, similar);
        tracing::debug!(id = %entry.id, matched = matched.len(), "resource fingerprint");
        if matched.is_empty() {
            return Ok(stopped(
                entry,
                PipelineExit::NoMatchingResources,
                cluster.len(),
                similar_count,
            ));
        }

        let fingerprint_matches = matched.len();
        let ids: Vec<EntryId> = matched.into_iter().map(|c| c.id).collect();
        let result = resolve(self.store, entry, &ids)?;
        tracing::debug!(
            id = %entry.id,
            original = %result.original.id,
            is_original = result.is_original,
            "resolved"
        );

        Ok(Detection {
            result,
            exit: PipelineExit::Resolved,
            cluster_size: cluster.len(),
            similar: similar_count,
            fingerprint_matches,
        })
    }
}

fn required<'e>(entry: &CatalogEntry, value: Option<&'e str>, field: &'static str) -> Result<&'e str> {
    value.ok_or_else(|| DetectError::MalformedInput {
        id: entry.id.clone(),
        field,
    })
}

fn stopped(entry: &CatalogEntry, exit: PipelineExit, cluster_size: usize, similar: usize) -> Detection {
    Detection {
        result: DuplicateResult::unique(entry.clone()),
        exit,
        cluster_size,
        similar,
        fingerprint_matches: 0,
    }
}

/// Keep candidates whose resource fingerprint equals the query's.
pub fn filter_by_resources(query: &CatalogEntry, candidates: Vec<CandidateSummary>) -> Vec<CandidateSummary> {
    let expected = query.fingerprint();
    candidates
        .into_iter()
        .filter(|c| c.fingerprint() == expected)
        .collect()
}

/// Canonical order: ascending score, then id.
pub fn canonical_order(a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
    score_key(a.duplicate_score)
        .total_cmp(&score_key(b.duplicate_score))
        .then_with(|| a.id.cmp(&b.id))
}

/// `-0.0 + 0.0` is `+0.0`, so both zeros compare equal under `total_cmp`.
fn score_key(score: f64) -> f64 {
    score + 0.0
}

/// Pick the original among the query and the confirmed duplicates.
///
/// No ids means no store call. Otherwise the records are loaded in one batch.
pub fn resolve<B: BatchFetch + ?Sized>(
    store: &B,
    query: &CatalogEntry,
    passed_ids: &[EntryId],
) -> Result<DuplicateResult> {
    if passed_ids.is_empty() {
        return Ok(DuplicateResult::unique(query.clone()));
    }

    let fetched = store.by_ids(passed_ids)?;
    let mut seen: BTreeSet<EntryId> = BTreeSet::new();
    seen.insert(query.id.clone());

    let mut pool = Vec::with_capacity(fetched.len() + 1);
    pool.push(query.clone());
    for entry in fetched {
        if seen.insert(entry.id.clone()) {
            pool.push(entry);
        }
    }
    pool.sort_by(canonical_order);

    let mut members = pool.into_iter();
    let Some(original) = members.next() else {
        return Ok(DuplicateResult::unique(query.clone()));
    };
    Ok(DuplicateResult {
        is_original: original.id == query.id,
        original,
        duplicates: members.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::cell::Cell;

    struct CountingFetch {
        entries: Vec<CatalogEntry>,
        calls: Cell<usize>,
    }

    impl BatchFetch for CountingFetch {
        fn by_ids(&self, ids: &[EntryId]) -> std::result::Result<Vec<CatalogEntry>, StoreError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self
                .entries
                .iter()
                .filter(|e| ids.contains(&e.id))
                .cloned()
                .collect())
        }
    }

    fn summary(id: &str, formats: &[&str]) -> CandidateSummary {
        CandidateSummary {
            id: id.to_string(),
            resource_count: formats.len(),
            resource_formats: formats.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_filter_by_resources_exact_only() {
        let query = CatalogEntry::new("q", "T", "N").with_formats(&["CSV", "PDF"]);
        let kept = filter_by_resources(
            &query,
            vec![
                summary("same", &["PDF", "CSV"]),
                summary("fewer", &["CSV"]),
                summary("more", &["CSV", "PDF", "PDF"]),
                summary("case", &["csv", "PDF"]),
            ],
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "same");
    }

    #[test]
    fn test_filter_by_resources_missing_format() {
        let mut query = CatalogEntry::new("q", "T", "N");
        query.resources.push(Default::default());
        let kept = filter_by_resources(&query, vec![summary("blank", &[""]), summary("csv", &["CSV"])]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "blank");
    }

    #[test]
    fn test_resolve_empty_makes_no_call() {
        let store = CountingFetch {
            entries: vec![],
            calls: Cell::new(0),
        };
        let query = CatalogEntry::new("q", "T", "N");
        let result = resolve(&store, &query, &[]).unwrap();
        assert!(result.is_original);
        assert!(result.duplicates.is_empty());
        assert_eq!(store.calls.get(), 0);
    }

    #[test]
    fn test_resolve_lowest_score_wins() {
        let store = CountingFetch {
            entries: vec![
                CatalogEntry::new("b", "T", "N").with_score(0.0),
                CatalogEntry::new("c", "T", "N").with_score(2.0),
            ],
            calls: Cell::new(0),
        };
        let query = CatalogEntry::new("a", "T", "N").with_score(1.0);
        let result = resolve(&store, &query, &["b".to_string(), "c".to_string()]).unwrap();
        assert!(!result.is_original);
        assert_eq!(result.original.id, "b");
        assert_eq!(result.member_ids(), vec!["b", "a", "c"]);
        assert_eq!(store.calls.get(), 1);
    }

    #[test]
    fn test_resolve_tie_broken_by_id() {
        let store = CountingFetch {
            entries: vec![CatalogEntry::new("a", "T", "N")],
            calls: Cell::new(0),
        };
        let query = CatalogEntry::new("b", "T", "N");
        let result = resolve(&store, &query, &["a".to_string()]).unwrap();
        assert_eq!(result.original.id, "a");
        assert!(!result.is_original);
    }

    #[test]
    fn test_resolve_signed_zero_scores_tie() {
        let store = CountingFetch {
            entries: vec![CatalogEntry::new("a", "T", "N").with_score(0.0)],
            calls: Cell::new(0),
        };
        let query = CatalogEntry::new("b", "T", "N").with_score(-0.0);
        let result = resolve(&store, &query, &["a".to_string()]).unwrap();
        assert_eq!(result.original.id, "a");
        assert_eq!(result.member_ids(), vec!["a", "b"]);

        let a = CatalogEntry::new("a", "T", "N").with_score(0.0);
        let b = CatalogEntry::new("b", "T", "N").with_score(-0.0);
        assert_eq!(canonical_order(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_resolve_ignores_query_echo() {
        let store = CountingFetch {
            entries: vec![CatalogEntry::new("q", "stale", "stale").with_score(0.0)],
            calls: Cell::new(0),
        };
        let query = CatalogEntry::new("q", "T", "N").with_score(5.0);
        let result = resolve(&store, &query, &["q".to_string()]).unwrap();
        assert!(result.is_original);
        assert_eq!(result.original.title.as_deref(), Some("T"));
        assert!(result.duplicates.is_empty());
    }
}
