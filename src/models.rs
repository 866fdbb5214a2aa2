//! Core data models for duplicate detection.
//!
//! Catalog records, the summaries passed between pipeline stages, detection
//! results and the counters collected over a scan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Type Aliases & Constants
// ============================================================================

/// Opaque catalog identifier.
pub type EntryId = String;

/// Score given to entries that arrive without one.
pub const DEFAULT_DUPLICATE_SCORE: f64 = 1.0;

fn default_duplicate_score() -> f64 {
    DEFAULT_DUPLICATE_SCORE
}

// ============================================================================
// Catalog Models
// ============================================================================

/// A file or link attached to a catalog entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub format: Option<String>,
}

impl Resource {
    pub fn with_format(format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
        }
    }
}

/// One dataset record as seen by the detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Stable slug shared by an entry and all of its copies.
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Lower is more authoritative.
    #[serde(default = "default_duplicate_score")]
    pub duplicate_score: f64,
    /// Free-form metadata (`harvest`, `syndicate`, ...). Carried, never matched on.
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
}

impl CatalogEntry {
    pub fn new(id: &str, title: &str, notes: &str) -> Self {
        Self {
            id: id.to_string(),
            title: Some(title.to_string()),
            notes: Some(notes.to_string()),
            original_name: None,
            resources: Vec::new(),
            duplicate_score: DEFAULT_DUPLICATE_SCORE,
            extras: BTreeMap::new(),
        }
    }

    pub fn with_original_name(mut self, name: &str) -> Self {
        self.original_name = Some(name.to_string());
        self
    }

    pub fn with_formats(mut self, formats: &[&str]) -> Self {
        self.resources = formats.iter().map(|f| Resource::with_format(f)).collect();
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.duplicate_score = score;
        self
    }

    pub fn with_extra(mut self, key: &str, value: &str) -> Self {
        self.extras.insert(key.to_string(), value.to_string());
        self
    }

    /// Resource formats in attachment order, missing formats as "".
    pub fn resource_formats(&self) -> Vec<String> {
        self.resources
            .iter()
            .map(|r| r.format.clone().unwrap_or_default())
            .collect()
    }

    pub fn fingerprint(&self) -> ResourceFingerprint {
        ResourceFingerprint::new(self.resource_formats())
    }
}

// ============================================================================
// Pipeline Models
// ============================================================================

/// A candidate that passed similarity refinement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CandidateSummary {
    pub id: EntryId,
    pub resource_count: usize,
    pub resource_formats: Vec<String>,
}

impl CandidateSummary {
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            resource_count: entry.resources.len(),
            resource_formats: entry.resource_formats(),
        }
    }

    pub fn fingerprint(&self) -> ResourceFingerprint {
        ResourceFingerprint {
            count: self.resource_count,
            formats: sorted(self.resource_formats.clone()),
        }
    }
}

/// Resource count plus the sorted format multiset. Case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceFingerprint {
    pub count: usize,
    pub formats: Vec<String>,
}

impl ResourceFingerprint {
    pub fn new(formats: Vec<String>) -> Self {
        Self {
            count: formats.len(),
            formats: sorted(formats),
        }
    }
}

fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
}

/// Outcome of one detection. Built per query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DuplicateResult {
    pub is_original: bool,
    pub original: CatalogEntry,
    /// Every other group member, ascending by `duplicate_score`.
    pub duplicates: Vec<CatalogEntry>,
}

impl DuplicateResult {
    /// Result for an entry with no duplicates.
    pub fn unique(entry: CatalogEntry) -> Self {
        Self {
            is_original: true,
            original: entry,
            duplicates: Vec::new(),
        }
    }

    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    /// Group member ids, original first.
    pub fn member_ids(&self) -> Vec<EntryId> {
        std::iter::once(&self.original)
            .chain(&self.duplicates)
            .map(|e| e.id.clone())
            .collect()
    }
}

/// Stage at which a detection finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineExit {
    NoCluster,
    NoSimilarCandidates,
    NoMatchingResources,
    Resolved,
}

/// A result plus how far through the pipeline it got.
#[derive(Clone, Debug, Serialize)]
pub struct Detection {
    pub result: DuplicateResult,
    pub exit: PipelineExit,
    pub cluster_size: usize,
    pub similar: usize,
    pub fingerprint_matches: usize,
}

/// Duplicate group as reported by a catalog scan.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DuplicateGroup {
    pub original: EntryId,
    pub duplicates: Vec<EntryId>,
}

impl DuplicateGroup {
    pub fn from_result(result: &DuplicateResult) -> Self {
        Self {
            original: result.original.id.clone(),
            duplicates: result.duplicates.iter().map(|e| e.id.clone()).collect(),
        }
    }
}

// ============================================================================
// Scan Statistics
// ============================================================================

/// Per-stage counters for a catalog scan.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DetectionStats {
    pub entries_scanned: usize,
    pub malformed_entries: usize,

    // Where each detection stopped
    pub exit_no_cluster: usize,
    pub exit_no_similar: usize,
    pub exit_no_matching_resources: usize,
    pub resolved: usize,

    // Funnel totals, summed over detections
    pub cluster_members: usize,
    pub similar_candidates: usize,
    pub fingerprint_matches: usize,

    // Final totals
    pub originals: usize,
    pub duplicates: usize,
    pub groups: usize,

    pub elapsed_seconds: f64,
}

impl DetectionStats {
    pub fn record(&mut self, detection: &Detection) {
        self.entries_scanned += 1;
        match detection.exit {
            PipelineExit::NoCluster => self.exit_no_cluster += 1,
            PipelineExit::NoSimilarCandidates => self.exit_no_similar += 1,
            PipelineExit::NoMatchingResources => self.exit_no_matching_resources += 1,
            PipelineExit::Resolved => self.resolved += 1,
        }
        self.cluster_members += detection.cluster_size;
        self.similar_candidates += detection.similar;
        self.fingerprint_matches += detection.fingerprint_matches;
        if detection.result.is_original {
            self.originals += 1;
        } else {
            self.duplicates += 1;
        }
    }

    pub fn record_malformed(&mut self) {
        self.entries_scanned += 1;
        self.malformed_entries += 1;
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.entries_scanned += other.entries_scanned;
        self.malformed_entries += other.malformed_entries;
        self.exit_no_cluster += other.exit_no_cluster;
        self.exit_no_similar += other.exit_no_similar;
        self.exit_no_matching_resources += other.exit_no_matching_resources;
        self.resolved += other.resolved;
        self.cluster_members += other.cluster_members;
        self.similar_candidates += other.similar_candidates;
        self.fingerprint_matches += other.fingerprint_matches;
        self.originals += other.originals;
        self.duplicates += other.duplicates;
        self.groups += other.groups;
        self.elapsed_seconds = self.elapsed_seconds.max(other.elapsed_seconds);
        self
    }

    /// Share of scanned entries flagged as duplicates, in percent.
    pub fn duplicate_rate(&self) -> f64 {
        if self.entries_scanned == 0 {
            0.0
        } else {
            100.0 * self.duplicates as f64 / self.entries_scanned as f64
        }
    }

    /// Log stats as JSON
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            tracing::info!(phase, "stats\n{}", json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_defaults() {
        let entry: CatalogEntry = serde_json::from_str(r#"{"id": "a", "title": "T"}"#).unwrap();
        assert_eq!(entry.notes, None);
        assert!(entry.resources.is_empty());
        assert_eq!(entry.duplicate_score, DEFAULT_DUPLICATE_SCORE);
        assert!(entry.extras.is_empty());
    }

    #[test]
    fn test_missing_format_is_empty_string() {
        let mut entry = CatalogEntry::new("a", "T", "N").with_formats(&["CSV"]);
        entry.resources.push(Resource::default());
        assert_eq!(entry.resource_formats(), vec!["CSV".to_string(), String::new()]);
    }

    #[test]
    fn test_fingerprint_ignores_order() {
        let a = CatalogEntry::new("a", "T", "N").with_formats(&["CSV", "PDF"]);
        let b = CatalogEntry::new("b", "T", "N").with_formats(&["PDF", "CSV"]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), CandidateSummary::from_entry(&b).fingerprint());
    }

    #[test]
    fn test_fingerprint_case_sensitive() {
        let a = CatalogEntry::new("a", "T", "N").with_formats(&["CSV"]);
        let b = CatalogEntry::new("b", "T", "N").with_formats(&["csv"]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_multiset() {
        let a = CatalogEntry::new("a", "T", "N").with_formats(&["CSV", "CSV", "PDF"]);
        let b = CatalogEntry::new("b", "T", "N").with_formats(&["CSV", "PDF", "PDF"]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_unique_result() {
        let result = DuplicateResult::unique(CatalogEntry::new("a", "T", "N"));
        assert!(result.is_original);
        assert!(!result.has_duplicates());
        assert_eq!(result.member_ids(), vec!["a".to_string()]);
    }

    #[test]
    fn test_stats_record_and_merge() {
        let detection = Detection {
            result: DuplicateResult::unique(CatalogEntry::new("a", "T", "N")),
            exit: PipelineExit::NoCluster,
            cluster_size: 0,
            similar: 0,
            fingerprint_matches: 0,
        };
        let mut left = DetectionStats::default();
        left.record(&detection);
        let mut right = DetectionStats::default();
        right.record_malformed();

        let merged = left.merge(right);
        assert_eq!(merged.entries_scanned, 2);
        assert_eq!(merged.exit_no_cluster, 1);
        assert_eq!(merged.malformed_entries, 1);
        assert_eq!(merged.originals, 1);
        assert_eq!(merged.duplicate_rate(), 0.0);
    }
}
