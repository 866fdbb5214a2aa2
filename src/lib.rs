//! Duplicate dataset detection for data catalogs.
//!
//! Entries are grouped by the phonetic code of their title, narrowed by strict
//! similarity of title, notes and original_name, confirmed by their resource
//! fingerprint, and finally ranked so that exactly one member of each group is
//! the original.

pub mod config;
pub mod detect;
pub mod error;
pub mod memory;
pub mod models;
pub mod normalize;
pub mod phonetic;
pub mod progress;
pub mod safety;
pub mod similarity;
pub mod sqlite;
pub mod store;

pub use config::DetectorConfig;
pub use detect::DuplicateDetector;
pub use error::{DetectError, StoreError};
pub use memory::MemoryCatalog;
pub use models::{CatalogEntry, DuplicateResult, Resource};
pub use sqlite::SqliteCatalog;
