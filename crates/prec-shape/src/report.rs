//! Diagnostics collected while building a shape.

use prec_frame::CutReport;
use serde::{Deserialize, Serialize};

/// A category dropped for lack of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCategory {
    /// Category label.
    pub label: String,
    /// Rows inside the observable.
    pub entries: usize,
    /// Threshold in force.
    pub min_entries: usize,
}

/// Cache access for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEvent {
    /// Category label.
    pub label: String,
    /// Entry digest.
    pub key: String,
    /// Entry path.
    pub path: String,
    /// Whether the entry existed.
    pub hit: bool,
}

/// What happened during one [`crate::Prec::get_sum`] call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildReport {
    /// Selection, category and mass-window cuts in application order.
    pub cut_flow: CutReport,
    /// One entry per category when caching is on.
    pub cache: Vec<CacheEvent>,
    /// Categories excluded by the entries threshold.
    pub skipped: Vec<SkippedCategory>,
    /// Labels of the categories that made it into the shape.
    pub components: Vec<String>,
    /// Rows of the combined table matching no category. Only known when the
    /// combined table was built, i.e. not on an all-hit call.
    pub unmatched_rows: Option<usize>,
}

impl BuildReport {
    /// Cache keys in category order.
    pub fn cache_keys(&self) -> Vec<&str> {
        self.cache.iter().map(|event| event.key.as_str()).collect()
    }

    /// True when every category was served from the cache.
    pub fn all_cache_hits(&self) -> bool {
        !self.cache.is_empty() && self.cache.iter().all(|event| event.hit)
    }
}
