//! Configuration for template matching

use serde::{Deserialize, Serialize};

/// Threshold assigned to templates without (valid) metadata
pub const DEFAULT_THRESHOLD: f32 = 0.7;
/// Category assigned to templates without metadata
pub const DEFAULT_CATEGORY: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Same-category candidates overlapping a stronger one by more than this IoU are dropped
    pub suppression_threshold: f64,
    /// Only match templates in these categories; `None` matches everything
    pub categories: Option<Vec<String>>,
    /// Cap on raw candidates kept per template before suppression (strongest first)
    pub max_candidates_per_template: Option<usize>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            suppression_threshold: 0.3,
            categories: None,
            max_candidates_per_template: None,
        }
    }
}

impl MatchConfig {
    /// Restrict matching to the given categories
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }
}

/// Preset for hunting: only monster templates, tighter suppression
pub fn create_monster_config() -> MatchConfig {
    MatchConfig {
        suppression_threshold: 0.2,
        categories: Some(vec!["monster".to_string()]),
        max_candidates_per_template: Some(64),
    }
}

pub(crate) fn category_allowed(filter: Option<&[String]>, category: &str) -> bool {
    match filter {
        None => true,
        Some(allowed) => allowed.iter().any(|c| c == category),
    }
}
