//! Configuration options for identity resolution.

use serde::{Deserialize, Serialize};

/// Evidence categories a record can offer: address, father, mother.
pub const EVIDENCE_CATEGORY_COUNT: usize = 3;

/// How input records are ordered before the single resolution pass.
///
/// Clustering without identity numbers depends on input order, so the same
/// records in a different order can group differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrder {
    /// Process records exactly as supplied.
    #[default]
    AsGiven,
    /// Stable sort by identity number, then declared key, then name-key.
    Presorted,
}

/// Options controlling the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    pub input_order: InputOrder,

    /// Cap on evidence categories that must match.
    ///
    /// A name-only candidate is accepted when at least
    /// `min(available, min_evidence_categories)` of the categories present
    /// on the incoming record overlap the candidate's evidence.
    pub min_evidence_categories: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            input_order: InputOrder::AsGiven,
            min_evidence_categories: 2,
        }
    }
}

impl ResolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every available evidence category must match.
    pub fn strict() -> Self {
        Self {
            input_order: InputOrder::AsGiven,
            min_evidence_categories: EVIDENCE_CATEGORY_COUNT,
        }
    }

    #[must_use]
    pub fn with_input_order(mut self, order: InputOrder) -> Self {
        self.input_order = order;
        self
    }

    #[must_use]
    pub fn with_min_evidence_categories(mut self, count: usize) -> Self {
        self.min_evidence_categories = count.clamp(1, EVIDENCE_CATEGORY_COUNT);
        self
    }

    /// Number of matching categories required given how many are available.
    pub fn required_matches(&self, available: usize) -> usize {
        available.min(self.min_evidence_categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requires_two_of_three() {
        let options = ResolverOptions::default();
        assert_eq!(options.required_matches(3), 2);
        assert_eq!(options.required_matches(2), 2);
        assert_eq!(options.required_matches(1), 1);
        assert_eq!(options.required_matches(0), 0);
    }

    #[test]
    fn strict_requires_all_available() {
        let options = ResolverOptions::strict();
        assert_eq!(options.required_matches(3), 3);
        assert_eq!(options.required_matches(1), 1);
    }

    #[test]
    fn evidence_cap_is_clamped() {
        let options = ResolverOptions::new().with_min_evidence_categories(9);
        assert_eq!(options.min_evidence_categories, 3);
        let options = ResolverOptions::new().with_min_evidence_categories(0);
        assert_eq!(options.min_evidence_categories, 1);
    }
}
