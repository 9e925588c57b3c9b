//! Budget profiles: named bundles of traversal limits.
//!
//! Every phase of a retrieval is bounded by one field of the active profile.
//! Two profiles are built in: `Deeper` (the default) and the tighter `Deep`.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Traversal limits applied to one retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetProfile {
    pub name: String,
    /// Matches returned per entity property lookup.
    pub entity_limit: usize,
    /// Triples returned per anchored relation query.
    pub relation_limit: usize,
    /// Neighbors returned per direction in first-hop expansion.
    pub one_hop_limit: usize,
    /// Neighbors returned per direction in second-hop expansion.
    pub multi_hop_limit: usize,
    /// Triples kept per extracted relation after re-ranking.
    pub top_k_triples: usize,
    /// Candidates expanded in the second hop.
    pub top_k_multi_hop_entities: usize,
}

impl BudgetProfile {
    pub const DEEPER: &'static str = "Deeper";
    pub const DEEP: &'static str = "Deep";

    /// The generous default profile.
    pub fn deeper() -> Self {
        Self {
            name: Self::DEEPER.to_string(),
            entity_limit: 3,
            relation_limit: 10,
            one_hop_limit: 10,
            multi_hop_limit: 3,
            top_k_triples: 5,
            top_k_multi_hop_entities: 5,
        }
    }

    /// A tighter profile for cheaper retrievals.
    pub fn deep() -> Self {
        Self {
            name: Self::DEEP.to_string(),
            entity_limit: 2,
            relation_limit: 8,
            one_hop_limit: 8,
            multi_hop_limit: 2,
            top_k_triples: 4,
            top_k_multi_hop_entities: 4,
        }
    }

    /// Look up a built-in profile, falling back to `Deeper` with a warning.
    pub fn by_name(name: &str) -> Self {
        match name {
            Self::DEEPER => Self::deeper(),
            Self::DEEP => Self::deep(),
            unknown => {
                warn!(
                    profile = unknown,
                    "Unknown search budget profile, using '{}'",
                    Self::DEEPER
                );
                Self::deeper()
            }
        }
    }

    /// Check that every limit is positive.
    pub fn validate(&self) -> ConfigResult<()> {
        let limits = [
            ("entity_limit", self.entity_limit),
            ("relation_limit", self.relation_limit),
            ("one_hop_limit", self.one_hop_limit),
            ("multi_hop_limit", self.multi_hop_limit),
            ("top_k_triples", self.top_k_triples),
            ("top_k_multi_hop_entities", self.top_k_multi_hop_entities),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(ConfigError::invalid(
                    format!("budget.{}", field),
                    value.to_string(),
                    "must be positive",
                ));
            }
        }
        Ok(())
    }
}

impl Default for BudgetProfile {
    fn default() -> Self {
        Self::deeper()
    }
}
