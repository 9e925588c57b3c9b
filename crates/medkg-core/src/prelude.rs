//! Prelude: import everything needed to work with medkg types.
//!
//! ```rust
//! use medkg_core::prelude::*;
//! ```

pub use crate::budget::BudgetProfile;
pub use crate::error::{ConfigError, ConfigResult};
pub use crate::retry::{RecordingSleeper, Retryable, RetryPolicy, Sleeper, ThreadSleeper};
pub use crate::types::{
    property_name, Entity, EntityProperty, EntityType, Extraction, PropertyMap, Relation,
    RelationType, RetrievalResult, SecondHop, Triple,
};
