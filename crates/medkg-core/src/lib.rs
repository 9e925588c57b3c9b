//! # medkg Core
//!
//! Shared types for the medical knowledge-graph question answering pipeline.
//!
//! - **Entities and relations** extracted from a question ([`Entity`], [`Relation`])
//! - **Retrieved facts** returned by the graph query engine ([`Triple`], [`RetrievalResult`])
//! - **Budget profiles** bounding every traversal phase ([`BudgetProfile`])
//! - **Retry policy** shared by the embedding and completion clients ([`RetryPolicy`])
//!
//! ## Quick Start
//!
//! ```rust
//! use medkg_core::prelude::*;
//!
//! let budget = BudgetProfile::by_name("Deep");
//! assert_eq!(budget.entity_limit, 2);
//!
//! let entity = Entity::new("肺炎", EntityType::Disease);
//! assert!(!entity.is_empty());
//! ```

pub mod budget;
pub mod error;
pub mod prelude;
pub mod retry;
pub mod types;

pub use budget::BudgetProfile;
pub use error::{ConfigError, ConfigResult};
pub use retry::{RecordingSleeper, Retryable, RetryPolicy, Sleeper, ThreadSleeper};
pub use types::*;
