//! Metadata filtering for search and list scans.
//!
//! The operator set is closed: equality, numeric ranges (`gt`, `gte`, `lt`,
//! `lte`) and set membership (`any`). Filters are validated when they are
//! built, so matching itself never fails.
//!
//! ## Usage
//!
//! ```rust
//! use embervec_core::filter::{Comparison, Condition, Filter};
//! use serde_json::json;
//!
//! // Built programmatically
//! let filter = Filter::new(Condition::and(vec![
//!     Condition::eq("category", "tech"),
//!     Condition::compare("price", Comparison::Gte, 100.0),
//! ]));
//!
//! // Or parsed from the JSON filter shape
//! let parsed = Filter::from_json(&json!({
//!     "category": "tech",
//!     "price": {"gte": 100},
//!     "tag": {"any": ["a", "b"]}
//! }))
//! .unwrap();
//! # let _ = (filter, parsed);
//! ```

mod builders;
mod conversion;
mod matching;

pub use builders::Comparison;

use crate::point::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A filter for metadata-based search refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// The root condition of the filter.
    pub condition: Condition,
}

impl Filter {
    /// Creates a new filter with the given condition.
    #[must_use]
    pub fn new(condition: Condition) -> Self {
        Self { condition }
    }

    /// Evaluates the filter against a payload.
    #[must_use]
    pub fn matches(&self, payload: &Payload) -> bool {
        self.condition.matches(payload)
    }
}

/// A condition on a payload field. Field names support dot notation for
/// nested objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Equality comparison: field == value
    Eq {
        /// Field name
        field: String,
        /// Value to compare against
        value: Value,
    },
    /// Greater than: field > value
    Gt {
        /// Field name
        field: String,
        /// Numeric bound
        value: f64,
    },
    /// Greater than or equal: field >= value
    Gte {
        /// Field name
        field: String,
        /// Numeric bound
        value: f64,
    },
    /// Less than: field < value
    Lt {
        /// Field name
        field: String,
        /// Numeric bound
        value: f64,
    },
    /// Less than or equal: field <= value
    Lte {
        /// Field name
        field: String,
        /// Numeric bound
        value: f64,
    },
    /// Set membership: field equals any of the values
    In {
        /// Field name
        field: String,
        /// Accepted values
        values: Vec<Value>,
    },
    /// Logical AND of multiple conditions
    And {
        /// Conditions to AND together
        conditions: Vec<Condition>,
    },
}
