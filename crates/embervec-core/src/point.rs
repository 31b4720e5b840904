//! Point data structures: stored records and search results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Key–value metadata attached to a point.
pub type Payload = Map<String, JsonValue>;

/// A point in a collection.
///
/// A point consists of:
/// - A caller-assigned identifier, unique within its collection
/// - A vector of the collection dimension
/// - A payload (possibly empty)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Unique identifier for the point.
    pub id: u64,

    /// The vector embedding.
    pub vector: Vec<f32>,

    /// Metadata used for filtering and returned with results.
    #[serde(default)]
    pub payload: Payload,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub fn new(id: u64, vector: Vec<f32>, payload: Payload) -> Self {
        Self {
            id,
            vector,
            payload,
        }
    }

    /// Creates a new point with an empty payload.
    #[must_use]
    pub fn without_payload(id: u64, vector: Vec<f32>) -> Self {
        Self::new(id, vector, Payload::new())
    }

    /// Creates a point from a JSON value. Non-object values yield an empty payload.
    #[must_use]
    pub fn from_json(id: u64, vector: Vec<f32>, payload: JsonValue) -> Self {
        Self::new(id, vector, payload_from_json(payload))
    }

    /// Returns the dimension of the vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Converts a JSON value into a payload. Non-object values yield an empty map.
#[must_use]
pub fn payload_from_json(value: JsonValue) -> Payload {
    match value {
        JsonValue::Object(map) => map,
        _ => Payload::new(),
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Point identifier.
    pub id: u64,

    /// Cosine similarity to the query, higher is closer.
    pub score: f32,

    /// Payload of the matching point.
    pub payload: Payload,

    /// Raw distance reported by the accelerated index, if it answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,

    /// Whether the hit came from the accelerated path.
    pub from_ann: bool,
}

/// A page of records returned by a list scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    /// Records in this page, ascending by id.
    pub records: Vec<Point>,

    /// Number of records matching the filter, independent of the page size.
    pub total: usize,
}
