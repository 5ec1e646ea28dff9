//! Wire shapes for paged results and push events.

use serde::{Deserialize, Serialize};

use crate::types::EntityName;

/// One page of records plus the server's total count.
///
/// Wire format: `{"array": [...], "longitud": 40}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "array")]
    pub items: Vec<T>,

    /// Total number of records matching the unfiltered query.
    #[serde(rename = "longitud")]
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

/// An upsert delivered by a push channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent<T> {
    /// The stream the event arrived on.
    pub entity: EntityName,
    /// The created or updated record.
    pub record: T,
}

impl<T> PushEvent<T> {
    pub fn new(entity: EntityName, record: T) -> Self {
        Self { entity, record }
    }
}

/// The payload carried by each push event: `{"data": <record>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPayload<T> {
    pub data: T,
}
