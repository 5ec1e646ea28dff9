//! Generic record container.

use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// Anything with a stable identity.
///
/// The synchronizer keys every merge on [`Identified::id`]; field contents
/// may change between fetches without affecting identity.
pub trait Identified {
    /// The identifier type.
    type Id: Clone + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync;

    /// Returns this value's identifier.
    fn id(&self) -> &Self::Id;
}

/// A backend record: an `_id` plus entity-specific fields.
///
/// `F` is flattened on the wire, so `{"_id": "A", "total": 150}` decodes as
/// `Record { id: "A", fields: SaleFields { total: 150, .. } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<F> {
    #[serde(rename = "_id")]
    pub id: RecordId,

    #[serde(flatten)]
    pub fields: F,
}

impl<F> Record<F> {
    pub fn new(id: RecordId, fields: F) -> Self {
        Self { id, fields }
    }
}

impl<F> Identified for Record<F> {
    type Id = RecordId;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// Schema-agnostic record, used where the entity shape is not known.
pub type DynRecord = Record<serde_json::Map<String, serde_json::Value>>;

impl DynRecord {
    /// Look up a top-level field.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// Whether any string field contains `needle`, ignoring case.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.fields.values().any(|value| match value {
            serde_json::Value::String(s) => s.to_lowercase().contains(&needle),
            _ => false,
        })
    }
}
