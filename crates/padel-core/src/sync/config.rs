//! Synchronizer configuration.

use serde::{Deserialize, Serialize};

/// Page size used by every list screen.
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// What a push event does to an active search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushPolicy {
    /// Clear the active search and upsert into the paged collection.
    #[default]
    ResetSearch,
    /// Keep the search active. The paged collection is upserted; search
    /// results only have matching elements replaced in place, since a new
    /// record may not match the query.
    Isolated,
}

/// Where a record with an unseen id lands on upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    #[default]
    Back,
    /// Newest first, as the sales screen shows them.
    Front,
}

/// How page completions that resolve out of order are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOrder {
    /// Apply every page as it resolves. Merging stays duplicate-free but the
    /// visual order can be non-monotonic.
    #[default]
    AsResolved,
    /// Drop any page completion older than the latest applied one.
    Sequenced,
}

/// Per-list configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub page_size: u64,
    pub push_policy: PushPolicy,
    pub insert_position: InsertPosition,
    pub apply_order: ApplyOrder,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            push_policy: PushPolicy::default(),
            insert_position: InsertPosition::default(),
            apply_order: ApplyOrder::default(),
        }
    }
}

impl SyncConfig {
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_push_policy(mut self, policy: PushPolicy) -> Self {
        self.push_policy = policy;
        self
    }

    pub fn with_insert_position(mut self, position: InsertPosition) -> Self {
        self.insert_position = position;
        self
    }

    pub fn with_apply_order(mut self, order: ApplyOrder) -> Self {
        self.apply_order = order;
        self
    }
}
