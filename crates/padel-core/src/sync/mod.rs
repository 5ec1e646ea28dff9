//! Incremental list synchronization.
//!
//! A [`ListSynchronizer`] combines three sources into one duplicate-free,
//! server-ordered collection per list view:
//!
//! - paged fetches (`skip`/`limit`), appended as the user scrolls,
//! - one-shot searches, shown instead of the paged collection while active,
//! - push events, upserted by id as they arrive.

mod collection;
mod config;
mod notice;
mod synchronizer;


pub use collection::{Collection, Upsert};
pub use config::{ApplyOrder, DEFAULT_PAGE_SIZE, InsertPosition, PushPolicy, SyncConfig};
pub use notice::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use synchronizer::{
    ListContext, ListSynchronizer, ListView, LoadOutcome, Phase, PushOutcome, PushSubscription,
};
