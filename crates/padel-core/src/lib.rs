//! padel-core - Types, traits and the incremental list synchronizer for the
//! padel-court administration backend.

pub mod error;
pub mod record;
pub mod sync;
pub mod tokens;
pub mod traits;
pub mod types;

pub use error::Error;
pub use record::entities::{Product, Role, Sale, User};
pub use record::{DynRecord, Identified, Page, PushEvent, PushPayload, Record};
pub use sync::{ListContext, ListSynchronizer, ListView, LoadOutcome, Phase, SyncConfig};
pub use tokens::AccessToken;
pub use traits::{Gateway, PushChannel, PushStream};
pub use types::{BackendUrl, Cursor, EntityName, RecordId};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
