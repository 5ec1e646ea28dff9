//! Core value types.
//!
//! These types enforce their invariants at construction time, so a
//! zero-limit cursor or an entity name with a path separator cannot exist.

mod backend_url;
mod cursor;
mod entity_name;
mod record_id;

pub use backend_url::BackendUrl;
pub use cursor::Cursor;
pub use entity_name::EntityName;
pub use record_id::RecordId;
