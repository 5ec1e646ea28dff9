//! Records and the wire shapes that carry them.
//!
//! The synchronizer itself only needs [`Identified`]; the concrete models
//! here are what the backend actually returns.

pub mod entities;
mod page;
mod types;

pub use page::{Page, PushEvent, PushPayload};
pub use types::{DynRecord, Identified, Record};
