//! Production queue: per-article production records and their state machine.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::*;
pub use store::*;
pub use types::*;
