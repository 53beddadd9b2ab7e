//! Curation engine: scores fresh articles and selects non-duplicate
//! candidates into the production queue.

mod dedup;
mod engine;
mod scoring;
mod sentiment;
mod trends;

pub use dedup::*;
pub use engine::*;
pub use scoring::*;
pub use sentiment::*;
pub use trends::*;
