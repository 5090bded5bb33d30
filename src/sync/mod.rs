mod engine;
pub mod merge;

pub use engine::{SpanProgress, SyncEngine};
