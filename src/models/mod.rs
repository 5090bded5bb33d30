pub mod record;

pub use record::{LocalizationRecord, RecordFile};
