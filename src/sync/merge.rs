use crate::error::RecordError;
use crate::models::{LocalizationRecord, RecordFile};
use std::path::Path;
use tracing::{debug, instrument};

/// Marks a line that is intentionally left blank in the translation.
pub const BLANK_SENTINEL: &str = "¤";

/// Control-code tokens translators type as plain hex, in replacement order.
const CONTROL_TOKENS: [&str; 13] = [
    "001C", "001D", "0017", "0014", "0015", "0019", "001A", "001B", "0018", "0016", "00A0",
    "001E", "001F",
];

const KEY_COLUMN: usize = 1;
const VALUE_COLUMN: usize = 2;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeStats {
    pub rows: usize,
    pub skipped_rows: usize,
    pub updated_records: usize,
}

/// Replace each control-code token with its textual escape, `001C` -> `u"\x001C"`.
pub fn sanitize(text: &str) -> String {
    CONTROL_TOKENS
        .iter()
        .fold(text.to_string(), |text, token| {
            text.replace(token, &format!("u\"\\x{}\"", token))
        })
}

/// Apply sheet rows to records matched by key.
///
/// Rows need at least three cells: label, key, translation. Every record with
/// the row's key is updated, not just the first. An empty translation resets
/// the value to the key itself; [`BLANK_SENTINEL`] clears it.
pub fn merge_rows(rows: &[Vec<String>], records: &mut [LocalizationRecord]) -> MergeStats {
    let mut stats = MergeStats::default();

    for row in rows {
        stats.rows += 1;
        if row.len() <= VALUE_COLUMN {
            stats.skipped_rows += 1;
            continue;
        }

        let key = &row[KEY_COLUMN];
        let translation = &row[VALUE_COLUMN];

        for record in records.iter_mut().filter(|r| r.key == *key) {
            record.val = match translation.as_str() {
                "" => record.key.clone(),
                BLANK_SENTINEL => String::new(),
                text => sanitize(text),
            };
            stats.updated_records += 1;
        }
    }

    stats
}

/// Merge rows into the record file at `path` and write it back.
#[instrument(name = "Merging rows", skip_all, fields(path = ?path.as_ref()))]
pub fn merge_into_file(
    rows: &[Vec<String>],
    path: impl AsRef<Path>,
) -> Result<MergeStats, RecordError> {
    let mut file = RecordFile::load(path)?;
    let stats = merge_rows(rows, &mut file.records);
    file.save()?;

    debug!(?stats, "Merged rows");
    Ok(stats)
}
