use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// One translatable string of a game script.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalizationRecord {
    pub key: String,
    pub val: String,
    /// Fields we do not touch but must write back.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocalizationRecord {
    pub fn new(key: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            val: val.into(),
            extra: Map::new(),
        }
    }
}

/// A record file loaded in memory, written back to where it came from.
#[derive(Debug)]
pub struct RecordFile {
    path: PathBuf,
    pub records: Vec<LocalizationRecord>,
}

impl RecordFile {
    #[instrument(name = "Loading record file", skip_all, fields(path = ?path.as_ref()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();
        let contents = fs::read_to_string(&path).map_err(|source| RecordError::Read {
            path: path.clone(),
            source,
        })?;
        let records = serde_json::from_str(&contents).map_err(|source| RecordError::Parse {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path, records })
    }

    /// Rewrite the file: 4-space indented JSON, non-ASCII left as is.
    ///
    /// Goes through a temporary file in the same directory so a crash leaves
    /// either the old or the new contents.
    #[instrument(name = "Saving record file", skip_all, fields(path = ?self.path))]
    pub fn save(&self) -> Result<(), RecordError> {
        let write_err = |source: std::io::Error| RecordError::Write {
            path: self.path.clone(),
            source,
        };

        let contents = to_pretty_json(&self.records).map_err(|source| RecordError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&contents).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(records = self.records.len(), "Saved record file");
        Ok(())
    }
}

fn to_pretty_json(records: &[LocalizationRecord]) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;
    Ok(buf)
}
