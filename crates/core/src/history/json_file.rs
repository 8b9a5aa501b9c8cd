use crate::history::{HistoryError, HistoryRecord, HistoryStore, HISTORY_CAP};
use std::fs;
use std::path::PathBuf;

/// Stores the whole history as one JSON document. Saves are a plain
/// read-modify-write; the file is assumed to belong to a single process at a
/// time, so concurrent writers are last-one-wins.
#[derive(Clone, Debug)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HistoryError::Io(e)),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn push(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        let mut records = self.load()?;
        records.insert(0, record);
        records.truncate(HISTORY_CAP);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&records)?)?;
        Ok(())
    }
}
