mod json_file;

use crate::score::ScoringResult;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub use json_file::JsonFileHistoryStore;

/// Only the most recent entries are kept; older ones are evicted by
/// insertion order when a new record arrives.
pub const HISTORY_CAP: usize = 10;

/// Integer percentages for the fixed label set plus the verdict. Labels the
/// model invented beyond the fixed seven are display-only and not persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmotionBreakdown {
    pub happiness: i64,
    pub sadness: i64,
    pub anger: i64,
    pub fear: i64,
    pub surprise: i64,
    pub disgust: i64,
    pub neutral: i64,
    pub winner: String,
}

impl EmotionBreakdown {
    pub fn from_result(result: &ScoringResult) -> Self {
        let rounded = |label: &str| {
            result
                .emotions
                .get(label)
                .map(|v| v.round() as i64)
                .unwrap_or(0)
        };
        Self {
            happiness: rounded("happiness"),
            sadness: rounded("sadness"),
            anger: rounded("anger"),
            fear: rounded("fear"),
            surprise: rounded("surprise"),
            disgust: rounded("disgust"),
            neutral: rounded("neutral"),
            winner: result.winner.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub timestamp: String,
    pub transcript: String,
    pub emotions: EmotionBreakdown,
    #[serde(rename = "audioUrl")]
    pub audio_url: String,
}

impl HistoryRecord {
    pub fn new<S, U>(transcript: S, result: &ScoringResult, audio_url: U) -> Self
    where
        S: Into<String>,
        U: Into<String>,
    {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            transcript: transcript.into(),
            emotions: EmotionBreakdown::from_result(result),
            audio_url: audio_url.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HistoryError {
    #[error("history io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history file corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Append-capped persistence for past analyses, newest first.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError>;
    fn push(&self, record: HistoryRecord) -> Result<(), HistoryError>;
}

/// In-memory store for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let guard = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(guard.clone())
    }

    fn push(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        let mut guard = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.insert(0, record);
        guard.truncate(HISTORY_CAP);
        Ok(())
    }
}
