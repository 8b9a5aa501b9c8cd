mod normalize;

use std::fmt;

pub use normalize::normalize;

/// The emotion categories the scoring prompt asks for, in prompt order.
pub const EMOTION_LABELS: [&str; 7] = [
    "happiness",
    "sadness",
    "anger",
    "fear",
    "surprise",
    "disgust",
    "neutral",
];

pub const NEUTRAL_LABEL: &str = "neutral";

/// Maximum share the neutral category may keep; the rest is redistributed.
pub const NEUTRAL_CEILING: f64 = 10.0;

/// Minimum share the dominant emotion is forced up to.
pub const DOMINANCE_FLOOR: f64 = 40.0;

/// Insertion-ordered label -> score mapping.
///
/// Extraction order is load-bearing: ties for the dominant emotion are broken
/// by whichever label was extracted first, so a plain sorted map would give
/// different winners.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmotionScores {
    entries: Vec<(String, f64)>,
}

impl EmotionScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    /// Inserts or overwrites. An overwritten label keeps its original
    /// position, matching the last-occurrence-wins extraction rule.
    pub fn set(&mut self, label: &str, value: f64) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, v)) => *v = value,
            None => self.entries.push((label.to_owned(), value)),
        }
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), *v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut f64)> {
        self.entries.iter_mut().map(|(l, v)| (l.as_str(), v))
    }
}

/// A normalized distribution plus the recomputed dominant label.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringResult {
    pub emotions: EmotionScores,
    pub winner: String,
}

impl fmt::Display for ScoringResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.emotions.iter() {
            writeln!(f, "{label}: {}%", value.round() as i64)?;
        }
        write!(f, "Verdict: {}", self.winner)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("no emotion scores found")]
    NoScores,
}
