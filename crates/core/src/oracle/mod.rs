mod dummy;
mod gemini;

use bytes::Bytes;
use futures::future::BoxFuture;

pub use dummy::DummyOracle;
pub use gemini::GeminiOracle;

pub const WAV_MIME_TYPE: &str = "audio/wav";

/// The prompt sent alongside every clip. The normalization rules in
/// [`crate::score`] enforce the same constraints the prompt asks for, so a
/// model that ignores the instructions still produces a usable result.
pub const SCORING_PROMPT: &str = "\
Analyze this audio and provide emotion scores. IMPORTANT RULES:
1. Make Neutral score very low (maximum 10%)
2. Make one emotion clearly dominant (at least 40%)
3. Format response EXACTLY like this:
Happiness: [score]
Sadness: [score]
Anger: [score]
Fear: [score]
Surprise: [score]
Disgust: [score]
Neutral: [score]

WINNER: [dominant emotion]

Only provide the scores and winner, no other text.";

#[derive(Clone, Debug, PartialEq)]
pub struct AudioPayload {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl AudioPayload {
    pub fn wav(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: WAV_MIME_TYPE.to_owned(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum OracleError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// The hosted model that turns audio into a free-text emotion report.
/// Implementations must not retry; a failed request is terminal for the
/// analysis that issued it.
pub trait ScoringOracle: Send + Sync {
    fn score_audio(&self, audio: AudioPayload) -> BoxFuture<'_, Result<String, OracleError>>;
}
