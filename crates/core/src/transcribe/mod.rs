mod dummy;

use crate::audio::PcmClip;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use dummy::DummyTranscriptionProvider;

/// Transcript shown when the provider produced no final segments.
pub const NO_SPEECH_FALLBACK: &str = "No speech detected";

/// One recognition event. Interim segments carry in-progress hypotheses that
/// only matter for live display; the stored transcript is built from final
/// segments alone.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptSegment {
    pub fn final_text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    pub fn interim<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TranscribeError {
    #[error("transcription engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("transcription failed: {0}")]
    Failed(String),
}

/// Speech-to-text over a finished clip. Failures here are non-fatal to the
/// surrounding analysis; callers degrade to [`NO_SPEECH_FALLBACK`].
pub trait TranscriptionProvider: Send + Sync {
    fn transcribe(
        &self,
        clip: PcmClip,
    ) -> BoxFuture<'_, Result<Vec<TranscriptSegment>, TranscribeError>>;
}

/// Folds a segment sequence into the accumulated transcript: each final
/// segment is appended with a trailing space, interim segments are dropped.
pub fn fold_transcript<I>(segments: I) -> String
where
    I: IntoIterator<Item = TranscriptSegment>,
{
    segments
        .into_iter()
        .filter(|segment| segment.is_final)
        .fold(String::new(), |mut transcript, segment| {
            transcript.push_str(&segment.text);
            transcript.push(' ');
            transcript
        })
}

pub fn transcript_or_fallback(transcript: String) -> String {
    if transcript.trim().is_empty() {
        NO_SPEECH_FALLBACK.to_owned()
    } else {
        transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_keeps_final_segments_in_order() {
        let segments = vec![
            TranscriptSegment::interim("hel"),
            TranscriptSegment::final_text("hello"),
            TranscriptSegment::interim("wor"),
            TranscriptSegment::final_text("world"),
        ];
        assert_eq!(fold_transcript(segments), "hello world ");
    }

    #[test]
    fn fold_of_interim_only_is_empty() {
        let segments = vec![
            TranscriptSegment::interim("a"),
            TranscriptSegment::interim("ab"),
        ];
        assert_eq!(fold_transcript(segments), "");
    }

    #[test]
    fn fallback_replaces_blank_transcripts() {
        assert_eq!(transcript_or_fallback(String::new()), NO_SPEECH_FALLBACK);
        assert_eq!(transcript_or_fallback("  ".to_owned()), NO_SPEECH_FALLBACK);
        assert_eq!(transcript_or_fallback("hi ".to_owned()), "hi ");
    }
}
