use crate::audio::PcmClip;
use crate::transcribe::{TranscribeError, TranscriptSegment, TranscriptionProvider};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Stand-in for environments without a recognition engine; yields no
/// segments, so the session falls back to the no-speech transcript.
#[derive(Clone)]
pub struct DummyTranscriptionProvider;

impl DummyTranscriptionProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyTranscriptionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptionProvider for DummyTranscriptionProvider {
    fn transcribe(
        &self,
        _clip: PcmClip,
    ) -> BoxFuture<'_, Result<Vec<TranscriptSegment>, TranscribeError>> {
        async move { Ok(Vec::new()) }.boxed()
    }
}
