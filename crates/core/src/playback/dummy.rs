use crate::audio::PcmClip;
use crate::playback::{PlaybackError, PlaybackSink};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Discards audio; used in tests and headless environments.
#[derive(Clone)]
pub struct DummyPlaybackSink;

impl DummyPlaybackSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyPlaybackSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSink for DummyPlaybackSink {
    fn play(&self, clip: PcmClip) -> BoxFuture<'_, Result<(), PlaybackError>> {
        async move {
            tracing::debug!(
                samples = clip.samples.len(),
                duration_ms = clip.duration().as_millis() as u64,
                "dummy playback sink discarding clip"
            );
            Ok(())
        }
        .boxed()
    }
}
