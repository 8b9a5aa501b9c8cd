mod dummy;
mod rodio_sink;

use crate::audio::PcmClip;
use futures::future::BoxFuture;

pub use dummy::DummyPlaybackSink;
pub use rodio_sink::RodioPlaybackSink;

#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("audio output unavailable: {details}")]
    AudioOutputUnavailable { details: String },
}

/// Plays a finished clip to the user; blocks until the clip ends.
pub trait PlaybackSink: Send + Sync {
    fn play(&self, clip: PcmClip) -> BoxFuture<'_, Result<(), PlaybackError>>;
}
