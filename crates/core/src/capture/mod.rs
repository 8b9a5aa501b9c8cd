mod dummy;
mod microphone;

use crate::audio::PcmClip;
use futures::future::BoxFuture;
use std::time::Duration;

pub use dummy::DummyCapture;
pub use microphone::MicrophoneCapture;

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("no audio input device available")]
    NoInputDevice,

    #[error("input device unusable: {0}")]
    DeviceUnusable(String),

    #[error("input stream failed: {0}")]
    StreamFailed(String),

    #[error("capture task failed: {0}")]
    TaskFailed(String),
}

/// Records audio until the limit elapses. Stopping capture does not affect a
/// scoring request already in flight; callers own that lifecycle.
pub trait AudioCapture: Send + Sync {
    fn capture(&self, limit: Duration) -> BoxFuture<'_, Result<PcmClip, CaptureError>>;
}
