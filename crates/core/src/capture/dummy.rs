use crate::audio::{PcmClip, ANALYSIS_SAMPLE_RATE};
use crate::capture::{AudioCapture, CaptureError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;

/// Produces a synthesized tone instead of touching any device. Handy for
/// driving the analysis flow in tests and on machines without a microphone.
#[derive(Clone, Debug)]
pub struct DummyCapture {
    pub frequency_hz: f32,
}

impl DummyCapture {
    pub fn new() -> Self {
        Self { frequency_hz: 440.0 }
    }
}

impl Default for DummyCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCapture for DummyCapture {
    fn capture(&self, limit: Duration) -> BoxFuture<'_, Result<PcmClip, CaptureError>> {
        let frequency = self.frequency_hz;
        async move {
            let total = (limit.as_secs_f64() * f64::from(ANALYSIS_SAMPLE_RATE)) as usize;
            let samples = (0..total)
                .map(|i| {
                    let t = i as f32 / ANALYSIS_SAMPLE_RATE as f32;
                    0.5 * (std::f32::consts::TAU * frequency * t).sin()
                })
                .collect();
            Ok(PcmClip::new(ANALYSIS_SAMPLE_RATE, samples))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dummy_clip_matches_the_requested_length() {
        let clip = DummyCapture::new()
            .capture(Duration::from_secs(2))
            .await
            .expect("dummy never fails");
        assert_eq!(clip.sample_rate_hz, ANALYSIS_SAMPLE_RATE);
        assert_eq!(clip.samples.len(), 32_000);
        assert!(clip.samples.iter().all(|s| s.abs() <= 0.5));
    }
}
