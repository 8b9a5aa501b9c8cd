use crate::audio::PcmClip;
use crate::capture::{AudioCapture, CaptureError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Captures from the default (or a named) input device via cpal. The stream
/// callback appends interleaved samples into a shared buffer; after the limit
/// elapses the stream is dropped and the buffer reduced to mono.
#[derive(Clone, Debug, Default)]
pub struct MicrophoneCapture {
    device_name: Option<String>,
}

impl MicrophoneCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device_name<S: Into<String>>(mut self, name: S) -> Self {
        self.device_name = Some(name.into());
        self
    }

    fn record_blocking(
        device_name: Option<String>,
        limit: Duration,
    ) -> Result<PcmClip, CaptureError> {
        let host = cpal::default_host();
        let device = match device_name.as_deref() {
            Some(wanted) => host
                .input_devices()
                .map_err(|e| CaptureError::DeviceUnusable(e.to_string()))?
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or(CaptureError::NoInputDevice)?,
            None => host.default_input_device().ok_or(CaptureError::NoInputDevice)?,
        };

        let config = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceUnusable(e.to_string()))?;
        let sample_rate_hz = config.sample_rate().0;
        let channels = usize::from(config.channels());

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "<unnamed>".to_owned()),
            sample_rate_hz,
            channels,
            limit_secs = limit.as_secs(),
            "starting microphone capture"
        );

        let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let stream = build_stream(&device, &config, Arc::clone(&buffer))?;
        stream
            .play()
            .map_err(|e| CaptureError::StreamFailed(e.to_string()))?;

        std::thread::sleep(limit);
        drop(stream);

        let interleaved = std::mem::take(
            &mut *buffer
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        let samples = first_channel(&interleaved, channels);
        Ok(PcmClip::new(sample_rate_hz, samples))
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::SupportedStreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
) -> Result<cpal::Stream, CaptureError> {
    let on_error = |err: cpal::StreamError| {
        tracing::warn!(error = %err, "input stream error");
    };

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config.config(),
            move |data: &[f32], _| {
                let mut guard = buffer
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                guard.extend_from_slice(data);
            },
            on_error,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config.config(),
            move |data: &[i16], _| {
                let mut guard = buffer
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                guard.extend(crate::audio::i16_to_f32_pcm(data));
            },
            on_error,
            None,
        ),
        other => {
            return Err(CaptureError::DeviceUnusable(format!(
                "unsupported sample format {other:?}"
            )))
        }
    };

    stream.map_err(|e| CaptureError::StreamFailed(e.to_string()))
}

/// Takes channel 0 of an interleaved buffer, mirroring the single-channel
/// treatment the rest of the analysis path expects.
fn first_channel(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .filter_map(|frame| frame.first().copied())
        .collect()
}

impl AudioCapture for MicrophoneCapture {
    fn capture(&self, limit: Duration) -> BoxFuture<'_, Result<PcmClip, CaptureError>> {
        let device_name = self.device_name.clone();
        async move {
            tokio::task::spawn_blocking(move || Self::record_blocking(device_name, limit))
                .await
                .map_err(|e| CaptureError::TaskFailed(e.to_string()))?
        }
        .boxed()
    }
}
