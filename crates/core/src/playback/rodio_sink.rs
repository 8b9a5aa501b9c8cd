use crate::audio::PcmClip;
use crate::playback::{PlaybackError, PlaybackSink};
use futures::future::BoxFuture;
use futures::FutureExt;
use rodio::source::Source;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use std::sync::{Arc, Mutex};

/// Rodio-backed playback.
///
/// The [`OutputStream`] is opened lazily and kept alive across clips: opening
/// a fresh stream per play drops the previous one mid-clip and truncates or
/// blanks the audio.
#[derive(Clone)]
pub struct RodioPlaybackSink {
    output_stream: Arc<Mutex<Option<OutputStream>>>,
}

impl RodioPlaybackSink {
    pub fn new() -> Self {
        Self {
            output_stream: Arc::new(Mutex::new(None)),
        }
    }

    fn connect_sink(&self) -> Result<Sink, PlaybackError> {
        let mut guard = self
            .output_stream
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if guard.is_none() {
            let stream = OutputStreamBuilder::open_default_stream().map_err(|e| {
                PlaybackError::AudioOutputUnavailable {
                    details: e.to_string(),
                }
            })?;
            *guard = Some(stream);
        }

        match guard.as_ref() {
            Some(stream) => {
                let mixer = stream.mixer();
                Ok(Sink::connect_new(&mixer))
            }
            None => Err(PlaybackError::AudioOutputUnavailable {
                details: "output stream cache invariant violated".to_owned(),
            }),
        }
    }
}

impl Default for RodioPlaybackSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSink for RodioPlaybackSink {
    fn play(&self, clip: PcmClip) -> BoxFuture<'_, Result<(), PlaybackError>> {
        async move {
            if clip.sample_rate_hz == 0 || clip.samples.is_empty() {
                tracing::warn!(
                    sample_rate_hz = clip.sample_rate_hz,
                    samples = clip.samples.len(),
                    "skipping playback of empty clip"
                );
                return Ok(());
            }

            let sink = self.connect_sink()?;
            sink.append(ClipSource::new(clip));
            sink.sleep_until_end();
            Ok(())
        }
        .boxed()
    }
}

struct ClipSource {
    samples: std::vec::IntoIter<f32>,
    sample_rate: u32,
}

impl ClipSource {
    fn new(clip: PcmClip) -> Self {
        Self {
            sample_rate: clip.sample_rate_hz,
            samples: clip.samples.into_iter(),
        }
    }
}

impl Iterator for ClipSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        self.samples.next()
    }
}

impl Source for ClipSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<std::time::Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_source_is_mono_at_the_clip_rate() {
        let clip = PcmClip::new(16_000, vec![0.5, -0.5]);
        let source = ClipSource::new(clip);
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 16_000);
        assert_eq!(source.collect::<Vec<_>>(), vec![0.5, -0.5]);
    }
}
