use crate::audio::{PcmClip, ANALYSIS_SAMPLE_RATE};
use bytes::Bytes;
use ffmpeg_sidecar::{download, paths::ffmpeg_path};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::io::AsyncWriteExt;

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("ffmpeg unavailable: {0}")]
    FfmpegUnavailable(String),

    #[error("ffmpeg failed: {0}")]
    FfmpegFailed(String),

    #[error("invalid pcm output: {0}")]
    InvalidPcm(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Turns the raw bytes of an uploaded audio file into an analysis clip.
pub trait AudioFileDecoder: Send + Sync {
    fn decode(&self, file_bytes: Bytes) -> BoxFuture<'_, Result<PcmClip>>;
}

/// Pipes the file through an ffmpeg child process, resampling whatever
/// container/codec the user uploaded down to mono f32 at the analysis rate.
#[derive(Clone, Debug)]
pub struct FfmpegFileDecoder {
    sample_rate_hz: u32,
}

impl Default for FfmpegFileDecoder {
    fn default() -> Self {
        Self {
            sample_rate_hz: ANALYSIS_SAMPLE_RATE,
        }
    }
}

impl FfmpegFileDecoder {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self { sample_rate_hz }
    }

    fn ensure_ffmpeg_available(&self) -> Result<()> {
        download::auto_download().map_err(|e| DecodeError::FfmpegUnavailable(e.to_string()))
    }

    async fn run_ffmpeg(&self, file_bytes: Bytes) -> Result<Vec<u8>> {
        let rate = self.sample_rate_hz.to_string();
        let mut child = tokio::process::Command::new(ffmpeg_path())
            .args([
                "-hide_banner",
                "-nostdin",
                "-loglevel",
                "error",
                "-i",
                "pipe:0",
                "-vn",
                "-sn",
                "-dn",
                "-ac",
                "1",
                "-ar",
                rate.as_str(),
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "pipe:1",
            ])
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            DecodeError::FfmpegFailed("ffmpeg stdin unavailable (pipe not created)".to_owned())
        })?;

        let feed = async move {
            stdin.write_all(&file_bytes).await?;
            stdin.shutdown().await
        };

        let (feed_result, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(DecodeError::FfmpegFailed(format!(
                "exit_code={:?} stderr={stderr}",
                output.status.code()
            )));
        }

        // A broken pipe with a successful exit means ffmpeg stopped reading
        // early (trailing junk in the container); anything else is fatal.
        if let Err(e) = feed_result {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(DecodeError::FfmpegFailed(e.to_string()));
            }
        }

        Ok(output.stdout)
    }
}

fn parse_f32le(raw: &[u8]) -> Result<Vec<f32>> {
    if !raw.len().is_multiple_of(4usize) {
        return Err(DecodeError::InvalidPcm(format!(
            "f32le byte length must be multiple of 4, got {}",
            raw.len()
        )));
    }
    let mut out = Vec::with_capacity(raw.len() / 4);
    for chunk in raw.chunks_exact(4) {
        out.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(out)
}

impl AudioFileDecoder for FfmpegFileDecoder {
    fn decode(&self, file_bytes: Bytes) -> BoxFuture<'_, Result<PcmClip>> {
        let this = self.clone();
        async move {
            this.ensure_ffmpeg_available()?;
            let raw = this.run_ffmpeg(file_bytes).await?;
            let samples = parse_f32le(&raw)?;
            if samples.is_empty() {
                return Err(DecodeError::InvalidPcm(
                    "decoded zero samples; not an audio file?".to_owned(),
                ));
            }
            Ok(PcmClip::new(this.sample_rate_hz, samples))
        }
        .boxed()
    }
}
