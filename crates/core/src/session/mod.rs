use crate::audio::{encode_wav, PcmClip};
use crate::capture::{AudioCapture, CaptureError};
use crate::config::DEFAULT_CAPTURE_SECS;
use crate::history::{HistoryError, HistoryRecord, HistoryStore};
use crate::oracle::{AudioPayload, OracleError, ScoringOracle};
use crate::score::{normalize, ScoreError, ScoringResult};
use crate::transcribe::{fold_transcript, transcript_or_fallback, TranscriptionProvider};
use std::path::PathBuf;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("scoring request failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("unusable scoring response: {0}")]
    Score(#[from] ScoreError),

    #[error("history save failed: {0}")]
    History(#[from] HistoryError),

    #[error("could not save clip: {0}")]
    ClipWrite(#[from] std::io::Error),
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub capture_limit: Duration,
    /// Where finished WAV clips are written for later playback. When unset,
    /// clips live only in memory and history records carry no audio path.
    pub clips_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capture_limit: Duration::from_secs(DEFAULT_CAPTURE_SECS),
            clips_dir: None,
        }
    }
}

/// Everything one finished analysis produced.
#[derive(Clone, Debug)]
pub struct AnalysisOutcome {
    pub result: ScoringResult,
    pub transcript: String,
    pub clip: PcmClip,
    pub audio_url: String,
}

/// One analysis session: owns its collaborators and all per-session state,
/// so two sessions never share anything. A new session implicitly abandons
/// whatever an earlier one still had in flight.
pub struct AnalysisSession<C, T, O, H> {
    pub capture: C,
    pub transcriber: T,
    pub oracle: O,
    pub history: H,
    pub config: SessionConfig,
}

impl<C, T, O, H> AnalysisSession<C, T, O, H>
where
    C: AudioCapture,
    T: TranscriptionProvider,
    O: ScoringOracle,
    H: HistoryStore,
{
    pub async fn analyze_live(&self) -> Result<AnalysisOutcome, SessionError> {
        let clip = self.capture.capture(self.config.capture_limit).await?;
        tracing::info!(
            duration_ms = clip.duration().as_millis() as u64,
            "capture finished"
        );
        self.analyze_clip(clip).await
    }

    pub async fn analyze_clip(&self, clip: PcmClip) -> Result<AnalysisOutcome, SessionError> {
        let wav = encode_wav(&clip);

        // Transcription and scoring are independent: a dead recognition
        // engine must not block the emotion verdict.
        let (transcribed, raw_report) = tokio::join!(
            self.transcriber.transcribe(clip.clone()),
            self.oracle.score_audio(AudioPayload::wav(wav.clone()))
        );

        let transcript = match transcribed {
            Ok(segments) => transcript_or_fallback(fold_transcript(segments)),
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed; analysis continues");
                transcript_or_fallback(String::new())
            }
        };

        let result = normalize(&raw_report?)?;

        let audio_url = self.save_clip(&wav)?;
        let record = HistoryRecord::new(transcript.clone(), &result, audio_url.clone());
        self.history.push(record)?;

        Ok(AnalysisOutcome {
            result,
            transcript,
            clip,
            audio_url,
        })
    }

    fn save_clip(&self, wav: &[u8]) -> Result<String, SessionError> {
        let Some(dir) = &self.config.clips_dir else {
            return Ok(String::new());
        };
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("clip-{}.wav", chrono::Utc::now().timestamp_millis()));
        std::fs::write(&path, wav)?;
        Ok(path.to_string_lossy().into_owned())
    }
}
