use crate::oracle::{AudioPayload, OracleError, ScoringOracle};
use crate::score::EMOTION_LABELS;
use futures::future::BoxFuture;
use futures::FutureExt;

/// Offline stand-in returning a fixed, well-formed report. Useful for
/// exercising the full analysis flow without an API key.
#[derive(Clone)]
pub struct DummyOracle;

impl DummyOracle {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringOracle for DummyOracle {
    fn score_audio(&self, _audio: AudioPayload) -> BoxFuture<'_, Result<String, OracleError>> {
        async move {
            let mut report = String::new();
            for (i, label) in EMOTION_LABELS.iter().enumerate() {
                let score = if i == 0 { 55 } else { 5 };
                report.push_str(&format!("{label}: {score}\n"));
            }
            report.push_str(&format!("WINNER: {}\n", EMOTION_LABELS[0]));
            Ok(report)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::normalize;

    #[tokio::test]
    async fn dummy_report_normalizes_cleanly() {
        let text = DummyOracle::new()
            .score_audio(AudioPayload::wav(vec![0u8]))
            .await
            .expect("dummy never fails");
        let result = normalize(&text).expect("parsable");
        assert_eq!(result.winner, EMOTION_LABELS[0]);
    }
}
