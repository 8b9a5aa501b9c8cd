use crate::config::{ApiKey, GenerationParams, ModelName};
use crate::oracle::{AudioPayload, OracleError, ScoringOracle, SCORING_PROMPT};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";

#[derive(Clone)]
pub struct GeminiOracle {
    client: Client,
    api_key: ApiKey,
    model: ModelName,
    generation: GenerationParams,
    base_url: String,
}

impl GeminiOracle {
    pub fn new(api_key: ApiKey, model: ModelName, generation: GenerationParams) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            generation,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn build_request(&self, audio: &AudioPayload) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart {
                        text: Some(SCORING_PROMPT.to_owned()),
                        inline_data: None,
                    },
                    RequestPart {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: audio.mime_type.clone(),
                            data: BASE64_STANDARD.encode(&audio.bytes),
                        }),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.generation.temperature,
                top_k: self.generation.top_k,
                top_p: self.generation.top_p,
                max_output_tokens: self.generation.max_output_tokens,
            },
        }
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

// Every field on the response path is optional so a shape mismatch surfaces
// as a typed InvalidResponse instead of a deserialization panic deeper in.
#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> Result<String, OracleError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .and_then(|parts| parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| {
            OracleError::InvalidResponse(
                "missing candidates[0].content.parts[0].text".to_owned(),
            )
        })
}

impl ScoringOracle for GeminiOracle {
    fn score_audio(&self, audio: AudioPayload) -> BoxFuture<'_, Result<String, OracleError>> {
        let this = self.clone();
        async move {
            let url = format!(
                "{}/models/{}:generateContent?key={}",
                this.base_url,
                this.model.as_str(),
                this.api_key.expose()
            );
            let request = this.build_request(&audio);

            tracing::debug!(
                model = %this.model.as_str(),
                payload_bytes = audio.bytes.len(),
                "requesting emotion scores"
            );

            let response = this
                .client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(OracleError::Network)?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_owned());
                return Err(OracleError::Api { status, body });
            }

            let parsed: GenerateContentResponse = response
                .json()
                .await
                .map_err(|e| OracleError::InvalidResponse(format!("failed to parse JSON: {e}")))?;

            extract_text(parsed)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle() -> GeminiOracle {
        let key = ApiKey::new("test-key").expect("valid key");
        GeminiOracle::new(key, ModelName::default(), GenerationParams::default())
    }

    #[test]
    fn request_body_carries_prompt_audio_and_generation_config() {
        let payload = AudioPayload::wav(vec![1u8, 2, 3]);
        let request = oracle().build_request(&payload);
        let body = serde_json::to_value(&request).expect("serializable");

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], SCORING_PROMPT);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "audio/wav");
        assert_eq!(parts[1]["inline_data"]["data"], "AQID");

        let config = &body["generationConfig"];
        assert_eq!(config["topK"], 40);
        assert_eq!(config["maxOutputTokens"], 100);
    }

    #[test]
    fn text_parts_omit_inline_data_field() {
        let payload = AudioPayload::wav(vec![0u8]);
        let request = oracle().build_request(&payload);
        let body = serde_json::to_value(&request).expect("serializable");
        let text_part = body["contents"][0]["parts"][0]
            .as_object()
            .expect("object");
        assert!(!text_part.contains_key("inline_data"));
    }

    #[test]
    fn extract_text_walks_the_fixed_path() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Happiness: 50"}]}}]}"#,
        )
        .expect("valid fixture");
        assert_eq!(extract_text(parsed).expect("text"), "Happiness: 50");
    }

    #[test]
    fn missing_text_path_is_an_invalid_response() {
        let fixtures = [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{"content":null}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{}]}}]}"#,
        ];
        for fixture in fixtures {
            let parsed: GenerateContentResponse =
                serde_json::from_str(fixture).expect("valid fixture");
            assert!(
                matches!(extract_text(parsed), Err(OracleError::InvalidResponse(_))),
                "fixture {fixture} should not yield text"
            );
        }
    }
}
