use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::PathBuf,
    time::{Duration, SystemTime},
};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_CAPTURE_SECS: u64 = 5;
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum InputSource {
    Microphone,
    File(PathBuf),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelName(pub String);

impl ModelName {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyModelName);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelName {
    fn default() -> Self {
        Self(DEFAULT_MODEL.to_owned())
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

/// Generation parameters sent with every scoring request. The values are
/// fixed to match the scoring prompt's expectations rather than tunable
/// per call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 100,
        }
    }
}

/// How long a live microphone capture runs before analysis starts.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureLimit {
    pub secs: u64,
}

impl CaptureLimit {
    pub fn new(secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::ZeroCaptureLimit);
        }
        Ok(Self { secs })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }
}

impl Default for CaptureLimit {
    fn default() -> Self {
        Self {
            secs: DEFAULT_CAPTURE_SECS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub input: InputSource,
    pub model: ModelName,
    pub api_key: Option<ApiKey>,
    pub generation: GenerationParams,
    pub capture_limit: CaptureLimit,
    pub data_dir: PathBuf,
    pub start_time: SystemTime,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("model name must not be empty")]
    EmptyModelName,
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("capture limit must be > 0 seconds")]
    ZeroCaptureLimit,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_GEMINI_API_KEY, "env-key");
        let key = resolve_api_key(Some("cli-key".to_owned()), ENV_GEMINI_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "cli-key");
    }

    #[test]
    fn api_key_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_GEMINI_API_KEY, "env-key");
        let key = resolve_api_key(None, ENV_GEMINI_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "env-key");
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let env = MapEnv::default();
        let err = resolve_api_key(Some("   ".to_owned()), ENV_GEMINI_API_KEY, &env).unwrap_err();
        assert_eq!(err, ConfigError::EmptyApiKey);
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret").expect("valid key");
        assert_eq!(format!("{key:?}"), "ApiKey(**redacted**)");
    }

    #[test]
    fn model_resolution_falls_back_to_default() {
        let env = MapEnv::default();
        let v = resolve_string_with_default(None, ENV_GEMINI_MODEL, &env, DEFAULT_MODEL);
        assert_eq!(v, DEFAULT_MODEL);

        let env = MapEnv::default().with_var(ENV_GEMINI_MODEL, "gemini-1.5-pro");
        let v = resolve_string_with_default(None, ENV_GEMINI_MODEL, &env, DEFAULT_MODEL);
        assert_eq!(v, "gemini-1.5-pro");
    }

    #[test]
    fn capture_limit_rejects_zero() {
        assert_eq!(
            CaptureLimit::new(0).unwrap_err(),
            ConfigError::ZeroCaptureLimit
        );
        assert_eq!(
            CaptureLimit::new(3).expect("nonzero").duration(),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn generation_params_match_the_scoring_contract() {
        let params = GenerationParams::default();
        assert_eq!(params.top_k, 40);
        assert_eq!(params.max_output_tokens, 100);
        assert!((params.temperature - 0.9).abs() < f32::EPSILON);
        assert!((params.top_p - 0.95).abs() < f32::EPSILON);
    }
}
