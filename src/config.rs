//! Configuration types for requests and slicing.
//!
//! [`ClientConfig`] holds everything the request client needs: endpoint,
//! credentials, model, sampling and retry settings. It is immutable once
//! built and cheap to clone, so several clients may share one.
//! [`SliceConfig`] holds the driver-level knobs: where section files go and
//! which classification prompt to use.
//!
//! Both are built through builders that validate on `build()`.
//! [`ClientConfig::from_file`] additionally reads the JSON configuration
//! file used by the command-line tool:
//!
//! ```json
//! { "api_key": "sk-...", "model": "gpt-4o", "base_url": "https://api.openai.com/v1" }
//! ```

use crate::client::RetryPolicy;
use crate::error::MdSliceError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// API key value shipped in the sample configuration file.
pub const PLACEHOLDER_API_KEY: &str = "your-api-key-here";

/// Configuration for [`crate::client::RequestClient`].
///
/// # Example
/// ```rust
/// use mdslice::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .model("gpt-4o-mini")
///     .api_key("sk-test")
///     .max_retries(5)
///     .retry_backoff(Duration::from_secs(2))
///     .build()
///     .unwrap();
/// assert_eq!(config.retry_policy().max_attempts, 5);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Model identifier sent with every request. Default: `gpt-4o`.
    pub model: String,

    /// Bearer token. `None` sends no `Authorization` header (local servers).
    pub api_key: Option<String>,

    /// Endpoint root; `/chat/completions` is appended. Default: OpenAI.
    pub base_url: String,

    /// Maximum tokens the model may generate. Default: 4096.
    pub max_tokens: u32,

    /// Sampling temperature, 0.0–2.0. Default: 1.0.
    pub temperature: f32,

    /// Total attempts per request, including the first. Default: 3.
    pub max_retries: u32,

    /// Base of the linear backoff: the wait after attempt `n` is
    /// `retry_backoff * n`. Default: 5 s.
    pub retry_backoff: Duration,

    /// Upper bound of random jitter added to each wait. Default: none.
    pub max_jitter: Duration,

    /// Per-attempt HTTP timeout in seconds. Default: 1200.
    ///
    /// Long generations (whole slide decks, narration scripts) routinely
    /// take several minutes.
    pub api_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: 4096,
            temperature: 1.0,
            max_retries: 3,
            retry_backoff: Duration::from_secs(5),
            max_jitter: Duration::ZERO,
            api_timeout_secs: 1200,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("max_jitter", &self.max_jitter)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

/// On-disk configuration file.
#[derive(Debug, Clone, Deserialize)]
struct FileConfig {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// The retry policy derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            base_backoff: self.retry_backoff,
            max_jitter: self.max_jitter,
        }
    }

    /// Load a builder pre-filled from a JSON configuration file.
    ///
    /// Fields missing from the file keep their defaults. The placeholder key
    /// from the sample file is rejected.
    pub fn from_file(path: impl AsRef<Path>) -> Result<ClientConfigBuilder, MdSliceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| MdSliceError::ConfigLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let file: FileConfig = serde_json::from_str(&text).map_err(|e| MdSliceError::ConfigLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        if file.api_key.as_deref() == Some(PLACEHOLDER_API_KEY) {
            return Err(MdSliceError::ConfigLoad {
                path: path.to_path_buf(),
                detail: format!("replace the placeholder api_key '{PLACEHOLDER_API_KEY}' with a real key"),
            });
        }

        let mut builder = Self::builder();
        if let Some(key) = file.api_key {
            builder = builder.api_key(key);
        }
        if let Some(model) = file.model {
            builder = builder.model(model);
        }
        if let Some(url) = file.base_url {
            builder = builder.base_url(url);
        }
        Ok(builder)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.api_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.retry_backoff = backoff;
        self
    }

    pub fn max_jitter(mut self, jitter: Duration) -> Self {
        self.config.max_jitter = jitter;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, MdSliceError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(MdSliceError::InvalidConfig("Model must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(MdSliceError::InvalidConfig(format!(
                "Base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.max_retries == 0 {
            return Err(MdSliceError::InvalidConfig("Max retries must be ≥ 1".into()));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(MdSliceError::InvalidConfig(format!(
                "Temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(MdSliceError::InvalidConfig("API timeout must be ≥ 1s".into()));
        }
        Ok(self.config)
    }
}

/// Configuration for the slicing driver.
#[derive(Debug, Clone)]
pub struct SliceConfig {
    /// Directory that receives section files. Default: `./sections`.
    pub output_dir: PathBuf,

    /// Classification prompt override. `None` uses
    /// [`crate::prompts::DEFAULT_CLASSIFY_PROMPT`].
    pub classify_prompt: Option<String>,

    /// Extension of written section files, without the dot. Default: `md`.
    pub file_extension: String,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("sections"),
            classify_prompt: None,
            file_extension: "md".to_string(),
        }
    }
}

impl SliceConfig {
    pub fn builder() -> SliceConfigBuilder {
        SliceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Output file path for one label of a document.
    pub fn section_path(&self, document_stem: &str, label: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.{}", document_stem, sanitise_label(label), self.file_extension))
    }
}

/// Labels come from model output; keep them from escaping the output directory.
fn sanitise_label(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Builder for [`SliceConfig`].
#[derive(Debug)]
pub struct SliceConfigBuilder {
    config: SliceConfig,
}

impl SliceConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn classify_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.classify_prompt = Some(prompt.into());
        self
    }

    pub fn file_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.file_extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    pub fn build(self) -> Result<SliceConfig, MdSliceError> {
        if self.config.file_extension.is_empty() {
            return Err(MdSliceError::InvalidConfig(
                "File extension must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
