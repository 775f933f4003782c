//! Configuration file parser for ~/.config/zeeguu-feeds/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning for each so
//! typos do not go unnoticed.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides the configured session id.
pub const SESSION_ENV_VAR: &str = "ZEEGUU_SESSION";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// `session` is masked in `Debug` output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Zeeguu API.
    pub api_base_url: String,

    /// Zeeguu session id (alternative to the ZEEGUU_SESSION env var).
    /// Env var takes precedence over config file.
    pub session: Option<String>,

    /// Language of the text being read, used for speech and the feed catalog.
    pub from_language: String,

    /// Minimum press duration before a release counts as press-to-speak.
    pub speech_delay_ms: u64,

    /// Speech synthesizer invoked as `<command> -v <language>`.
    pub speech_command: String,

    /// Timeout for each API request. 0 disables the timeout.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.zeeguu.org".to_string(),
            session: None,
            from_language: "de".to_string(),
            speech_delay_ms: 500,
            speech_command: "espeak-ng".to_string(),
            request_timeout_secs: 20,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("session", &self.session.as_ref().map(|_| "[REDACTED]"))
            .field("from_language", &self.from_language)
            .field("speech_delay_ms", &self.speech_delay_ms)
            .field("speech_command", &self.speech_command)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "api_base_url",
        "session",
        "from_language",
        "speech_delay_ms",
        "speech_command",
        "request_timeout_secs",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            api = %config.api_base_url,
            language = %config.from_language,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Session id to authenticate with: env var first, then the file.
    pub fn session_secret(&self) -> Option<SecretString> {
        std::env::var(SESSION_ENV_VAR)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.session.clone())
            .map(SecretString::from)
    }

    pub fn speech_delay(&self) -> Duration {
        Duration::from_millis(self.speech_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            // tokio::time::timeout with a far-future deadline
            0 => Duration::from_secs(60 * 60 * 24 * 365),
            secs => Duration::from_secs(secs),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
