//! Environment-driven configuration.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Model used when `MODEL` is unset and the provider is Google.
pub const DEFAULT_GOOGLE_MODEL: &str = "gemini-2.0-flash";
/// Model used when `MODEL` is unset and the provider is OpenAI.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Supported completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    OpenAI,
}

impl ProviderKind {
    /// The model used for this provider when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Google => DEFAULT_GOOGLE_MODEL,
            ProviderKind::OpenAI => DEFAULT_OPENAI_MODEL,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "openai" => Ok(ProviderKind::OpenAI),
            other => Err(Error::config(format!(
                "Unsupported provider '{other}'. Valid values are: google, openai"
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Google => write!(f, "google"),
            ProviderKind::OpenAI => write!(f, "openai"),
        }
    }
}

/// Configuration resolved once at startup, immutable afterward.
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
}

impl Settings {
    pub fn new(
        provider: ProviderKind,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Load settings from `PROVIDER`, `API_KEY` and `MODEL` environment variables.
    ///
    /// `PROVIDER` defaults to `google`; `MODEL` defaults per provider.
    /// A missing `API_KEY` is an error.
    pub fn from_env() -> Result<Self, Error> {
        Self::resolve(|key| env::var(key).ok())
    }

    /// Resolve settings through a lookup function. Empty values are treated
    /// as unset.
    fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let provider = match lookup("PROVIDER").filter(|v| !v.trim().is_empty()) {
            Some(value) => value.parse()?,
            None => ProviderKind::Google,
        };

        let api_key = lookup("API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::config("API_KEY environment variable is required"))?;

        let model = lookup("MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        Ok(Self {
            provider,
            api_key,
            model,
        })
    }
}
