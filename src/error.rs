use thiserror::Error;

/// Everything that can go wrong talking to a completion provider.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{provider} request failed: {message}")]
    Provider { provider: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("stream decoding failed: {0}")]
    Streaming(String),

    #[error("rate limited by provider")]
    RateLimit,

    /// Structured-output parse failure. Keeps the raw model text so callers
    /// can log or retry with it.
    #[error("model output is not valid JSON: {raw}")]
    JsonOutput { raw: String },

    #[error("no function named '{0}' is registered")]
    UnknownFunction(String),

    #[error("invalid few-shot example: {0}")]
    InvalidExample(String),
}

impl Error {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth(message.into())
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Streaming(message.into())
    }

    pub fn json_output(raw: impl Into<String>) -> Self {
        Error::JsonOutput { raw: raw.into() }
    }
}
