use crate::config::{ProviderKind, Settings};
use crate::providers::{GoogleProvider, OpenAIProvider};
use crate::{Error, TextProvider};

/// Factory for creating completion providers from configuration.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider from settings.
    pub fn create(settings: &Settings) -> Result<Box<dyn TextProvider>, Error> {
        match settings.provider {
            ProviderKind::OpenAI => {
                let provider = OpenAIProvider::new(settings.api_key.clone())?;
                Ok(Box::new(provider))
            }
            ProviderKind::Google => {
                let provider = GoogleProvider::new(settings.api_key.clone())?;
                Ok(Box::new(provider))
            }
        }
    }

    /// Create a provider from environment variables.
    pub fn from_env() -> Result<Box<dyn TextProvider>, Error> {
        let settings = Settings::from_env()?;
        Self::create(&settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_openai() {
        let settings = Settings::new(ProviderKind::OpenAI, "test-key", "gpt-3.5-turbo");
        assert!(ProviderFactory::create(&settings).is_ok());
    }

    #[test]
    fn test_create_google() {
        let settings = Settings::new(ProviderKind::Google, "test-key", "gemini-2.0-flash");
        assert!(ProviderFactory::create(&settings).is_ok());
    }
}
