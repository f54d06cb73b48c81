//! High-level client tying configuration, prompts, providers and responses
//! together.

use serde::de::DeserializeOwned;

use crate::config::Settings;
use crate::factory::ProviderFactory;
use crate::functions::FunctionRegistry;
use crate::structured;
use crate::types::{Example, GenerationRequest, Prompt};
use crate::{Error, Response, TextProvider};

/// Maximum rounds of function-call dispatch before forcing a plain answer.
const MAX_FUNCTION_ROUNDS: usize = 4;

/// A configured client bound to one provider and model.
pub struct Client {
    provider: Box<dyn TextProvider>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Client {
    /// Create a client for the given provider and model.
    pub fn new(provider: Box<dyn TextProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Create a client from `PROVIDER`, `API_KEY` and `MODEL` environment
    /// variables.
    pub fn from_env() -> Result<Self, Error> {
        let settings = Settings::from_env()?;
        let provider = ProviderFactory::create(&settings)?;
        Ok(Self::new(provider, settings.model))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, prompt: &Prompt) -> GenerationRequest {
        let mut request = GenerationRequest::new(&self.model, prompt.items().to_vec());
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request
    }

    /// Generate a streaming response for the prompt.
    pub async fn generate(&self, prompt: &Prompt) -> Result<Response, Error> {
        self.provider.generate(&self.request(prompt)).await
    }

    /// Generate and buffer the response text, trimmed.
    pub async fn text(&self, prompt: &Prompt) -> Result<String, Error> {
        let response = self.generate(prompt).await?;
        Ok(response.text().await?.trim().to_string())
    }

    /// Few-shot prompting: steer the model with Q/A examples before asking
    /// the real question.
    pub async fn few_shot(&self, question: &str, examples: &[Example]) -> Result<String, Error> {
        let prompt = Prompt::few_shot(question, examples)?;
        self.text(&prompt).await
    }

    /// Ask for a JSON-formatted answer and parse it, stripping any code
    /// fences the model wraps it in.
    pub async fn structured_json(&self, question: &str) -> Result<serde_json::Value, Error> {
        let prompt = Prompt::user(structured::json_instruction(question));
        let raw = self.text(&prompt).await?;
        structured::parse_value(&raw)
    }

    /// Like [`Client::structured_json`] but deserializing into a
    /// caller-provided type.
    pub async fn structured<T: DeserializeOwned>(&self, question: &str) -> Result<T, Error> {
        let prompt = Prompt::user(structured::json_instruction(question));
        let raw = self.text(&prompt).await?;
        structured::parse(&raw)
    }

    /// Answer a question grounded in caller-provided context.
    pub async fn answer_with_context(
        &self,
        context: &str,
        question: &str,
    ) -> Result<String, Error> {
        self.text(&Prompt::grounded(context, question)).await
    }

    /// Generate with the registry's functions available as tools, dispatching
    /// any calls the model makes and feeding the results back until the model
    /// produces a plain text answer.
    pub async fn run_with_functions(
        &self,
        prompt: &Prompt,
        registry: &FunctionRegistry,
    ) -> Result<String, Error> {
        let mut conversation = prompt.clone();

        for _ in 0..MAX_FUNCTION_ROUNDS {
            let mut request = self.request(&conversation);
            request.tools = Some(registry.tools());

            let response = self.provider.generate(&request).await?.buffer().await?;
            let calls: Vec<_> = response.function_calls().into_iter().cloned().collect();
            if calls.is_empty() {
                return Ok(response.text().trim().to_string());
            }

            conversation = conversation.with_response(&response);
            for call in &calls {
                conversation = conversation.with_item(registry.execute(call)?);
            }
        }

        // Rounds exhausted; ask for a final answer without tools
        self.text(&conversation).await
    }
}
