use serde::{Deserialize, Serialize};

use super::message::InputItem;
use crate::Error;

/// A question/answer pair used to steer the model's output style
/// before the real question is asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub question: String,
    pub answer: String,
}

impl Example {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Reject examples with an empty question or answer.
    pub fn validate(&self) -> Result<(), Error> {
        if self.question.trim().is_empty() {
            return Err(Error::InvalidExample("question must not be empty".into()));
        }
        if self.answer.trim().is_empty() {
            return Err(Error::InvalidExample("answer must not be empty".into()));
        }
        Ok(())
    }
}

/// A structured prompt containing a sequence of input items.
#[derive(Debug, Clone)]
pub struct Prompt {
    items: Vec<InputItem>,
}

impl Prompt {
    /// Create a new empty prompt.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a prompt with a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            items: vec![InputItem::system(content.into())],
        }
    }

    /// Create a prompt with a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            items: vec![InputItem::user(content.into())],
        }
    }

    /// Create a few-shot prompt: each example is rendered as a Q/A line pair,
    /// in order, followed by the target question left open for the model.
    ///
    /// Fails if any example has an empty question or answer.
    pub fn few_shot(question: impl AsRef<str>, examples: &[Example]) -> Result<Self, Error> {
        let mut text = String::new();
        for example in examples {
            example.validate()?;
            text.push_str(&format!(
                "Q: {}\nA: {}\n",
                example.question, example.answer
            ));
        }
        text.push_str(&format!("Q: {}\nA:", question.as_ref()));
        Ok(Prompt::user(text))
    }

    /// Create a context-grounded prompt: the model is asked to answer the
    /// question using the supplied context.
    pub fn grounded(context: impl AsRef<str>, question: impl AsRef<str>) -> Self {
        Prompt::user(format!(
            "Context: {}\nQuestion: {}\nAnswer:",
            context.as_ref(),
            question.as_ref()
        ))
    }

    /// Add a system message.
    pub fn with_system(mut self, content: impl Into<String>) -> Self {
        self.items.push(InputItem::system(content.into()));
        self
    }

    /// Add a user message.
    pub fn with_user(mut self, content: impl Into<String>) -> Self {
        self.items.push(InputItem::user(content.into()));
        self
    }

    /// Add an assistant message.
    pub fn with_assistant(mut self, content: impl Into<String>) -> Self {
        self.items.push(InputItem::assistant(content.into()));
        self
    }

    /// Add an input item.
    pub fn with_item(mut self, item: InputItem) -> Self {
        self.items.push(item);
        self
    }

    /// Add multiple input items.
    pub fn with_items(mut self, items: Vec<InputItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Add a response to the conversation.
    /// This converts the response to a sequence of input items, preserving the ordering of text and function calls.
    pub fn with_response(mut self, response: &crate::response::CompleteResponse) -> Self {
        self.items.extend(response.to_items());
        self
    }

    /// Get the input items.
    pub fn items(&self) -> &[InputItem] {
        &self.items
    }
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for Prompt {
    fn from(s: &str) -> Self {
        Prompt::user(s)
    }
}

impl From<String> for Prompt {
    fn from(s: String) -> Self {
        Prompt::user(s)
    }
}

impl From<InputItem> for Prompt {
    fn from(item: InputItem) -> Self {
        Prompt { items: vec![item] }
    }
}

impl From<Vec<InputItem>> for Prompt {
    fn from(items: Vec<InputItem>) -> Self {
        Prompt { items }
    }
}
