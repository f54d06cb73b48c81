use serde::{Deserialize, Serialize};

/// One item of conversation input: a message, a function call the model
/// made earlier, or the output produced for such a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InputItem {
    Message(Message),
    FunctionCall(FunctionCall),
    FunctionCallOutput { call_id: String, output: String },
}

/// A role-tagged text message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl InputItem {
    pub fn system(content: impl Into<String>) -> Self {
        InputItem::Message(Message::new(Role::System, content))
    }

    pub fn user(content: impl Into<String>) -> Self {
        InputItem::Message(Message::new(Role::User, content))
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        InputItem::Message(Message::new(Role::Assistant, content))
    }

    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        InputItem::FunctionCallOutput {
            call_id: call_id.into(),
            output: output.into(),
        }
    }

    /// The textual content of this item, if it carries any.
    pub fn content(&self) -> Option<&str> {
        match self {
            InputItem::Message(msg) => Some(&msg.content),
            InputItem::FunctionCallOutput { output, .. } => Some(output),
            InputItem::FunctionCall(_) => None,
        }
    }

    pub fn get_function_call(&self) -> Option<&FunctionCall> {
        match self {
            InputItem::FunctionCall(call) => Some(call),
            _ => None,
        }
    }
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }
}

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A capability offered to the model. Currently functions only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub r#type: ToolType,
    pub function: Function,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    Function,
}

/// A callable function: name, human-readable description, and a JSON
/// schema describing its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A call the model asked to have executed. `call_id` links the eventual
/// output back to this call; `arguments` is a JSON object as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub id: String,
    pub call_id: String,
    pub name: String,
    pub arguments: String,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}
