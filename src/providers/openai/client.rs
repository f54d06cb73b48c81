use super::types::{
    ChatCompletionChunk, ChatFunctionCall, ChatFunctionDef, ChatMessage, ChatRequest, ChatTool,
    ChatToolCall, StreamOptions,
};
use crate::provider::TextProvider;
use crate::sse_stream::SseStream;
use crate::types::{FinishReason, FunctionCall, InputItem, ItemKind, Role};
use crate::{Error, GenerationRequest, Response, StreamEvent};
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

/// OpenAI provider implementation (Chat Completions API).
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::new_with_base_url(api_key, "https://api.openai.com/v1".to_string())
    }

    /// Point the client at a different base URL (used by the HTTP tests).
    pub fn new_with_base_url(api_key: String, base_url: String) -> Result<Self, Error> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    /// Convert the internal request to Chat Completions format.
    fn convert_request(&self, request: &GenerationRequest) -> ChatRequest {
        let messages = request.messages.iter().map(Self::convert_message).collect();

        ChatRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            stop: request.stop.clone(),
            tools: request.tools.as_ref().map(|tools| Self::convert_tools(tools)),
            stream: None, // Set by generate
            stream_options: None,
        }
    }

    /// Convert an internal conversation item to a chat message.
    fn convert_message(item: &InputItem) -> ChatMessage {
        match item {
            InputItem::Message(msg) => {
                let role = match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };

                ChatMessage {
                    role: role.to_string(),
                    content: Some(msg.content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                }
            }
            InputItem::FunctionCall(call) => ChatMessage {
                role: "assistant".to_string(),
                content: None,
                tool_calls: Some(vec![ChatToolCall {
                    id: call.call_id.clone(),
                    r#type: "function".to_string(),
                    function: ChatFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                }]),
                tool_call_id: None,
            },
            InputItem::FunctionCallOutput { call_id, output } => ChatMessage {
                role: "tool".to_string(),
                content: Some(output.clone()),
                tool_calls: None,
                tool_call_id: Some(call_id.clone()),
            },
        }
    }

    /// Convert internal tools to OpenAI wire format.
    fn convert_tools(tools: &[crate::types::Tool]) -> Vec<ChatTool> {
        tools
            .iter()
            .map(|tool| ChatTool {
                r#type: "function".to_string(),
                function: ChatFunctionDef {
                    name: tool.function.name.clone(),
                    description: tool.function.description.clone(),
                    parameters: tool.function.parameters.clone(),
                },
            })
            .collect()
    }

    fn map_finish_reason(reason: &str) -> FinishReason {
        match reason {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "tool_calls" => FinishReason::ToolCalls,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        }
    }

    /// Convert a streamed chunk into stream events, accumulating tool-call
    /// argument fragments so only complete calls are emitted.
    fn convert_chunk(chunk: ChatCompletionChunk, state: &mut ChatStreamState) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(choice) = chunk.choices.first() {
            if let Some(content) = &choice.delta.content {
                if !state.text_started {
                    events.push(StreamEvent::ItemStarted { kind: ItemKind::Text });
                    state.text_started = true;
                }
                if !content.is_empty() {
                    events.push(StreamEvent::TextDelta {
                        text: content.clone(),
                    });
                }
            }

            if let Some(tool_deltas) = &choice.delta.tool_calls {
                for delta in tool_deltas {
                    let index = delta.index as usize;
                    while state.partial_calls.len() <= index {
                        state.partial_calls.push(PartialToolCall::default());
                    }
                    let slot = &mut state.partial_calls[index];

                    if let Some(id) = &delta.id {
                        slot.id = id.clone();
                    }
                    if let Some(function) = &delta.function {
                        if let Some(name) = &function.name {
                            slot.name.push_str(name);
                        }
                        if let Some(arguments) = &function.arguments {
                            slot.arguments.push_str(arguments);
                        }
                    }

                    if !slot.announced && !slot.name.is_empty() {
                        events.push(StreamEvent::ItemStarted {
                            kind: ItemKind::FunctionCall {
                                name: slot.name.clone(),
                                id: slot.id.clone(),
                            },
                        });
                        slot.announced = true;
                    }
                }
            }

            if let Some(reason) = &choice.finish_reason {
                for slot in state.partial_calls.drain(..) {
                    let arguments = if slot.arguments.is_empty() {
                        "{}".to_string()
                    } else {
                        slot.arguments
                    };
                    events.push(StreamEvent::FunctionCallDone {
                        call: FunctionCall {
                            id: slot.id.clone(),
                            call_id: slot.id,
                            name: slot.name,
                            arguments,
                        },
                    });
                }
                state.finish_reason = Some(Self::map_finish_reason(reason));
            }
        }

        // With include_usage, the final chunk carries token counts and no choices
        if let Some(usage) = chunk.usage {
            events.push(StreamEvent::Finished {
                reason: state.finish_reason.take().unwrap_or(FinishReason::Stop),
                usage: usage.into(),
            });
        }

        events
    }
}

/// Accumulation state for a single streamed chat completion.
#[derive(Debug, Default)]
struct ChatStreamState {
    text_started: bool,
    partial_calls: Vec<PartialToolCall>,
    finish_reason: Option<FinishReason>,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
    announced: bool,
}

#[async_trait::async_trait]
impl TextProvider for OpenAIProvider {
    /// Generate a chat completion (internally always streams).
    async fn generate(&self, request: &GenerationRequest) -> Result<Response, Error> {
        let mut chat_request = self.convert_request(request);
        chat_request.stream = Some(true);
        chat_request.stream_options = Some(StreamOptions {
            include_usage: true,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&chat_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            tracing::error!("OpenAI API error ({status}): {error_text}");
            return Err(match status.as_u16() {
                401 | 403 => Error::auth(error_text),
                429 => Error::RateLimit,
                _ => Error::provider("OpenAI", format!("API error: {error_text}")),
            });
        }

        let mut state = ChatStreamState::default();
        let event_stream = SseStream::new(response.bytes_stream())
            .map(move |result| match result {
                Ok(sse_event) => {
                    if sse_event.is_done() {
                        return vec![];
                    }

                    match serde_json::from_str::<ChatCompletionChunk>(&sse_event.data) {
                        Ok(chunk) => Self::convert_chunk(chunk, &mut state)
                            .into_iter()
                            .map(Ok)
                            .collect(),
                        Err(e) => {
                            tracing::warn!(
                                "failed to parse chunk: {e}, data: {}",
                                sse_event.data
                            );
                            vec![]
                        }
                    }
                }
                Err(e) => vec![Err(e)],
            })
            .map(futures_util::stream::iter)
            .flatten();

        Ok(Response::from_stream(event_stream))
    }
}
