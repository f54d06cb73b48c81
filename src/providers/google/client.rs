use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use uuid::Uuid;

use super::types::*;
use crate::provider::TextProvider;
use crate::sse_stream::SseStream;
use crate::types::{FinishReason, FunctionCall, InputItem, ItemKind, Role};
use crate::{Error, GenerationRequest, Response, StreamEvent};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini Developer API client, authenticated with an API key.
pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleProvider {
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL.to_string())
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

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Convert the provider-independent request into Gemini wire format.
    fn convert_request(&self, request: &GenerationRequest) -> Result<GeminiRequest, Error> {
        let mut contents: Vec<GeminiContent> = Vec::new();
        let mut system_parts: Vec<GeminiPart> = Vec::new();
        // Function responses are keyed by function name, not call id, so
        // remember which name each call id belongs to.
        let mut call_names: HashMap<String, String> = HashMap::new();

        for item in &request.messages {
            match item {
                InputItem::Message(msg) => {
                    let part = GeminiPart::Text {
                        text: msg.content.clone(),
                    };
                    match msg.role {
                        Role::System => system_parts.push(part),
                        Role::User => contents.push(GeminiContent {
                            role: "user".to_string(),
                            parts: vec![part],
                        }),
                        Role::Assistant => contents.push(GeminiContent {
                            role: "model".to_string(),
                            parts: vec![part],
                        }),
                    }
                }
                InputItem::FunctionCall(call) => {
                    call_names.insert(call.call_id.clone(), call.name.clone());
                    let args = serde_json::from_str(&call.arguments).map_err(|e| {
                        Error::provider("Google", format!("invalid function arguments: {e}"))
                    })?;
                    let part = GeminiPart::FunctionCall {
                        function_call: GeminiFunctionCall {
                            name: call.name.clone(),
                            args,
                        },
                    };
                    // Calls extend the trailing model turn
                    match contents.last_mut() {
                        Some(content) if content.role == "model" => content.parts.push(part),
                        _ => contents.push(GeminiContent {
                            role: "model".to_string(),
                            parts: vec![part],
                        }),
                    }
                }
                InputItem::FunctionCallOutput { call_id, output } => {
                    let name = call_names
                        .get(call_id)
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string());
                    let part = GeminiPart::FunctionResponse {
                        function_response: GeminiFunctionResponse {
                            name,
                            response: serde_json::json!({ "result": output }),
                        },
                    };
                    // Responses for the same round share one user turn
                    let last_is_response_turn = contents.last().is_some_and(|content| {
                        content.role == "user"
                            && content
                                .parts
                                .iter()
                                .any(|p| matches!(p, GeminiPart::FunctionResponse { .. }))
                    });
                    if last_is_response_turn {
                        contents.last_mut().unwrap().parts.push(part);
                    } else {
                        contents.push(GeminiContent {
                            role: "user".to_string(),
                            parts: vec![part],
                        });
                    }
                }
            }
        }

        let generation_config = Some(GeminiGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
            top_p: request.top_p,
            stop_sequences: request.stop.clone(),
        });

        let tools = request.tools.as_ref().map(|tools| {
            vec![GeminiTool {
                function_declarations: tools
                    .iter()
                    .map(|tool| GeminiFunctionDeclaration {
                        name: tool.function.name.clone(),
                        description: tool.function.description.clone(),
                        parameters: tool.function.parameters.clone(),
                    })
                    .collect(),
            }]
        });

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: "user".to_string(),
                parts: system_parts,
            })
        };

        Ok(GeminiRequest {
            contents,
            generation_config,
            tools,
            system_instruction,
        })
    }

    /// Decode one streamed chunk into events. The stream state tracks which
    /// items have been announced so ItemStarted fires once per item.
    fn decode_chunk(
        response: GeminiResponse,
        state: &mut GeminiStreamState,
    ) -> Result<Vec<StreamEvent>, Error> {
        let mut events = Vec::new();

        if let Some(candidate) = response.candidates.first() {
            for part in &candidate.content.parts {
                match part {
                    GeminiPart::Text { text } => {
                        if !state.text_started {
                            events.push(StreamEvent::ItemStarted { kind: ItemKind::Text });
                            state.text_started = true;
                        }
                        if !text.is_empty() {
                            events.push(StreamEvent::TextDelta { text: text.clone() });
                        }
                    }
                    GeminiPart::FunctionCall { function_call } => {
                        // Gemini supplies no call ids, so synthesize a pair
                        let base_id = Uuid::new_v4().simple().to_string();
                        let fc_id = format!("fc_{base_id}");
                        let call_id = format!("call_{base_id}");

                        let arguments =
                            serde_json::to_string(&function_call.args).map_err(|e| {
                                Error::provider(
                                    "Google",
                                    format!("unserializable function args: {e}"),
                                )
                            })?;

                        let call_key = format!("{}:{arguments}", function_call.name);
                        if state.seen_calls.insert(call_key) {
                            events.push(StreamEvent::ItemStarted {
                                kind: ItemKind::FunctionCall {
                                    name: function_call.name.clone(),
                                    id: fc_id.clone(),
                                },
                            });
                        }

                        events.push(StreamEvent::FunctionCallDone {
                            call: FunctionCall {
                                id: fc_id,
                                call_id,
                                name: function_call.name.clone(),
                                arguments,
                            },
                        });
                    }
                    GeminiPart::FunctionResponse { .. } => {
                        // Never present in model output
                    }
                }
            }

            if let Some(finish) = &candidate.finish_reason {
                // Gemini reports STOP even when it emitted function calls
                let reason = match finish.as_str() {
                    "STOP" if state.seen_calls.is_empty() => FinishReason::Stop,
                    "STOP" => FinishReason::ToolCalls,
                    "MAX_TOKENS" => FinishReason::Length,
                    "SAFETY" => FinishReason::ContentFilter,
                    _ => FinishReason::Stop,
                };

                events.push(StreamEvent::Finished {
                    reason,
                    usage: response.usage_metadata.map(Into::into).unwrap_or_default(),
                });
            }
        } else if let Some(meta) = response.usage_metadata {
            // Bookkeeping chunk with no candidates
            events.push(StreamEvent::Finished {
                reason: FinishReason::Stop,
                usage: meta.into(),
            });
        }

        Ok(events)
    }
}

#[derive(Debug, Default)]
struct GeminiStreamState {
    text_started: bool,
    seen_calls: HashSet<String>,
}

#[async_trait::async_trait]
impl TextProvider for GoogleProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<Response, Error> {
        let gemini_request = self.convert_request(request)?;
        let endpoint = self.endpoint(&request.model);

        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            tracing::error!("Google API error ({status}): {error_text}");
            return Err(match status.as_u16() {
                401 | 403 => Error::auth(error_text),
                429 => Error::RateLimit,
                _ => Error::provider("Google", format!("API error: {error_text}")),
            });
        }

        let mut state = GeminiStreamState::default();
        let event_stream = SseStream::new(response.bytes_stream())
            .map(move |result| match result {
                Ok(sse_event) => {
                    let data = sse_event.data.trim();
                    if sse_event.is_done() || data.is_empty() {
                        return vec![];
                    }

                    match serde_json::from_str::<GeminiResponse>(data) {
                        Ok(chunk) => match Self::decode_chunk(chunk, &mut state) {
                            Ok(events) => events.into_iter().map(Ok).collect(),
                            Err(e) => vec![Err(e)],
                        },
                        Err(e) => {
                            vec![Err(Error::provider(
                                "Google",
                                format!("unparseable SSE event: {e}"),
                            ))]
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
