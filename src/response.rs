//! Buffered and streaming views of a generation.

use std::pin::Pin;

use futures_util::stream::{Stream, StreamExt};

use crate::accumulator::ResponseAccumulator;
use crate::types::{FunctionCall, InputItem};
use crate::{Error, FinishReason, StreamEvent, Usage};

/// A fully received response.
#[derive(Debug, Clone)]
pub struct CompleteResponse {
    /// Output in the order the model produced it.
    pub items: Vec<ResponseItem>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

/// One piece of model output.
#[derive(Debug, Clone)]
pub enum ResponseItem {
    Text(String),
    Call(FunctionCall),
}

impl CompleteResponse {
    /// All text output, concatenated.
    pub fn text(&self) -> String {
        self.items
            .iter()
            .filter_map(|item| match item {
                ResponseItem::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The function calls the model made, in order.
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.items
            .iter()
            .filter_map(|item| match item {
                ResponseItem::Call(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Replay this response as conversation items, so a follow-up request
    /// can carry the assistant turn (text and calls, in order).
    pub fn to_items(&self) -> Vec<InputItem> {
        self.items
            .iter()
            .map(|item| match item {
                ResponseItem::Text(text) => InputItem::assistant(text.clone()),
                ResponseItem::Call(call) => InputItem::FunctionCall(call.clone()),
            })
            .collect()
    }
}

/// An in-flight generation. Every provider streams internally; callers pick
/// between consuming events as they arrive and buffering the whole response.
pub struct Response {
    events: Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>>,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response").finish_non_exhaustive()
    }
}

impl Response {
    pub fn from_stream<S>(events: S) -> Self
    where
        S: Stream<Item = Result<StreamEvent, Error>> + Send + 'static,
    {
        Self {
            events: Box::pin(events),
        }
    }

    /// The raw event stream.
    pub fn stream(self) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>> {
        self.events
    }

    /// Consume the stream into a complete response.
    pub async fn buffer(mut self) -> Result<CompleteResponse, Error> {
        let mut accumulator = ResponseAccumulator::new();
        while let Some(result) = self.events.next().await {
            match result? {
                StreamEvent::Failed { message } => return Err(Error::streaming(message)),
                event @ StreamEvent::Finished { .. } => {
                    accumulator.apply(event);
                    break;
                }
                event => accumulator.apply(event),
            }
        }
        Ok(accumulator.finish())
    }

    /// Buffer and return just the text output.
    pub async fn text(self) -> Result<String, Error> {
        Ok(self.buffer().await?.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemKind, Message, Role};

    fn multiply_call() -> FunctionCall {
        FunctionCall {
            id: "fc_1".to_string(),
            call_id: "call_1".to_string(),
            name: "multiply".to_string(),
            arguments: "{\"a\":5,\"b\":3}".to_string(),
        }
    }

    #[test]
    fn test_text_skips_calls() {
        let response = CompleteResponse {
            items: vec![
                ResponseItem::Text("Let me check. ".to_string()),
                ResponseItem::Call(multiply_call()),
                ResponseItem::Text("It is 15.".to_string()),
            ],
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        };

        assert_eq!(response.text(), "Let me check. It is 15.");
        assert_eq!(response.function_calls().len(), 1);
    }

    #[test]
    fn test_to_items_keeps_order_and_roles() {
        let response = CompleteResponse {
            items: vec![
                ResponseItem::Text("Calculating. ".to_string()),
                ResponseItem::Call(multiply_call()),
            ],
            finish_reason: FinishReason::ToolCalls,
            usage: Usage::default(),
        };

        let items = response.to_items();
        assert_eq!(items.len(), 2);
        match &items[0] {
            InputItem::Message(Message { role, content }) => {
                assert_eq!(*role, Role::Assistant);
                assert_eq!(content, "Calculating. ");
            }
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(matches!(&items[1], InputItem::FunctionCall(call) if call.name == "multiply"));
    }

    #[tokio::test]
    async fn test_buffering_folds_events() {
        let events = vec![
            Ok(StreamEvent::ItemStarted { kind: ItemKind::Text }),
            Ok(StreamEvent::TextDelta {
                text: "Mount ".to_string(),
            }),
            Ok(StreamEvent::TextDelta {
                text: "Everest".to_string(),
            }),
            Ok(StreamEvent::Finished {
                reason: FinishReason::Stop,
                usage: Usage::default(),
            }),
        ];

        let response = Response::from_stream(futures_util::stream::iter(events));
        assert_eq!(response.text().await.unwrap(), "Mount Everest");
    }

    #[tokio::test]
    async fn test_failed_event_surfaces_as_error() {
        let events = vec![
            Ok(StreamEvent::TextDelta {
                text: "partial".to_string(),
            }),
            Ok(StreamEvent::Failed {
                message: "connection reset".to_string(),
            }),
        ];

        let response = Response::from_stream(futures_util::stream::iter(events));
        let err = response.text().await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
