//! Folds stream events back into a complete response.

use crate::response::{CompleteResponse, ResponseItem};
use crate::types::{FinishReason, ItemKind, StreamEvent, Usage};

/// Builds a [`CompleteResponse`] out of the events of one generation,
/// preserving the order in which text and function calls arrived.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    items: Vec<ResponseItem>,
    reason: Option<FinishReason>,
    usage: Option<Usage>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the accumulated state.
    pub fn apply(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::ItemStarted { kind: ItemKind::Text } => {
                self.items.push(ResponseItem::Text(String::new()));
            }
            StreamEvent::ItemStarted { kind: ItemKind::FunctionCall { .. } } => {
                // The item is recorded once its arguments arrive
            }
            StreamEvent::TextDelta { text } => match self.items.last_mut() {
                Some(ResponseItem::Text(buffer)) => buffer.push_str(&text),
                // Providers that skip ItemStarted still get their text kept
                _ => self.items.push(ResponseItem::Text(text)),
            },
            StreamEvent::FunctionCallDone { call } => {
                self.items.push(ResponseItem::Call(call));
            }
            StreamEvent::Finished { reason, usage } => {
                self.reason = Some(reason);
                self.usage = Some(usage);
            }
            StreamEvent::Failed { .. } => {}
        }
    }

    /// The text accumulated so far.
    pub fn text(&self) -> String {
        self.items
            .iter()
            .filter_map(|item| match item {
                ResponseItem::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn finish(self) -> CompleteResponse {
        CompleteResponse {
            items: self.items,
            finish_reason: self.reason.unwrap_or(FinishReason::Stop),
            usage: self.usage.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FunctionCall;

    fn call(name: &str) -> FunctionCall {
        FunctionCall {
            id: format!("fc_{name}"),
            call_id: format!("call_{name}"),
            name: name.to_string(),
            arguments: "{}".to_string(),
        }
    }

    #[test]
    fn test_text_deltas_concatenate() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(StreamEvent::ItemStarted { kind: ItemKind::Text });
        for piece in ["Mount", " Everest", "."] {
            acc.apply(StreamEvent::TextDelta {
                text: piece.to_string(),
            });
        }
        assert_eq!(acc.text(), "Mount Everest.");
    }

    #[test]
    fn test_text_without_item_started() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(StreamEvent::TextDelta {
            text: "orphan".to_string(),
        });
        assert_eq!(acc.text(), "orphan");
    }

    #[test]
    fn test_interleaved_text_and_calls_keep_order() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(StreamEvent::ItemStarted { kind: ItemKind::Text });
        acc.apply(StreamEvent::TextDelta {
            text: "Working it out. ".to_string(),
        });
        acc.apply(StreamEvent::FunctionCallDone { call: call("multiply") });
        acc.apply(StreamEvent::ItemStarted { kind: ItemKind::Text });
        acc.apply(StreamEvent::TextDelta {
            text: "Done.".to_string(),
        });

        let response = acc.finish();
        assert_eq!(response.items.len(), 3);
        assert!(matches!(&response.items[0], ResponseItem::Text(t) if t == "Working it out. "));
        assert!(matches!(&response.items[1], ResponseItem::Call(c) if c.name == "multiply"));
        assert!(matches!(&response.items[2], ResponseItem::Text(t) if t == "Done."));
    }

    #[test]
    fn test_finish_defaults_without_finished_event() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(StreamEvent::TextDelta {
            text: "partial".to_string(),
        });
        let response = acc.finish();
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.input_tokens, 0);
    }

    #[test]
    fn test_finished_sets_reason_and_usage() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(StreamEvent::Finished {
            reason: FinishReason::Length,
            usage: Usage {
                input_tokens: 8,
                output_tokens: 120,
                cached_tokens: None,
            },
        });
        let response = acc.finish();
        assert_eq!(response.finish_reason, FinishReason::Length);
        assert_eq!(response.usage.output_tokens, 120);
    }
}
