//! Events emitted while a generation streams in.

use crate::types::{FinishReason, FunctionCall, Usage};

/// An incremental event decoded from a provider stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The provider opened a new output item.
    ItemStarted { kind: ItemKind },
    /// A fragment of text belonging to the current text item.
    TextDelta { text: String },
    /// A function call whose arguments have fully arrived.
    FunctionCallDone { call: FunctionCall },
    /// The generation is complete.
    Finished {
        reason: FinishReason,
        usage: Usage,
    },
    /// The provider reported a mid-stream failure.
    Failed { message: String },
}

/// The kind of output item a provider opened.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Text,
    FunctionCall { name: String, id: String },
}
