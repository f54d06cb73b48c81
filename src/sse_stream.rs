//! Decoder turning a chunked HTTP byte stream into Server-Sent Events.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_util::{Stream, StreamExt};
use memchr::memmem;

use crate::Error;

/// Upper bound on bytes held while waiting for an event terminator.
const MAX_PENDING_BYTES: usize = 1 << 20;

/// One Server-Sent Event. Both provider streams carry their payload in
/// `data`; an `event:` label is kept when one is present.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// The `[DONE]` sentinel sent after the last payload chunk.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Decodes SSE events out of a byte stream, carrying partial events (and
/// partial UTF-8 sequences) across chunk boundaries.
pub struct SseStream<S> {
    source: S,
    pending: Vec<u8>,
    ready: VecDeque<SseEvent>,
}

impl<S> SseStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pending: Vec::new(),
            ready: VecDeque::new(),
        }
    }

    /// Split complete events off the front of the pending buffer. Bytes
    /// after the last blank-line terminator stay buffered.
    fn drain_pending(&mut self) -> Result<(), Error> {
        while let Some(pos) = memmem::find(&self.pending, b"\n\n") {
            let raw: Vec<u8> = self.pending.drain(..pos + 2).collect();
            let text = std::str::from_utf8(&raw[..pos])
                .map_err(|e| Error::streaming(format!("invalid UTF-8 in SSE event: {e}")))?;
            if let Some(event) = decode_event(text) {
                self.ready.push_back(event);
            }
        }
        Ok(())
    }
}

/// Decode the field lines of one event. Events without a data field
/// (comments, keep-alives) decode to nothing.
fn decode_event(text: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data: Option<String> = None;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        // A line without a colon is a field with an empty value
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = Some(value.to_string()),
            "data" => match &mut data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => data = Some(value.to_string()),
            },
            _ => {}
        }
    }

    data.map(|data| SseEvent { event, data })
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            match ready!(self.source.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    self.pending.extend_from_slice(&chunk);
                    if self.pending.len() > MAX_PENDING_BYTES {
                        self.pending.clear();
                        return Poll::Ready(Some(Err(Error::streaming(
                            "SSE event exceeded the buffer limit",
                        ))));
                    }
                    if let Err(e) = self.drain_pending() {
                        return Poll::Ready(Some(Err(e)));
                    }
                }
                Some(Err(e)) => {
                    return Poll::Ready(Some(Err(Error::streaming(format!(
                        "transport error mid-stream: {}",
                        e.into()
                    )))));
                }
                None => {
                    // Gemini can end the stream without terminating the final
                    // event with a blank line; decode whatever is left.
                    let tail = std::mem::take(&mut self.pending);
                    let event = std::str::from_utf8(&tail)
                        .ok()
                        .and_then(|text| decode_event(text.trim()));
                    return Poll::Ready(event.map(Ok));
                }
            }
        }
    }
}
