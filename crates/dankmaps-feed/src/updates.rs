//! Real-time `storeDetailsUpdated` subscription over server-sent events.
//!
//! [`SseDecoder`] is a pure incremental parser so framing can be tested
//! without a socket. [`UpdateSubscription`] drives it from a response body and
//! yields decoded [`StoreUpdate`] patches.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use dankmaps_core::update::{StoreUpdate, STORE_UPDATED_EVENT};
use futures::{Stream, StreamExt};

use crate::error::FeedError;

/// One dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
///
/// Chunks may split anywhere, including inside a multi-byte character; only
/// complete blank-line-terminated blocks are decoded.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feeds a chunk and returns every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_block(&String::from_utf8_lossy(&block[..end])) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn parse_block(block: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = Some(value.to_owned()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event,
        data: data.join("\n"),
    })
}

/// Decodes the payload of a `storeDetailsUpdated` frame.
///
/// # Errors
///
/// Returns [`FeedError::Deserialize`] when the payload is not a store patch.
pub fn decode_update(frame: &SseFrame) -> Result<StoreUpdate, FeedError> {
    serde_json::from_str(&frame.data).map_err(|e| FeedError::Deserialize {
        context: STORE_UPDATED_EVENT.to_owned(),
        source: e,
    })
}

type UpdateStream = Pin<Box<dyn Stream<Item = Result<StoreUpdate, FeedError>> + Send>>;

/// Live stream of store patches. Dropping it closes the connection.
pub struct UpdateSubscription {
    inner: UpdateStream,
}

impl std::fmt::Debug for UpdateSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateSubscription").finish_non_exhaustive()
    }
}

impl UpdateSubscription {
    pub(crate) fn from_response(response: reqwest::Response) -> Self {
        Self::from_byte_stream(response.bytes_stream())
    }

    /// Builds a subscription from any chunked byte stream.
    pub fn from_byte_stream<S, B>(bytes: S) -> Self
    where
        S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
    {
        let state = (Box::pin(bytes), SseDecoder::default(), VecDeque::<SseFrame>::new());
        let stream = futures::stream::unfold(state, |(mut bytes, mut decoder, mut ready)| async move {
            loop {
                if let Some(frame) = ready.pop_front() {
                    if frame.event.as_deref() != Some(STORE_UPDATED_EVENT) {
                        tracing::debug!(event = ?frame.event, "ignoring unrelated event");
                        continue;
                    }
                    return Some((decode_update(&frame), (bytes, decoder, ready)));
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => ready.extend(decoder.push(chunk.as_ref())),
                    Some(Err(e)) => {
                        return Some((Err(FeedError::Network(e)), (bytes, decoder, ready)));
                    }
                    None => return None,
                }
            }
        });

        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for UpdateSubscription {
    type Item = Result<StoreUpdate, FeedError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_frame_split_across_chunks() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"event: storeDetailsUpdated\nda").is_empty());
        let frames = decoder.push(b"ta: {\"id\":\"1\"}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: Some("storeDetailsUpdated".to_owned()),
                data: "{\"id\":\"1\"}".to_owned(),
            }]
        );
    }

    #[test]
    fn handles_crlf_and_comments() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push(b": keep-alive\r\n\r\nevent: x\r\ndata: a\r\ndata: b\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("x"));
        assert_eq!(frames[0].data, "a\nb");
    }

    #[test]
    fn multibyte_character_split_between_chunks() {
        let mut decoder = SseDecoder::default();
        let payload = "data: Caf\u{e9}\n\n".as_bytes();
        let split = payload.len() - 3;
        assert!(decoder.push(&payload[..split]).is_empty());
        let frames = decoder.push(&payload[split..]);
        assert_eq!(frames[0].data, "Caf\u{e9}");
    }

    #[tokio::test]
    async fn subscription_yields_only_store_updates() {
        let chunks: Vec<Result<&'static [u8], reqwest::Error>> = vec![
            Ok(&b"event: ping\ndata: {}\n\n"[..]),
            Ok(&b"event: storeRemoved\ndata: {\"id\":\"3\"}\n\n"[..]),
            Ok(&b"event: storeDetailsUpdated\ndata: {\"id\":7,\"status\":\"closed\"}\n\n"[..]),
            Ok(&b"event: storeDetailsUpdated\ndata: not json\n\n"[..]),
        ];
        let mut sub = UpdateSubscription::from_byte_stream(futures::stream::iter(chunks));

        let first = sub.next().await.expect("item").expect("update");
        assert_eq!(first.id, "7");
        assert_eq!(first.status.as_deref(), Some("closed"));

        let second = sub.next().await.expect("item");
        assert!(matches!(second, Err(FeedError::Deserialize { .. })));

        assert!(sub.next().await.is_none());
    }
}
