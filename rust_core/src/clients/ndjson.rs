//! Newline-delimited JSON decoding for Lichess streaming endpoints
//!
//! Lichess keeps its streams alive by sending bare newlines, and HTTP chunk
//! boundaries fall anywhere inside a line. This turns a raw chunk stream into
//! a stream of decoded values:
//! - blank lines are skipped
//! - lines that do not decode are logged and skipped
//! - a transport error is yielded once, then the stream ends

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::pin::Pin;
use tracing::{trace, warn};

use crate::error::TransportError;

struct DecoderState<S> {
    chunks: Pin<Box<S>>,
    buffer: Vec<u8>,
    finished: bool,
    label: String,
}

pub fn decode_ndjson<S, B, E, T>(
    chunks: S,
    label: impl Into<String>,
) -> BoxStream<'static, Result<T, TransportError>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<TransportError> + Send + 'static,
    T: DeserializeOwned + Send + 'static,
{
    let state = DecoderState {
        chunks: Box::pin(chunks),
        buffer: Vec::new(),
        finished: false,
        label: label.into(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                if let Some(value) = decode_line(&state.label, &line) {
                    return Some((Ok(value), state));
                }
                continue;
            }

            if state.finished {
                // a final line without trailing newline
                let rest = std::mem::take(&mut state.buffer);
                return decode_line(&state.label, &rest).map(|value| (Ok(value), state));
            }

            match state.chunks.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    state.finished = true;
                    state.buffer.clear();
                    return Some((Err(e.into()), state));
                }
                None => state.finished = true,
            }
        }
    })
    .boxed()
}

fn decode_line<T: DeserializeOwned>(label: &str, line: &[u8]) -> Option<T> {
    let line = line.trim_ascii();
    if line.is_empty() {
        trace!("{}: keep-alive", label);
        return None;
    }

    match serde_json::from_slice(line) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                "{}: skipping undecodable line ({}): {}",
                label,
                e,
                String::from_utf8_lossy(line)
            );
            None
        }
    }
}
