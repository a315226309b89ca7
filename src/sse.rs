use log::{debug, warn};
use serde::Deserialize;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// One decoded event from the provider's stream.
#[derive(Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental fragment of assistant text.
    Delta(String),
    /// End-of-stream sentinel; no further events follow.
    Done,
}

/// Incremental decoder for the completion provider's `data: `-framed event
/// stream. The transport may split the stream at arbitrary byte offsets, so
/// the decoder owns the single pending-partial-line buffer: feed it raw
/// chunks, receive zero or more complete events.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buf: Vec<u8>,
    done: bool,
}

#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

impl EventStreamDecoder {
    pub fn new() -> EventStreamDecoder {
        EventStreamDecoder::default()
    }

    /// Consume a raw chunk and return every event completed by it. The last
    /// (possibly partial) line is retained for the next call. After `Done`
    /// has been produced, all further input is ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            match std::str::from_utf8(&line) {
                Ok(line) => {
                    if let Some(event) = self.decode_line(line.trim_end_matches(['\r', '\n'])) {
                        let finished = event == StreamEvent::Done;
                        events.push(event);
                        if finished {
                            break;
                        }
                    }
                }
                Err(e) => warn!("Dropping non-UTF-8 stream line: {}", e),
            }
        }
        events
    }

    fn decode_line(&mut self, line: &str) -> Option<StreamEvent> {
        let payload = line.strip_prefix(DATA_PREFIX)?;
        if payload == DONE_SENTINEL {
            self.done = true;
            return Some(StreamEvent::Done);
        }
        match serde_json::from_str::<CompletionChunk>(payload) {
            Ok(chunk) => {
                let text = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)?;
                if text.is_empty() {
                    None
                } else {
                    Some(StreamEvent::Delta(text))
                }
            }
            Err(e) => {
                // A single malformed event must not interrupt the stream.
                debug!("Dropping malformed stream event: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &[u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\
data: [DONE]\n";

    fn collect(chunks: &[&[u8]]) -> (String, bool) {
        let mut decoder = EventStreamDecoder::new();
        let mut text = String::new();
        let mut done = false;
        for chunk in chunks {
            for event in decoder.feed(chunk) {
                match event {
                    StreamEvent::Delta(t) => text.push_str(&t),
                    StreamEvent::Done => done = true,
                }
            }
        }
        (text, done)
    }

    #[test]
    fn decodes_whole_stream_in_one_chunk() {
        assert_eq!(collect(&[RAW]), ("Hello".to_string(), true));
    }

    #[test]
    fn output_is_chunk_boundary_independent() {
        let whole = collect(&[RAW]);
        for split in 1..RAW.len() {
            let (a, b) = RAW.split_at(split);
            assert_eq!(collect(&[a, b]), whole, "split at byte {}", split);
        }
    }

    #[test]
    fn survives_byte_at_a_time_feeding() {
        let chunks: Vec<&[u8]> = RAW.chunks(1).collect();
        assert_eq!(collect(&chunks), ("Hello".to_string(), true));
    }

    #[test]
    fn malformed_event_is_dropped_without_halting() {
        let raw = b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\
data: {not json}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\
data: [DONE]\n";
        assert_eq!(collect(&[raw.as_slice()]), ("ab".to_string(), true));
    }

    #[test]
    fn absent_delta_contributes_nothing() {
        let raw = b"data: {\"choices\":[{\"delta\":{}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\
data: [DONE]\n";
        assert_eq!(collect(&[raw.as_slice()]), ("x".to_string(), true));
    }

    #[test]
    fn blank_and_comment_lines_are_ignored() {
        let raw = b"\n: keep-alive\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\ndata: [DONE]\n";
        assert_eq!(collect(&[raw.as_slice()]), ("x".to_string(), true));
    }

    #[test]
    fn input_after_done_is_ignored() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.feed(b"data: [DONE]\n");
        assert_eq!(events, vec![StreamEvent::Done]);
        assert!(decoder
            .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n")
            .is_empty());
    }

    #[test]
    fn multibyte_text_split_mid_character() {
        // "Olá" split inside the two-byte 'á'.
        let raw = "data: {\"choices\":[{\"delta\":{\"content\":\"Olá\"}}]}\ndata: [DONE]\n".as_bytes();
        let mid = raw.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let (a, b) = raw.split_at(mid);
        assert_eq!(collect(&[a, b]), ("Olá".to_string(), true));
    }
}
