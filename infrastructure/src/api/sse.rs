//! Incremental server-sent-events framing and event classification.
//!
//! The transport delivers arbitrary byte chunks; [`SseParser::feed`]
//! reassembles them into complete frames across chunk boundaries, and
//! [`classify_frame`] turns each frame into exactly one closed
//! [`StreamEvent`] at the boundary — nothing downstream ever compares
//! event-name strings again.
//!
//! Frame payloads are the service's `{code, data: {content, type?}}`
//! envelope; any non-success code or malformed payload classifies as a
//! protocol failure.

use serde::Deserialize;
use solace_domain::{StreamError, StreamEvent};

/// One complete server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, when present.
    pub event: Option<String>,
    /// Joined `data:` lines.
    pub data: String,
}

/// Incremental SSE frame parser.
///
/// Feed it raw chunks as they arrive; it returns every frame completed by
/// that chunk. Handles CRLF line endings, comment lines, multi-line
/// `data:` fields, and UTF-8 sequences split across chunks.
#[derive(Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data_lines: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    frames.push(frame);
                }
            } else {
                self.handle_line(&line);
            }
        }
        frames
    }

    fn handle_line(&mut self, line: &str) {
        // Comment lines start with a bare colon
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            // id and retry are irrelevant to this client
            _ => {}
        }
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        if self.event.is_none() && self.data_lines.is_empty() {
            return None;
        }
        Some(SseFrame {
            event: self.event.take(),
            data: std::mem::take(&mut self.data_lines).join("\n"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct FramePayload {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    data: Option<FrameData>,
}

#[derive(Debug, Deserialize)]
struct FrameData {
    #[serde(default)]
    content: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

const DONE_EVENT: &str = "done";
const RISK_EVENT: &str = "risk";
const SUCCESS_CODE: &str = "success";

/// Map one frame onto the closed stream event type.
pub fn classify_frame(frame: &SseFrame) -> StreamEvent {
    if frame.event.as_deref() == Some(DONE_EVENT) {
        return StreamEvent::Done;
    }

    let payload: FramePayload = match serde_json::from_str(&frame.data) {
        Ok(payload) => payload,
        Err(e) => {
            return StreamEvent::Failed(StreamError::Protocol(format!(
                "unparseable frame payload: {e}"
            )));
        }
    };

    if payload.code != SUCCESS_CODE {
        let message = payload.msg.unwrap_or_else(|| payload.code.clone());
        return StreamEvent::Failed(StreamError::Protocol(format!(
            "server reported {}: {message}",
            payload.code
        )));
    }

    let Some(data) = payload.data else {
        return StreamEvent::Failed(StreamError::Protocol("frame without data".into()));
    };

    let is_risk = frame.event.as_deref() == Some(RISK_EVENT)
        || data.kind.as_deref() == Some(RISK_EVENT);
    if is_risk {
        StreamEvent::RiskWarning(data.content)
    } else {
        StreamEvent::Delta(data.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_frame(content: &str) -> SseFrame {
        SseFrame {
            event: Some("message".into()),
            data: format!(r#"{{"code":"success","data":{{"content":"{content}"}}}}"#),
        }
    }

    #[test]
    fn frames_survive_arbitrary_chunk_boundaries() {
        let wire = "event: message\ndata: {\"code\":\"success\",\"data\":{\"content\":\"hi\"}}\n\n";
        let mut parser = SseParser::new();

        let mut frames = Vec::new();
        // One byte at a time — worst case chunking
        for byte in wire.as_bytes() {
            frames.extend(parser.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("message"));
        assert!(frames[0].data.contains("\"hi\""));
    }

    #[test]
    fn crlf_lines_parse_like_lf() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"event: done\r\ndata: {}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("done"));
    }

    #[test]
    fn comments_and_blank_runs_are_ignored() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b": keep-alive\n\n\ndata: x\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
        assert_eq!(frames[0].event, None);
    }

    #[test]
    fn multiple_data_lines_join_with_newline() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"data: first\ndata: second\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "first\nsecond");
    }

    #[test]
    fn two_frames_in_one_chunk() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"data: a\n\ndata: b\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, "a");
        assert_eq!(frames[1].data, "b");
    }

    #[test]
    fn classify_delta() {
        assert_eq!(
            classify_frame(&delta_frame("hello")),
            StreamEvent::Delta("hello".into())
        );
    }

    #[test]
    fn classify_done_event_without_parsing_data() {
        let frame = SseFrame {
            event: Some("done".into()),
            data: String::new(),
        };
        assert_eq!(classify_frame(&frame), StreamEvent::Done);
    }

    #[test]
    fn classify_risk_by_event_name() {
        let frame = SseFrame {
            event: Some("risk".into()),
            data: r#"{"code":"success","data":{"content":"please take care"}}"#.into(),
        };
        assert_eq!(
            classify_frame(&frame),
            StreamEvent::RiskWarning("please take care".into())
        );
    }

    #[test]
    fn classify_risk_by_payload_type() {
        let frame = SseFrame {
            event: Some("message".into()),
            data: r#"{"code":"success","data":{"content":"please take care","type":"risk"}}"#
                .into(),
        };
        assert_eq!(
            classify_frame(&frame),
            StreamEvent::RiskWarning("please take care".into())
        );
    }

    #[test]
    fn classify_non_success_code_as_protocol_failure() {
        let frame = SseFrame {
            event: Some("message".into()),
            data: r#"{"code":"rate_limited","msg":"slow down"}"#.into(),
        };
        match classify_frame(&frame) {
            StreamEvent::Failed(StreamError::Protocol(msg)) => {
                assert!(msg.contains("rate_limited"));
                assert!(msg.contains("slow down"));
            }
            other => panic!("expected protocol failure, got {other:?}"),
        }
    }

    #[test]
    fn classify_malformed_payload_as_protocol_failure() {
        let frame = SseFrame {
            event: Some("message".into()),
            data: "not json at all".into(),
        };
        assert!(matches!(
            classify_frame(&frame),
            StreamEvent::Failed(StreamError::Protocol(_))
        ));
    }
}
