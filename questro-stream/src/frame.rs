//! Frame classification and vendor payload decoding.
//!
//! The wire format is the OpenAI-style chat completion stream:
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! : keep-alive
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//! data: [DONE]
//! ```

use serde::Deserialize;

/// Prefix that marks an event-data line.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that signals deliberate end of stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// What a single line of the stream means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Blank line, comment, or a line without the data prefix.
    Ignored,
    /// The `[DONE]` sentinel.
    Done,
    /// A data payload, trimmed.
    Data(&'a str),
}

/// Classify one line. The line must not contain its terminating `\n`; a
/// single trailing `\r` is stripped here.
pub fn classify_line(line: &str) -> Frame<'_> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() || line.starts_with(':') {
        return Frame::Ignored;
    }
    let Some(rest) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignored;
    };
    let payload = rest.trim();
    if payload == DONE_SENTINEL {
        Frame::Done
    } else {
        Frame::Data(payload)
    }
}

/// A data frame whose payload could not be turned into a delta.
#[derive(Debug, thiserror::Error)]
pub enum MalformedFrame {
    /// The payload is not JSON, or a field has the wrong type.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// Valid JSON without a `choices` array.
    #[error("payload has no choices array")]
    MissingChoices,
    /// The vendor reported an error mid-stream.
    #[error("vendor error: {0}")]
    Vendor(String),
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Option<Vec<ChunkChoice>>,
    #[serde(default)]
    error: Option<VendorError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VendorError {
    Detailed { message: String },
    Plain(String),
    Other(serde_json::Value),
}

impl VendorError {
    fn into_message(self) -> String {
        match self {
            Self::Detailed { message } | Self::Plain(message) => message,
            Self::Other(value) => value.to_string(),
        }
    }
}

/// Decode the text delta at `choices[0].delta.content`.
///
/// `Ok(None)` is a well-formed frame that carries no text (role-only delta,
/// empty content, finish chunk, empty `choices`).
pub fn decode_delta(payload: &str) -> Result<Option<String>, MalformedFrame> {
    let chunk: ChunkPayload = serde_json::from_str(payload)?;
    if let Some(err) = chunk.error {
        return Err(MalformedFrame::Vendor(err.into_message()));
    }
    let choices = chunk.choices.ok_or(MalformedFrame::MissingChoices)?;
    let content = choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .filter(|text| !text.is_empty());
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_data_line() {
        assert_eq!(
            classify_line(r#"data: {"a":1}"#),
            Frame::Data(r#"{"a":1}"#)
        );
    }

    #[test]
    fn classify_trims_payload_and_carriage_return() {
        assert_eq!(classify_line("data:   {}  \r"), Frame::Data("{}"));
    }

    #[test]
    fn classify_sentinel() {
        assert_eq!(classify_line("data: [DONE]"), Frame::Done);
        assert_eq!(classify_line("data: [DONE]\r"), Frame::Done);
        assert_eq!(classify_line("data:  [DONE] "), Frame::Done);
    }

    #[test]
    fn classify_ignores_blank_comment_and_other_fields() {
        assert_eq!(classify_line(""), Frame::Ignored);
        assert_eq!(classify_line("\r"), Frame::Ignored);
        assert_eq!(classify_line(": keep-alive"), Frame::Ignored);
        assert_eq!(classify_line("event: message"), Frame::Ignored);
        assert_eq!(classify_line("id: 42"), Frame::Ignored);
        // The prefix includes the space.
        assert_eq!(classify_line("data:{}"), Frame::Ignored);
    }

    #[test]
    fn only_one_carriage_return_is_stripped() {
        assert_eq!(classify_line("data: x\r\r"), Frame::Data("x"));
        assert_eq!(classify_line("\r\r"), Frame::Ignored);
    }

    #[test]
    fn decode_content_delta() {
        let delta = decode_delta(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#).unwrap();
        assert_eq!(delta.as_deref(), Some("Hel"));
    }

    #[test]
    fn decode_ignores_extra_fields() {
        let payload = r#"{"id":"chatcmpl-1","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"role":"assistant","content":"Hi"},"finish_reason":null}]}"#;
        assert_eq!(decode_delta(payload).unwrap().as_deref(), Some("Hi"));
    }

    #[test]
    fn decode_role_only_delta_has_no_text() {
        let payload = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(decode_delta(payload).unwrap(), None);
    }

    #[test]
    fn decode_empty_and_null_content_have_no_text() {
        assert_eq!(
            decode_delta(r#"{"choices":[{"delta":{"content":""}}]}"#).unwrap(),
            None
        );
        assert_eq!(
            decode_delta(r#"{"choices":[{"delta":{"content":null}}]}"#).unwrap(),
            None
        );
    }

    #[test]
    fn decode_finish_chunk_has_no_text() {
        let payload = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(decode_delta(payload).unwrap(), None);
    }

    #[test]
    fn decode_empty_choices_has_no_text() {
        assert_eq!(decode_delta(r#"{"choices":[]}"#).unwrap(), None);
    }

    #[test]
    fn decode_uses_first_choice_only() {
        let payload = r#"{"choices":[{"delta":{"content":"a"}},{"delta":{"content":"b"}}]}"#;
        assert_eq!(decode_delta(payload).unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(matches!(
            decode_delta(r#"{"choices":[{"delta":{"content":"x"#),
            Err(MalformedFrame::Json(_))
        ));
    }

    #[test]
    fn decode_rejects_missing_choices() {
        assert!(matches!(
            decode_delta(r#"{"id":"x"}"#),
            Err(MalformedFrame::MissingChoices)
        ));
    }

    #[test]
    fn decode_rejects_wrong_shapes() {
        assert!(decode_delta("42").is_err());
        assert!(decode_delta(r#"{"choices":"nope"}"#).is_err());
        assert!(decode_delta(r#"{"choices":[{"delta":{"content":7}}]}"#).is_err());
    }

    #[test]
    fn decode_surfaces_vendor_error_message() {
        let err = decode_delta(r#"{"error":{"message":"Rate limit exceeded","type":"rate_limit_error"}}"#)
            .unwrap_err();
        assert!(matches!(err, MalformedFrame::Vendor(msg) if msg == "Rate limit exceeded"));
    }

    #[test]
    fn decode_surfaces_plain_vendor_error() {
        let err = decode_delta(r#"{"error":"boom"}"#).unwrap_err();
        assert!(matches!(err, MalformedFrame::Vendor(msg) if msg == "boom"));
    }
}
