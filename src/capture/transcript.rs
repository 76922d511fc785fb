//! Canonical transcript parser
//!
//! Converts a line-delimited JSON event log into [`SessionData`]. Agents
//! that write Claude-style transcripts (one JSON object per line, with a
//! `type` discriminator and a `requestId` shared by streamed partial
//! responses) all go through this parser.
//!
//! Streaming produces several `assistant` events per request; only the last
//! occurrence of each request id in stream order counts. The dedup map is
//! keyed on position, so identical timestamps cannot confuse it.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;
use crate::storage::models::{Prompt, Response, SessionData, TokenUsage, ToolCall};

/// Tool input keys that name a file the tool touched.
const FILE_INPUT_KEYS: [&str; 3] = ["file_path", "path", "notebook_path"];

/// One line of a transcript. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(rename = "type", default)]
    event_type: String,

    #[serde(default)]
    timestamp: Option<String>,

    #[serde(default)]
    request_id: Option<String>,

    #[serde(default)]
    message: Option<Value>,

    #[serde(default)]
    usage: Option<RawUsage>,
}

impl RawEvent {
    fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Usage is reported either at the top level or inside `message`.
    fn usage(&self) -> Option<RawUsage> {
        self.usage.clone().or_else(|| {
            self.message
                .as_ref()
                .and_then(|m| m.get("usage"))
                .and_then(|u| serde_json::from_value(u.clone()).ok())
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    cache_creation_input_tokens: u64,
    #[serde(default)]
    cache_read_input_tokens: u64,
}

impl From<RawUsage> for TokenUsage {
    fn from(raw: RawUsage) -> Self {
        TokenUsage {
            input_tokens: raw.input_tokens,
            output_tokens: raw.output_tokens,
            cache_creation: raw.cache_creation_input_tokens,
            cache_reads: raw.cache_read_input_tokens,
            api_calls: 1,
        }
    }
}

/// Parses a transcript file. The session id defaults to the file stem.
pub fn parse_file(path: &Path, agent_name: &str) -> Result<SessionData> {
    let file = File::open(path)?;
    let mut session = parse_reader(BufReader::new(file), agent_name)?;
    session.id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();
    Ok(session)
}

/// Parses transcript events from any buffered reader.
///
/// Blank and malformed lines are skipped, including lines that are not
/// valid UTF-8. Only read errors fail the parse.
pub fn parse_reader<R: BufRead>(reader: R, agent_name: &str) -> Result<SessionData> {
    let mut events: Vec<RawEvent> = Vec::new();

    for (line_num, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        if line.trim_ascii().is_empty() {
            continue;
        }

        match serde_json::from_slice::<RawEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::debug!("Skipping unparseable line {}: {}", line_num + 1, e);
            }
        }
    }

    Ok(build_session(&events, agent_name))
}

fn build_session(events: &[RawEvent], agent_name: &str) -> SessionData {
    // request id -> position of its last assistant event
    let mut last_by_request: HashMap<&str, usize> = HashMap::new();
    for (pos, event) in events.iter().enumerate() {
        if event.event_type == "assistant" {
            if let Some(id) = event.request_id() {
                last_by_request.insert(id, pos);
            }
        }
    }

    let mut session = SessionData {
        agent_name: agent_name.to_string(),
        ..Default::default()
    };

    for (pos, event) in events.iter().enumerate() {
        let timestamp = parse_timestamp(event.timestamp.as_deref());
        let request_id = event.request_id().map(str::to_string);

        match event.event_type.as_str() {
            "user" => {
                let content = extract_content(event.message.as_ref());
                if !content.is_empty() {
                    session.prompts.push(Prompt {
                        content,
                        timestamp,
                        request_id,
                    });
                }
            }
            "assistant" => {
                // Streamed blocks of one request each carry their own tool
                // calls; only the last one counts as the response.
                let is_final = match event.request_id() {
                    Some(id) => last_by_request.get(id) == Some(&pos),
                    None => false,
                };

                for call in extract_tool_calls(event.message.as_ref()) {
                    record_files(&call.1, &mut session.files_changed);
                    session.tool_calls.push(ToolCall {
                        name: call.0,
                        input: call.1,
                        timestamp,
                        request_id: request_id.clone(),
                    });
                }

                if is_final {
                    let usage = event.usage().map(TokenUsage::from).unwrap_or_default();
                    session.token_usage += usage;
                    session.responses.push(Response {
                        content: extract_content(event.message.as_ref()),
                        timestamp,
                        request_id,
                        token_usage: usage,
                    });
                }
            }
            _ => {}
        }
    }

    if let (Some(first), Some(last)) = (events.first(), events.last()) {
        session.started_at = parse_timestamp(first.timestamp.as_deref());
        session.ended_at = parse_timestamp(last.timestamp.as_deref());
    }

    session
}

/// RFC 3339 timestamp, or `None` when absent or unparseable.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Extracts displayable text from a message.
///
/// Accepts a bare string, or an object whose `content` is a string or a
/// list of typed parts (text parts are newline-joined). Anything else is
/// returned as raw JSON.
fn extract_content(message: Option<&Value>) -> String {
    let Some(message) = message else {
        return String::new();
    };

    match message {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        _ => match message.get("content") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(parts)) => parts
                .iter()
                .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => message.to_string(),
        },
    }
}

/// `(name, input)` for every `tool_use` part of an assistant message.
fn extract_tool_calls(message: Option<&Value>) -> Vec<(String, Value)> {
    let Some(parts) = message
        .and_then(|m| m.get("content"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    parts
        .iter()
        .filter(|p| p.get("type").and_then(Value::as_str) == Some("tool_use"))
        .map(|p| {
            let name = p
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let input = p.get("input").cloned().unwrap_or(Value::Null);
            (name, input)
        })
        .collect()
}

fn record_files(input: &Value, files: &mut Vec<String>) {
    for key in FILE_INPUT_KEYS {
        if let Some(path) = input.get(key).and_then(Value::as_str) {
            if !path.is_empty() && !files.iter().any(|f| f == path) {
                files.push(path.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(lines: &[&str]) -> SessionData {
        parse_reader(Cursor::new(lines.join("\n")), "claude-code").unwrap()
    }

    #[test]
    fn test_streaming_dedup_and_usage() {
        let session = parse(&[
            r#"{"type":"user","timestamp":"2026-01-01T10:00:00Z","requestId":"req-1","message":{"role":"user","content":"Add a login page"}}"#,
            r#"{"type":"assistant","timestamp":"2026-01-01T10:00:01Z","requestId":"req-1","message":{"content":[{"type":"text","text":"Sure"}]}}"#,
            r#"{"type":"assistant","timestamp":"2026-01-01T10:00:02Z","requestId":"req-1","message":{"content":[{"type":"text","text":"Sure, working"}]}}"#,
            r#"{"type":"assistant","timestamp":"2026-01-01T10:00:03Z","requestId":"req-1","message":{"content":[{"type":"text","text":"Sure, working on it"}]},"usage":{"input_tokens":100,"output_tokens":50,"cache_creation_input_tokens":10,"cache_read_input_tokens":5}}"#,
            r#"{"type":"user","timestamp":"2026-01-01T10:01:00Z","requestId":"req-2","message":{"role":"user","content":"Now add tests"}}"#,
            r#"{"type":"assistant","timestamp":"2026-01-01T10:01:05Z","requestId":"req-2","message":{"content":[{"type":"text","text":"Done"}]},"usage":{"input_tokens":200,"output_tokens":100,"cache_creation_input_tokens":0,"cache_read_input_tokens":20}}"#,
        ]);

        assert_eq!(session.prompts.len(), 2);
        assert_eq!(session.responses.len(), 2);
        assert_eq!(session.responses[0].content, "Sure, working on it");
        assert_eq!(
            session.token_usage,
            TokenUsage {
                input_tokens: 300,
                output_tokens: 150,
                cache_creation: 10,
                cache_reads: 25,
                api_calls: 2,
            }
        );
        assert_eq!(session.agent_name, "claude-code");
    }

    #[test]
    fn test_dedup_does_not_depend_on_timestamps() {
        let session = parse(&[
            r#"{"type":"assistant","timestamp":"2026-01-01T10:00:00Z","requestId":"r","message":{"content":"partial"},"usage":{"input_tokens":1}}"#,
            r#"{"type":"assistant","timestamp":"2026-01-01T10:00:00Z","requestId":"r","message":{"content":"final"},"usage":{"input_tokens":7}}"#,
        ]);

        assert_eq!(session.responses.len(), 1);
        assert_eq!(session.responses[0].content, "final");
        assert_eq!(session.token_usage.input_tokens, 7);
        assert_eq!(session.token_usage.api_calls, 1);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let session = parse(&[
            "{not json",
            r#"{"type":"user","timestamp":"2026-01-01T10:00:00Z","message":"hello"}"#,
            "}}}",
        ]);

        assert_eq!(session.prompts.len(), 1);
        assert_eq!(session.prompts[0].content, "hello");
        assert!(session.responses.is_empty());
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(
            br#"{"type":"user","timestamp":"2026-01-01T10:00:00Z","message":"hello"}"#,
        );
        bytes.extend_from_slice(b"\n{\"type\":\"user\",\"message\":\"bad \xff\"}\r\n");
        bytes.extend_from_slice(
            br#"{"type":"user","timestamp":"2026-01-01T10:00:05Z","message":"again"}"#,
        );
        bytes.push(b'\n');

        let session = parse_reader(Cursor::new(bytes), "claude-code").unwrap();

        assert_eq!(session.prompts.len(), 2);
        assert_eq!(session.prompts[0].content, "hello");
        assert_eq!(session.prompts[1].content, "again");
    }

    #[test]
    fn test_usage_inside_message() {
        let session = parse(&[
            r#"{"type":"assistant","requestId":"r","message":{"content":"ok","usage":{"input_tokens":3,"output_tokens":4}}}"#,
        ]);
        assert_eq!(session.token_usage.input_tokens, 3);
        assert_eq!(session.token_usage.output_tokens, 4);
        assert_eq!(session.token_usage.api_calls, 1);
    }

    #[test]
    fn test_response_without_usage_is_not_an_api_call() {
        let session = parse(&[r#"{"type":"assistant","requestId":"r","message":{"content":"ok"}}"#]);
        assert_eq!(session.responses.len(), 1);
        assert_eq!(session.token_usage, TokenUsage::default());
    }

    #[test]
    fn test_extract_content_shapes() {
        let v: Value = serde_json::json!("plain");
        assert_eq!(extract_content(Some(&v)), "plain");

        let v = serde_json::json!({"content": "inner"});
        assert_eq!(extract_content(Some(&v)), "inner");

        let v = serde_json::json!({"content": [
            {"type": "text", "text": "one"},
            {"type": "tool_use", "name": "Read", "input": {}},
            {"type": "text", "text": "two"}
        ]});
        assert_eq!(extract_content(Some(&v)), "one\ntwo");

        let v = serde_json::json!({"other": 1});
        assert_eq!(extract_content(Some(&v)), r#"{"other":1}"#);

        assert_eq!(extract_content(None), "");
    }

    #[test]
    fn test_tool_calls_and_files_changed() {
        let session = parse(&[
            r#"{"type":"assistant","timestamp":"2026-01-01T10:00:00Z","requestId":"r1","message":{"content":[{"type":"tool_use","id":"t0","name":"Edit","input":{"file_path":"src/partial.rs"}}]}}"#,
            r#"{"type":"assistant","timestamp":"2026-01-01T10:00:01Z","requestId":"r1","message":{"content":[{"type":"text","text":"Editing"},{"type":"tool_use","id":"t1","name":"Edit","input":{"file_path":"src/main.rs"}},{"type":"tool_use","id":"t2","name":"Write","input":{"file_path":"src/main.rs"}}]}}"#,
            r#"{"type":"assistant","timestamp":"2026-01-01T10:00:02Z","message":{"content":[{"type":"tool_use","id":"t3","name":"NotebookEdit","input":{"notebook_path":"nb.ipynb"}}]}}"#,
        ]);

        let names: Vec<&str> = session.tool_calls.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Edit", "Edit", "Write", "NotebookEdit"]);
        assert_eq!(session.tool_calls[0].request_id.as_deref(), Some("r1"));
        assert_eq!(session.tool_calls[3].request_id, None);
        assert_eq!(
            session.files_changed,
            vec!["src/partial.rs", "src/main.rs", "nb.ipynb"]
        );
        // Only the last r1 block is a response; the request-less one is not.
        assert_eq!(session.responses.len(), 1);
        assert_eq!(session.responses[0].content, "Editing");
    }

    #[test]
    fn test_session_span() {
        let session = parse(&[
            r#"{"type":"user","timestamp":"2026-01-01T10:00:00Z","message":"a"}"#,
            r#"{"type":"summary"}"#,
            r#"{"type":"user","timestamp":"2026-01-01T11:30:00Z","message":"b"}"#,
        ]);
        assert_eq!(
            session.started_at.map(|t| t.to_rfc3339()),
            Some("2026-01-01T10:00:00+00:00".to_string())
        );
        assert_eq!(
            session.ended_at.map(|t| t.to_rfc3339()),
            Some("2026-01-01T11:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_bad_timestamp_is_none() {
        let session = parse(&[r#"{"type":"user","timestamp":"yesterday","message":"a"}"#]);
        assert_eq!(session.prompts.len(), 1);
        assert!(session.prompts[0].timestamp.is_none());
        assert!(session.started_at.is_none());
    }

    #[test]
    fn test_parse_file_uses_stem_as_id() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("abc-123.jsonl");
        std::fs::write(&path, r#"{"type":"user","message":"hi"}"#).unwrap();

        let session = parse_file(&path, "claude-code").unwrap();
        assert_eq!(session.id, "abc-123");
        assert_eq!(session.prompts.len(), 1);
    }
}
