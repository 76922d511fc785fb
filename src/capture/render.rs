//! Human-readable renderings of a parsed session.
//!
//! `context.md` and `prompt.txt` in each checkpoint session folder are
//! produced here.

use chrono::{DateTime, Utc};

use crate::storage::models::SessionData;

/// Renders a session as markdown.
pub fn render_context(session: &SessionData) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Session {}\n\n", session.id));

    output.push_str("## Metadata\n\n");
    output.push_str("| Property | Value |\n");
    output.push_str("|----------|-------|\n");
    output.push_str(&format!("| Agent | {} |\n", session.agent_name));
    if let Some(started) = session.started_at {
        output.push_str(&format!(
            "| Started | {} |\n",
            started.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if let Some(ended) = session.ended_at {
        output.push_str(&format!(
            "| Ended | {} |\n",
            ended.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if let Some(started) = session.started_at {
            output.push_str(&format!(
                "| Duration | {} minutes |\n",
                ended.signed_duration_since(started).num_minutes()
            ));
        }
    }
    output.push_str(&format!("| Prompts | {} |\n", session.prompts.len()));
    output.push_str(&format!("| Responses | {} |\n", session.responses.len()));
    if !session.nested_sessions.is_empty() {
        output.push_str(&format!(
            "| Sub-agents | {} |\n",
            session.nested_sessions.len()
        ));
    }
    output.push('\n');

    let usage = session.total_usage();
    output.push_str("## Token Usage\n\n");
    output.push_str(&format!("- Input: {}\n", usage.input_tokens));
    output.push_str(&format!("- Output: {}\n", usage.output_tokens));
    output.push_str(&format!("- Cache creation: {}\n", usage.cache_creation));
    output.push_str(&format!("- Cache reads: {}\n", usage.cache_reads));
    output.push_str(&format!("- API calls: {}\n\n", usage.api_calls));

    if !session.files_changed.is_empty() {
        output.push_str("## Files\n\n");
        for file in &session.files_changed {
            output.push_str(&format!("- `{file}`\n"));
        }
        output.push('\n');
    }

    output.push_str("## Conversation\n\n");
    for (timestamp, role, content) in conversation(session) {
        match timestamp {
            Some(t) => output.push_str(&format!(
                "### [{role}] {}\n\n",
                t.format("%Y-%m-%d %H:%M:%S")
            )),
            None => output.push_str(&format!("### [{role}]\n\n")),
        }
        output.push_str(content);
        output.push_str("\n\n");
    }

    if !session.tool_calls.is_empty() {
        output.push_str("## Tool Calls\n\n");
        for call in &session.tool_calls {
            output.push_str(&format!("**Tool: {}**\n\n", call.name));
            output.push_str("```json\n");
            output.push_str(&serde_json::to_string_pretty(&call.input).unwrap_or_default());
            output.push_str("\n```\n\n");
        }
    }

    output
}

/// All prompts of a session separated by `---` lines.
pub fn prompt_excerpt(session: &SessionData) -> String {
    session
        .prompts
        .iter()
        .map(|p| p.content.trim())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Prompts and responses merged in time order. Entries without a timestamp
/// keep their relative order.
fn conversation(session: &SessionData) -> Vec<(Option<DateTime<Utc>>, &'static str, &str)> {
    let mut entries: Vec<_> = session
        .prompts
        .iter()
        .map(|p| (p.timestamp, "Human", p.content.as_str()))
        .chain(
            session
                .responses
                .iter()
                .map(|r| (r.timestamp, "Assistant", r.content.as_str())),
        )
        .collect();

    if entries.iter().all(|(t, _, _)| t.is_some()) {
        entries.sort_by_key(|(t, _, _)| *t);
    }
    entries
}
