//! Commit message trailers linking commits to checkpoints.

/// Trailer carrying the checkpoint id of the commit.
pub const TRAILER_CHECKPOINT: &str = "Entire-Checkpoint";

/// Trailer carrying the agent/human line split of the commit.
pub const TRAILER_ATTRIBUTION: &str = "Entire-Attribution";

/// Returns the value of the first `key:` line in `message`.
pub fn read_trailer(key: &str, message: &str) -> Option<String> {
    let prefix = format!("{key}:");
    message
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|value| value.trim().to_string())
}

/// Returns true if `message` already carries a `key:` trailer.
pub fn has_trailer(message: &str, key: &str) -> bool {
    read_trailer(key, message).is_some()
}

/// Extracts the checkpoint id from a commit message.
pub fn parse_checkpoint_trailer(message: &str) -> Option<String> {
    read_trailer(TRAILER_CHECKPOINT, message).filter(|id| !id.is_empty())
}

/// Appends `key: value` to a commit message.
///
/// Joins an existing trailer block with a single newline; otherwise the
/// trailer starts a new paragraph.
pub fn append_trailer_to_message(message: &str, key: &str, value: &str) -> String {
    let body = message.trim_end();
    let trailer = format!("{key}: {value}");

    if body.is_empty() {
        return format!("{trailer}\n");
    }

    let separator = if ends_with_trailer_block(body) { "\n" } else { "\n\n" };
    format!("{body}{separator}{trailer}\n")
}

/// Formats the value of an [`TRAILER_ATTRIBUTION`] trailer.
pub fn format_attribution_trailer(percent: f64, agent_lines: u64, total_lines: u64) -> String {
    format!("{percent:.0}% agent ({agent_lines}/{total_lines} lines)")
}

/// True if the last paragraph of `body` (not the subject) is all `Token: value` lines.
fn ends_with_trailer_block(body: &str) -> bool {
    let Some((_, last)) = body.rsplit_once("\n\n") else {
        return false;
    };
    let mut lines = last.lines().peekable();
    lines.peek().is_some() && lines.all(is_trailer_line)
}

fn is_trailer_line(line: &str) -> bool {
    match line.split_once(": ") {
        Some((token, _)) => {
            !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_attribution_trailer() {
        assert_eq!(
            format_attribution_trailer(73.0, 146, 200),
            "73% agent (146/200 lines)"
        );
    }

    #[test]
    fn test_parse_checkpoint_trailer() {
        let msg = "feat: Add user authentication\n\n\
                   Some description here.\n\n\
                   Entire-Checkpoint: a3b2c4d5e6f7\n\
                   Entire-Attribution: 73% agent (146/200 lines)";
        assert_eq!(parse_checkpoint_trailer(msg).as_deref(), Some("a3b2c4d5e6f7"));
        assert_eq!(
            read_trailer(TRAILER_ATTRIBUTION, msg).as_deref(),
            Some("73% agent (146/200 lines)")
        );
    }

    #[test]
    fn test_parse_checkpoint_trailer_not_found() {
        assert_eq!(parse_checkpoint_trailer("feat: Normal commit without trailers"), None);
    }

    #[test]
    fn test_append_trailer_new_paragraph() {
        let msg = append_trailer_to_message("fix: typo\n", TRAILER_CHECKPOINT, "a3b2c4d5e6f7");
        assert_eq!(msg, "fix: typo\n\nEntire-Checkpoint: a3b2c4d5e6f7\n");
    }

    #[test]
    fn test_append_trailer_joins_existing_block() {
        let msg = "fix: typo\n\nEntire-Checkpoint: a3b2c4d5e6f7\n";
        let out = append_trailer_to_message(msg, TRAILER_ATTRIBUTION, "50% agent (1/2 lines)");
        assert_eq!(
            out,
            "fix: typo\n\nEntire-Checkpoint: a3b2c4d5e6f7\nEntire-Attribution: 50% agent (1/2 lines)\n"
        );
    }

    #[test]
    fn test_append_trailer_prose_paragraph_is_not_a_block() {
        let msg = "fix: typo\n\nThis explains: the reason for the change";
        let out = append_trailer_to_message(msg, TRAILER_CHECKPOINT, "a3b2c4d5e6f7");
        assert!(out.ends_with("change\n\nEntire-Checkpoint: a3b2c4d5e6f7\n"));
    }

    #[test]
    fn test_has_trailer() {
        assert!(has_trailer("x\n\nEntire-Checkpoint: abc", TRAILER_CHECKPOINT));
        assert!(!has_trailer("x\n\nEntire-Attribution: 1%", TRAILER_CHECKPOINT));
    }
}
