use chrono::{DateTime, Utc};

/// Font size the average character width below is calibrated against.
pub const BASE_FONT_SIZE: f32 = 16.0;

/// Average monospace glyph width at [`BASE_FONT_SIZE`]. No real font metrics
/// are consulted anywhere; every width in the layout is this estimate scaled
/// to the requested size.
const BASE_CHAR_WIDTH: f32 = 8.0;

/// Hard cap on wrapped output, truncated final line included.
const MAX_WRAP_LINES: usize = 10;

/// How far past the wrap column a space may be and still be taken as the
/// break point. Beyond this the line is hard-broken mid-word.
const WRAP_SLACK: usize = 20;

/// Estimated pixel width of `text` at `font_size`. Stable and monotonic in
/// string length; counts chars, not bytes.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * BASE_CHAR_WIDTH * font_size / BASE_FONT_SIZE
}

/// Cut `text` to at most `max_chars` chars, marking the cut with an ellipsis.
/// Input shorter than the limit passes through unchanged.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() < max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let mut cut: String = text.chars().take(max_chars - 1).collect();
    cut.push('…');
    cut
}

/// Greedily break `text` into lines of roughly `max_line` chars. A space at
/// or after the wrap column breaks the line (and is dropped) when it falls
/// within [`WRAP_SLACK`] chars of the column; otherwise the line is
/// hard-broken at exactly `max_line`. Output is capped at [`MAX_WRAP_LINES`]
/// lines; leftover text collapses into a final truncated line, so dropped
/// content always leaves the ellipsis marker.
///
/// Each iteration consumes at least one char (`max_line` is clamped to 1),
/// so even a spaceless input terminates.
pub fn wrap(text: &str, max_line: usize) -> Vec<String> {
    let max_line = max_line.max(1);
    let chars: Vec<char> = text.chars().collect();
    let mut lines: Vec<String> = Vec::new();
    let mut at = 0;

    while at < chars.len() && lines.len() < MAX_WRAP_LINES - 1 {
        let rest = &chars[at..];
        if rest.len() <= max_line {
            lines.push(rest.iter().collect());
            return lines;
        }

        let next_break = rest[max_line..]
            .iter()
            .position(|&c| c == ' ')
            .map(|i| i + max_line);
        match next_break {
            Some(i) if i < max_line + WRAP_SLACK => {
                lines.push(rest[..i].iter().collect());
                at += i + 1;
            }
            _ => {
                lines.push(rest[..max_line].iter().collect());
                at += max_line;
            }
        }
    }

    if at < chars.len() {
        let remainder: String = chars[at..].iter().collect();
        lines.push(truncate(&remainder, max_line));
    }

    lines
}

/// Format a row timestamp either as an absolute UTC date-time or, when
/// `as_offset` is set, as the signed millisecond distance from `start_time`
/// with thousands separators.
pub fn format_timestamp(
    timestamp: DateTime<Utc>,
    start_time: DateTime<Utc>,
    as_offset: bool,
) -> String {
    if !as_offset {
        return timestamp.format("%Y-%m-%d %H:%M:%S%.3fZ").to_string();
    }

    let offset_ms = timestamp.signed_duration_since(start_time).num_milliseconds();
    format!("{}ms", group_thousands(offset_ms))
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
