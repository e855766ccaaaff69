//! The free-text command grammar embedded in card titles, descriptions, and
//! pane text. Two independent grammars coexist:
//!
//! - a passive count marker `#<digits>` setting the card's micro-task target,
//!   suppressed whenever a `!` appears anywhere in the combined text;
//! - a batch command delimited by `. ... .` that spawns a chain of sub-cards.
//!
//! Parsing here is pure; the store applies the resulting directives.

use regex::Regex;
use std::sync::OnceLock;

/// Time-unit multipliers in seconds. The week unit follows the source's
/// 30-day convention.
const UNIT_SECOND: u32 = 1;
const UNIT_MINUTE: u32 = 60;
const UNIT_HOUR: u32 = 3_600;
const UNIT_WEEK: u32 = 2_592_000;
const UNIT_YEAR: u32 = 31_536_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSegment {
    pub title: String,
    /// Per-segment override; falls back to the batch default.
    pub duration_seconds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommand {
    pub default_duration: Option<u32>,
    pub explicit_count: Option<usize>,
    pub tags: Vec<String>,
    pub segments: Vec<BatchSegment>,
}

impl BatchCommand {
    /// Segments after count padding: one segment is duplicated to fill an
    /// explicit count, and an empty batch with a positive count synthesizes
    /// placeholder titles.
    pub fn expanded_segments(&self) -> Vec<BatchSegment> {
        let mut segments = self.segments.clone();
        if let Some(count) = self.explicit_count {
            if segments.len() == 1 && count > 1 {
                let template = segments[0].clone();
                while segments.len() < count {
                    segments.push(template.clone());
                }
            } else if segments.len() < count {
                for i in segments.len()..count {
                    segments.push(BatchSegment {
                        title: format!("Task {}", i + 1),
                        duration_seconds: None,
                    });
                }
            }
        }
        segments
    }

    /// Resolved duration for a segment, in seconds.
    pub fn duration_for(&self, segment: &BatchSegment) -> u32 {
        segment
            .duration_seconds
            .or(self.default_duration)
            .unwrap_or(0)
    }
}

/// Result of parsing one text field.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub stripped: String,
    pub target_micro_tasks: Option<u32>,
    pub batch: Option<BatchCommand>,
}

fn count_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\d+)").unwrap())
}

fn batch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Leading period+space ... space+trailing period, shortest match.
    RE.get_or_init(|| Regex::new(r"(?s)\. (.*?) \.").unwrap())
}

fn time_token(word: &str) -> Option<u32> {
    let mut chars = word.chars();
    let unit = match chars.next()? {
        's' => UNIT_SECOND,
        'm' => UNIT_MINUTE,
        'h' => UNIT_HOUR,
        'w' => UNIT_WEEK,
        'y' => UNIT_YEAR,
        _ => return None,
    };
    let digits = chars.as_str();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    Some(unit.saturating_mul(value))
}

fn count_token(word: &str) -> Option<usize> {
    let digits = word.strip_prefix('n')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn tag_token(word: &str) -> Option<String> {
    let tag = word.strip_prefix('#')?;
    // Digits-only is the count marker, not a tag.
    if tag.is_empty() || tag.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(tag.to_string())
}

/// The `#<digits>` micro-task target, if present. Callers decide whether a
/// `!` elsewhere in the combined text suppresses it.
pub fn count_marker(text: &str) -> Option<u32> {
    count_marker_re()
        .captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

pub fn has_bang(text: &str) -> bool {
    text.contains('!')
}

/// Finds the first `. ... .` batch block in `text`. Returns the parsed
/// command and the text with the matched substring removed.
pub fn extract_batch(text: &str) -> Option<(BatchCommand, String)> {
    let m = batch_re().find(text)?;
    let inner = &text[m.start() + 2..m.end() - 2];
    let command = parse_batch_body(inner)?;
    let mut stripped = String::with_capacity(text.len() - m.len());
    stripped.push_str(&text[..m.start()]);
    stripped.push_str(&text[m.end()..]);
    Some((command, stripped.trim().to_string()))
}

fn parse_batch_body(inner: &str) -> Option<BatchCommand> {
    let mut default_duration: Option<u32> = None;
    let mut explicit_count: Option<usize> = None;
    let mut tags = Vec::new();
    let mut remainder: Vec<&str> = Vec::new();

    for word in inner.split_whitespace() {
        // Time tokens ahead of any title word stack into the batch default;
        // later ones belong to individual segments.
        if remainder.is_empty()
            && let Some(seconds) = time_token(word)
        {
            default_duration = Some(default_duration.unwrap_or(0).saturating_add(seconds));
            continue;
        }
        if explicit_count.is_none()
            && let Some(count) = count_token(word)
        {
            explicit_count = Some(count);
            continue;
        }
        if let Some(tag) = tag_token(word) {
            tags.push(tag);
            continue;
        }
        remainder.push(word);
    }

    let segments = parse_segments(&remainder.join(" "));
    if segments.is_empty() && explicit_count.is_none() {
        return None;
    }
    Some(BatchCommand {
        default_duration,
        explicit_count,
        tags,
        segments,
    })
}

fn parse_segments(text: &str) -> Vec<BatchSegment> {
    text.split([',', ';'])
        .filter_map(|raw| {
            let mut words: Vec<&str> = raw.split_whitespace().collect();
            let mut duration = None;
            if let Some(first) = words.first()
                && let Some(seconds) = time_token(first)
            {
                duration = Some(seconds);
                words.remove(0);
            } else if let Some(last) = words.last()
                && let Some(seconds) = time_token(last)
            {
                duration = Some(seconds);
                words.pop();
            }
            let title = words.join(" ");
            if title.is_empty() {
                None
            } else {
                Some(BatchSegment {
                    title,
                    duration_seconds: duration,
                })
            }
        })
        .collect()
}

/// Single-field convenience entry point: batch extraction plus the count
/// marker (honored only when the field carries no `!`). Multi-field callers
/// use the lower-level functions so the `!` check can span the combined text
/// while stripping stays per-field. The batch block always parses and
/// strips; `!` suppresses only the count marker.
pub fn parse(text: &str) -> Parsed {
    let (batch, stripped) = match extract_batch(text) {
        Some((command, stripped)) => (Some(command), stripped),
        None => (None, text.to_string()),
    };
    let target_micro_tasks = if has_bang(text) {
        None
    } else {
        count_marker(&stripped)
    };
    Parsed {
        stripped,
        target_micro_tasks,
        batch,
    }
}
