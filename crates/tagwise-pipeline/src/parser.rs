// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lenient parsing of remote responses into per-item records.
//!
//! Parsing is total: every input, however malformed, yields exactly the
//! requested number of records. Lines that do not match the mode grammar
//! become empty records, missing lines are padded with empty records and
//! surplus lines are discarded.

use std::sync::LazyLock;

use regex::Regex;
use tagwise_core::{ClassificationMode, ClassificationRecord};

/// Leading `12. ` style numbering some responses echo back.
static INDEX_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.．]\s+").unwrap());

/// A markdown fence line, optionally carrying a language tag.
static FENCE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^`{3,}[A-Za-z0-9_+-]*$").unwrap());

const TAG_DELIMITERS: [char; 2] = ['|', '｜'];
const LIST_DELIMITERS: [char; 3] = [',', '、', '，'];
const SENTIMENT_PREFIXES: [&str; 2] = ["感情", "sentiment"];

/// Records recovered from one response plus counters for what was lost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBatch {
    /// Exactly `expected` records, in response-line order.
    pub records: Vec<ClassificationRecord>,
    /// Lines that were present but did not match the grammar.
    pub degraded_lines: usize,
    /// Records appended because the response had too few lines.
    pub padded: usize,
}

/// Parses `raw` into exactly `expected` records for `mode`.
pub fn parse_response(raw: &str, expected: usize, mode: ClassificationMode) -> ParsedBatch {
    let mut records = Vec::with_capacity(expected);
    let mut degraded_lines = 0;

    for segment in segments(raw).take(expected) {
        match parse_line(segment, mode) {
            Some(record) => records.push(record),
            None => {
                degraded_lines += 1;
                records.push(ClassificationRecord::empty());
            }
        }
    }

    let padded = expected - records.len();
    records.resize(expected, ClassificationRecord::empty());

    ParsedBatch {
        records,
        degraded_lines,
        padded,
    }
}

/// Non-blank response lines with numbering stripped, skipping fence lines.
///
/// A line that held only a number still counts as a segment so later lines
/// stay aligned with their items. A fence glued to content is stripped and
/// the content kept.
fn segments(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !FENCE_LINE.is_match(line))
        .map(|line| line.strip_prefix("```").map_or(line, str::trim_start))
        .map(|line| match INDEX_PREFIX.find(line) {
            Some(m) => line[m.end()..].trim(),
            None => line,
        })
}

fn parse_line(line: &str, mode: ClassificationMode) -> Option<ClassificationRecord> {
    match mode {
        ClassificationMode::TagsOnly => parse_tags_only(line),
        ClassificationMode::TagsSentiment => parse_tags_sentiment(line),
    }
}

/// `<primary>|<secondary1>, <secondary2>`
fn parse_tags_only(line: &str) -> Option<ClassificationRecord> {
    let (primary, secondary) = line.split_once(TAG_DELIMITERS)?;
    let primary = primary.trim();
    if primary.is_empty() {
        return None;
    }
    Some(ClassificationRecord::tagged(
        primary,
        secondary.split(LIST_DELIMITERS),
    ))
}

/// `<tag1>, <tag2>, <tag3> | 感情: <label>`
fn parse_tags_sentiment(line: &str) -> Option<ClassificationRecord> {
    let (tags, label) = line.rsplit_once(TAG_DELIMITERS)?;
    let mut tags = tags
        .split(LIST_DELIMITERS)
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let primary = tags.next()?;

    let label = strip_sentiment_prefix(label.trim());
    if label.is_empty() {
        return None;
    }

    Some(ClassificationRecord::tagged(primary, tags).with_sentiment(label))
}

fn strip_sentiment_prefix(label: &str) -> &str {
    for prefix in SENTIMENT_PREFIXES {
        if let Some(rest) = label.strip_prefix(prefix) {
            let rest = rest.trim_start();
            if let Some(value) = rest.strip_prefix([':', '：']) {
                return value.trim();
            }
        }
    }
    label
}
