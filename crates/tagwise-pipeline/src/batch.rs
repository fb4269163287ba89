// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text normalization and partitioning of the input into batches.

use tagwise_core::{Batch, InputItem, TagwiseError};

/// Trims `raw`, flattens line breaks into spaces and truncates the result
/// to at most `max_chars` characters.
///
/// Truncation counts Unicode scalar values, never bytes, so multi-byte
/// text is never split inside a character.
pub fn normalize_text(raw: &str, max_chars: usize) -> String {
    let flattened: String = raw
        .trim()
        .replace("\r\n", " ")
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    match flattened.char_indices().nth(max_chars) {
        Some((cut, _)) => flattened[..cut].to_string(),
        None => flattened,
    }
}

/// Splits `texts` into contiguous batches of at most `batch_size` items.
///
/// Batch `k` covers positions `[k * batch_size, min((k + 1) * batch_size, n))`.
/// Every item is normalized with [`normalize_text`]. An empty input yields
/// no batches.
pub fn build_batches<S: AsRef<str>>(
    texts: &[S],
    batch_size: usize,
    max_chars: usize,
) -> Result<Vec<Batch>, TagwiseError> {
    if batch_size == 0 {
        return Err(TagwiseError::Config(
            "batch_size must be at least 1".to_string(),
        ));
    }
    if max_chars == 0 {
        return Err(TagwiseError::Config(
            "max_item_text_length must be at least 1".to_string(),
        ));
    }

    texts
        .chunks(batch_size)
        .enumerate()
        .map(|(index, chunk)| {
            let start = index * batch_size;
            let items = chunk
                .iter()
                .enumerate()
                .map(|(offset, text)| InputItem {
                    position: start + offset,
                    text: normalize_text(text.as_ref(), max_chars),
                })
                .collect();
            Batch::new(index, items)
        })
        .collect()
}
