// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Final ordered sequence of records.

use tagwise_core::{ClassificationRecord, TagwiseError};

use crate::buffer::OutputBuffer;

/// Converts the filled buffer into the final record sequence.
///
/// Record `i` always describes input item `i`; positions no batch wrote
/// (failed, panicked or cancelled batches) hold the empty record.
pub fn assemble(
    buffer: OutputBuffer,
    expected: usize,
) -> Result<Vec<ClassificationRecord>, TagwiseError> {
    if buffer.len() != expected {
        return Err(TagwiseError::Internal(format!(
            "output buffer holds {} records, expected {expected}",
            buffer.len()
        )));
    }
    Ok(buffer.into_records())
}
