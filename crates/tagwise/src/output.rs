// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV output: the kept input rows with classification columns appended.

use std::io::Write;
use std::path::Path;

use tagwise_core::{ClassificationRecord, TagwiseError};

use crate::input::CommentTable;

/// Columns appended after the input columns.
pub const RECORD_COLUMNS: [&str; 4] = [
    "primary_tag",
    "secondary_tag_1",
    "secondary_tag_2",
    "sentiment",
];

pub fn write_results_to_path(
    path: &Path,
    table: &CommentTable,
    records: &[ClassificationRecord],
) -> Result<(), TagwiseError> {
    let file = std::fs::File::create(path).map_err(|e| {
        TagwiseError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot create {}: {e}", path.display()),
        ))
    })?;
    write_results(file, table, records)
}

/// Writes one output row per table row; absent fields become empty cells.
pub fn write_results<W: Write>(
    writer: W,
    table: &CommentTable,
    records: &[ClassificationRecord],
) -> Result<(), TagwiseError> {
    if records.len() != table.len() {
        return Err(TagwiseError::Internal(format!(
            "{} records for {} rows",
            records.len(),
            table.len()
        )));
    }

    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    let header = table.headers().iter().chain(RECORD_COLUMNS);
    writer.write_record(header).map_err(write_error)?;

    for (row, record) in table.rows().iter().zip(records) {
        let secondary = record.secondary_tags();
        let cells = [
            record.primary_tag().unwrap_or_default(),
            secondary.first().map(String::as_str).unwrap_or_default(),
            secondary.get(1).map(String::as_str).unwrap_or_default(),
            record.sentiment().unwrap_or_default(),
        ];
        writer
            .write_record(row.iter().chain(cells))
            .map_err(write_error)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_error(err: csv::Error) -> TagwiseError {
    TagwiseError::Csv {
        message: format!("failed to write CSV: {err}"),
        source: Some(Box::new(err)),
    }
}
