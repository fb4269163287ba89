// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV input: locating the comment column and cleaning rows.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tagwise_config::model::InputConfig;
use tagwise_core::TagwiseError;

/// Rows that survived cleaning, with the comment column located.
#[derive(Debug, Clone)]
pub struct CommentTable {
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
    comment_index: usize,
    date_index: Option<usize>,
    dropped_blank: usize,
    dropped_duplicate: usize,
}

impl CommentTable {
    pub fn headers(&self) -> &csv::StringRecord {
        &self.headers
    }

    pub fn rows(&self) -> &[csv::StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Comment text of every kept row, in file order.
    pub fn comments(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.get(self.comment_index).unwrap_or_default())
            .collect()
    }

    /// Whether rows were filtered and deduplicated by a date column.
    pub fn has_date_column(&self) -> bool {
        self.date_index.is_some()
    }

    pub fn dropped_blank(&self) -> usize {
        self.dropped_blank
    }

    pub fn dropped_duplicate(&self) -> usize {
        self.dropped_duplicate
    }
}

/// Reads `path`, keeping rows whose comment (and date, if the file has the
/// date column) is non-blank.
///
/// With `drop_duplicates`, only the first row carrying a given trimmed
/// (comment, date) pair is kept.
pub fn read_comments(path: &Path, options: &InputConfig) -> Result<CommentTable, TagwiseError> {
    let file = File::open(path).map_err(|e| {
        TagwiseError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open {}: {e}", path.display()),
        ))
    })?;
    read_comments_from(file, options)
}

pub fn read_comments_from<R: Read>(
    reader: R,
    options: &InputConfig,
) -> Result<CommentTable, TagwiseError> {
    let column = options.comment_column.as_str();
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: csv::StringRecord = reader
        .headers()
        .map_err(|e| csv_error("failed to read CSV header", e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect();

    let comment_index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| TagwiseError::Csv {
            message: format!(
                "column \"{column}\" not found; available columns: {}",
                headers.iter().collect::<Vec<_>>().join(", ")
            ),
            source: None,
        })?;
    let date_column = options.date_column.trim();
    let date_index = (!date_column.is_empty())
        .then(|| headers.iter().position(|h| h == date_column))
        .flatten();

    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    let mut dropped_blank = 0;
    let mut dropped_duplicate = 0;

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(&format!("failed to read row {}", line + 2), e))?;
        let comment = record.get(comment_index).unwrap_or_default().trim();
        let date = date_index
            .map(|i| record.get(i).unwrap_or_default().trim())
            .unwrap_or_default();
        if comment.is_empty() || (date_index.is_some() && date.is_empty()) {
            dropped_blank += 1;
            continue;
        }
        if options.drop_duplicates && !seen.insert((comment.to_string(), date.to_string())) {
            dropped_duplicate += 1;
            continue;
        }
        rows.push(record);
    }

    Ok(CommentTable {
        headers,
        rows,
        comment_index,
        date_index,
        dropped_blank,
        dropped_duplicate,
    })
}

fn csv_error(context: &str, err: csv::Error) -> TagwiseError {
    TagwiseError::Csv {
        message: format!("{context}: {err}"),
        source: Some(Box::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "作成日,コメント\n2024-01-01,配送が遅い\n2024-01-02,\n2024-01-03,価格が高い\n2024-01-01, 配送が遅い \n2024-01-04,配送が遅い\n";

    fn options() -> InputConfig {
        InputConfig::default()
    }

    fn without_duplicates_dropped() -> InputConfig {
        InputConfig {
            drop_duplicates: false,
            ..InputConfig::default()
        }
    }

    #[test]
    fn duplicates_are_judged_on_comment_and_date() {
        let table = read_comments_from(SAMPLE.as_bytes(), &options()).unwrap();
        assert!(table.has_date_column());
        assert_eq!(table.comments(), vec!["配送が遅い", "価格が高い", "配送が遅い"]);
        assert_eq!(table.dropped_blank(), 1);
        assert_eq!(table.dropped_duplicate(), 1);
        assert_eq!(&table.rows()[2][0], "2024-01-04");
    }

    #[test]
    fn rows_without_a_date_are_dropped() {
        let data = "作成日,コメント\n,日付なし\n2024-02-01,あり\n";
        let table = read_comments_from(data.as_bytes(), &options()).unwrap();
        assert_eq!(table.comments(), vec!["あり"]);
        assert_eq!(table.dropped_blank(), 1);
    }

    #[test]
    fn without_a_date_column_duplicates_are_judged_on_comment() {
        let data = "id,コメント\n1,配送が遅い\n2, 配送が遅い\n3,高い\n";
        let table = read_comments_from(data.as_bytes(), &options()).unwrap();
        assert!(!table.has_date_column());
        assert_eq!(table.comments(), vec!["配送が遅い", "高い"]);
        assert_eq!(table.dropped_duplicate(), 1);
    }

    #[test]
    fn empty_date_column_disables_date_handling() {
        let options = InputConfig {
            date_column: String::new(),
            ..InputConfig::default()
        };
        let table = read_comments_from(SAMPLE.as_bytes(), &options).unwrap();
        assert!(!table.has_date_column());
        assert_eq!(table.comments(), vec!["配送が遅い", "価格が高い"]);
        assert_eq!(table.dropped_duplicate(), 2);
    }

    #[test]
    fn duplicates_are_kept_on_request() {
        let table = read_comments_from(SAMPLE.as_bytes(), &without_duplicates_dropped()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.dropped_duplicate(), 0);
    }

    #[test]
    fn missing_column_names_the_alternatives() {
        let options = InputConfig {
            comment_column: "comment".into(),
            ..InputConfig::default()
        };
        let err = read_comments_from(SAMPLE.as_bytes(), &options).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("\"comment\" not found"), "{message}");
        assert!(message.contains("作成日, コメント"), "{message}");
    }

    #[test]
    fn byte_order_mark_is_ignored_in_headers() {
        let data = "\u{feff}コメント,score\nよい,5\n";
        let table = read_comments_from(data.as_bytes(), &options()).unwrap();
        assert_eq!(table.comments(), vec!["よい"]);
        assert_eq!(&table.headers()[0], "コメント");
    }

    #[test]
    fn short_rows_count_as_blank() {
        let data = "id,コメント\n1\n2,ok\n";
        let table = read_comments_from(data.as_bytes(), &options()).unwrap();
        assert_eq!(table.comments(), vec!["ok"]);
        assert_eq!(table.dropped_blank(), 1);
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let table = read_comments(file.path(), &options()).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_comments(&dir.path().join("absent.csv"), &options()).unwrap_err();
        assert!(matches!(err, TagwiseError::Io(_)));
    }
}
