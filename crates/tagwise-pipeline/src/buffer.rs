// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-sized, position-indexed storage for classification records.

use std::ops::Range;

use tagwise_core::{ClassificationRecord, TagwiseError};

/// One slot per input position, pre-filled with empty records.
///
/// Each position may be claimed at most once; a second write to any
/// position in a range is rejected without modifying the buffer.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    slots: Vec<ClassificationRecord>,
    claimed: Vec<bool>,
}

impl OutputBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![ClassificationRecord::empty(); len],
            claimed: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of positions written so far.
    pub fn written(&self) -> usize {
        self.claimed.iter().filter(|c| **c).count()
    }

    /// Writes `records` into consecutive positions starting at `start`.
    pub fn write(
        &mut self,
        start: usize,
        records: Vec<ClassificationRecord>,
    ) -> Result<(), TagwiseError> {
        let range = start..start + records.len();
        self.claim(range.clone())?;
        for (slot, record) in self.slots[range].iter_mut().zip(records) {
            *slot = record;
        }
        Ok(())
    }

    /// Marks `range` as settled while leaving its records empty.
    pub fn write_empty(&mut self, range: Range<usize>) -> Result<(), TagwiseError> {
        self.claim(range)
    }

    pub fn records(&self) -> &[ClassificationRecord] {
        &self.slots
    }

    pub fn into_records(self) -> Vec<ClassificationRecord> {
        self.slots
    }

    fn claim(&mut self, range: Range<usize>) -> Result<(), TagwiseError> {
        if range.end > self.slots.len() {
            return Err(TagwiseError::Internal(format!(
                "write to positions {range:?} exceeds buffer of {}",
                self.slots.len()
            )));
        }
        if self.claimed[range.clone()].iter().any(|c| *c) {
            return Err(TagwiseError::Internal(format!(
                "positions {range:?} written more than once"
            )));
        }
        self.claimed[range].fill(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tag: &str) -> ClassificationRecord {
        ClassificationRecord::tagged(tag, Vec::<String>::new())
    }

    #[test]
    fn new_buffer_is_all_empty() {
        let buffer = OutputBuffer::new(3);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.written(), 0);
        assert!(buffer.records().iter().all(ClassificationRecord::is_empty));
    }

    #[test]
    fn writes_land_at_their_positions_in_any_order() {
        let mut buffer = OutputBuffer::new(5);
        buffer.write(3, vec![tagged("d"), tagged("e")]).unwrap();
        buffer.write(0, vec![tagged("a"), tagged("b"), tagged("c")]).unwrap();

        let primaries: Vec<_> = buffer
            .records()
            .iter()
            .map(|r| r.primary_tag().unwrap_or_default())
            .collect();
        assert_eq!(primaries, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(buffer.written(), 5);
    }

    #[test]
    fn overlapping_write_is_rejected_and_leaves_buffer_intact() {
        let mut buffer = OutputBuffer::new(4);
        buffer.write(0, vec![tagged("a"), tagged("b")]).unwrap();

        let err = buffer.write(1, vec![tagged("x"), tagged("y")]).unwrap_err();
        assert!(matches!(err, TagwiseError::Internal(_)));
        assert_eq!(buffer.records()[1].primary_tag(), Some("b"));
        assert!(buffer.records()[2].is_empty());
        assert_eq!(buffer.written(), 2);
    }

    #[test]
    fn out_of_bounds_write_is_rejected() {
        let mut buffer = OutputBuffer::new(2);
        assert!(buffer.write(1, vec![tagged("a"), tagged("b")]).is_err());
        assert!(buffer.write_empty(0..3).is_err());
    }

    #[test]
    fn empty_write_claims_without_changing_records() {
        let mut buffer = OutputBuffer::new(3);
        buffer.write_empty(0..3).unwrap();
        assert_eq!(buffer.written(), 3);
        assert!(buffer.write(0, vec![tagged("late")]).is_err());
        assert!(buffer.into_records().iter().all(ClassificationRecord::is_empty));
    }
}
