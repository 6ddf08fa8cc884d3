use thiserror::Error;

use crate::{types::MessageSeq, wrapping_number::sequence_less_than};

/// Errors that can occur during SequenceBuffer operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Attempted to buffer a sequence number that is already held
    #[error("Sequence number {seq} is already buffered")]
    Duplicate { seq: MessageSeq },
}

/// Holds out-of-order items keyed by wrapping sequence number, kept in
/// ascending sequence order so the earliest gap-filling item is always at
/// the front.
pub struct SequenceBuffer<T> {
    list: Vec<(MessageSeq, T)>,
}

impl<T> SequenceBuffer<T> {
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Sequence number of the earliest buffered item, if any.
    pub fn front_seq(&self) -> Option<MessageSeq> {
        self.list.first().map(|(seq, _)| *seq)
    }

    pub fn pop_front(&mut self) -> Option<(MessageSeq, T)> {
        if self.list.is_empty() {
            None
        } else {
            Some(self.list.remove(0))
        }
    }

    /// Inserts an item in sequence order, scanning from the back since
    /// arrivals are usually near the tail.
    pub fn insert(&mut self, seq: MessageSeq, item: T) -> Result<(), SequenceError> {
        let mut index = self.list.len();

        loop {
            if index == 0 {
                self.list.insert(0, (seq, item));
                return Ok(());
            }

            index -= 1;

            let (buffered_seq, _) = &self.list[index];
            if *buffered_seq == seq {
                return Err(SequenceError::Duplicate { seq });
            }
            if sequence_less_than(*buffered_seq, seq) {
                self.list.insert(index + 1, (seq, item));
                return Ok(());
            }
        }
    }
}

impl<T> Default for SequenceBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
