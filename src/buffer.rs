use std::num::NonZeroUsize;

use tracing::{debug, warn};

use crate::{error::BufferError, lot::Lot};

/// Bounded FIFO queue of lots backed by a circular array.
///
/// `head` is the slot of the oldest lot and `tail` the slot the next append
/// writes to. Both advance modulo the capacity. `len` is tracked on its own
/// because `head == tail` holds both when empty and when full.
#[derive(Debug)]
pub struct LotBuffer {
    slots: Box<[Option<Lot>]>,
    head: usize,
    tail: usize,
    len: usize,
}

impl LotBuffer {
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        LotBuffer {
            slots: (0..capacity.get()).map(|_| None).collect(),
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// The oldest lot still held.
    pub fn front(&self) -> Result<&Lot, BufferError> {
        if self.is_empty() {
            return Err(BufferError::Empty);
        }
        self.slots[self.head].as_ref().ok_or(BufferError::Empty)
    }

    /// The most recently appended lot.
    pub fn last(&self) -> Result<&Lot, BufferError> {
        if self.is_empty() {
            return Err(BufferError::Empty);
        }
        self.slots[self.retreat(self.tail)]
            .as_ref()
            .ok_or(BufferError::Empty)
    }

    /// Append a lot at the tail. A full buffer rejects the lot and is left
    /// untouched.
    pub fn append(&mut self, lot: Lot) -> Result<(), BufferError> {
        if self.is_full() {
            warn!(symbol = lot.symbol(), capacity = self.capacity(), "lot buffer full");
            return Err(BufferError::Full {
                capacity: self.capacity(),
            });
        }

        debug!(slot = self.tail, lot = %lot, "appending lot");
        self.slots[self.tail] = Some(lot);
        self.tail = self.advance(self.tail);
        self.len += 1;

        Ok(())
    }

    /// Remove and return the oldest lot.
    pub fn remove_front(&mut self) -> Result<Lot, BufferError> {
        if self.is_empty() {
            return Err(BufferError::Empty);
        }

        let lot = self.slots[self.head].take().ok_or(BufferError::Empty)?;
        debug!(slot = self.head, lot = %lot, "removed front lot");
        self.head = self.advance(self.head);
        self.len -= 1;

        Ok(lot)
    }

    /// Iterate from the oldest lot to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Lot> + '_ {
        (0..self.len).filter_map(move |offset| {
            self.slots[(self.head + offset) % self.capacity()].as_ref()
        })
    }

    pub(crate) fn front_mut(&mut self) -> Result<&mut Lot, BufferError> {
        if self.is_empty() {
            return Err(BufferError::Empty);
        }
        self.slots[self.head].as_mut().ok_or(BufferError::Empty)
    }

    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }

    fn retreat(&self, index: usize) -> usize {
        (index + self.capacity() - 1) % self.capacity()
    }
}

#[cfg(test)]
mod tests {
    use std::{num::NonZeroU64, str::FromStr};

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

    fn buffer(capacity: usize) -> LotBuffer {
        LotBuffer::with_capacity(NonZeroUsize::new(capacity).expect("non-zero capacity"))
    }

    fn lot(symbol: &str, quantity: u64) -> Lot {
        Lot::open(
            symbol,
            NonZeroU64::new(quantity).expect("non-zero share count"),
            Decimal::from(100),
            NaiveDate::from_str("2018-04-29").expect("valid date"),
        )
    }

    #[test]
    fn test_new_buffer_rejects_reads_and_removal() {
        let mut buffer = buffer(3);

        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.front(), Err(BufferError::Empty));
        assert_eq!(buffer.last(), Err(BufferError::Empty));
        assert_eq!(buffer.remove_front(), Err(BufferError::Empty));
    }

    #[test]
    fn test_front_and_last_follow_arrival_order() -> Result<(), BufferError> {
        let mut buffer = buffer(3);
        buffer.append(lot("AMZN", 1))?;
        buffer.append(lot("FB", 2))?;
        buffer.append(lot("AAPL", 3))?;

        assert_eq!(buffer.front()?.symbol(), "AMZN");
        assert_eq!(buffer.last()?.symbol(), "AAPL");
        // Peeking twice gives the same answer and leaves the count alone.
        assert_eq!(buffer.front()?, buffer.front()?);
        assert_eq!(buffer.len(), 3);

        Ok(())
    }

    #[test]
    fn test_append_to_full_buffer_fails_without_change() -> Result<(), BufferError> {
        let mut buffer = buffer(2);
        buffer.append(lot("AMZN", 1))?;
        buffer.append(lot("FB", 2))?;

        assert!(buffer.is_full());
        assert_eq!(
            buffer.append(lot("AAPL", 3)),
            Err(BufferError::Full { capacity: 2 })
        );
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.front()?.symbol(), "AMZN");
        assert_eq!(buffer.last()?.symbol(), "FB");

        Ok(())
    }

    #[test]
    fn test_cursors_wrap_around_capacity() -> Result<(), BufferError> {
        let mut buffer = buffer(3);
        for (symbol, quantity) in [("A", 1), ("B", 2), ("C", 3)] {
            buffer.append(lot(symbol, quantity))?;
        }
        assert_eq!(buffer.remove_front()?.symbol(), "A");
        assert_eq!(buffer.remove_front()?.symbol(), "B");

        buffer.append(lot("D", 4))?;
        buffer.append(lot("E", 5))?;

        assert!(buffer.is_full());
        assert_eq!(buffer.last()?.symbol(), "E");
        let order: Vec<&str> = buffer.iter().map(Lot::symbol).collect();
        assert_eq!(order, ["C", "D", "E"]);

        // Several more laps to make sure the cursors never leave the window.
        for round in 0..10u64 {
            buffer.remove_front()?;
            buffer.append(lot("R", round + 1))?;
            assert_eq!(buffer.len(), 3);
            assert_eq!(buffer.last()?.quantity().get(), round + 1);
        }

        Ok(())
    }

    #[test]
    fn test_single_slot_buffer() -> Result<(), BufferError> {
        let mut buffer = buffer(1);
        buffer.append(lot("AMZN", 5))?;
        assert_eq!(buffer.front()?, buffer.last()?);
        assert!(buffer.append(lot("FB", 1)).is_err());

        buffer.remove_front()?;
        buffer.append(lot("FB", 1))?;
        assert_eq!(buffer.front()?.symbol(), "FB");

        Ok(())
    }
}
