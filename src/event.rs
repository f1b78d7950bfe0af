//! Structural sheet events and the sources that produce them

use crate::error::Result;
use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One structural signal from a worksheet decoder, in document order
///
/// Row indexes are 0-based. `reference` is the raw cell reference ("B7") and
/// `value` the cell's resolved text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SheetEvent {
    RowStart(u32),
    Cell { reference: String, value: String },
    RowEnd(u32),
    SheetEnd,
}

impl SheetEvent {
    /// Shorthand for building cell events
    pub fn cell(reference: impl Into<String>, value: impl Into<String>) -> Self {
        SheetEvent::Cell {
            reference: reference.into(),
            value: value.into(),
        }
    }
}

/// A sequential, one-shot stream of sheet events
///
/// `Ok(None)` marks the end of the stream. A well-formed source emits
/// `SheetEnd` as its last event.
pub trait EventSource {
    fn next_event(&mut self) -> Result<Option<SheetEvent>>;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_event(&mut self) -> Result<Option<SheetEvent>> {
        (**self).next_event()
    }
}

/// Event source over events already held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryEvents {
    events: VecDeque<SheetEvent>,
}

impl MemoryEvents {
    pub fn new(events: impl IntoIterator<Item = SheetEvent>) -> Self {
        MemoryEvents {
            events: events.into_iter().collect(),
        }
    }

    /// Builds the events of a sheet from rows of `(reference, value)` cells
    ///
    /// Rows are numbered from 0 in the order given; a trailing `SheetEnd` is
    /// appended.
    ///
    /// ```
    /// use excelchunk::event::{EventSource, MemoryEvents, SheetEvent};
    ///
    /// let mut events = MemoryEvents::from_rows(vec![vec![("A1", "Title")]]);
    /// assert_eq!(events.next_event().unwrap(), Some(SheetEvent::RowStart(0)));
    /// ```
    pub fn from_rows<R, V>(rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<(V, V)>>,
        V: Into<String>,
    {
        let mut events = VecDeque::new();
        for (index, cells) in rows.into_iter().enumerate() {
            let index = index as u32;
            events.push_back(SheetEvent::RowStart(index));
            for (reference, value) in cells {
                events.push_back(SheetEvent::cell(reference, value));
            }
            events.push_back(SheetEvent::RowEnd(index));
        }
        events.push_back(SheetEvent::SheetEnd);
        MemoryEvents { events }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for MemoryEvents {
    fn next_event(&mut self) -> Result<Option<SheetEvent>> {
        Ok(self.events.pop_front())
    }
}
