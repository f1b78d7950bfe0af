//! Fixed-size batching of assembled records
//!
//! The dispatcher holds at most `partition_size` records. A full batch is
//! moved into the callback at once, and whatever remains is handed over by
//! the single end-of-sheet flush, even when that batch is empty.

use crate::error::{BoxError, ExcelError, Result};

/// Accumulates records and delivers them to a callback in batches
pub struct PartitionDispatcher<T, C> {
    partition_size: usize,
    current: Vec<T>,
    callback: C,
    batches: usize,
    records: usize,
    flushed: bool,
}

impl<T, C> PartitionDispatcher<T, C>
where
    C: FnMut(Vec<T>) -> std::result::Result<(), BoxError>,
{
    pub fn new(partition_size: usize, callback: C) -> Self {
        PartitionDispatcher {
            partition_size,
            current: Vec::with_capacity(partition_size),
            callback,
            batches: 0,
            records: 0,
            flushed: false,
        }
    }

    /// Append a record, delivering the batch once it is full
    pub fn add(&mut self, record: T) -> Result<()> {
        if self.flushed {
            return Err(ExcelError::InvalidEventSequence {
                row: 0,
                message: "record added after the final flush".to_string(),
            });
        }
        self.current.push(record);
        if self.current.len() >= self.partition_size {
            self.deliver()?;
        }
        Ok(())
    }

    /// Deliver the remaining records; runs exactly once per sheet
    pub fn flush(&mut self) -> Result<()> {
        if self.flushed {
            return Err(ExcelError::InvalidEventSequence {
                row: 0,
                message: "batches already flushed".to_string(),
            });
        }
        self.flushed = true;
        self.deliver()
    }

    /// Records waiting for the next delivery
    pub fn pending(&self) -> usize {
        self.current.len()
    }

    /// Callback invocations so far, including the final flush
    pub fn batches_delivered(&self) -> usize {
        self.batches
    }

    pub fn records_delivered(&self) -> usize {
        self.records
    }

    fn deliver(&mut self) -> Result<()> {
        let batch = std::mem::replace(&mut self.current, Vec::with_capacity(self.partition_size));
        let size = batch.len();
        let index = self.batches;
        self.batches += 1;

        (self.callback)(batch).map_err(|source| ExcelError::CallbackError {
            batch: index,
            source,
        })?;

        self.records += size;
        log::trace!("Delivered batch {} with {} records", index, size);
        Ok(())
    }
}
