//! Reader configuration

use crate::error::{ExcelError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default number of records per batch
pub const DEFAULT_PARTITION_SIZE: usize = 2;

/// Default 0-based index of the header row
pub const DEFAULT_HEADER_ROW: u32 = 0;

/// Which worksheet a scan reads
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SheetSelector {
    /// First sheet in workbook order
    #[default]
    First,
    /// Zero-based sheet index
    Index(usize),
    /// Sheet name, matched exactly
    Name(String),
}

/// Shared flag that stops a running scan between rows
///
/// Clones share the same flag, so one clone can be handed to another thread
/// and cancelled from there while the scan runs.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Options for [`RecordReader`](crate::reader::RecordReader)
///
/// # Examples
///
/// ```
/// use excelchunk::options::{ReaderOptions, SheetSelector};
///
/// let options = ReaderOptions::default()
///     .with_partition_size(500)
///     .with_sheet(SheetSelector::Name("Books".to_string()));
/// assert_eq!(options.partition_size, 500);
/// ```
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Records per batch handed to the callback
    pub partition_size: usize,
    /// Row whose cells are captured as the header; earlier rows are ignored
    pub header_row: u32,
    /// Worksheet to scan
    pub sheet: SheetSelector,
    /// Ignore data cells whose column has no field instead of failing
    pub skip_unknown_columns: bool,
    /// Let a later field take over a column already claimed by an earlier one
    pub allow_duplicate_columns: bool,
    /// Checked before every row
    pub cancellation: Option<CancellationToken>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            partition_size: DEFAULT_PARTITION_SIZE,
            header_row: DEFAULT_HEADER_ROW,
            sheet: SheetSelector::First,
            skip_unknown_columns: false,
            allow_duplicate_columns: false,
            cancellation: None,
        }
    }
}

impl ReaderOptions {
    pub fn with_partition_size(mut self, partition_size: usize) -> Self {
        self.partition_size = partition_size;
        self
    }

    pub fn with_header_row(mut self, header_row: u32) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn with_sheet(mut self, sheet: SheetSelector) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_skip_unknown_columns(mut self, skip: bool) -> Self {
        self.skip_unknown_columns = skip;
        self
    }

    pub fn with_allow_duplicate_columns(mut self, allow: bool) -> Self {
        self.allow_duplicate_columns = allow;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(CancellationToken::is_cancelled)
            .unwrap_or(false)
    }

    /// Reject option combinations a scan cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.partition_size == 0 {
            return Err(ExcelError::InvalidOptions(
                "partition_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReaderOptions::default();
        assert_eq!(options.partition_size, 2);
        assert_eq!(options.header_row, 0);
        assert_eq!(options.sheet, SheetSelector::First);
        assert!(!options.skip_unknown_columns);
        assert!(!options.allow_duplicate_columns);
        assert!(!options.is_cancelled());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_partition_rejected() {
        let options = ReaderOptions::default().with_partition_size(0);
        assert!(matches!(options.validate(), Err(ExcelError::InvalidOptions(_))));
    }

    #[test]
    fn test_cancellation_shared_between_clones() {
        let token = CancellationToken::new();
        let options = ReaderOptions::default().with_cancellation(token.clone());
        assert!(!options.is_cancelled());
        token.cancel();
        assert!(options.is_cancelled());
    }
}
