//! Error types for the excelchunk library

use thiserror::Error;

/// Result type alias for excelchunk operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Boxed error returned by batch callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all streaming decode operations
///
/// Every variant aborts the scan it occurs in. Row indexes are 0-based, the
/// same numbering the sheet events carry.
#[derive(Error, Debug)]
pub enum ExcelError {
    /// The document is missing, corrupt, or not a valid XLSX container
    #[error("Failed to open Excel file '{path}': {message}")]
    ContainerOpenError { path: String, message: String },

    /// Invalid sheet name or sheet not found
    #[error("Sheet '{sheet}' not found. Available sheets: {available}")]
    SheetNotFound { sheet: String, available: String },

    /// Error occurred while decoding worksheet markup
    #[error("Failed to read Excel file: {0}")]
    ReadError(String),

    /// A data cell's column has no field in the column mapping
    #[error("No field mapped to column '{column}' (cell {reference}, row {row})")]
    FieldNotFound {
        row: u32,
        column: String,
        reference: String,
    },

    /// A cell value could not be converted to the field's declared kind
    #[error("Cannot convert '{value}' to a number for field '{field}' (column '{column}', row {row})")]
    TypeCoercionError {
        row: u32,
        column: String,
        field: String,
        value: String,
    },

    /// A field declares a value kind outside the supported set
    #[error("Field '{field}' declares unsupported kind '{kind}'")]
    UnsupportedFieldType { field: String, kind: String },

    /// Two fields are tagged with the same column
    #[error("Column '{column}' is mapped by both '{first}' and '{second}'")]
    DuplicateColumn {
        column: String,
        first: String,
        second: String,
    },

    /// The batch callback failed; the scan stops at this batch
    #[error("Batch callback failed on batch {batch}: {source}")]
    CallbackError {
        batch: usize,
        #[source]
        source: BoxError,
    },

    /// Sheet events arrived out of protocol order
    #[error("Invalid event sequence at row {row}: {message}")]
    InvalidEventSequence { row: u32, message: String },

    /// Reader options are not usable
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// The scan was cancelled before reaching this row
    #[error("Scan cancelled before row {row}")]
    Cancelled { row: u32 },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// XML markup error wrapper
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML encoding error: {0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),
}

impl ExcelError {
    /// Row index the error refers to, when there is one
    pub fn row(&self) -> Option<u32> {
        match self {
            ExcelError::FieldNotFound { row, .. }
            | ExcelError::TypeCoercionError { row, .. }
            | ExcelError::InvalidEventSequence { row, .. }
            | ExcelError::Cancelled { row } => Some(*row),
            _ => None,
        }
    }

    /// Column identifier the error refers to, when there is one
    pub fn column(&self) -> Option<&str> {
        match self {
            ExcelError::FieldNotFound { column, .. }
            | ExcelError::TypeCoercionError { column, .. }
            | ExcelError::DuplicateColumn { column, .. } => Some(column.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_location() {
        let err = ExcelError::FieldNotFound {
            row: 4,
            column: "D".to_string(),
            reference: "D5".to_string(),
        };
        assert_eq!(err.row(), Some(4));
        assert_eq!(err.column(), Some("D"));
        assert!(err.to_string().contains("D5"));

        let err = ExcelError::InvalidOptions("partition size".to_string());
        assert_eq!(err.row(), None);
        assert_eq!(err.column(), None);
    }

    #[test]
    fn test_callback_error_keeps_source() {
        use std::error::Error;

        let source: BoxError = "database unavailable".into();
        let err = ExcelError::CallbackError { batch: 2, source };
        assert!(err.to_string().contains("batch 2"));
        assert_eq!(err.source().unwrap().to_string(), "database unavailable");
    }
}
