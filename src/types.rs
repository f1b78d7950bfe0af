//! Type definitions for typed sheet records

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value kinds a record field can declare
///
/// This is a closed set: the column mapping rejects any other kind name when
/// it is resolved, so cell coercion never meets an unknown kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueKind {
    /// Cell text assigned verbatim
    Text,
    /// Cell text parsed as a decimal number
    Number,
}

impl ValueKind {
    /// Canonical name of the kind
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Text => "text",
            ValueKind::Number => "number",
        }
    }

    /// Parses a kind from its declared name (case-insensitive)
    ///
    /// - Text: "text", "string", "varchar"
    /// - Number: "number", "numeric", "double", "float", "decimal"
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "text" | "string" | "varchar" => Some(ValueKind::Text),
            "number" | "numeric" | "double" | "float" | "decimal" => Some(ValueKind::Number),
            _ => None,
        }
    }

    /// Converts a raw cell string to a value of this kind
    ///
    /// Numbers are parsed from the trimmed text. Overflow saturates to an
    /// infinity, but the only spelled-out non-finite values are `NaN` and
    /// `Infinity` (optionally signed), matched exactly.
    pub fn coerce(&self, raw: &str) -> Option<FieldValue> {
        match self {
            ValueKind::Text => Some(FieldValue::Text(raw.to_string())),
            ValueKind::Number => {
                let text = raw.trim();
                let number = text.parse::<f64>().ok()?;
                if !number.is_finite() {
                    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
                    let spelled = unsigned.starts_with(|c: char| c.is_ascii_alphabetic());
                    if spelled && unsigned != "NaN" && unsigned != "Infinity" {
                        return None;
                    }
                }
                Some(FieldValue::Number(number))
            }
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coerced cell value, ready to be assigned into a record field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// The kind this value was coerced to
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Number(_) => ValueKind::Number,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            FieldValue::Number(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// Takes the text out of a text value
    pub fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Static declaration of one record field
///
/// `column` is the column identifier the field reads from ("A", "B", "AA").
/// Fields without a column are part of the record but are never filled from
/// the sheet. `kind` is a kind name understood by [`ValueKind::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub column: Option<String>,
    pub kind: String,
}

impl FieldSpec {
    /// Declare a field with an explicit kind name
    pub fn new(name: impl Into<String>, column: impl Into<String>, kind: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            column: Some(column.into()),
            kind: kind.into(),
        }
    }

    /// Declare a text field read from `column`
    pub fn text(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(name, column, ValueKind::Text.as_str())
    }

    /// Declare a numeric field read from `column`
    pub fn number(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(name, column, ValueKind::Number.as_str())
    }

    /// Declare a field that no column fills
    pub fn untagged(name: impl Into<String>, kind: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            column: None,
            kind: kind.into(),
        }
    }
}

/// A record type that can be filled from sheet rows
///
/// # Example
///
/// ```
/// use excelchunk::types::{FieldSpec, FieldValue, SheetRecord};
///
/// #[derive(Debug, Default)]
/// struct Book {
///     no: Option<String>,
///     title: Option<String>,
///     price: Option<f64>,
/// }
///
/// impl SheetRecord for Book {
///     fn schema() -> Vec<FieldSpec> {
///         vec![
///             FieldSpec::text("no", "A"),
///             FieldSpec::text("title", "B"),
///             FieldSpec::number("price", "C"),
///         ]
///     }
///
///     fn assign(&mut self, field: &str, value: FieldValue) {
///         match field {
///             "no" => self.no = value.into_text(),
///             "title" => self.title = value.into_text(),
///             "price" => self.price = value.as_f64(),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait SheetRecord {
    /// Field declarations in declaration order
    fn schema() -> Vec<FieldSpec>;

    /// Store a coerced value into the named field
    fn assign(&mut self, field: &str, value: FieldValue);
}

/// Extract the column identifier from a cell reference ("AA23" -> "AA")
///
/// Keeps every ASCII letter and drops everything else, preserving case. The
/// result is not checked against the sheet's width.
pub fn extract_column(reference: &str) -> String {
    reference.chars().filter(char::is_ascii_alphabetic).collect()
}

/// Convert column index to Excel letter (0 -> A, 25 -> Z, 26 -> AA)
pub fn column_name(col: u32) -> String {
    let mut result = String::new();
    let mut col = u64::from(col) + 1;

    while col > 0 {
        col -= 1;
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        col /= 26;
    }

    result
}

/// Get Excel-style cell reference (e.g., "A1", "B2") from 0-based indexes
pub fn cell_reference(row: u32, col: u32) -> String {
    format!("{}{}", column_name(col), u64::from(row) + 1)
}
