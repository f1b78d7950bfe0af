//! # excelchunk
//!
//! Streaming decoding of XLSX worksheets into typed records, delivered in
//! fixed-size batches.
//!
//! ## Features
//!
//! - **Streaming Read**: Worksheet XML is decoded event by event straight out of the ZIP entry
//! - **Typed Records**: Columns map to record fields declared through [`SheetRecord`]
//! - **Bounded Memory**: At most one batch of records is held before it is handed over
//! - **Better Errors**: Failures name the row index and column they happened at
//! - **Cancellable**: A [`CancellationToken`] stops a scan between rows
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use excelchunk::{FieldSpec, FieldValue, RecordReader, ReaderOptions, SheetRecord};
//!
//! #[derive(Debug, Default)]
//! struct Book {
//!     no: String,
//!     title: String,
//!     price: f64,
//! }
//!
//! impl SheetRecord for Book {
//!     fn schema() -> Vec<FieldSpec> {
//!         vec![
//!             FieldSpec::text("no", "A"),
//!             FieldSpec::text("title", "B"),
//!             FieldSpec::number("price", "C"),
//!         ]
//!     }
//!
//!     fn assign(&mut self, field: &str, value: FieldValue) {
//!         match field {
//!             "no" => self.no = value.into_text().unwrap_or_default(),
//!             "title" => self.title = value.into_text().unwrap_or_default(),
//!             "price" => self.price = value.as_f64().unwrap_or_default(),
//!             _ => {}
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ReaderOptions::default().with_partition_size(1000);
//! let mut reader = RecordReader::with_options(Book::default, options)?;
//!
//! reader.process("books.xlsx", |batch: Vec<Book>| {
//!     println!("Got {} books", batch.len());
//!     Ok::<(), std::io::Error>(())
//! })?;
//!
//! println!("Header: {:?}", reader.header());
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod error;
pub mod event;
pub mod mapping;
pub mod options;
pub mod partition;
pub mod reader;
pub mod streaming_reader;
pub mod styles;
pub mod types;
mod xml;

pub use error::{BoxError, ExcelError, Result};
pub use event::{EventSource, MemoryEvents, SheetEvent};
pub use options::{CancellationToken, ReaderOptions, SheetSelector};
pub use reader::{process, RecordReader};
pub use streaming_reader::WorkbookSource;
pub use styles::CellStyles;
pub use types::{FieldSpec, FieldValue, SheetRecord, ValueKind};
