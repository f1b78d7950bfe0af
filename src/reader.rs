//! Typed batch decoding of worksheets
//!
//! [`RecordReader`] ties the pieces together: it opens the workbook, picks a
//! sheet, pulls events one at a time and feeds them through a
//! [`RowAssembler`] whose records are handed to the caller in batches.

use crate::assembler::RowAssembler;
use crate::error::{BoxError, ExcelError, Result};
use crate::event::{EventSource, SheetEvent};
use crate::mapping::ColumnMapping;
use crate::options::ReaderOptions;
use crate::partition::PartitionDispatcher;
use crate::streaming_reader::WorkbookSource;
use crate::types::SheetRecord;
use std::marker::PhantomData;
use std::path::Path;

/// Decodes a worksheet into batches of `T`
///
/// The column mapping is resolved once, when the reader is built, so a bad
/// record declaration fails before any file is touched. A reader runs one
/// scan at a time: `process` takes `&mut self`, so a second scan on the same
/// reader cannot start while one is in progress.
///
/// # Example
///
/// ```no_run
/// use excelchunk::types::{FieldSpec, FieldValue, SheetRecord};
/// use excelchunk::reader::RecordReader;
///
/// #[derive(Default)]
/// struct Book {
///     title: String,
///     price: f64,
/// }
///
/// impl SheetRecord for Book {
///     fn schema() -> Vec<FieldSpec> {
///         vec![FieldSpec::text("title", "A"), FieldSpec::number("price", "B")]
///     }
///
///     fn assign(&mut self, field: &str, value: FieldValue) {
///         match field {
///             "title" => self.title = value.into_text().unwrap_or_default(),
///             "price" => self.price = value.as_f64().unwrap_or_default(),
///             _ => {}
///         }
///     }
/// }
///
/// let mut reader = RecordReader::new(Book::default)?;
/// reader.process("books.xlsx", |batch: Vec<Book>| {
///     for book in batch {
///         println!("{}: {}", book.title, book.price);
///     }
///     Ok::<(), std::io::Error>(())
/// })?;
/// println!("Header: {:?}", reader.header());
/// # Ok::<(), excelchunk::ExcelError>(())
/// ```
pub struct RecordReader<T, F> {
    factory: F,
    mapping: ColumnMapping,
    options: ReaderOptions,
    header: Vec<String>,
    _record: PhantomData<fn() -> T>,
}

impl<T, F> RecordReader<T, F>
where
    T: SheetRecord,
    F: FnMut() -> T,
{
    /// Reader with default options: first sheet, header at row 0, batches of 2
    pub fn new(factory: F) -> Result<Self> {
        Self::with_options(factory, ReaderOptions::default())
    }

    pub fn with_options(factory: F, options: ReaderOptions) -> Result<Self> {
        options.validate()?;
        let mapping = ColumnMapping::resolve::<T>(&options)?;
        log::debug!(
            "Resolved {} mapped columns: {:?}",
            mapping.len(),
            mapping.columns().collect::<Vec<_>>()
        );

        Ok(RecordReader {
            factory,
            mapping,
            options,
            header: Vec::new(),
            _record: PhantomData,
        })
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Header captured by the most recent scan
    ///
    /// Empty before the first scan. A failed scan leaves whatever header
    /// cells it saw before failing.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn into_header(self) -> Vec<String> {
        self.header
    }

    /// Decode the configured sheet of an XLSX file
    ///
    /// The callback receives batches of at most `partition_size` records in
    /// row order, followed by one final batch with the remainder (possibly
    /// empty). The workbook is closed on every exit path.
    pub fn process<P, C, E>(&mut self, path: P, callback: C) -> Result<()>
    where
        P: AsRef<Path>,
        C: FnMut(Vec<T>) -> std::result::Result<(), E>,
        E: Into<BoxError>,
    {
        let mut workbook = WorkbookSource::open(path)?;
        let events = workbook.sheet_events(&self.options.sheet)?;
        self.process_events(events, callback)
    }

    /// Decode events from any source
    pub fn process_events<S, C, E>(&mut self, mut source: S, mut callback: C) -> Result<()>
    where
        S: EventSource,
        C: FnMut(Vec<T>) -> std::result::Result<(), E>,
        E: Into<BoxError>,
    {
        self.header.clear();

        let dispatcher = PartitionDispatcher::new(self.options.partition_size, move |batch| {
            callback(batch).map_err(Into::<BoxError>::into)
        });
        let mut assembler =
            RowAssembler::new(&self.mapping, &mut self.factory, dispatcher, &self.options);

        let result = drive(&mut source, &mut assembler, &self.options);
        if result.is_ok() {
            log::info!(
                "Decoded {} rows in {} batches (header width {})",
                assembler.rows_emitted(),
                assembler.batches_delivered(),
                assembler.header().len()
            );
        }
        if assembler.skipped_cells() > 0 {
            log::warn!("Skipped {} cells in unmapped columns", assembler.skipped_cells());
        }

        self.header = assembler.into_header();
        result
    }
}

/// Pull events into the assembler until the sheet ends
fn drive<S, T, F, C>(
    source: &mut S,
    assembler: &mut RowAssembler<'_, T, F, C>,
    options: &ReaderOptions,
) -> Result<()>
where
    S: EventSource,
    T: SheetRecord,
    F: FnMut() -> T,
    C: FnMut(Vec<T>) -> std::result::Result<(), BoxError>,
{
    while let Some(event) = source.next_event()? {
        if let SheetEvent::RowStart(row) = event {
            if options.is_cancelled() {
                log::debug!("Scan cancelled before row {}", row);
                return Err(ExcelError::Cancelled { row });
            }
        }
        assembler.handle(event)?;
        if assembler.is_done() {
            return Ok(());
        }
    }

    // Source ran dry without a sheet end
    log::debug!("Event source ended without a sheet end");
    assembler.on_sheet_end()
}

/// Decode the first sheet of `path` with default options
///
/// Returns the header row's values.
///
/// ```no_run
/// # use excelchunk::types::{FieldSpec, FieldValue, SheetRecord};
/// # #[derive(Default)]
/// # struct Book;
/// # impl SheetRecord for Book {
/// #     fn schema() -> Vec<FieldSpec> { vec![FieldSpec::text("title", "A")] }
/// #     fn assign(&mut self, _: &str, _: FieldValue) {}
/// # }
/// let header = excelchunk::process("books.xlsx", Book::default, |batch: Vec<Book>| {
///     println!("{} books", batch.len());
///     Ok::<(), std::io::Error>(())
/// })?;
/// # Ok::<(), excelchunk::ExcelError>(())
/// ```
pub fn process<T, F, P, C, E>(path: P, factory: F, callback: C) -> Result<Vec<String>>
where
    T: SheetRecord,
    F: FnMut() -> T,
    P: AsRef<Path>,
    C: FnMut(Vec<T>) -> std::result::Result<(), E>,
    E: Into<BoxError>,
{
    let mut reader = RecordReader::new(factory)?;
    reader.process(path, callback)?;
    Ok(reader.into_header())
}
