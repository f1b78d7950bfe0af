//! Streaming decoder for XLSX workbooks
//!
//! This module is the boundary to the document container. It opens the ZIP
//! archive, loads the pieces every sheet depends on, and turns one
//! worksheet's markup into [`SheetEvent`]s without materializing the sheet.
//!
//! **Memory Usage:**
//! - Shared Strings Table (SST): Loaded fully (cells reference it by index)
//! - Style table: one number format per cell format, loaded fully
//! - Worksheet XML: Streamed from the ZIP entry through a 64KB buffer
//! - Total memory ≈ SST + one cell's text
//!
//! **Cell values** are resolved to text before they leave the decoder:
//! shared and inline strings are looked up, booleans become `TRUE`/`FALSE`,
//! error cells become `ERROR:<code>`, numbers styled with a date or time
//! format are rendered through it, and all other numbers keep their stored
//! text so numeric fields parse exactly what the file holds. Cells with no
//! value produce no event.

use crate::error::{ExcelError, Result};
use crate::event::{EventSource, SheetEvent};
use crate::options::SheetSelector;
use crate::styles::CellStyles;
use crate::types::cell_reference;
use crate::xml::{self, XmlReader};
use quick_xml::events::Event;
use s_zip::StreamingZipReader;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

const WORKBOOK_PATH: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PATH: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";
const STYLES_PATH: &str = "xl/styles.xml";

/// Rows and columns a worksheet can address (`XFD1048576`)
const MAX_ROWS: u32 = 1_048_576;
const MAX_COLUMNS: u32 = 16_384;

/// An opened XLSX document
///
/// Holds the ZIP archive, the shared string pool and the workbook's sheet
/// list. The archive is released by [`close`](Self::close) or on drop,
/// whichever comes first.
pub struct WorkbookSource {
    path: String,
    archive: Option<StreamingZipReader>,
    shared_strings: Vec<String>,
    styles: CellStyles,
    /// (sheet name, worksheet path inside the archive), in workbook order
    sheets: Vec<(String, String)>,
}

impl WorkbookSource {
    /// Open XLSX file for streaming read
    ///
    /// Fails with `ContainerOpenError` when the file is missing, is not a
    /// ZIP archive, or lacks a readable workbook part.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use excelchunk::streaming_reader::WorkbookSource;
    ///
    /// let workbook = WorkbookSource::open("large.xlsx")?;
    /// println!("Sheets: {:?}", workbook.sheet_names());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let display = path.as_ref().display().to_string();
        let open_error = |message: String| ExcelError::ContainerOpenError {
            path: display.clone(),
            message,
        };

        let mut archive = StreamingZipReader::open(path.as_ref())
            .map_err(|e| open_error(format!("Failed to open ZIP: {}", e)))?;

        let (sheets, date1904) =
            load_sheet_info(&mut archive).map_err(|e| open_error(e.to_string()))?;
        if sheets.is_empty() {
            return Err(open_error("Workbook contains no sheets".to_string()));
        }

        let shared_strings =
            load_shared_strings(&mut archive).map_err(|e| open_error(e.to_string()))?;
        let styles = load_styles(&mut archive, date1904).map_err(|e| open_error(e.to_string()))?;

        log::debug!(
            "Loaded {} shared strings (~{:.2} MB in memory) from {}",
            shared_strings.len(),
            estimate_sst_size(&shared_strings) as f64 / (1024.0 * 1024.0),
            display
        );
        log::debug!(
            "Loaded {} cell formats (1904 date system: {})",
            styles.len(),
            date1904
        );
        log::debug!(
            "Found {} sheets: {:?}",
            sheets.len(),
            sheets.iter().map(|(name, _)| name).collect::<Vec<_>>()
        );

        Ok(WorkbookSource {
            path: display,
            archive: Some(archive),
            shared_strings,
            styles,
            sheets,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Names of all worksheets, in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn shared_string_count(&self) -> usize {
        self.shared_strings.len()
    }

    /// Start decoding one worksheet
    ///
    /// The returned reader borrows the workbook, so the workbook stays open
    /// for as long as events are being pulled.
    pub fn sheet_events(&mut self, selector: &SheetSelector) -> Result<SheetEventReader<'_>> {
        let index = self.sheet_index(selector)?;
        let (sheet_name, sheet_path) = &self.sheets[index];

        let archive = self
            .archive
            .as_mut()
            .ok_or_else(|| ExcelError::ReadError(format!("Workbook '{}' is closed", self.path)))?;
        let entry = entry_name(archive, sheet_path).ok_or_else(|| {
            ExcelError::ReadError(format!(
                "Sheet '{}' points to missing part '{}'",
                sheet_name, sheet_path
            ))
        })?;

        log::debug!("Streaming sheet '{}' from {}", sheet_name, entry);
        let reader: Box<dyn Read + '_> = archive
            .read_entry_streaming_by_name(&entry)
            .map_err(|e| ExcelError::ReadError(format!("Failed to open sheet: {}", e)))?;

        Ok(SheetEventReader::new(
            BufReader::with_capacity(64 * 1024, reader),
            &self.shared_strings,
            &self.styles,
        ))
    }

    /// Release the archive; later calls do nothing
    pub fn close(&mut self) {
        if self.archive.take().is_some() {
            log::debug!("Closed workbook {}", self.path);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.archive.is_none()
    }

    fn sheet_index(&self, selector: &SheetSelector) -> Result<usize> {
        let found = match selector {
            SheetSelector::First => Some(0).filter(|_| !self.sheets.is_empty()),
            SheetSelector::Index(index) => Some(*index).filter(|i| *i < self.sheets.len()),
            SheetSelector::Name(name) => self.sheets.iter().position(|(n, _)| n == name),
        };

        found.ok_or_else(|| ExcelError::SheetNotFound {
            sheet: match selector {
                SheetSelector::First => "first sheet".to_string(),
                SheetSelector::Index(index) => format!("index {}", index),
                SheetSelector::Name(name) => name.clone(),
            },
            available: self.sheet_names().join(", "),
        })
    }
}

impl Drop for WorkbookSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Find an archive entry by name, ignoring case and path separator style
fn entry_name(archive: &StreamingZipReader, name: &str) -> Option<String> {
    let pattern = name.replace('\\', "/");
    archive
        .entries()
        .iter()
        .find(|entry| entry.name.replace('\\', "/").eq_ignore_ascii_case(&pattern))
        .map(|entry| entry.name.clone())
}

/// XML reader over one archive entry, or `None` when the entry is absent
fn entry_xml<'a>(
    archive: &'a mut StreamingZipReader,
    name: &str,
) -> Result<Option<XmlReader<BufReader<Box<dyn Read + 'a>>>>> {
    let Some(entry) = entry_name(archive, name) else {
        return Ok(None);
    };
    let reader: Box<dyn Read + 'a> = archive
        .read_entry_streaming_by_name(&entry)
        .map_err(|e| ExcelError::ReadError(format!("Failed to open {}: {}", entry, e)))?;
    Ok(Some(XmlReader::new(BufReader::new(reader))))
}

/// Normalize a relationship target to a path inside the archive
fn to_zip_path(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{}", target)
    }
}

/// Load sheet names and paths from workbook.xml and its relationships,
/// along with whether the workbook counts dates from 1904
fn load_sheet_info(archive: &mut StreamingZipReader) -> Result<(Vec<(String, String)>, bool)> {
    let mut relationships = HashMap::new();
    if let Some(mut reader) = entry_xml(archive, WORKBOOK_RELS_PATH)? {
        while let Some(event) = reader.next()? {
            let Event::Start(node) = event else {
                continue;
            };
            if node.local_name().as_ref() != b"Relationship" {
                continue;
            }
            let id = xml::attribute(&node, "Id")?;
            let target = xml::attribute(&node, "Target")?;
            let is_worksheet = xml::attribute(&node, "Type")?
                .map(|kind| kind.ends_with("/worksheet"))
                .unwrap_or(true);
            if let (true, Some(id), Some(target)) = (is_worksheet, id, target) {
                relationships.insert(id.into_owned(), to_zip_path(&target));
            }
        }
    }

    let mut reader = entry_xml(archive, WORKBOOK_PATH)?
        .ok_or_else(|| ExcelError::ReadError(format!("Missing {}", WORKBOOK_PATH)))?;

    let mut sheets = Vec::new();
    let mut date1904 = false;
    while let Some(event) = reader.next()? {
        let Event::Start(node) = event else {
            continue;
        };
        if node.local_name().as_ref() == b"workbookPr" {
            date1904 = xml::attribute(&node, "date1904")?
                .map(|value| value == "1" || value == "true")
                .unwrap_or(false);
            continue;
        }
        if node.local_name().as_ref() != b"sheet" {
            continue;
        }

        // Example: <sheet name="Sheet1" sheetId="1" r:id="rId1"/>
        let mut name = None;
        let mut id = None;
        for attribute in node.attributes() {
            let attribute = attribute?;
            match attribute.key.local_name().as_ref() {
                b"name" => name = Some(attribute.unescape_value()?.into_owned()),
                b"id" => id = Some(attribute.unescape_value()?.into_owned()),
                _ => {}
            }
        }

        if let (Some(name), Some(id)) = (name, id) {
            if let Some(path) = relationships.get(&id) {
                sheets.push((name, path.clone()));
            }
        }
    }

    Ok((sheets, date1904))
}

/// Load Shared Strings Table
///
/// This MUST be loaded fully because cells reference strings by index.
fn load_shared_strings(archive: &mut StreamingZipReader) -> Result<Vec<String>> {
    let mut sst = Vec::new();
    let Some(mut reader) = entry_xml(archive, SHARED_STRINGS_PATH)? else {
        // No SST = all cells are inline
        return Ok(sst);
    };

    loop {
        let is_item = match reader.next()? {
            None => break,
            Some(Event::Start(node)) => node.local_name().as_ref() == b"si",
            Some(_) => false,
        };
        if is_item {
            sst.push(read_text(&mut reader, b"si", false)?);
        }
    }

    Ok(sst)
}

/// Load the style table; a workbook without one formats nothing
fn load_styles(archive: &mut StreamingZipReader, date1904: bool) -> Result<CellStyles> {
    match entry_xml(archive, STYLES_PATH)? {
        Some(mut reader) => CellStyles::parse(&mut reader, date1904),
        None => Ok(CellStyles::default()),
    }
}

fn estimate_sst_size(sst: &[String]) -> usize {
    sst.iter().map(|s| s.len() + 24).sum() // 24 bytes per String overhead
}

/// Collect text up to the closing `end` tag
///
/// Text inside `<t>` runs is kept and phonetic runs (`<rPh>`) are skipped.
/// With `bare_text` set, text outside `<t>` counts too, which is how `<v>`
/// stores its content.
fn read_text<R: BufRead>(reader: &mut XmlReader<R>, end: &[u8], bare_text: bool) -> Result<String> {
    let mut in_phonetic = false;
    let mut in_text = bare_text;
    let mut text = String::new();

    while let Some(event) = reader.next()? {
        match event {
            Event::End(node) if node.local_name().as_ref() == end => break,
            Event::Start(node) if node.local_name().as_ref() == b"rPh" => in_phonetic = true,
            Event::End(node) if node.local_name().as_ref() == b"rPh" => in_phonetic = false,
            Event::Start(node) if !in_phonetic && node.local_name().as_ref() == b"t" => {
                in_text = true
            }
            Event::End(node) if in_text && node.local_name().as_ref() == b"t" => in_text = bare_text,
            Event::Text(content) if in_text => text.push_str(&content.xml_content()?),
            Event::CData(content) if in_text => text.push_str(&content.xml_content()?),
            Event::GeneralRef(reference) if in_text => xml::push_reference(&mut text, &reference)?,
            _ => {}
        }
    }

    Ok(text)
}

// Parse column index from cell reference (e.g., "A1" -> 0, "B1" -> 1, "AA1" -> 26)
fn parse_column_index(cell_ref: &str) -> Option<u32> {
    let mut col_idx = 0u32;
    let mut seen = false;
    for ch in cell_ref.chars() {
        if ch.is_ascii_alphabetic() {
            col_idx = col_idx
                .checked_mul(26)?
                .checked_add(ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
            seen = true;
        } else if ch != '$' {
            break;
        }
    }
    seen.then(|| col_idx - 1)
}

/// How a cell's stored text turns into its value (`t` attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Number,
    SharedString,
    InlineString,
    Boolean,
    Error,
    Text,
}

impl CellType {
    fn from_attribute(t: Option<&str>) -> Self {
        match t {
            Some("s") => CellType::SharedString,
            Some("inlineStr") => CellType::InlineString,
            Some("b") => CellType::Boolean,
            Some("e") => CellType::Error,
            Some("str") | Some("d") => CellType::Text,
            _ => CellType::Number,
        }
    }
}

struct PendingCell {
    reference: String,
    kind: CellType,
    /// Index into the workbook's cell formats
    style: usize,
    value: Option<String>,
}

/// What one markup event means for the event stream
enum Step {
    /// 0-based row index when the row carries one
    RowStart(Option<u32>),
    RowEnd,
    CellStart {
        reference: Option<String>,
        kind: CellType,
        style: usize,
    },
    CellEnd,
    Value,
    InlineString,
    Eof,
    Skip,
}

/// Pulls [`SheetEvent`]s out of one worksheet's markup
pub struct SheetEventReader<'a> {
    xml: XmlReader<BufReader<Box<dyn Read + 'a>>>,
    shared_strings: &'a [String],
    styles: &'a CellStyles,
    next_row: u32,
    open_row: Option<u32>,
    next_col: u32,
    cell: Option<PendingCell>,
    finished: bool,
}

impl<'a> SheetEventReader<'a> {
    fn new(
        reader: BufReader<Box<dyn Read + 'a>>,
        shared_strings: &'a [String],
        styles: &'a CellStyles,
    ) -> Self {
        SheetEventReader {
            xml: XmlReader::new(reader),
            shared_strings,
            styles,
            next_row: 0,
            open_row: None,
            next_col: 0,
            cell: None,
            finished: false,
        }
    }

    fn next_step(&mut self) -> Result<Step> {
        let step = match self.xml.next()? {
            None => Step::Eof,
            Some(Event::Start(node)) => match node.local_name().as_ref() {
                b"row" => {
                    let row = match xml::attribute(&node, "r")? {
                        Some(r) => match r.trim().parse::<u32>() {
                            Ok(number @ 1..=MAX_ROWS) => Some(number - 1),
                            _ => {
                                return Err(ExcelError::ReadError(format!(
                                    "Invalid row number '{}'",
                                    r
                                )))
                            }
                        },
                        None => None,
                    };
                    Step::RowStart(row)
                }
                b"c" => Step::CellStart {
                    reference: xml::attribute(&node, "r")?.map(|r| r.into_owned()),
                    kind: CellType::from_attribute(xml::attribute(&node, "t")?.as_deref()),
                    style: xml::attribute(&node, "s")?
                        .and_then(|s| s.trim().parse::<usize>().ok())
                        .unwrap_or(0),
                },
                b"v" => Step::Value,
                b"is" => Step::InlineString,
                _ => Step::Skip,
            },
            Some(Event::End(node)) => match node.local_name().as_ref() {
                b"row" => Step::RowEnd,
                b"c" => Step::CellEnd,
                _ => Step::Skip,
            },
            Some(_) => Step::Skip,
        };
        Ok(step)
    }

    fn resolve(&self, cell: PendingCell, raw: String) -> Result<SheetEvent> {
        let value = match cell.kind {
            CellType::SharedString => {
                let index = raw.trim().parse::<usize>().ok();
                index
                    .and_then(|i| self.shared_strings.get(i))
                    .cloned()
                    .ok_or_else(|| {
                        ExcelError::ReadError(format!(
                            "Cell {} references unknown shared string '{}'",
                            cell.reference, raw
                        ))
                    })?
            }
            CellType::Boolean => match raw.trim() {
                "1" => "TRUE".to_string(),
                "0" => "FALSE".to_string(),
                _ => raw,
            },
            CellType::Error => format!("ERROR:{}", raw),
            CellType::Number => self.styles.format(cell.style, &raw).unwrap_or(raw),
            CellType::InlineString | CellType::Text => raw,
        };
        Ok(SheetEvent::Cell {
            reference: cell.reference,
            value,
        })
    }
}

impl EventSource for SheetEventReader<'_> {
    fn next_event(&mut self) -> Result<Option<SheetEvent>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            match self.next_step()? {
                Step::RowStart(r) => {
                    // Rows without `r` follow the previous row
                    let row = r.unwrap_or(self.next_row);
                    if row >= MAX_ROWS {
                        return Err(ExcelError::ReadError(format!(
                            "Row {} is past the last sheet row",
                            row + 1
                        )));
                    }
                    self.next_row = row + 1;
                    self.open_row = Some(row);
                    self.next_col = 0;
                    return Ok(Some(SheetEvent::RowStart(row)));
                }
                Step::RowEnd => {
                    if let Some(row) = self.open_row.take() {
                        return Ok(Some(SheetEvent::RowEnd(row)));
                    }
                }
                Step::CellStart {
                    reference,
                    kind,
                    style,
                } => {
                    let reference = match reference {
                        Some(reference) => {
                            if let Some(col) = parse_column_index(&reference) {
                                if col >= MAX_COLUMNS {
                                    return Err(ExcelError::ReadError(format!(
                                        "Cell {} is past the last sheet column",
                                        reference
                                    )));
                                }
                                self.next_col = col + 1;
                            }
                            reference
                        }
                        None => {
                            if self.next_col >= MAX_COLUMNS {
                                return Err(ExcelError::ReadError(
                                    "Cell is past the last sheet column".to_string(),
                                ));
                            }
                            let row = self.open_row.unwrap_or(self.next_row);
                            let reference = cell_reference(row, self.next_col);
                            self.next_col += 1;
                            reference
                        }
                    };
                    self.cell = Some(PendingCell {
                        reference,
                        kind,
                        style,
                        value: None,
                    });
                }
                Step::Value => {
                    let text = read_text(&mut self.xml, b"v", true)?;
                    if let Some(cell) = self.cell.as_mut() {
                        cell.value = Some(text);
                    }
                }
                Step::InlineString => {
                    let text = read_text(&mut self.xml, b"is", false)?;
                    if let Some(cell) = self.cell.as_mut() {
                        cell.value = Some(text);
                    }
                }
                Step::CellEnd => {
                    if let Some(mut cell) = self.cell.take() {
                        if let Some(raw) = cell.value.take() {
                            return self.resolve(cell, raw).map(Some);
                        }
                    }
                }
                Step::Eof => {
                    self.finished = true;
                    return Ok(Some(SheetEvent::SheetEnd));
                }
                Step::Skip => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source<'a>(
        sheet_xml: &'a str,
        shared_strings: &'a [String],
        styles: &'a CellStyles,
    ) -> SheetEventReader<'a> {
        let reader: Box<dyn Read + 'a> = Box::new(sheet_xml.as_bytes());
        SheetEventReader::new(BufReader::new(reader), shared_strings, styles)
    }

    fn decode_styled(sheet_xml: &str, shared_strings: &[String], styles: &CellStyles) -> Vec<SheetEvent> {
        let mut source = source(sheet_xml, shared_strings, styles);
        let mut events = Vec::new();
        while let Some(event) = source.next_event().unwrap() {
            events.push(event);
        }
        events
    }

    fn decode(sheet_xml: &str, shared_strings: &[String]) -> Vec<SheetEvent> {
        decode_styled(sheet_xml, shared_strings, &CellStyles::default())
    }

    #[test]
    fn test_estimate_sst_size() {
        let sst = vec!["hello".to_string(), "world".to_string()];
        let size = estimate_sst_size(&sst);
        assert!(size > 10); // At least the string bytes
    }

    #[test]
    fn test_parse_column_index() {
        assert_eq!(parse_column_index("A1"), Some(0));
        assert_eq!(parse_column_index("Z9"), Some(25));
        assert_eq!(parse_column_index("AA1"), Some(26));
        assert_eq!(parse_column_index("$B$2"), Some(1));
        assert_eq!(parse_column_index("12"), None);
    }

    #[test]
    fn test_to_zip_path() {
        assert_eq!(to_zip_path("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path("/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path("xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn test_decode_cell_types() {
        let sst = vec!["Title".to_string(), "Rust & Go".to_string()];
        let xml = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="inlineStr"><is><t>Price</t></is></c></row>
            <row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2"><v>12.5</v></c><c r="C2" t="b"><v>1</v></c><c r="D2" t="e"><v>#DIV/0!</v></c></row>
        </sheetData></worksheet>"#;

        assert_eq!(
            decode(xml, &sst),
            vec![
                SheetEvent::RowStart(0),
                SheetEvent::cell("A1", "Title"),
                SheetEvent::cell("B1", "Price"),
                SheetEvent::RowEnd(0),
                SheetEvent::RowStart(1),
                SheetEvent::cell("A2", "Rust & Go"),
                SheetEvent::cell("B2", "12.5"),
                SheetEvent::cell("C2", "TRUE"),
                SheetEvent::cell("D2", "ERROR:#DIV/0!"),
                SheetEvent::RowEnd(1),
                SheetEvent::SheetEnd,
            ]
        );
    }

    #[test]
    fn test_decode_sparse_rows_and_empty_cells() {
        let xml = r#"<worksheet><sheetData>
            <row r="1"><c r="C1"><v>3</v></c><c r="A1"><v>1</v></c><c r="B1" s="2"/></row>
            <row r="4"/>
            <row><c><f>SUM(A1:C1)</f><v>4</v></c><c t="str"><v>text</v></c></row>
        </sheetData></worksheet>"#;

        assert_eq!(
            decode(xml, &[]),
            vec![
                SheetEvent::RowStart(0),
                SheetEvent::cell("C1", "3"),
                SheetEvent::cell("A1", "1"),
                SheetEvent::RowEnd(0),
                SheetEvent::RowStart(3),
                SheetEvent::RowEnd(3),
                SheetEvent::RowStart(4),
                SheetEvent::cell("A5", "4"),
                SheetEvent::cell("B5", "text"),
                SheetEvent::RowEnd(4),
                SheetEvent::SheetEnd,
            ]
        );
    }

    #[test]
    fn test_rich_text_and_phonetic_runs() {
        let xml = r#"<si><r><t>Big </t></r><r><rPr><b/></rPr><t>Data</t></r><rPh><t>phonetic</t></rPh></si>"#;
        let mut reader = XmlReader::new(xml.as_bytes());
        // Step past the opening <si>
        reader.next().unwrap();
        assert_eq!(read_text(&mut reader, b"si", false).unwrap(), "Big Data");
    }

    #[test]
    fn test_unknown_shared_string_is_error() {
        let xml = r#"<sheetData><row r="1"><c r="A1" t="s"><v>7</v></c></row></sheetData>"#;
        let styles = CellStyles::default();
        let mut source = source(xml, &[], &styles);
        assert_eq!(source.next_event().unwrap(), Some(SheetEvent::RowStart(0)));
        assert!(matches!(source.next_event(), Err(ExcelError::ReadError(_))));
    }

    #[test]
    fn test_date_styled_cells_formatted() {
        // cellXfs: General, m/d/yy, custom yyyy-mm-dd, 0.00
        let custom = HashMap::from([(164, "yyyy-mm-dd".to_string())]);
        let styles = CellStyles::from_formats([0, 14, 164, 2], &custom, false);
        let xml = r#"<sheetData><row r="2">
            <c r="A2" s="1"><v>44197</v></c>
            <c r="B2" s="2"><v>44197.5</v></c>
            <c r="C2" s="3"><v>44197</v></c>
            <c r="D2"><v>44197</v></c>
            <c r="E2" s="1" t="s"><v>0</v></c>
            <c r="F2" s="1" t="str"><v>44197</v></c>
        </row></sheetData>"#;

        assert_eq!(
            decode_styled(xml, &["Label".to_string()], &styles),
            vec![
                SheetEvent::RowStart(1),
                SheetEvent::cell("A2", "1/1/21"),
                SheetEvent::cell("B2", "2021-01-01"),
                SheetEvent::cell("C2", "44197"),
                SheetEvent::cell("D2", "44197"),
                SheetEvent::cell("E2", "Label"),
                SheetEvent::cell("F2", "44197"),
                SheetEvent::RowEnd(1),
                SheetEvent::SheetEnd,
            ]
        );
    }

    #[test]
    fn test_row_number_out_of_range_is_error() {
        let styles = CellStyles::default();
        for xml in [
            r#"<sheetData><row r="4294967295"></row><row></row></sheetData>"#,
            r#"<sheetData><row r="1048577"/></sheetData>"#,
            r#"<sheetData><row r="0"/></sheetData>"#,
            r#"<sheetData><row r="-3"/></sheetData>"#,
        ] {
            let mut source = source(xml, &[], &styles);
            assert!(matches!(source.next_event(), Err(ExcelError::ReadError(_))), "{}", xml);
        }
    }

    #[test]
    fn test_positional_row_after_last_row_is_error() {
        let styles = CellStyles::default();
        let xml = r#"<sheetData><row r="1048576"></row><row></row></sheetData>"#;
        let mut source = source(xml, &[], &styles);
        assert_eq!(source.next_event().unwrap(), Some(SheetEvent::RowStart(1_048_575)));
        assert_eq!(source.next_event().unwrap(), Some(SheetEvent::RowEnd(1_048_575)));
        assert!(matches!(source.next_event(), Err(ExcelError::ReadError(_))));
    }

    #[test]
    fn test_column_past_last_is_error() {
        let styles = CellStyles::default();
        let xml = r#"<sheetData><row r="1"><c r="XFE1"><v>1</v></c></row></sheetData>"#;
        let mut source = source(xml, &[], &styles);
        assert_eq!(source.next_event().unwrap(), Some(SheetEvent::RowStart(0)));
        assert!(matches!(source.next_event(), Err(ExcelError::ReadError(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let result = WorkbookSource::open("non_existent_file.xlsx");
        assert!(matches!(result, Err(ExcelError::ContainerOpenError { .. })));
    }
}
