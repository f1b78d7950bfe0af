//! Row assembly from sheet events
//!
//! [`RowAssembler`] turns the `RowStart / Cell / RowEnd / SheetEnd` protocol
//! into typed records. The header row's raw values are captured separately;
//! every later row becomes one record, built by the caller's factory and
//! filled cell by cell in whatever column order the cells arrive.
//!
//! ```text
//! AwaitingRow --RowStart(header)--> InHeaderRow --RowEnd--> AwaitingRow
//! AwaitingRow --RowStart(data)----> InDataRow ----RowEnd--> AwaitingRow
//! AwaitingRow --RowStart(before)--> SkippedRow ---RowEnd--> AwaitingRow
//! AwaitingRow --SheetEnd----------> Done
//! ```

use crate::error::{BoxError, ExcelError, Result};
use crate::event::SheetEvent;
use crate::mapping::ColumnMapping;
use crate::options::ReaderOptions;
use crate::partition::PartitionDispatcher;
use crate::types::{extract_column, SheetRecord};

/// Where the assembler is in the event protocol
#[derive(Debug)]
enum AssemblerState<T> {
    AwaitingRow,
    InHeaderRow { row: u32 },
    InDataRow { row: u32, record: T },
    SkippedRow { row: u32 },
    Done,
}

impl<T> AssemblerState<T> {
    fn name(&self) -> &'static str {
        match self {
            AssemblerState::AwaitingRow => "awaiting row",
            AssemblerState::InHeaderRow { .. } => "in header row",
            AssemblerState::InDataRow { .. } => "in data row",
            AssemblerState::SkippedRow { .. } => "in skipped row",
            AssemblerState::Done => "done",
        }
    }
}

/// Builds records from sheet events and hands them to a dispatcher
pub struct RowAssembler<'m, T, F, C> {
    mapping: &'m ColumnMapping,
    factory: F,
    dispatcher: PartitionDispatcher<T, C>,
    header: Vec<String>,
    header_row: u32,
    skip_unknown_columns: bool,
    state: AssemblerState<T>,
    last_row: u32,
    skipped_cells: usize,
}

impl<'m, T, F, C> RowAssembler<'m, T, F, C>
where
    T: SheetRecord,
    F: FnMut() -> T,
    C: FnMut(Vec<T>) -> std::result::Result<(), BoxError>,
{
    pub fn new(
        mapping: &'m ColumnMapping,
        factory: F,
        dispatcher: PartitionDispatcher<T, C>,
        options: &ReaderOptions,
    ) -> Self {
        RowAssembler {
            mapping,
            factory,
            dispatcher,
            header: Vec::new(),
            header_row: options.header_row,
            skip_unknown_columns: options.skip_unknown_columns,
            state: AssemblerState::AwaitingRow,
            last_row: 0,
            skipped_cells: 0,
        }
    }

    /// Feed one event into the state machine
    pub fn handle(&mut self, event: SheetEvent) -> Result<()> {
        match event {
            SheetEvent::RowStart(row) => self.on_row_start(row),
            SheetEvent::Cell { reference, value } => self.on_cell(&reference, value),
            SheetEvent::RowEnd(row) => self.on_row_end(row),
            SheetEvent::SheetEnd => self.on_sheet_end(),
        }
    }

    pub fn on_row_start(&mut self, row: u32) -> Result<()> {
        if !matches!(self.state, AssemblerState::AwaitingRow) {
            return Err(self.out_of_sequence(row, "row start"));
        }
        self.last_row = row;

        self.state = if row == self.header_row {
            AssemblerState::InHeaderRow { row }
        } else if row < self.header_row {
            AssemblerState::SkippedRow { row }
        } else {
            AssemblerState::InDataRow {
                row,
                record: (self.factory)(),
            }
        };
        Ok(())
    }

    pub fn on_cell(&mut self, reference: &str, value: String) -> Result<()> {
        let state = self.state.name();
        match &mut self.state {
            AssemblerState::InHeaderRow { .. } => {
                self.header.push(value);
                Ok(())
            }
            AssemblerState::SkippedRow { .. } => Ok(()),
            AssemblerState::InDataRow { row, record } => {
                let row = *row;
                let column = extract_column(reference);
                let Some(field) = self.mapping.get(&column) else {
                    if self.skip_unknown_columns {
                        self.skipped_cells += 1;
                        log::warn!("Skipping cell {} with no mapped field", reference);
                        return Ok(());
                    }
                    return Err(ExcelError::FieldNotFound {
                        row,
                        column,
                        reference: reference.to_string(),
                    });
                };

                let coerced = field.kind.coerce(&value).ok_or_else(|| ExcelError::TypeCoercionError {
                    row,
                    column,
                    field: field.name.clone(),
                    value,
                })?;
                record.assign(&field.name, coerced);
                Ok(())
            }
            AssemblerState::AwaitingRow | AssemblerState::Done => Err(ExcelError::InvalidEventSequence {
                row: self.last_row,
                message: format!("unexpected cell while {}", state),
            }),
        }
    }

    pub fn on_row_end(&mut self, row: u32) -> Result<()> {
        let open_row = match &self.state {
            AssemblerState::InHeaderRow { row }
            | AssemblerState::InDataRow { row, .. }
            | AssemblerState::SkippedRow { row } => *row,
            AssemblerState::AwaitingRow | AssemblerState::Done => {
                return Err(self.out_of_sequence(row, "row end"));
            }
        };
        if open_row != row {
            return Err(ExcelError::InvalidEventSequence {
                row,
                message: format!("row end does not match open row {}", open_row),
            });
        }

        match std::mem::replace(&mut self.state, AssemblerState::AwaitingRow) {
            AssemblerState::InDataRow { record, .. } => self.dispatcher.add(record),
            _ => Ok(()),
        }
    }

    pub fn on_sheet_end(&mut self) -> Result<()> {
        if !matches!(self.state, AssemblerState::AwaitingRow) {
            return Err(self.out_of_sequence(self.last_row, "sheet end"));
        }
        self.dispatcher.flush()?;
        self.state = AssemblerState::Done;
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, AssemblerState::Done)
    }

    /// Raw header values captured so far
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn into_header(self) -> Vec<String> {
        self.header
    }

    pub fn rows_emitted(&self) -> usize {
        self.dispatcher.records_delivered() + self.dispatcher.pending()
    }

    pub fn batches_delivered(&self) -> usize {
        self.dispatcher.batches_delivered()
    }

    /// Cells ignored because their column has no field
    pub fn skipped_cells(&self) -> usize {
        self.skipped_cells
    }

    fn out_of_sequence(&self, row: u32, event: &str) -> ExcelError {
        ExcelError::InvalidEventSequence {
            row,
            message: format!("unexpected {} while {}", event, self.state.name()),
        }
    }
}
