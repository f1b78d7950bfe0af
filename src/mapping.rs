//! Column to field mapping
//!
//! A [`ColumnMapping`] is resolved once per reader from a record type's field
//! declarations. It is an ordered map from column identifier to field
//! descriptor; iteration follows declaration order so diagnostics come out
//! the same way on every run.

use crate::error::{ExcelError, Result};
use crate::options::ReaderOptions;
use crate::types::{FieldSpec, SheetRecord, ValueKind};
use indexmap::map::Entry;
use indexmap::IndexMap;

/// A resolved record field: its name and the kind its cells coerce to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: ValueKind,
}

/// Ordered lookup from column identifier to field descriptor
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    fields: IndexMap<String, FieldDescriptor>,
}

impl ColumnMapping {
    /// Resolve the mapping for a record type
    pub fn resolve<T: SheetRecord>(options: &ReaderOptions) -> Result<Self> {
        Self::from_specs(T::schema(), options)
    }

    /// Resolve a mapping from field declarations, in declaration order
    ///
    /// Untagged fields are skipped. Every tagged field's kind must parse,
    /// otherwise resolution fails with `UnsupportedFieldType`. A column
    /// claimed twice fails with `DuplicateColumn` unless
    /// `allow_duplicate_columns` is set, in which case the later field wins
    /// and keeps the column's original position.
    pub fn from_specs(
        specs: impl IntoIterator<Item = FieldSpec>,
        options: &ReaderOptions,
    ) -> Result<Self> {
        let mut fields = IndexMap::new();

        for spec in specs {
            let Some(column) = spec.column else {
                continue;
            };

            let kind = ValueKind::parse(&spec.kind).ok_or_else(|| {
                ExcelError::UnsupportedFieldType {
                    field: spec.name.clone(),
                    kind: spec.kind.clone(),
                }
            })?;
            let descriptor = FieldDescriptor {
                name: spec.name,
                kind,
            };

            match fields.entry(column) {
                Entry::Vacant(entry) => {
                    entry.insert(descriptor);
                }
                Entry::Occupied(mut entry) => {
                    if !options.allow_duplicate_columns {
                        return Err(ExcelError::DuplicateColumn {
                            column: entry.key().clone(),
                            first: entry.get().name.clone(),
                            second: descriptor.name,
                        });
                    }
                    log::warn!(
                        "Column '{}' remapped from field '{}' to '{}'",
                        entry.key(),
                        entry.get().name,
                        descriptor.name
                    );
                    entry.insert(descriptor);
                }
            }
        }

        Ok(ColumnMapping { fields })
    }

    /// Field descriptor for a column identifier
    pub fn get(&self, column: &str) -> Option<&FieldDescriptor> {
        self.fields.get(column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Mapped column identifiers in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(column, field)| (column.as_str(), field))
    }
}
