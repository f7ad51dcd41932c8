use crate::core::{data_type::ColumnKind, identifiers::BatchId, value::NativeValue};
use chrono::NaiveDateTime;

/// Row-major block of values as read from the source.
///
/// `values.len()` is always a multiple of `column_count`; the final batch
/// of an extractor may hold fewer rows than the configured batch size.
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub id: BatchId,
    column_count: usize,
    values: Vec<NativeValue>,
}

impl RawBatch {
    pub fn new(id: BatchId, column_count: usize, values: Vec<NativeValue>) -> Self {
        debug_assert!(column_count > 0);
        debug_assert_eq!(values.len() % column_count, 0);
        Self {
            id,
            column_count,
            values,
        }
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn row_count(&self) -> usize {
        self.values.len() / self.column_count
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[NativeValue]> {
        self.values.chunks(self.column_count)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &NativeValue> {
        self.values.iter().skip(index).step_by(self.column_count)
    }

    pub fn into_values(self) -> Vec<NativeValue> {
        self.values
    }
}

/// One column of a transformed batch. Nulls are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnArray {
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
    Bytes(Vec<Option<Vec<u8>>>),
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
}

impl ColumnArray {
    pub fn with_capacity(kind: ColumnKind, capacity: usize) -> Self {
        match kind {
            ColumnKind::Text => ColumnArray::Text(Vec::with_capacity(capacity)),
            ColumnKind::Timestamp => ColumnArray::Timestamp(Vec::with_capacity(capacity)),
            ColumnKind::Bytes => ColumnArray::Bytes(Vec::with_capacity(capacity)),
            ColumnKind::Integer => ColumnArray::Integer(Vec::with_capacity(capacity)),
            ColumnKind::Float => ColumnArray::Float(Vec::with_capacity(capacity)),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnArray::Text(_) => ColumnKind::Text,
            ColumnArray::Timestamp(_) => ColumnKind::Timestamp,
            ColumnArray::Bytes(_) => ColumnKind::Bytes,
            ColumnArray::Integer(_) => ColumnKind::Integer,
            ColumnArray::Float(_) => ColumnKind::Float,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnArray::Text(v) => v.len(),
            ColumnArray::Timestamp(v) => v.len(),
            ColumnArray::Bytes(v) => v.len(),
            ColumnArray::Integer(v) => v.len(),
            ColumnArray::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads a cell back as a native value. Text comes back as bytes.
    pub fn value_at(&self, row: usize) -> Option<NativeValue> {
        let value = match self {
            ColumnArray::Text(v) => v.get(row)?.clone().map(|s| NativeValue::Bytes(s.into_bytes())),
            ColumnArray::Timestamp(v) => v.get(row)?.map(NativeValue::Timestamp),
            ColumnArray::Bytes(v) => v.get(row)?.clone().map(NativeValue::Bytes),
            ColumnArray::Integer(v) => v.get(row)?.map(NativeValue::Int),
            ColumnArray::Float(v) => v.get(row)?.map(NativeValue::Float),
        };
        Some(value.unwrap_or(NativeValue::Null))
    }
}

/// Column-major batch ready for a bulk insert.
#[derive(Debug, Clone)]
pub struct TransformedBatch {
    pub id: BatchId,
    pub row_count: usize,
    pub columns: Vec<ColumnArray>,
}

impl TransformedBatch {
    /// The kinds of every column in order; identifies the insert statement
    /// shape a loader needs for this batch.
    pub fn signature(&self) -> Vec<ColumnKind> {
        self.columns.iter().map(ColumnArray::kind).collect()
    }

    pub fn row(&self, index: usize) -> Option<Vec<NativeValue>> {
        self.columns.iter().map(|c| c.value_at(index)).collect()
    }
}
