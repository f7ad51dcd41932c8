//! Row-major to column-major reshaping with per-column kind resolution.

use crate::error::ConversionError;
use chrono::{NaiveDate, NaiveDateTime};
use model::{
    core::{
        data_type::{ColumnKind, MixedKindPolicy},
        value::{NativeValue, TIMESTAMP_FORMAT},
    },
    execution::settings::CopySettings,
    records::batch::{ColumnArray, RawBatch, TransformedBatch},
};
use std::collections::BTreeSet;

/// Converts a raw batch into one typed array per declared column,
/// preserving row count and column order.
pub fn transform(
    settings: &CopySettings,
    batch: RawBatch,
) -> Result<TransformedBatch, ConversionError> {
    let width = settings.column_count();
    if batch.column_count() != width {
        return Err(ConversionError::ColumnCount {
            expected: width,
            actual: batch.column_count(),
        });
    }

    let kinds = (0..width)
        .map(|index| resolve_kind(settings, &batch, index))
        .collect::<Result<Vec<_>, _>>()?;

    let id = batch.id;
    let row_count = batch.row_count();
    let mut columns = kinds
        .iter()
        .map(|kind| ColumnArray::with_capacity(*kind, row_count))
        .collect::<Vec<_>>();

    for (position, value) in batch.into_values().into_iter().enumerate() {
        let (row, column) = (position / width, position % width);
        push(&mut columns[column], value).map_err(|value| ConversionError::Incompatible {
            column: settings.columns[column].name.clone(),
            row,
            value: value.to_string(),
            target: kinds[column],
        })?;
    }

    Ok(TransformedBatch {
        id,
        row_count,
        columns,
    })
}

/// Binary columns always hold bytes. Otherwise a catalog-declared kind
/// wins, and only undeclared columns are decided by scanning the batch.
pub fn resolve_kind(
    settings: &CopySettings,
    batch: &RawBatch,
    index: usize,
) -> Result<ColumnKind, ConversionError> {
    if settings.is_binary(index) {
        return Ok(ColumnKind::Bytes);
    }
    if let Some(kind) = settings.columns[index].kind {
        return Ok(kind);
    }

    let seen = batch
        .column(index)
        .filter_map(NativeValue::runtime_kind)
        .collect::<BTreeSet<_>>();

    match (seen.len(), settings.mixed_kinds) {
        // An all-null column binds as text.
        (0, _) => Ok(ColumnKind::Text),
        (1, _) | (_, MixedKindPolicy::Precedence) => {
            Ok(seen.last().copied().unwrap_or(ColumnKind::Text))
        }
        (_, MixedKindPolicy::Reject) => Err(ConversionError::MixedKinds {
            column: settings.columns[index].name.clone(),
            kinds: seen.into_iter().collect(),
        }),
    }
}

/// Appends `value` to `array`, coercing it into the array's kind. Hands the
/// value back when no coercion exists.
fn push(array: &mut ColumnArray, value: NativeValue) -> Result<(), NativeValue> {
    match array {
        ColumnArray::Text(v) => v.push(to_text(value)?),
        ColumnArray::Timestamp(v) => v.push(to_timestamp(value)?),
        ColumnArray::Bytes(v) => v.push(value.render()),
        ColumnArray::Integer(v) => v.push(to_integer(value)?),
        ColumnArray::Float(v) => v.push(to_float(value)?),
    }
    Ok(())
}

fn to_text(value: NativeValue) -> Result<Option<String>, NativeValue> {
    match value {
        NativeValue::Null => Ok(None),
        NativeValue::Bytes(bytes) => {
            String::from_utf8(bytes).map(Some).map_err(|e| NativeValue::Bytes(e.into_bytes()))
        }
        other => match other.render() {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|_| other),
            None => Ok(None),
        },
    }
}

fn to_timestamp(value: NativeValue) -> Result<Option<NaiveDateTime>, NativeValue> {
    match value {
        NativeValue::Null => Ok(None),
        NativeValue::Timestamp(ts) => Ok(Some(ts)),
        NativeValue::Bytes(bytes) => match std::str::from_utf8(&bytes).ok().and_then(parse_timestamp) {
            Some(ts) => Ok(Some(ts)),
            None => Err(NativeValue::Bytes(bytes)),
        },
        other => Err(other),
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn to_integer(value: NativeValue) -> Result<Option<i64>, NativeValue> {
    match value {
        NativeValue::Null => Ok(None),
        NativeValue::Int(i) => Ok(Some(i)),
        // Only exact, in-range floats.
        NativeValue::Float(f)
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
        {
            Ok(Some(f as i64))
        }
        NativeValue::Bytes(bytes) => match parse_number::<i64>(&bytes) {
            Some(n) => Ok(Some(n)),
            None => Err(NativeValue::Bytes(bytes)),
        },
        other => Err(other),
    }
}

fn parse_number<T: std::str::FromStr>(bytes: &[u8]) -> Option<T> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}

fn to_float(value: NativeValue) -> Result<Option<f64>, NativeValue> {
    match value {
        NativeValue::Null => Ok(None),
        NativeValue::Float(f) => Ok(Some(f)),
        NativeValue::Int(i) => Ok(Some(i as f64)),
        NativeValue::Bytes(bytes) => match parse_number::<f64>(&bytes) {
            Some(n) => Ok(Some(n)),
            None => Err(NativeValue::Bytes(bytes)),
        },
        other => Err(other),
    }
}
