use crate::core::data_type::ColumnKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single source value in the kind the driver produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NativeValue {
    Null,
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
}

impl NativeValue {
    pub fn text(s: impl Into<String>) -> Self {
        NativeValue::Bytes(s.into().into_bytes())
    }

    /// The bucket this value falls into when no kind is declared for its
    /// column. Byte strings that decode as UTF-8 count as text.
    pub fn runtime_kind(&self) -> Option<ColumnKind> {
        match self {
            NativeValue::Null => None,
            NativeValue::Bytes(b) if std::str::from_utf8(b).is_ok() => Some(ColumnKind::Text),
            NativeValue::Bytes(_) => Some(ColumnKind::Bytes),
            NativeValue::Int(_) => Some(ColumnKind::Integer),
            NativeValue::Float(_) => Some(ColumnKind::Float),
            NativeValue::Timestamp(_) => Some(ColumnKind::Timestamp),
        }
    }

    pub fn compare(&self, other: &NativeValue) -> Option<Ordering> {
        use NativeValue::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Bytes(a), Bytes(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Textual rendering used when a non-text value lands in a text or
    /// binary column. `None` for null.
    pub fn render(&self) -> Option<Vec<u8>> {
        match self {
            NativeValue::Null => None,
            NativeValue::Bytes(b) => Some(b.clone()),
            NativeValue::Int(i) => Some(i.to_string().into_bytes()),
            NativeValue::Float(f) => Some(ryu::Buffer::new().format(*f).as_bytes().to_vec()),
            NativeValue::Timestamp(ts) => Some(ts.format(TIMESTAMP_FORMAT).to_string().into_bytes()),
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Null => write!(f, "NULL"),
            NativeValue::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "'{s}'"),
                Err(_) => {
                    let hex = b.iter().map(|byte| format!("{byte:02x}")).collect::<String>();
                    write!(f, "x'{hex}'")
                }
            },
            NativeValue::Int(v) => write!(f, "{v}"),
            NativeValue::Float(v) => write!(f, "{}", ryu::Buffer::new().format(*v)),
            NativeValue::Timestamp(v) => write!(f, "'{}'", v.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<i64> for NativeValue {
    fn from(v: i64) -> Self {
        NativeValue::Int(v)
    }
}

impl From<f64> for NativeValue {
    fn from(v: f64) -> Self {
        NativeValue::Float(v)
    }
}

impl From<&str> for NativeValue {
    fn from(v: &str) -> Self {
        NativeValue::text(v)
    }
}

impl From<Vec<u8>> for NativeValue {
    fn from(v: Vec<u8>) -> Self {
        NativeValue::Bytes(v)
    }
}

impl From<NaiveDateTime> for NativeValue {
    fn from(v: NaiveDateTime) -> Self {
        NativeValue::Timestamp(v)
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(NativeValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn utf8_bytes_are_text_at_runtime() {
        assert_eq!(NativeValue::text("abc").runtime_kind(), Some(ColumnKind::Text));
        assert_eq!(
            NativeValue::Bytes(vec![0xff, 0xfe]).runtime_kind(),
            Some(ColumnKind::Bytes)
        );
        assert_eq!(NativeValue::Null.runtime_kind(), None);
    }

    #[test]
    fn renders_non_text_values() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(NativeValue::Int(-7).render(), Some(b"-7".to_vec()));
        assert_eq!(NativeValue::Float(1.5).render(), Some(b"1.5".to_vec()));
        assert_eq!(
            NativeValue::Timestamp(ts).render(),
            Some(b"2024-03-01 12:30:00".to_vec())
        );
        assert_eq!(NativeValue::Null.render(), None);
    }

    #[test]
    fn compares_mixed_numbers() {
        assert_eq!(
            NativeValue::Int(2).compare(&NativeValue::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(NativeValue::Int(1).compare(&NativeValue::text("1")), None);
    }
}
