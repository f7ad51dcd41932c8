use crate::sql::base::error::DbError;
use chrono::{Datelike, NaiveDate, Timelike};
use model::core::value::NativeValue;
use mysql_async::{Params, Value as MySqlValue};

pub struct MySqlParam(MySqlValue);

impl MySqlParam {
    pub fn from_value(value: &NativeValue) -> Self {
        match value {
            NativeValue::Null => MySqlParam(MySqlValue::NULL),
            NativeValue::Bytes(b) => MySqlParam(MySqlValue::Bytes(b.clone())),
            NativeValue::Int(i) => MySqlParam(MySqlValue::Int(*i)),
            NativeValue::Float(f) => MySqlParam(MySqlValue::Double(*f)),
            NativeValue::Timestamp(ts) => MySqlParam(MySqlValue::Date(
                ts.year() as u16,
                ts.month() as u8,
                ts.day() as u8,
                ts.hour() as u8,
                ts.minute() as u8,
                ts.second() as u8,
                ts.nanosecond() / 1_000,
            )),
        }
    }
}

pub struct MySqlParamStore {
    pub params: Vec<MySqlParam>,
}

impl MySqlParamStore {
    pub fn from_values(values: &[NativeValue]) -> Self {
        let params = values.iter().map(MySqlParam::from_value).collect();
        MySqlParamStore { params }
    }

    pub fn into_params(self) -> Params {
        if self.params.is_empty() {
            Params::Empty
        } else {
            Params::Positional(self.params.into_iter().map(|p| p.0).collect())
        }
    }
}

/// Converts a binary-protocol value into its native kind.
///
/// Unsigned integers beyond `i64::MAX` keep their decimal text. Zero
/// dates become null. `TIME` values become `[-]HH:MM:SS[.ffffff]` text.
pub fn native_value(value: MySqlValue, column: usize) -> Result<NativeValue, DbError> {
    match value {
        MySqlValue::NULL => Ok(NativeValue::Null),
        MySqlValue::Bytes(b) => Ok(NativeValue::Bytes(b)),
        MySqlValue::Int(i) => Ok(NativeValue::Int(i)),
        MySqlValue::UInt(u) => Ok(match i64::try_from(u) {
            Ok(i) => NativeValue::Int(i),
            Err(_) => NativeValue::text(u.to_string()),
        }),
        MySqlValue::Float(f) => Ok(NativeValue::Float(f64::from(f))),
        MySqlValue::Double(d) => Ok(NativeValue::Float(d)),
        MySqlValue::Date(0, 0, 0, 0, 0, 0, 0) => Ok(NativeValue::Null),
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(year.into(), month.into(), day.into())
                .and_then(|d| d.and_hms_micro_opt(hour.into(), minute.into(), second.into(), micros))
                .map(NativeValue::Timestamp)
                .ok_or_else(|| DbError::UnsupportedValue {
                    column,
                    detail: format!(
                        "invalid date {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
                    ),
                })
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = u64::from(days) * 24 + u64::from(hours);
            let mut text = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            Ok(NativeValue::text(text))
        }
    }
}
