use model::core::data_type::ColumnKind;

pub trait MySqlColumnKind {
    /// Maps a MySQL `COLUMN_TYPE` (e.g. `bigint(20) unsigned`) to the kind
    /// its values arrive as.
    fn from_mysql_type(column_type: &str) -> ColumnKind;
}

impl MySqlColumnKind for ColumnKind {
    fn from_mysql_type(column_type: &str) -> ColumnKind {
        let lowered = column_type.trim().to_ascii_lowercase();
        let base = lowered
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        let unsigned = lowered.contains("unsigned");

        match base {
            // Unsigned 64-bit values may not fit in i64.
            "bigint" if unsigned => ColumnKind::Text,
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "year" => {
                ColumnKind::Integer
            }
            "float" | "double" | "real" => ColumnKind::Float,
            "date" | "datetime" | "timestamp" => ColumnKind::Timestamp,
            "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" | "bit" => {
                ColumnKind::Bytes
            }
            // decimal, char, text, enum, set, json, time, ...
            _ => ColumnKind::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_column_types() {
        assert_eq!(ColumnKind::from_mysql_type("int(11)"), ColumnKind::Integer);
        assert_eq!(
            ColumnKind::from_mysql_type("bigint(20) unsigned"),
            ColumnKind::Text
        );
        assert_eq!(
            ColumnKind::from_mysql_type("int unsigned"),
            ColumnKind::Integer
        );
        assert_eq!(ColumnKind::from_mysql_type("decimal(10,2)"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_mysql_type("DOUBLE"), ColumnKind::Float);
        assert_eq!(ColumnKind::from_mysql_type("datetime(6)"), ColumnKind::Timestamp);
        assert_eq!(ColumnKind::from_mysql_type("varbinary(16)"), ColumnKind::Bytes);
        assert_eq!(ColumnKind::from_mysql_type("time"), ColumnKind::Text);
    }
}
