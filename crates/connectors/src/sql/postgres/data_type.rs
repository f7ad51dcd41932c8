use model::core::data_type::ColumnKind;
use tokio_postgres::types::Type;

pub trait PgColumnKind {
    /// Postgres array type a column of this kind is bound as.
    fn array_type(&self) -> Type;

    /// SQL spelling of [`PgColumnKind::array_type`].
    fn array_type_name(&self) -> &'static str;
}

impl PgColumnKind for ColumnKind {
    fn array_type(&self) -> Type {
        match self {
            ColumnKind::Text => Type::TEXT_ARRAY,
            ColumnKind::Timestamp => Type::TIMESTAMP_ARRAY,
            ColumnKind::Bytes => Type::BYTEA_ARRAY,
            ColumnKind::Integer => Type::INT8_ARRAY,
            ColumnKind::Float => Type::FLOAT8_ARRAY,
        }
    }

    fn array_type_name(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text[]",
            ColumnKind::Timestamp => "timestamp[]",
            ColumnKind::Bytes => "bytea[]",
            ColumnKind::Integer => "int8[]",
            ColumnKind::Float => "float8[]",
        }
    }
}

/// Whether a `format_type` result denotes a column that stores raw bytes.
pub fn is_binary_type(format_type: &str) -> bool {
    format_type.trim().eq_ignore_ascii_case("bytea")
}

/// Explicit cast for an unnested element of `kind` headed for a column of
/// `format_type`, or `None` when the insert's assignment cast covers it.
///
/// Only text needs one, and never into a character column. The cast drops
/// the length modifier; length and precision are checked on assignment.
pub fn element_cast(kind: ColumnKind, format_type: &str) -> Option<String> {
    if kind != ColumnKind::Text {
        return None;
    }

    let base = strip_type_modifier(format_type);
    let (element, array) = match base.strip_suffix("[]") {
        Some(element) => (element, "[]"),
        None => (base.as_str(), ""),
    };
    let element = element.trim();

    if array.is_empty() && is_character_type(element) {
        return None;
    }
    // Bare `bit` means `bit(1)`; varying keeps every bit for the assignment check.
    if element.eq_ignore_ascii_case("bit") {
        return Some(format!("bit varying{array}"));
    }
    Some(format!("{element}{array}"))
}

fn strip_type_modifier(format_type: &str) -> String {
    let mut depth = 0usize;
    let stripped = format_type
        .chars()
        .filter(|c| match *c {
            '(' => {
                depth += 1;
                false
            }
            ')' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0,
        })
        .collect::<String>();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_character_type(base: &str) -> bool {
    matches!(
        base.to_ascii_lowercase().as_str(),
        "text" | "character varying" | "varchar" | "character" | "bpchar" | "name" | "citext"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_columns_take_text_uncast() {
        for dest in ["text", "character varying(5)", "character(3)", "citext"] {
            assert_eq!(element_cast(ColumnKind::Text, dest), None, "{dest}");
        }
    }

    #[test]
    fn text_is_cast_without_length_modifier() {
        assert_eq!(
            element_cast(ColumnKind::Text, "numeric(12,2)").as_deref(),
            Some("numeric")
        );
        assert_eq!(
            element_cast(ColumnKind::Text, "timestamp(3) without time zone").as_deref(),
            Some("timestamp without time zone")
        );
        assert_eq!(element_cast(ColumnKind::Text, "jsonb").as_deref(), Some("jsonb"));
        assert_eq!(
            element_cast(ColumnKind::Text, "bit(8)").as_deref(),
            Some("bit varying")
        );
        assert_eq!(
            element_cast(ColumnKind::Text, "character varying(5)[]").as_deref(),
            Some("character varying[]")
        );
    }

    #[test]
    fn typed_kinds_rely_on_assignment() {
        assert_eq!(element_cast(ColumnKind::Integer, "integer"), None);
        assert_eq!(element_cast(ColumnKind::Float, "numeric(12,2)"), None);
        assert_eq!(element_cast(ColumnKind::Timestamp, "timestamp with time zone"), None);
        assert_eq!(element_cast(ColumnKind::Bytes, "bytea"), None);
    }
}
