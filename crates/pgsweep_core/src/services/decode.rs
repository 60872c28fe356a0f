//! Conversion of text-format PostgreSQL rows into [`Row`] maps.
//!
//! Values arrive as the server's text rendering. Booleans, integers and
//! floats become typed values, `bytea` is decoded to its bytes and then to
//! text, `timestamptz` is normalized to RFC 3339, and every other type keeps
//! the server text unchanged.

use crate::error::SweepError;
use crate::models::{ColumnValue, Row};

use chrono::DateTime;
use tokio_postgres::types::Type;
use tokio_postgres::SimpleQueryRow;

/// Name and type of one result column.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    /// Column name as reported by the server
    pub name: String,
    /// Column type
    pub ty: Type,
}

impl ResultColumn {
    /// Describe a column of a prepared statement.
    pub fn from_column(column: &tokio_postgres::Column) -> Self {
        Self { name: column.name().to_string(), ty: column.type_().clone() }
    }
}

/// Decode every column of a row.
pub fn decode_row(row: &SimpleQueryRow, columns: &[ResultColumn]) -> Result<Row, SweepError> {
    columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let text = row.try_get(i).map_err(|e| {
                SweepError::row_read_with_source(format!("column {}: {e}", col.name), e)
            })?;
            let value = match text {
                None => ColumnValue::Null,
                Some(text) => decode_text(&col.ty, text).map_err(|reason| {
                    SweepError::row_read("", format!("column {}: {reason}", col.name))
                })?,
            };
            Ok((col.name.clone(), value))
        })
        .collect()
}

/// Decode one non-NULL value from its text rendering.
pub fn decode_text(ty: &Type, text: &str) -> Result<ColumnValue, String> {
    let value = match *ty {
        Type::BOOL => match text {
            "t" => ColumnValue::Bool(true),
            "f" => ColumnValue::Bool(false),
            other => return Err(format!("invalid boolean {other:?}")),
        },

        // Integers
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => text
            .parse::<i64>()
            .map(ColumnValue::Int)
            .map_err(|e| format!("invalid integer {text:?}: {e}"))?,

        // Floating point, including NaN and Infinity
        Type::FLOAT4 | Type::FLOAT8 => text
            .parse::<f64>()
            .map(ColumnValue::Float)
            .map_err(|e| format!("invalid float {text:?}: {e}"))?,

        Type::BYTEA => ColumnValue::from_bytes(&decode_bytea(text)?),

        Type::TIMESTAMPTZ => ColumnValue::Text(timestamptz_rfc3339(text)),

        _ => ColumnValue::Text(text.to_string()),
    };

    Ok(value)
}

/// Decode `bytea` output in either the `hex` or the `escape` format.
fn decode_bytea(text: &str) -> Result<Vec<u8>, String> {
    if let Some(hex) = text.strip_prefix("\\x") {
        return decode_hex(hex);
    }

    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        match bytes.get(i + 1..i + 4) {
            Some([b'\\', ..]) => {
                out.push(b'\\');
                i += 2;
            }
            Some(octal) if octal.iter().all(|b| (b'0'..=b'7').contains(b)) => {
                let value = octal.iter().fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                let byte = u8::try_from(value).map_err(|_| "invalid bytea escape".to_string())?;
                out.push(byte);
                i += 4;
            }
            _ if bytes.get(i + 1) == Some(&b'\\') => {
                out.push(b'\\');
                i += 2;
            }
            _ => return Err("invalid bytea escape".to_string()),
        }
    }
    Ok(out)
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("odd number of hex digits in bytea".to_string());
    }
    hex.as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(|| "invalid hex digit in bytea".to_string())
        })
        .collect()
}

/// ISO `timestamptz` output as RFC 3339; anything else (`infinity`, other
/// DateStyles) is kept as sent.
fn timestamptz_rfc3339(text: &str) -> String {
    DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z")
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|_| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(ty: Type, text: &str) -> ColumnValue {
        decode_text(&ty, text).unwrap()
    }

    fn text(value: &str) -> ColumnValue {
        ColumnValue::Text(value.to_string())
    }

    #[test]
    fn test_scalar_types_are_typed() {
        assert_eq!(decode(Type::BOOL, "t"), ColumnValue::Bool(true));
        assert_eq!(decode(Type::BOOL, "f"), ColumnValue::Bool(false));
        assert_eq!(decode(Type::INT2, "-7"), ColumnValue::Int(-7));
        assert_eq!(decode(Type::INT8, "9223372036854775807"), ColumnValue::Int(i64::MAX));
        assert_eq!(decode(Type::OID, "4294967295"), ColumnValue::Int(4_294_967_295));
        assert_eq!(decode(Type::FLOAT8, "1.5"), ColumnValue::Float(1.5));
        assert_eq!(decode(Type::FLOAT4, "-Infinity"), ColumnValue::Float(f64::NEG_INFINITY));
        assert!(matches!(decode(Type::FLOAT8, "NaN"), ColumnValue::Float(v) if v.is_nan()));
    }

    #[test]
    fn test_server_text_kept_for_other_types() {
        assert_eq!(decode(Type::INTERVAL, "1 day"), text("1 day"));
        assert_eq!(decode(Type::INET, "127.0.0.1"), text("127.0.0.1"));
        assert_eq!(decode(Type::INT4_ARRAY, "{1,2}"), text("{1,2}"));
        assert_eq!(decode(Type::NUMERIC, "1.50"), text("1.50"));
        assert_eq!(decode(Type::TIMETZ, "12:00:00+02"), text("12:00:00+02"));
        assert_eq!(decode(Type::MONEY, "$1.00"), text("$1.00"));
        assert_eq!(decode(Type::XID, "742"), text("742"));
        assert_eq!(
            decode(Type::UUID, "a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11"),
            text("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11")
        );
        assert_eq!(decode(Type::JSONB, r#"{"a": 1}"#), text(r#"{"a": 1}"#));
    }

    #[test]
    fn test_bytea_hex_output_decodes_to_text() {
        assert_eq!(decode(Type::BYTEA, "\\x616263"), text("abc"));
        assert_eq!(decode(Type::BYTEA, "\\x"), text(""));
        assert_eq!(decode(Type::BYTEA, "\\x6869ff"), text("hi\u{fffd}"));
    }

    #[test]
    fn test_bytea_escape_output_decodes_to_text() {
        assert_eq!(decode(Type::BYTEA, "abc"), text("abc"));
        assert_eq!(decode(Type::BYTEA, "a\\\\b"), text("a\\b"));
        assert_eq!(decode(Type::BYTEA, "\\150\\151"), text("hi"));
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(decode_text(&Type::BOOL, "yes").is_err());
        assert!(decode_text(&Type::INT4, "12x").is_err());
        assert!(decode_text(&Type::BYTEA, "\\x6").is_err());
        assert!(decode_text(&Type::BYTEA, "\\xzz").is_err());
        assert!(decode_text(&Type::BYTEA, "\\9").is_err());
    }

    #[test]
    fn test_timestamptz_normalized_to_rfc3339() {
        assert_eq!(decode(Type::TIMESTAMPTZ, "2024-01-02 03:04:05+00"), text("2024-01-02T03:04:05+00:00"));
        assert_eq!(
            decode(Type::TIMESTAMPTZ, "2024-01-02 03:04:05.5+05:30"),
            text("2024-01-02T03:04:05.500+05:30")
        );
        assert_eq!(decode(Type::TIMESTAMPTZ, "infinity"), text("infinity"));
    }

    #[test]
    fn test_timestamp_without_zone_kept_as_sent() {
        assert_eq!(decode(Type::TIMESTAMP, "2024-01-02 03:04:05"), text("2024-01-02 03:04:05"));
        assert_eq!(decode(Type::DATE, "2024-01-02"), text("2024-01-02"));
    }
}
