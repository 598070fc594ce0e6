//! Conversion of runtime values into a column's physical storage type

use crate::error::{MarshalError, Result};
use crate::schema::{PhysicalType, SchemaElement};
use crate::types::Value;
use serde_json::Value as JsonValue;

/// A value in its physical storage representation
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalValue {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96([u8; 12]),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    FixedLenByteArray(Vec<u8>),
}

impl PhysicalValue {
    /// JSON rendering used by the column writers; byte arrays that are valid
    /// UTF-8 are written as strings
    pub fn to_json(&self) -> JsonValue {
        match self {
            PhysicalValue::Boolean(b) => JsonValue::Bool(*b),
            PhysicalValue::Int32(n) => JsonValue::from(*n),
            PhysicalValue::Int64(n) => JsonValue::from(*n),
            PhysicalValue::Int96(bytes) => JsonValue::from(bytes.to_vec()),
            PhysicalValue::Float(f) => JsonValue::from(f64::from(*f)),
            PhysicalValue::Double(f) => JsonValue::from(*f),
            PhysicalValue::ByteArray(bytes) | PhysicalValue::FixedLenByteArray(bytes) => {
                match std::str::from_utf8(bytes) {
                    Ok(s) => JsonValue::String(s.to_string()),
                    Err(_) => JsonValue::from(bytes.clone()),
                }
            }
        }
    }
}

/// Convert `value` to the physical type declared by `element`
///
/// `Null` maps to `None`. Wrappers and aggregates never reach this point.
pub fn coerce(value: &Value, element: &SchemaElement, path: &str) -> Result<Option<PhysicalValue>> {
    let Some(physical_type) = element.physical_type else {
        return Err(MarshalError::invariant(path, "leaf has no physical type"));
    };
    let fail = || MarshalError::Coercion {
        path: path.to_string(),
        physical_type,
        found: value.kind(),
    };

    let coerced = match (physical_type, value) {
        (_, Value::Null) => return Ok(None),

        (PhysicalType::Boolean, Value::Bool(b)) => PhysicalValue::Boolean(*b),

        (PhysicalType::Int32, Value::Int32(n)) => PhysicalValue::Int32(*n),
        (PhysicalType::Int32, Value::Int64(n)) => {
            PhysicalValue::Int32(i32::try_from(*n).map_err(|_| fail())?)
        }
        (PhysicalType::Int32, Value::UInt64(n)) => {
            PhysicalValue::Int32(i32::try_from(*n).map_err(|_| fail())?)
        }
        (PhysicalType::Int32, Value::Enum { number, .. }) => PhysicalValue::Int32(*number),

        (PhysicalType::Int64, Value::Int32(n)) => PhysicalValue::Int64(i64::from(*n)),
        (PhysicalType::Int64, Value::Int64(n)) => PhysicalValue::Int64(*n),
        (PhysicalType::Int64, Value::UInt64(n)) => {
            PhysicalValue::Int64(i64::try_from(*n).map_err(|_| fail())?)
        }
        (PhysicalType::Int64, Value::Enum { number, .. }) => {
            PhysicalValue::Int64(i64::from(*number))
        }

        (PhysicalType::Int96, Value::Bytes(bytes)) => {
            PhysicalValue::Int96(bytes.as_slice().try_into().map_err(|_| fail())?)
        }

        (PhysicalType::Float, Value::Float(f)) => PhysicalValue::Float(*f),
        (PhysicalType::Float, Value::Double(f)) => PhysicalValue::Float(*f as f32),
        (PhysicalType::Float, Value::Int32(n)) => PhysicalValue::Float(*n as f32),
        (PhysicalType::Float, Value::Int64(n)) => PhysicalValue::Float(*n as f32),

        (PhysicalType::Double, Value::Double(f)) => PhysicalValue::Double(*f),
        (PhysicalType::Double, Value::Float(f)) => PhysicalValue::Double(f64::from(*f)),
        (PhysicalType::Double, Value::Int32(n)) => PhysicalValue::Double(f64::from(*n)),
        (PhysicalType::Double, Value::Int64(n)) => PhysicalValue::Double(*n as f64),
        (PhysicalType::Double, Value::UInt64(n)) => PhysicalValue::Double(*n as f64),

        (PhysicalType::ByteArray, Value::String(s)) => {
            PhysicalValue::ByteArray(s.as_bytes().to_vec())
        }
        (PhysicalType::ByteArray, Value::Bytes(bytes)) => PhysicalValue::ByteArray(bytes.clone()),
        (PhysicalType::ByteArray, Value::Enum { name, .. }) => {
            PhysicalValue::ByteArray(name.as_bytes().to_vec())
        }

        (PhysicalType::FixedLenByteArray, Value::String(s)) => {
            fixed(s.as_bytes(), element).ok_or_else(fail)?
        }
        (PhysicalType::FixedLenByteArray, Value::Bytes(bytes)) => {
            fixed(bytes, element).ok_or_else(fail)?
        }

        _ => return Err(fail()),
    };

    Ok(Some(coerced))
}

fn fixed(bytes: &[u8], element: &SchemaElement) -> Option<PhysicalValue> {
    match element.type_length {
        Some(len) if usize::try_from(len).ok() != Some(bytes.len()) => None,
        _ => Some(PhysicalValue::FixedLenByteArray(bytes.to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Repetition;

    fn leaf(physical_type: PhysicalType) -> SchemaElement {
        SchemaElement::leaf("x", physical_type, Repetition::Optional)
    }

    #[test]
    fn test_integer_narrowing() {
        let int32 = leaf(PhysicalType::Int32);
        assert_eq!(
            coerce(&Value::Int64(7), &int32, "root/x").unwrap(),
            Some(PhysicalValue::Int32(7))
        );

        let err = coerce(&Value::Int64(i64::MAX), &int32, "root/x").unwrap_err();
        assert!(matches!(err, MarshalError::Coercion { found: "int64", .. }));
    }

    #[test]
    fn test_null_and_widening() {
        let double = leaf(PhysicalType::Double);
        assert_eq!(coerce(&Value::Null, &double, "root/x").unwrap(), None);
        assert_eq!(
            coerce(&Value::Int32(2), &double, "root/x").unwrap(),
            Some(PhysicalValue::Double(2.0))
        );
    }

    #[test]
    fn test_byte_arrays() {
        let bytes = leaf(PhysicalType::ByteArray);
        assert_eq!(
            coerce(&Value::from("hi"), &bytes, "root/x").unwrap(),
            Some(PhysicalValue::ByteArray(b"hi".to_vec()))
        );

        let fixed = leaf(PhysicalType::FixedLenByteArray).with_type_length(4);
        assert!(coerce(&Value::Bytes(vec![1, 2, 3, 4]), &fixed, "root/x").is_ok());
        assert!(coerce(&Value::Bytes(vec![1, 2, 3]), &fixed, "root/x").is_err());
    }

    #[test]
    fn test_mismatch() {
        let boolean = leaf(PhysicalType::Boolean);
        let err = coerce(&Value::from("yes"), &boolean, "root/flag").unwrap_err();
        assert_eq!(err.to_string(), "cannot store string value in Boolean column `root/flag`");
    }

    #[test]
    fn test_to_json() {
        assert_eq!(PhysicalValue::ByteArray(b"abc".to_vec()).to_json(), "abc");
        assert_eq!(PhysicalValue::Int64(5).to_json(), 5);
    }
}
