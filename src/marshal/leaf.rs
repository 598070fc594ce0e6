use crate::coerce::coerce;
use crate::error::{MarshalError, Result};
use crate::marshal::pool::Node;
use crate::marshal::sink::TableSink;
use crate::schema::{PhysicalType, SchemaElement, TimestampUnit};
use crate::types::Value;
use std::borrow::Cow;

/// Append a terminal node to its column
pub(crate) fn emit(node: &Node<'_>, sink: &mut TableSink) -> Result<()> {
    let Some(column) = sink.column_mut(node.path.ordinal()) else {
        return Err(MarshalError::invariant(
            node.path.path(),
            format!("{} value at a group path", node.value.kind()),
        ));
    };

    let value = transform(node.value, &column.element, &column.path)?;
    let physical = coerce(&value, &column.element, &column.path)?;
    column.try_append(physical, node.dl, node.rl)
}

/// Special-case conversions applied before physical coercion
///
/// Raw bytes need none here: they are already terminal and coerce to a byte array.
fn transform<'v>(value: &'v Value, element: &SchemaElement, path: &str) -> Result<Cow<'v, Value>> {
    match value {
        Value::Timestamp { seconds, nanos } => {
            flatten_timestamp(*seconds, *nanos, element, path).map(Cow::Owned)
        }
        Value::Enum { name, .. } if element.is_enum() => {
            Ok(Cow::Owned(Value::String(name.clone())))
        }
        Value::String(_) | Value::Null => Ok(Cow::Borrowed(value)),
        _ if element.is_enum() => Err(MarshalError::invariant(
            path,
            format!("enum column expects an enum value, got {}", value.kind()),
        )),
        _ => Ok(Cow::Borrowed(value)),
    }
}

fn flatten_timestamp(
    seconds: i64,
    nanos: i32,
    element: &SchemaElement,
    path: &str,
) -> Result<Value> {
    let Some(unit) = element.timestamp_unit() else {
        return Err(MarshalError::invariant(
            path,
            "timestamp value in a column without a timestamp unit",
        ));
    };
    let (per_second, nanos_per_unit) = match unit {
        TimestampUnit::Millis => (1_000, 1_000_000),
        TimestampUnit::Micros => (1_000_000, 1_000),
        TimestampUnit::Nanos => (1_000_000_000, 1),
    };

    seconds
        .checked_mul(per_second)
        .and_then(|scaled| scaled.checked_add(i64::from(nanos) / nanos_per_unit))
        .map(Value::Int64)
        .ok_or_else(|| MarshalError::Coercion {
            path: path.to_string(),
            physical_type: element.physical_type.unwrap_or(PhysicalType::Int64),
            found: "timestamp",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConvertedType, Repetition};

    #[test]
    fn test_timestamp_units() {
        let micros = SchemaElement::leaf("ts", PhysicalType::Int64, Repetition::Optional)
            .with_converted_type(ConvertedType::TimestampMicros);
        let millis = micros.clone().with_converted_type(ConvertedType::TimestampMillis);

        let ts = Value::Timestamp {
            seconds: 1_700_000_000,
            nanos: 123_456_789,
        };
        assert_eq!(
            transform(&ts, &micros, "root/ts").unwrap().into_owned(),
            Value::Int64(1_700_000_000_123_456)
        );
        assert_eq!(
            transform(&ts, &millis, "root/ts").unwrap().into_owned(),
            Value::Int64(1_700_000_000_123)
        );
    }

    #[test]
    fn test_timestamp_needs_unit() {
        let plain = SchemaElement::leaf("ts", PhysicalType::Int64, Repetition::Optional);
        let ts = Value::Timestamp { seconds: 1, nanos: 0 };
        assert!(matches!(
            transform(&ts, &plain, "root/ts"),
            Err(MarshalError::Invariant { .. })
        ));

        let nanos = plain.with_converted_type(ConvertedType::TimestampNanos);
        let far = Value::Timestamp { seconds: i64::MAX / 10, nanos: 0 };
        assert!(matches!(
            transform(&far, &nanos, "root/ts"),
            Err(MarshalError::Coercion { .. })
        ));
    }

    #[test]
    fn test_enum_rendering() {
        let element = SchemaElement::leaf("kind", PhysicalType::ByteArray, Repetition::Required)
            .with_converted_type(ConvertedType::Enum);
        let value = Value::Enum {
            number: 2,
            name: "ACTIVE".to_string(),
        };

        assert_eq!(
            transform(&value, &element, "root/kind").unwrap().into_owned(),
            Value::from("ACTIVE")
        );
        assert!(transform(&Value::Int32(2), &element, "root/kind").is_err());
    }
}
