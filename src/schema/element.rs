use serde::{Deserialize, Serialize};

/// Physical storage type of a leaf column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Repetition {
    Required,
    #[default]
    Optional,
    Repeated,
}

/// Logical conversion attached to an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConvertedType {
    Utf8,
    Json,
    Enum,
    List,
    Map,
    MapKeyValue,
    TimestampMillis,
    TimestampMicros,
    TimestampNanos,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampUnit {
    Millis,
    Micros,
    Nanos,
}

/// One entry of the flat, pre-order schema element list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaElement {
    pub name: String,
    pub physical_type: Option<PhysicalType>,
    pub repetition: Repetition,
    pub converted_type: Option<ConvertedType>,
    pub type_length: Option<i32>,
    pub num_children: usize,
}

impl SchemaElement {
    pub fn leaf(
        name: impl Into<String>,
        physical_type: PhysicalType,
        repetition: Repetition,
    ) -> Self {
        SchemaElement {
            name: name.into(),
            physical_type: Some(physical_type),
            repetition,
            converted_type: None,
            type_length: None,
            num_children: 0,
        }
    }

    pub fn group(name: impl Into<String>, repetition: Repetition, num_children: usize) -> Self {
        SchemaElement {
            name: name.into(),
            physical_type: None,
            repetition,
            converted_type: None,
            type_length: None,
            num_children,
        }
    }

    pub fn with_converted_type(mut self, converted_type: ConvertedType) -> Self {
        self.converted_type = Some(converted_type);
        self
    }

    pub fn with_type_length(mut self, type_length: i32) -> Self {
        self.type_length = Some(type_length);
        self
    }

    pub fn is_group(&self) -> bool {
        self.num_children > 0 || self.physical_type.is_none()
    }

    pub fn is_list(&self) -> bool {
        self.converted_type == Some(ConvertedType::List)
    }

    /// Whether a map value at this element is a logical key/value map
    /// rather than a fixed set of named fields
    pub fn is_map(&self) -> bool {
        matches!(
            self.converted_type,
            Some(ConvertedType::Map) | Some(ConvertedType::MapKeyValue)
        )
    }

    pub fn is_enum(&self) -> bool {
        self.converted_type == Some(ConvertedType::Enum)
    }

    pub fn timestamp_unit(&self) -> Option<TimestampUnit> {
        match self.converted_type {
            Some(ConvertedType::TimestampMillis) => Some(TimestampUnit::Millis),
            Some(ConvertedType::TimestampMicros) => Some(TimestampUnit::Micros),
            Some(ConvertedType::TimestampNanos) => Some(TimestampUnit::Nanos),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        let element = SchemaElement::leaf("ts", PhysicalType::Int64, Repetition::Optional)
            .with_converted_type(ConvertedType::TimestampMicros);
        let json = serde_json::to_value(&element).unwrap();

        assert_eq!(json["physical_type"], "INT64");
        assert_eq!(json["repetition"], "OPTIONAL");
        assert_eq!(json["converted_type"], "TIMESTAMP_MICROS");
        assert_eq!(element.timestamp_unit(), Some(TimestampUnit::Micros));
    }

    #[test]
    fn test_map_flags() {
        let map = SchemaElement::group("m", Repetition::Optional, 1)
            .with_converted_type(ConvertedType::MapKeyValue);
        assert!(map.is_map());
        assert!(!map.is_list());
        assert!(!SchemaElement::group("s", Repetition::Required, 2).is_map());
    }
}
