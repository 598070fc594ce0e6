//! Nested, serde-friendly schema description
//!
//! A `SchemaDefinition` is what users write in a schema file or what inference
//! produces. It flattens into the pre-order element list `SchemaHandler` consumes.

use crate::error::SchemaError;
use crate::schema::element::{ConvertedType, PhysicalType, Repetition, SchemaElement};
use crate::schema::handler::{SchemaHandler, PATH_DELIMITER};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const LIST_GROUP: &str = "list";
pub const LIST_ELEMENT: &str = "element";
pub const MAP_GROUP: &str = "key_value";
pub const MAP_KEY: &str = "key";
pub const MAP_VALUE: &str = "value";

/// Field name for a JSON key that contains the path delimiter
///
/// `%` and `/` are percent-encoded (`%25`, `%2F`); other keys are used as is.
pub fn escape_field_name(key: &str) -> Cow<'_, str> {
    if !key.contains(PATH_DELIMITER) {
        return Cow::Borrowed(key);
    }
    Cow::Owned(key.replace('%', "%25").replace(PATH_DELIMITER, "%2F"))
}

/// The JSON key an escaped field name was built from
pub fn unescape_field_name(name: &str) -> Cow<'_, str> {
    if !name.contains("%2F") {
        return Cow::Borrowed(name);
    }

    let mut key = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(pos) = rest.find('%') {
        key.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("%2F") {
            key.push(PATH_DELIMITER);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("%25") {
            key.push('%');
            rest = after;
        } else {
            key.push('%');
            rest = &tail[1..];
        }
    }
    key.push_str(rest);
    Cow::Owned(key)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub physical_type: Option<PhysicalType>,

    #[serde(default)]
    pub repetition: Repetition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_type: Option<ConvertedType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_length: Option<i32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<SchemaDefinition>,
}

impl SchemaDefinition {
    pub fn root(name: impl Into<String>, fields: Vec<SchemaDefinition>) -> Self {
        Self::group(name, Repetition::Required, fields)
    }

    pub fn leaf(
        name: impl Into<String>,
        physical_type: PhysicalType,
        repetition: Repetition,
    ) -> Self {
        SchemaDefinition {
            name: name.into(),
            physical_type: Some(physical_type),
            repetition,
            converted_type: None,
            type_length: None,
            fields: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>, repetition: Repetition) -> Self {
        Self::leaf(name, PhysicalType::ByteArray, repetition)
            .with_converted_type(ConvertedType::Utf8)
    }

    pub fn group(
        name: impl Into<String>,
        repetition: Repetition,
        fields: Vec<SchemaDefinition>,
    ) -> Self {
        SchemaDefinition {
            name: name.into(),
            physical_type: None,
            repetition,
            converted_type: None,
            type_length: None,
            fields,
        }
    }

    /// Three-level list: `name (LIST) / list (repeated) / element`
    pub fn list(
        name: impl Into<String>,
        repetition: Repetition,
        mut element: SchemaDefinition,
    ) -> Self {
        element.name = LIST_ELEMENT.to_string();
        Self::group(
            name,
            repetition,
            vec![Self::group(LIST_GROUP, Repetition::Repeated, vec![element])],
        )
        .with_converted_type(ConvertedType::List)
    }

    /// Three-level map: `name (MAP) / key_value (repeated) / {key, value}`
    pub fn map(
        name: impl Into<String>,
        repetition: Repetition,
        mut key: SchemaDefinition,
        mut value: SchemaDefinition,
    ) -> Self {
        key.name = MAP_KEY.to_string();
        key.repetition = Repetition::Required;
        value.name = MAP_VALUE.to_string();
        Self::group(
            name,
            repetition,
            vec![Self::group(MAP_GROUP, Repetition::Repeated, vec![key, value])],
        )
        .with_converted_type(ConvertedType::Map)
    }

    pub fn with_converted_type(mut self, converted_type: ConvertedType) -> Self {
        self.converted_type = Some(converted_type);
        self
    }

    pub fn with_type_length(mut self, type_length: i32) -> Self {
        self.type_length = Some(type_length);
        self
    }

    /// Flatten into a pre-order element list, root first
    pub fn to_elements(&self) -> Vec<SchemaElement> {
        let mut elements = Vec::new();
        self.flatten_into(&mut elements);
        elements
    }

    pub fn into_handler(self) -> Result<SchemaHandler, SchemaError> {
        SchemaHandler::new(self.to_elements())
    }

    fn flatten_into(&self, elements: &mut Vec<SchemaElement>) {
        elements.push(SchemaElement {
            name: self.name.clone(),
            physical_type: self.physical_type,
            repetition: self.repetition,
            converted_type: self.converted_type,
            type_length: self.type_length,
            num_children: self.fields.len(),
        });
        for field in &self.fields {
            field.flatten_into(elements);
        }
    }
}
