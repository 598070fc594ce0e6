//! Schema-guided decoding of JSON documents into records
//!
//! JSON carries no optionality or repetition of its own, so the decoder walks each
//! document alongside the schema's path tree and produces the `Value` shape a
//! typed record would have: `Optional` for optional elements, `Struct` for plain
//! groups, `List` for lists and repeated fields, `Map` for map groups.

use crate::error::{MarshalError, Result};
use crate::schema::definition::{
    unescape_field_name, LIST_ELEMENT, LIST_GROUP, MAP_GROUP, MAP_KEY, MAP_VALUE,
};
use crate::schema::{ConvertedType, PathNode, PhysicalType, Repetition, SchemaHandler};
use crate::types::Value;
use serde_json::Value as JsonValue;

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

pub struct JsonDecoder<'s> {
    schema: &'s SchemaHandler,
}

impl<'s> JsonDecoder<'s> {
    pub fn new(schema: &'s SchemaHandler) -> Self {
        JsonDecoder { schema }
    }

    /// Decode one JSON document into a record of the schema's root group
    pub fn decode(&self, json: &JsonValue) -> Result<Value> {
        self.decode_group(self.schema.root(), json)
    }

    /// Decode a batch of documents
    pub fn decode_all(&self, documents: &[JsonValue]) -> Result<Vec<Value>> {
        documents.iter().map(|doc| self.decode(doc)).collect()
    }

    /// Decode a value for a field, applying the field's repetition
    fn decode_field(&self, node: &PathNode, json: &JsonValue) -> Result<Value> {
        match self.schema.element(node.ordinal()).repetition {
            Repetition::Required if json.is_null() => {
                Err(MarshalError::decode(node.path(), "required value is null"))
            }
            Repetition::Required => self.decode_inner(node, json),
            Repetition::Optional if json.is_null() => Ok(Value::none()),
            Repetition::Optional => Ok(Value::some(self.decode_inner(node, json)?)),
            Repetition::Repeated => match json {
                JsonValue::Null => Ok(Value::List(Vec::new())),
                JsonValue::Array(items) => items
                    .iter()
                    .map(|item| self.decode_inner(node, item))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::List),
                other => Err(MarshalError::decode(
                    node.path(),
                    format!("repeated field expects an array, found {}", json_kind(other)),
                )),
            },
        }
    }

    /// Decode the value itself, ignoring the field's repetition
    fn decode_inner(&self, node: &PathNode, json: &JsonValue) -> Result<Value> {
        if node.is_leaf() {
            return self.decode_leaf(node, json);
        }

        let element = self.schema.element(node.ordinal());
        if element.is_list() {
            self.decode_list(node, json)
        } else if element.is_map() {
            self.decode_map(node, json)
        } else {
            self.decode_group(node, json)
        }
    }

    fn decode_group(&self, node: &PathNode, json: &JsonValue) -> Result<Value> {
        let JsonValue::Object(obj) = json else {
            return Err(MarshalError::decode(
                node.path(),
                format!("expected object, found {}", json_kind(json)),
            ));
        };

        // Keys missing from the document are left out; unknown keys are ignored
        let mut fields = Vec::with_capacity(node.children().len());
        for child in node.children() {
            let value = obj
                .get(child.name())
                .or_else(|| obj.get(&*unescape_field_name(child.name())));
            if let Some(value) = value {
                fields.push((child.name().to_string(), self.decode_field(child, value)?));
            }
        }
        Ok(Value::Struct(fields))
    }

    fn decode_list(&self, node: &PathNode, json: &JsonValue) -> Result<Value> {
        let element = node
            .child(LIST_GROUP)
            .and_then(|list| list.child(LIST_ELEMENT))
            .ok_or_else(|| {
                MarshalError::decode(node.path(), "list group without list/element")
            })?;
        let JsonValue::Array(items) = json else {
            return Err(MarshalError::decode(
                node.path(),
                format!("expected array, found {}", json_kind(json)),
            ));
        };

        let items = items
            .iter()
            .map(|item| self.decode_field(element, item))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::List(items))
    }

    fn decode_map(&self, node: &PathNode, json: &JsonValue) -> Result<Value> {
        let key_value = node
            .child(MAP_GROUP)
            .ok_or_else(|| MarshalError::decode(node.path(), "map group without key_value"))?;
        let (Some(key_node), Some(value_node)) =
            (key_value.child(MAP_KEY), key_value.child(MAP_VALUE))
        else {
            return Err(MarshalError::decode(
                key_value.path(),
                "key_value group without key and value",
            ));
        };
        let JsonValue::Object(obj) = json else {
            return Err(MarshalError::decode(
                node.path(),
                format!("expected object, found {}", json_kind(json)),
            ));
        };

        let mut entries = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            let key = self.decode_field(key_node, &JsonValue::String(key.clone()))?;
            entries.push((key, self.decode_field(value_node, value)?));
        }
        Ok(Value::Map(entries))
    }

    fn decode_leaf(&self, node: &PathNode, json: &JsonValue) -> Result<Value> {
        let element = self.schema.element(node.ordinal());
        if element.converted_type == Some(ConvertedType::Json) {
            return Ok(Value::String(json.to_string()));
        }

        let mismatch = || {
            MarshalError::decode(
                node.path(),
                format!("cannot read {:?} from {}", element.physical_type, json_kind(json)),
            )
        };

        match (element.physical_type, json) {
            (Some(PhysicalType::Boolean), JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
            (Some(PhysicalType::Int32), JsonValue::Number(n)) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Value::Int32)
                .ok_or_else(mismatch),
            (Some(PhysicalType::Int64), JsonValue::Number(n)) => n
                .as_i64()
                .map(Value::Int64)
                .or_else(|| n.as_u64().map(Value::UInt64))
                .ok_or_else(mismatch),
            (Some(PhysicalType::Float), JsonValue::Number(n)) => {
                n.as_f64().map(|f| Value::Float(f as f32)).ok_or_else(mismatch)
            }
            (Some(PhysicalType::Double), JsonValue::Number(n)) => {
                n.as_f64().map(Value::Double).ok_or_else(mismatch)
            }
            (
                Some(PhysicalType::ByteArray | PhysicalType::FixedLenByteArray),
                JsonValue::String(s),
            ) => Ok(Value::String(s.clone())),
            _ => Err(mismatch()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::PhysicalValue;
    use crate::marshal::marshal;
    use crate::schema::{infer_schema, SchemaDefinition};
    use serde_json::json;

    fn schema() -> SchemaHandler {
        SchemaDefinition::root(
            "root",
            vec![
                SchemaDefinition::leaf("id", PhysicalType::Int64, Repetition::Required),
                SchemaDefinition::string("email", Repetition::Optional),
                SchemaDefinition::list(
                    "posts",
                    Repetition::Optional,
                    SchemaDefinition::group(
                        "post",
                        Repetition::Required,
                        vec![
                            SchemaDefinition::string("title", Repetition::Required),
                            SchemaDefinition::list(
                                "tags",
                                Repetition::Optional,
                                SchemaDefinition::string("tag", Repetition::Optional),
                            ),
                        ],
                    ),
                ),
                SchemaDefinition::map(
                    "counters",
                    Repetition::Optional,
                    SchemaDefinition::string("k", Repetition::Required),
                    SchemaDefinition::leaf("v", PhysicalType::Int32, Repetition::Required),
                ),
                SchemaDefinition::leaf("extra", PhysicalType::ByteArray, Repetition::Optional)
                    .with_converted_type(ConvertedType::Json),
            ],
        )
        .into_handler()
        .unwrap()
    }

    #[test]
    fn test_decode_shapes() {
        let schema = schema();
        let decoder = JsonDecoder::new(&schema);

        let record = decoder
            .decode(&json!({"id": 1, "email": null, "ignored": true, "extra": {"a": [1]}}))
            .unwrap();

        assert_eq!(
            record,
            Value::record([
                ("id", Value::Int64(1)),
                ("email", Value::none()),
                ("extra", Value::some(Value::from(r#"{"a":[1]}"#))),
            ])
        );
    }

    #[test]
    fn test_decode_errors() {
        let schema = schema();
        let decoder = JsonDecoder::new(&schema);

        let err = decoder.decode(&json!({"id": "one"})).unwrap_err();
        assert!(matches!(err, MarshalError::Decode { ref path, .. } if path == "root/id"));

        let err = decoder.decode(&json!({"id": null})).unwrap_err();
        assert!(err.to_string().contains("required value is null"));

        assert!(decoder.decode(&json!([1, 2])).is_err());
        assert!(decoder.decode(&json!({"id": 1, "posts": {"title": "x"}})).is_err());
    }

    #[test]
    fn test_decode_then_marshal() {
        let schema = schema();
        let decoder = JsonDecoder::new(&schema);
        let records = decoder
            .decode_all(&[
                json!({
                    "id": 1,
                    "email": "a@example.com",
                    "posts": [
                        {"title": "first", "tags": ["rust", null]},
                        {"title": "second"}
                    ],
                    "counters": {"views": 10}
                }),
                json!({"id": 2, "posts": []}),
            ])
            .unwrap();

        let columns = marshal(&records, &schema).unwrap();

        let tags = &columns["root/posts/list/element/tags/list/element"];
        assert_eq!(tags.max_definition_level, 5);
        assert_eq!(tags.definition_levels, vec![5, 4, 2, 1]);
        assert_eq!(tags.repetition_levels, vec![0, 2, 1, 0]);

        let titles = &columns["root/posts/list/element/title"];
        assert_eq!(titles.definition_levels, vec![2, 2, 1]);
        assert_eq!(titles.repetition_levels, vec![0, 1, 0]);

        let values = &columns["root/counters/key_value/value"];
        assert_eq!(values.definition_levels, vec![2, 0]);
        assert_eq!(values.null_count(), 1);

        let email = &columns["root/email"];
        assert_eq!(email.definition_levels, vec![1, 0]);
    }

    #[test]
    fn test_keys_with_path_delimiter() {
        let documents = [json!({"a/b": 1, "a": {"b": 2}, "http://x": 5})];
        let schema = infer_schema(&documents, "root").into_handler().unwrap();
        let records = JsonDecoder::new(&schema).decode_all(&documents).unwrap();
        let columns = marshal(&records, &schema).unwrap();

        let paths: Vec<&str> = columns.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["root/a%2Fb", "root/a/b", "root/http:%2F%2Fx"]);
        assert_eq!(columns["root/a/b"].values, vec![Some(PhysicalValue::Int64(2))]);
        assert_eq!(columns["root/a%2Fb"].values, vec![Some(PhysicalValue::Int64(1))]);
        assert_eq!(columns["root/http:%2F%2Fx"].values, vec![Some(PhysicalValue::Int64(5))]);
    }

    #[test]
    fn test_unsigned_beyond_int64_is_inferred_as_double() {
        let documents = [json!({"n": u64::MAX}), json!({"n": 1})];
        let schema = infer_schema(&documents, "root").into_handler().unwrap();
        let records = JsonDecoder::new(&schema).decode_all(&documents).unwrap();
        let columns = marshal(&records, &schema).unwrap();

        assert_eq!(columns["root/n"].physical_type, PhysicalType::Double);
        assert_eq!(
            columns["root/n"].values,
            vec![Some(PhysicalValue::Double(u64::MAX as f64)), Some(PhysicalValue::Double(1.0))]
        );
    }
}
