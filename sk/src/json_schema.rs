//! JSON Schema export

use serde_json::{Map, Value, json};

use crate::schema::{Leaf, Schema};

pub const JSON_SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

impl Schema {
    /// Render this schema as a standalone JSON Schema document
    pub fn to_json_schema_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("$schema".to_string(), Value::from(JSON_SCHEMA_DIALECT));
        if let Value::Object(body) = self.to_json_schema() {
            doc.extend(body);
        }
        Value::Object(doc)
    }

    /// Render this schema as a JSON Schema fragment
    pub fn to_json_schema(&self) -> Value {
        match self {
            Schema::Optional(inner) => inner.to_json_schema(),
            Schema::Nullable(inner) => json!({ "anyOf": [inner.to_json_schema(), { "type": "null" }] }),
            Schema::Default(inner, value) => {
                let mut rendered = inner.to_json_schema();
                if let Value::Object(map) = &mut rendered {
                    map.insert("default".to_string(), value.clone());
                }
                rendered
            }
            Schema::Object(fields) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for (key, field) in fields {
                    properties.insert(key.clone(), field.to_json_schema());
                    if !field.is_omittable() {
                        required.push(Value::from(key.clone()));
                    }
                }
                let mut rendered = Map::new();
                rendered.insert("type".to_string(), Value::from("object"));
                rendered.insert("properties".to_string(), Value::Object(properties));
                if !required.is_empty() {
                    rendered.insert("required".to_string(), Value::Array(required));
                }
                rendered.insert("additionalProperties".to_string(), Value::Bool(false));
                Value::Object(rendered)
            }
            Schema::Array { element, min_items } => {
                let mut rendered = json!({ "type": "array", "items": element.to_json_schema() });
                if *min_items > 0 {
                    rendered["minItems"] = Value::from(*min_items);
                }
                rendered
            }
            Schema::Tuple(elements) => json!({
                "type": "array",
                "prefixItems": elements.iter().map(Schema::to_json_schema).collect::<Vec<_>>(),
                "items": false,
                "minItems": elements.len(),
                "maxItems": elements.len(),
            }),
            Schema::Map(value) => json!({ "type": "object", "additionalProperties": value.to_json_schema() }),
            Schema::Union(variants) => {
                let literals: Option<Vec<Value>> = variants
                    .iter()
                    .map(|v| match v {
                        Schema::Leaf(Leaf::Literal(lit)) => Some(lit.clone()),
                        _ => None,
                    })
                    .collect();
                match literals {
                    Some(values) if !values.is_empty() => json!({ "enum": values }),
                    _ => json!({ "anyOf": variants.iter().map(Schema::to_json_schema).collect::<Vec<_>>() }),
                }
            }
            Schema::Leaf(leaf) => match leaf {
                Leaf::Any => json!({}),
                Leaf::Null => json!({ "type": "null" }),
                Leaf::Boolean => json!({ "type": "boolean" }),
                Leaf::Integer { min, max } => {
                    let mut rendered = json!({ "type": "integer" });
                    if let Some(min) = min {
                        rendered["minimum"] = Value::from(*min);
                    }
                    if let Some(max) = max {
                        rendered["maximum"] = Value::from(*max);
                    }
                    rendered
                }
                Leaf::Number => json!({ "type": "number" }),
                Leaf::String { pattern: None } => json!({ "type": "string" }),
                Leaf::String { pattern: Some(re) } => json!({ "type": "string", "pattern": re.as_str() }),
                Leaf::Literal(value) => json!({ "const": value }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_lists_required_fields_and_forbids_extras() {
        let schema = Schema::object([
            ("name", Schema::string()),
            ("replicas", Schema::integer_min(1).with_default(json!(1))),
            ("note", Schema::string().optional()),
        ]);
        let rendered = schema.to_json_schema();
        assert_eq!(rendered["required"], json!(["name"]));
        assert_eq!(rendered["additionalProperties"], json!(false));
        assert_eq!(rendered["properties"]["replicas"], json!({ "type": "integer", "minimum": 1, "default": 1 }));
    }

    #[test]
    fn test_tuple_and_literals() {
        let schema = Schema::tuple(vec![Schema::literal(json!("a")), Schema::null()]);
        assert_eq!(
            schema.to_json_schema(),
            json!({
                "type": "array",
                "prefixItems": [ { "const": "a" }, { "type": "null" } ],
                "items": false,
                "minItems": 2,
                "maxItems": 2
            })
        );
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(
            Schema::integer_range(1, 65535).to_json_schema(),
            json!({ "type": "integer", "minimum": 1, "maximum": 65535 })
        );
        assert_eq!(Schema::integer().to_json_schema(), json!({ "type": "integer" }));
    }

    #[test]
    fn test_enumeration_renders_enum() {
        let schema = Schema::enumeration(&["NONE", "SPLIT"]);
        assert_eq!(schema.to_json_schema(), json!({ "enum": ["NONE", "SPLIT"] }));
    }

    #[test]
    fn test_document_carries_dialect() {
        let doc = Schema::map(Schema::boolean()).to_json_schema_document();
        assert_eq!(doc["$schema"], json!(JSON_SCHEMA_DIALECT));
        assert_eq!(doc["additionalProperties"], json!({ "type": "boolean" }));
    }
}
