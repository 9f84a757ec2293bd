//! Strict JSON schemas for structured model output.
//!
//! Strict structured output requires:
//! 1. `additionalProperties: false` on all object schemas
//! 2. ALL properties listed in `required`, even nullable ones
//! 3. Fully inlined schemas (no `$ref` references)
//!
//! `schemars` output is transformed here to meet these requirements.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Schema keywords dropped because strict mode rejects them.
const UNSUPPORTED_KEYWORDS: &[&str] = &["format", "default", "minimum"];

/// Types that can be requested as strict structured output.
///
/// Implemented for any `JsonSchema + DeserializeOwned` type.
pub trait StrictSchema: JsonSchema + DeserializeOwned {
    /// Generate the strict-mode schema for this type.
    fn strict_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions").unwrap_or_default()
            }
            _ => Value::Null,
        };
        make_strict(&mut value, &definitions);

        value
    }

    fn schema_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StrictSchema for T {}

/// One pass over a schema node: inline `$ref`s, drop unsupported keywords,
/// close objects and require every property.
fn make_strict(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            let referenced = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|path| path.strip_prefix("#/definitions/"))
                .and_then(|name| definitions.get(name));
            if let Some(def) = referenced {
                *value = def.clone();
                make_strict(value, definitions);
                return;
            }

            for keyword in UNSUPPORTED_KEYWORDS {
                map.remove(*keyword);
            }

            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get("properties") {
                    let required = props.keys().cloned().map(Value::String).collect();
                    map.insert("required".to_string(), Value::Array(required));
                }
            }

            for (key, child) in map.iter_mut() {
                match child {
                    // Keys under `properties` are field names, not keywords
                    Value::Object(props) if key == "properties" => {
                        for prop in props.values_mut() {
                            make_strict(prop, definitions);
                        }
                    }
                    _ => make_strict(child, definitions),
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                make_strict(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::menu::ExtractedMenuData;
    use serde::Deserialize;

    #[test]
    fn test_all_properties_required() {
        #[derive(Deserialize, JsonSchema)]
        struct Choice {
            name: String,
            note: Option<String>,
        }

        let schema = Choice::strict_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();

        assert!(required.contains(&"name"));
        assert!(required.contains(&"note"));
        assert_eq!(schema["additionalProperties"], Value::Bool(false));
    }

    #[test]
    fn test_property_named_like_a_keyword_survives() {
        #[derive(Deserialize, JsonSchema)]
        struct Setting {
            #[serde(default)]
            default: Option<String>,
        }

        let schema = Setting::strict_schema();
        assert!(schema["properties"]["default"].is_object());
        assert_eq!(schema["required"][0], "default");
    }

    #[test]
    fn test_menu_schema_is_fully_inlined() {
        let schema = ExtractedMenuData::strict_schema();
        let text = serde_json::to_string(&schema).unwrap();

        assert!(!text.contains("$ref"));
        assert!(!text.contains("definitions"));
        assert!(!text.contains("\"format\""));

        let item = &schema["properties"]["categories"]["items"]["properties"]["items"]["items"];
        assert_eq!(item["additionalProperties"], Value::Bool(false));
        assert!(item["properties"]["existingItemId"].is_object());
    }
}
