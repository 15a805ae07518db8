//! Output model: schema nodes and the document that wraps them.
//!
//! Serialization omits empty values (empty strings and collections, `false`
//! for `additionalProperties`, unset validators) and flattens `extensions`
//! into the node's own object. Extension keys are written last, so an
//! extension named like a structural keyword replaces it.
use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Error as _, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

pub const DEFAULT_SCHEMA: &str = "http://json-schema.org/schema#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl SchemaType {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    String(String),
    #[serde(serialize_with = "num_pref_i64")]
    Number(f64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConstValue {
    String(String),
    #[serde(serialize_with = "num_pref_i64")]
    Number(f64),
    Integer(i64),
}

/// One node of the schema tree. Children are owned; `reference` is the only
/// link between nodes and it is a name, not a pointer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    pub schema_type: Option<SchemaType>,
    pub format: Option<String>,
    pub items: Option<Box<SchemaNode>>,
    pub properties: IndexMap<String, SchemaNode>,
    pub required: Vec<String>,
    pub additional_properties: bool,
    pub description: String,
    pub any_of: Vec<SchemaNode>,
    pub one_of: Vec<SchemaNode>,
    pub dependencies: IndexMap<String, SchemaNode>,
    pub default: Option<DefaultValue>,
    pub extensions: Map<String, Value>,

    // number validators
    pub multiple_of: Option<f64>,
    pub maximum: Option<f64>,
    pub minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    // string validators
    pub max_length: Option<i64>,
    pub min_length: Option<i64>,
    pub pattern: String,
    pub enum_values: Vec<String>,

    pub title: String,
    pub const_value: Option<ConstValue>,
    pub reference: String,
}

/// Field layout of a node as written on the wire, minus extensions.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Wire<'a> {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<&'a SchemaNode>,
    #[serde(skip_serializing_if = "is_empty_map")]
    properties: &'a IndexMap<String, SchemaNode>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    required: &'a [String],
    #[serde(skip_serializing_if = "is_false")]
    additional_properties: bool,
    #[serde(skip_serializing_if = "is_empty_str")]
    description: &'a str,
    #[serde(skip_serializing_if = "is_empty_slice")]
    any_of: &'a [SchemaNode],
    #[serde(skip_serializing_if = "is_empty_slice")]
    one_of: &'a [SchemaNode],
    #[serde(skip_serializing_if = "is_empty_map")]
    dependencies: &'a IndexMap<String, SchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<&'a DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_num_pref_i64")]
    multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_num_pref_i64")]
    maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_num_pref_i64")]
    minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_num_pref_i64")]
    exclusive_maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_num_pref_i64")]
    exclusive_minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_length: Option<i64>,
    #[serde(skip_serializing_if = "is_empty_str")]
    pattern: &'a str,
    #[serde(rename = "enum", skip_serializing_if = "is_empty_slice")]
    enum_values: &'a [String],
    #[serde(skip_serializing_if = "is_empty_str")]
    title: &'a str,
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    const_value: Option<&'a ConstValue>,
    #[serde(rename = "$ref", skip_serializing_if = "is_empty_str")]
    reference: &'a str,
}

impl SchemaNode {
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self { schema_type: Some(schema_type), ..Self::default() }
    }

    /// Pure pointer to a named definition.
    pub fn reference(pointer: impl Into<String>) -> Self {
        Self { reference: pointer.into(), ..Self::default() }
    }

    pub fn is_reference(&self) -> bool {
        !self.reference.is_empty()
    }

    /// The node's type, or for a nullable `anyOf [T, null]` node, `T`.
    pub fn effective_type(&self) -> Option<SchemaType> {
        self.schema_type.or_else(|| match self.any_of.as_slice() {
            [inner, null] if null.schema_type == Some(SchemaType::Null) => inner.schema_type,
            _ => None,
        })
    }

    /// Render as a JSON value, extensions merged in.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn wire(&self) -> Wire<'_> {
        Wire {
            schema_type: self.schema_type,
            format: self.format.as_deref(),
            items: self.items.as_deref(),
            properties: &self.properties,
            required: &self.required,
            additional_properties: self.additional_properties,
            description: &self.description,
            any_of: &self.any_of,
            one_of: &self.one_of,
            dependencies: &self.dependencies,
            default: self.default.as_ref(),
            multiple_of: self.multiple_of,
            maximum: self.maximum,
            minimum: self.minimum,
            exclusive_maximum: self.exclusive_maximum,
            exclusive_minimum: self.exclusive_minimum,
            max_length: self.max_length,
            min_length: self.min_length,
            pattern: &self.pattern,
            enum_values: &self.enum_values,
            title: &self.title,
            const_value: self.const_value.as_ref(),
            reference: &self.reference,
        }
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = self.wire();
        if self.extensions.is_empty() {
            return wire.serialize(serializer);
        }
        // extensions sit at the node's own level, after (and over) the keywords
        let mut raw = match serde_json::to_value(&wire).map_err(S::Error::custom)? {
            Value::Object(map) => map,
            _ => return Err(S::Error::custom("schema node did not serialize to an object")),
        };
        for (k, v) in &self.extensions {
            raw.insert(k.clone(), v.clone());
        }
        raw.serialize(serializer)
    }
}

/// A complete schema document: dialect URI, named definitions and the root
/// node flattened into the top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JsonSchema {
    #[serde(rename = "$schema", skip_serializing_if = "String::is_empty")]
    pub schema: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, SchemaNode>,
    #[serde(flatten)]
    pub root: SchemaNode,
}

impl JsonSchema {
    /// Pretty JSON with two-space indentation.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl fmt::Display for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let src = self.to_json_string().map_err(|_| fmt::Error)?;
        f.write_str(&src)
    }
}

// ------------------------------- Helpers ---------------------------------- //

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_empty_str(s: &&str) -> bool {
    s.is_empty()
}

fn is_empty_slice<T>(s: &&[T]) -> bool {
    s.is_empty()
}

fn is_empty_map(m: &&IndexMap<String, SchemaNode>) -> bool {
    m.is_empty()
}

// prefer emitting integers when exact
fn num_pref_i64<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let n = *n;
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

fn opt_num_pref_i64<S: Serializer>(n: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match n {
        Some(n) => num_pref_i64(n, serializer),
        None => serializer.serialize_none(),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_values_are_omitted() {
        let node = SchemaNode::of_type(SchemaType::String);
        assert_eq!(node.to_value().unwrap(), json!({ "type": "string" }));
        assert_eq!(SchemaNode::default().to_value().unwrap(), json!({}));
    }

    #[test]
    fn zero_validators_are_kept() {
        let node = SchemaNode {
            minimum: Some(0.0),
            min_length: Some(0),
            ..SchemaNode::of_type(SchemaType::Integer)
        };
        assert_eq!(
            node.to_value().unwrap(),
            json!({ "type": "integer", "minimum": 0, "minLength": 0 })
        );
    }

    #[test]
    fn integral_floats_serialize_as_integers() {
        let node = SchemaNode {
            maximum: Some(42.0),
            minimum: Some(1.5),
            default: Some(DefaultValue::Number(7.0)),
            const_value: Some(ConstValue::Integer(42)),
            ..SchemaNode::of_type(SchemaType::Number)
        };
        let src = serde_json::to_string(&node).unwrap();
        assert_eq!(
            src,
            r#"{"type":"number","default":7,"maximum":42,"minimum":1.5,"const":42}"#
        );
    }

    #[test]
    fn integer_form_stays_within_i64() {
        let two_63 = 2f64.powi(63);
        let node = SchemaNode {
            maximum: Some(two_63),
            minimum: Some(-two_63),
            ..SchemaNode::of_type(SchemaType::Number)
        };
        let value = node.to_value().unwrap();
        assert_eq!(value["maximum"].as_i64(), None);
        assert_eq!(value["maximum"].as_f64(), Some(two_63));
        assert_eq!(value["minimum"].as_i64(), Some(i64::MIN));
    }

    #[test]
    fn keyword_names_on_the_wire() {
        let node = SchemaNode {
            additional_properties: true,
            exclusive_minimum: Some(-10.0),
            exclusive_maximum: Some(0.5),
            enum_values: vec!["a".into(), "b".into()],
            reference: "#/definitions/x".into(),
            ..SchemaNode::default()
        };
        assert_eq!(
            node.to_value().unwrap(),
            json!({
                "additionalProperties": true,
                "exclusiveMaximum": 0.5,
                "exclusiveMinimum": -10,
                "enum": ["a", "b"],
                "$ref": "#/definitions/x"
            })
        );
    }

    #[test]
    fn extensions_merge_at_node_level_and_override() {
        let mut node = SchemaNode::of_type(SchemaType::String);
        node.enum_values = vec!["a".into()];
        node.extensions.insert("enumNames".into(), json!(["A"]));
        node.extensions.insert("type".into(), json!("number"));
        assert_eq!(
            node.to_value().unwrap(),
            json!({ "type": "number", "enum": ["a"], "enumNames": ["A"] })
        );
    }

    #[test]
    fn document_flattens_root_after_definitions() {
        let mut doc = JsonSchema {
            schema: DEFAULT_SCHEMA.into(),
            root: SchemaNode::of_type(SchemaType::Boolean),
            ..JsonSchema::default()
        };
        assert_eq!(
            doc.to_json_string().unwrap(),
            "{\n  \"$schema\": \"http://json-schema.org/schema#\",\n  \"type\": \"boolean\"\n}"
        );

        doc.definitions.insert("flag".into(), SchemaNode::of_type(SchemaType::Boolean));
        let keys: Vec<String> = match doc.to_value().unwrap() {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => unreachable!(),
        };
        assert_eq!(keys, ["$schema", "definitions", "type"]);
    }

    #[test]
    fn effective_type_sees_through_nullable() {
        let node = SchemaNode {
            any_of: vec![
                SchemaNode::of_type(SchemaType::Integer),
                SchemaNode::of_type(SchemaType::Null),
            ],
            ..SchemaNode::default()
        };
        assert_eq!(node.effective_type(), Some(SchemaType::Integer));
        assert_eq!(SchemaNode::default().effective_type(), None);
    }
}
