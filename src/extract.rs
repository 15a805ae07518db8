//! Annotation extraction: turns a field's tags into schema keywords on the
//! node built for that field.
//!
//! Recognized keys:
//! - all types: `description`, `title`, `default`, `extensions`
//! - strings: `minLength`, `maxLength`, `pattern`, `enum` (`a|b|c`), `const`
//! - numbers and integers: `multipleOf`, `min`, `max`, `exclusiveMin`,
//!   `exclusiveMax`, `const`
//!
//! Validator literals that do not parse are dropped with a warning rather than
//! failing the whole schema. Defaults and extensions are strict.
use std::str::FromStr;

use serde_json::Value;

use crate::desc::Tags;
use crate::error::SchemaError;
use crate::schema::{ConstValue, DefaultValue, SchemaNode, SchemaType};

/// Apply every annotation in `tags` to `node`. `property` names the field in
/// error messages.
pub fn apply_annotations(node: &mut SchemaNode, tags: &Tags, property: &str) -> Result<(), SchemaError> {
    apply_text(node, tags, "description", "title");
    add_validators(node, tags, property);
    if let Some(literal) = tags.lookup("default") {
        node.default = Some(coerce_default(node.effective_type(), literal, property)?);
    }
    apply_extensions(node, tags)
}

/// Annotations carried by a hidden field describe the enclosing object: only
/// title, description and extensions apply. `schema-title` and
/// `schema-description` are accepted as aliases.
pub fn apply_object_metadata(node: &mut SchemaNode, tags: &Tags) -> Result<(), SchemaError> {
    apply_text(node, tags, "schema-description", "schema-title");
    apply_text(node, tags, "description", "title");
    apply_extensions(node, tags)
}

fn apply_text(node: &mut SchemaNode, tags: &Tags, description_key: &str, title_key: &str) {
    if let Some(description) = tags.lookup(description_key) {
        node.description = description.to_string();
    }
    if let Some(title) = tags.lookup(title_key) {
        node.title = title.to_string();
    }
}

/// Coerce a `default` literal to the node's type.
pub fn coerce_default(
    ty: Option<SchemaType>,
    literal: &str,
    property: &str,
) -> Result<DefaultValue, SchemaError> {
    match ty {
        Some(SchemaType::String) => Ok(DefaultValue::String(literal.to_string())),
        Some(SchemaType::Number | SchemaType::Integer) => literal
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(DefaultValue::Number)
            .ok_or_else(|| SchemaError::DefaultParse {
                literal: literal.to_string(),
                target: "float64",
                property: property.to_string(),
            }),
        Some(SchemaType::Boolean) => parse_bool(literal)
            .map(DefaultValue::Boolean)
            .ok_or_else(|| SchemaError::DefaultParse {
                literal: literal.to_string(),
                target: "bool",
                property: property.to_string(),
            }),
        other => Err(SchemaError::UnsupportedDefaultType {
            ty: other.map(SchemaType::as_str).unwrap_or_default().to_string(),
            property: property.to_string(),
        }),
    }
}

fn apply_extensions(node: &mut SchemaNode, tags: &Tags) -> Result<(), SchemaError> {
    let Some(raw) = tags.lookup("extensions") else {
        return Ok(());
    };
    let parsed = serde_json::from_str::<Value>(raw).map_err(|source| SchemaError::ExtensionsParse {
        raw: raw.to_string(),
        source,
    })?;
    match parsed {
        Value::Object(map) => {
            node.extensions = map;
            Ok(())
        }
        _ => Err(SchemaError::ExtensionsNotObject { raw: raw.to_string() }),
    }
}

fn add_validators(node: &mut SchemaNode, tags: &Tags, property: &str) {
    match node.effective_type() {
        Some(SchemaType::String) => add_string_validators(node, tags, property),
        Some(ty @ (SchemaType::Number | SchemaType::Integer)) => add_number_validators(node, tags, ty, property),
        _ => {}
    }
}

fn add_string_validators(node: &mut SchemaNode, tags: &Tags, property: &str) {
    node.min_length = lenient(tags, "minLength", property).or(node.min_length);
    node.max_length = lenient(tags, "maxLength", property).or(node.max_length);
    let pattern = tags.get("pattern");
    if !pattern.is_empty() {
        node.pattern = pattern.to_string();
    }
    let enum_ = tags.get("enum");
    if !enum_.is_empty() {
        node.enum_values = enum_.split('|').map(str::to_string).collect();
    }
    let const_ = tags.get("const");
    if !const_.is_empty() {
        node.const_value = Some(ConstValue::String(const_.to_string()));
    }
}

fn add_number_validators(node: &mut SchemaNode, tags: &Tags, ty: SchemaType, property: &str) {
    node.multiple_of = lenient_finite(tags, "multipleOf", property).or(node.multiple_of);
    node.minimum = lenient_finite(tags, "min", property).or(node.minimum);
    node.maximum = lenient_finite(tags, "max", property).or(node.maximum);
    node.exclusive_minimum = lenient_finite(tags, "exclusiveMin", property).or(node.exclusive_minimum);
    node.exclusive_maximum = lenient_finite(tags, "exclusiveMax", property).or(node.exclusive_maximum);
    let const_ = if ty == SchemaType::Number {
        lenient_finite(tags, "const", property).map(ConstValue::Number)
    } else {
        lenient::<i64>(tags, "const", property).map(ConstValue::Integer)
    };
    if const_.is_some() {
        node.const_value = const_;
    }
}

/// Parse an optional validator literal; a literal that does not parse counts
/// as absent.
fn lenient<T: FromStr>(tags: &Tags, key: &str, property: &str) -> Option<T> {
    let literal = tags.lookup(key).filter(|s| !s.is_empty())?;
    match literal.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {key}:{literal:?} on property {property}: not a valid {}", std::any::type_name::<T>());
            None
        }
    }
}

/// [`lenient`] for floats; NaN and the infinities have no JSON form.
fn lenient_finite(tags: &Tags, key: &str, property: &str) -> Option<f64> {
    let n = lenient::<f64>(tags, key, property)?;
    if n.is_finite() {
        Some(n)
    } else {
        log::warn!("ignoring {key}:{n} on property {property}: not a finite number");
        None
    }
}

/// Boolean literals in the conventional spellings: 1/0, t/f, true/false in
/// lower, upper or title case.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

// ------------------------------- Tests ------------------------------------ //
