//! Type walker: the recursive core that maps a [`TypeDesc`] onto a
//! [`SchemaNode`] tree.
//!
//! - primitives map through the fixed kind table
//! - `Option<primitive>` becomes `anyOf [T, null]`; `Option<composite>` is transparent
//! - byte sequences are strings, other sequences carry `items`
//! - maps use the `".*"` property convention, or `additionalProperties` for dynamic values
//! - structs become objects, or a `$ref` when registered as a definition
//!
//! Self-referential descriptions recurse without bound (stack overflow); the
//! walker does not detect cycles.
use crate::desc::{StructDesc, TypeDesc};
use crate::error::SchemaError;
use crate::extract;
use crate::registry::DefinitionRegistry;
use crate::schema::{SchemaNode, SchemaType};

/// Convert `ty` into a schema node. With `is_definition_root`, a registered
/// struct at the top is expanded inline instead of becoming a `$ref`.
pub fn build(ty: &TypeDesc, registry: &DefinitionRegistry, is_definition_root: bool) -> Result<SchemaNode, SchemaError> {
    Walker::new(registry).read(ty, is_definition_root)
}

pub struct Walker<'r> {
    registry: &'r DefinitionRegistry,
}

impl<'r> Walker<'r> {
    pub fn new(registry: &'r DefinitionRegistry) -> Self {
        Self { registry }
    }

    pub fn read(&self, ty: &TypeDesc, is_definition_root: bool) -> Result<SchemaNode, SchemaError> {
        let mut node = SchemaNode::default();
        if let Some((schema_type, format)) = ty.kind_mapping() {
            node.schema_type = Some(schema_type);
            node.format = format.map(str::to_string);
        }

        match ty {
            TypeDesc::Seq(elem) => self.read_seq(&mut node, elem)?,
            TypeDesc::Map(value) => read_map(&mut node, value),
            TypeDesc::Struct(desc) => self.read_struct(&mut node, desc, is_definition_root)?,
            TypeDesc::Pointer(inner) => node = self.read(inner, is_definition_root)?,
            TypeDesc::Optional(inner) => {
                node = self.read(inner, is_definition_root)?;
                if strip_pointers(inner).is_primitive() {
                    node = nullable(node);
                }
            }
            _ => {}
        }

        Ok(node)
    }

    fn read_seq(&self, node: &mut SchemaNode, elem: &TypeDesc) -> Result<(), SchemaError> {
        if elem.is_byte() {
            node.schema_type = Some(SchemaType::String);
        } else if elem.kind_mapping().is_some() || matches!(elem, TypeDesc::Optional(_) | TypeDesc::Pointer(_)) {
            node.items = Some(Box::new(self.read(elem, false)?));
        }
        Ok(())
    }

    fn read_struct(&self, node: &mut SchemaNode, desc: &StructDesc, is_definition_root: bool) -> Result<(), SchemaError> {
        if !is_definition_root {
            if let Some(pointer) = self.registry.reference(&desc.key) {
                log::trace!("{} -> {pointer}", desc.key);
                *node = SchemaNode::reference(pointer);
                return Ok(());
            }
        }

        log::trace!("expanding {} ({} fields)", desc.key, desc.fields.len());
        node.schema_type = Some(SchemaType::Object);
        node.additional_properties = false;

        for field in &desc.fields {
            let (name, opts) = field.tags.json();

            if !field.visible {
                extract::apply_object_metadata(node, &field.tags).map_err(|e| e.in_field(&field.ident))?;
                continue;
            }

            let name = if name.is_empty() { field.ident.as_str() } else { name };
            if name == "-" {
                continue;
            }

            let mut child = self.read(&field.ty, false).map_err(|e| e.in_field(&field.ident))?;
            if child.is_reference() {
                // reference nodes stay pure pointers, but their annotations must still be well formed
                if !field.tags.is_empty() {
                    let mut scratch = SchemaNode::of_type(SchemaType::Object);
                    extract::apply_annotations(&mut scratch, &field.tags, name).map_err(|e| e.in_field(&field.ident))?;
                    log::debug!("{}.{}: annotations not applied to $ref", desc.key, field.ident);
                }
            } else {
                extract::apply_annotations(&mut child, &field.tags, name).map_err(|e| e.in_field(&field.ident))?;
            }
            node.properties.insert(name.to_string(), child);

            if field.tags.lookup("required").is_some()
                && !opts.contains("omitempty")
                && !node.required.iter().any(|r| r == name)
            {
                node.required.push(name.to_string());
            }
        }

        Ok(())
    }
}

fn read_map(node: &mut SchemaNode, value: &TypeDesc) {
    match value.kind_mapping() {
        Some((schema_type, format)) => {
            let pattern = SchemaNode {
                format: format.map(str::to_string),
                ..SchemaNode::of_type(schema_type)
            };
            node.properties.insert(".*".to_string(), pattern);
        }
        None => node.additional_properties = true,
    }
}

/// `T` becomes `anyOf [T, null]`; type and format move into the first arm.
fn nullable(inner: SchemaNode) -> SchemaNode {
    let arm = SchemaNode {
        schema_type: inner.schema_type,
        format: inner.format,
        ..SchemaNode::default()
    };
    SchemaNode {
        any_of: vec![arm, SchemaNode::of_type(SchemaType::Null)],
        ..SchemaNode::default()
    }
}

fn strip_pointers(ty: &TypeDesc) -> &TypeDesc {
    match ty {
        TypeDesc::Pointer(inner) => strip_pointers(inner),
        other => other,
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::{Describe, FloatWidth, IntWidth};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn schema_of(ty: &TypeDesc) -> Value {
        build(ty, &DefinitionRegistry::new(), false).unwrap().to_value().unwrap()
    }

    #[test]
    fn primitives_map_to_type_and_format() {
        let table = [
            (TypeDesc::Bool, json!({ "type": "boolean" })),
            (TypeDesc::Integer(IntWidth::I8), json!({ "type": "integer" })),
            (TypeDesc::Integer(IntWidth::U64), json!({ "type": "integer" })),
            (TypeDesc::Integer(IntWidth::USize), json!({ "type": "integer" })),
            (TypeDesc::Number(FloatWidth::F32), json!({ "type": "number" })),
            (TypeDesc::Number(FloatWidth::F64), json!({ "type": "number" })),
            (TypeDesc::String, json!({ "type": "string" })),
            (TypeDesc::DateTime, json!({ "type": "string", "format": "date-time" })),
            (TypeDesc::Any, json!({})),
        ];
        for (ty, expected) in table {
            assert_eq!(schema_of(&ty), expected, "{}", ty.display_name());
        }
    }

    #[test]
    fn optional_primitive_is_nullable() {
        assert_eq!(
            schema_of(&Option::<String>::describe()),
            json!({ "anyOf": [{ "type": "string" }, { "type": "null" }] })
        );
        assert_eq!(
            schema_of(&Option::<i32>::describe()),
            json!({ "anyOf": [{ "type": "integer" }, { "type": "null" }] })
        );
        assert_eq!(
            schema_of(&Option::<chrono::DateTime<chrono::Utc>>::describe()),
            json!({ "anyOf": [{ "type": "string", "format": "date-time" }, { "type": "null" }] })
        );
        assert_eq!(
            schema_of(&Option::<Box<bool>>::describe()),
            json!({ "anyOf": [{ "type": "boolean" }, { "type": "null" }] })
        );
    }

    #[test]
    fn pointers_are_transparent() {
        assert_eq!(schema_of(&Box::<u32>::describe()), json!({ "type": "integer" }));
        assert_eq!(schema_of(&Option::<serde_json::Value>::describe()), json!({}));
    }

    #[test]
    fn optional_composite_is_not_nullable() {
        let item: TypeDesc = StructDesc::named("Item").field::<String>("Foo", r#"required:"true""#).into();
        let expected = json!({
            "type": "object",
            "properties": { "Foo": { "type": "string" } },
            "required": ["Foo"]
        });
        assert_eq!(schema_of(&item), expected);
        assert_eq!(schema_of(&TypeDesc::Optional(Box::new(item))), expected);
    }

    #[test]
    fn bytes_are_strings() {
        assert_eq!(schema_of(&Vec::<u8>::describe()), json!({ "type": "string" }));
        assert_eq!(
            schema_of(&Vec::<u16>::describe()),
            json!({ "type": "array", "items": { "type": "integer" } })
        );
    }

    #[test]
    fn sequences() {
        assert_eq!(
            schema_of(&Vec::<String>::describe()),
            json!({ "type": "array", "items": { "type": "string" } })
        );
        assert_eq!(schema_of(&Vec::<serde_json::Value>::describe()), json!({ "type": "array" }));
        assert_eq!(
            schema_of(&Vec::<Option<f64>>::describe()),
            json!({ "type": "array", "items": { "anyOf": [{ "type": "number" }, { "type": "null" }] } })
        );
        assert_eq!(
            schema_of(&Vec::<Vec<bool>>::describe()),
            json!({ "type": "array", "items": { "type": "array", "items": { "type": "boolean" } } })
        );
    }

    #[test]
    fn maps() {
        assert_eq!(
            schema_of(&HashMap::<String, String>::describe()),
            json!({ "type": "object", "properties": { ".*": { "type": "string" } } })
        );
        assert_eq!(
            schema_of(&HashMap::<String, chrono::NaiveDateTime>::describe()),
            json!({ "type": "object", "properties": { ".*": { "type": "string", "format": "date-time" } } })
        );
        assert_eq!(
            schema_of(&HashMap::<String, serde_json::Value>::describe()),
            json!({ "type": "object", "additionalProperties": true })
        );
        assert_eq!(
            schema_of(&serde_json::Map::<String, serde_json::Value>::describe()),
            json!({ "type": "object", "additionalProperties": true })
        );
    }

    #[test]
    fn field_names_skips_and_requiredness() {
        let ty: TypeDesc = StructDesc::named("Fields")
            .field::<String>("Omitted", r#"json:"-,omitempty" required:"true""#)
            .field::<bool>("Flag", r#"json:",omitempty""#)
            .field::<i64>("Count", r#"json:"count" required:"true""#)
            .field::<i64>("Maybe", r#"json:"maybe,omitempty" required:"true""#)
            .field::<serde_json::Value>("Interface", r#"required:"true""#)
            .into();
        assert_eq!(
            schema_of(&ty),
            json!({
                "type": "object",
                "properties": {
                    "Flag": { "type": "boolean" },
                    "count": { "type": "integer" },
                    "maybe": { "type": "integer" },
                    "Interface": {}
                },
                "required": ["count", "Interface"]
            })
        );
    }

    #[test]
    fn properties_keep_declaration_order() {
        let ty: TypeDesc = StructDesc::named("Ordered")
            .field::<String>("Zulu", "")
            .field::<String>("Alpha", "")
            .field::<String>("Mike", "")
            .into();
        let node = build(&ty, &DefinitionRegistry::new(), false).unwrap();
        let keys: Vec<&str> = node.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Zulu", "Alpha", "Mike"]);
    }

    #[test]
    fn hidden_field_decorates_object() {
        let ty: TypeDesc = StructDesc::named("Tagged")
            .hidden("meta", r#"json:"-" schema-title:"Title" schema-description:"Description text." extensions:"{\"x-layout\": \"grid\"}""#)
            .field::<bool>("Bool", r#"json:"test" title:"BoolField""#)
            .into();
        assert_eq!(
            schema_of(&ty),
            json!({
                "type": "object",
                "title": "Title",
                "description": "Description text.",
                "properties": { "test": { "type": "boolean", "title": "BoolField" } },
                "x-layout": "grid"
            })
        );
    }

    #[test]
    fn registered_struct_becomes_reference() {
        let child: TypeDesc = StructDesc::named("Child").field::<String>("Foo", r#"required:"true""#).into();
        let parent: TypeDesc = StructDesc::named("Parent")
            .field_desc("Child", child.clone(), crate::desc::Tags::parse(r#"description:"ignored""#))
            .field_desc("Children", TypeDesc::Seq(Box::new(child.clone())), Default::default())
            .into();
        let registry = DefinitionRegistry::from_definitions([("child", &child)]);

        let node = build(&parent, &registry, false).unwrap().to_value().unwrap();
        assert_eq!(
            node,
            json!({
                "type": "object",
                "properties": {
                    "Child": { "$ref": "#/definitions/child" },
                    "Children": { "type": "array", "items": { "$ref": "#/definitions/child" } }
                }
            })
        );

        // top-level reference unless generating the definition body itself
        assert_eq!(
            build(&child, &registry, false).unwrap().to_value().unwrap(),
            json!({ "$ref": "#/definitions/child" })
        );
        assert_eq!(
            build(&child, &registry, true).unwrap().to_value().unwrap(),
            json!({
                "type": "object",
                "properties": { "Foo": { "type": "string" } },
                "required": ["Foo"]
            })
        );
    }

    #[test]
    fn optional_registered_struct_is_a_pure_reference() {
        let child: TypeDesc = StructDesc::named("Child").field::<String>("Foo", "").into();
        let parent: TypeDesc = StructDesc::named("Parent")
            .field_desc(
                "Child",
                TypeDesc::Optional(Box::new(TypeDesc::Pointer(Box::new(child.clone())))),
                crate::desc::Tags::parse(r#"json:"child,omitempty" title:"ignored""#),
            )
            .into();
        let registry = DefinitionRegistry::from_definitions([("child", &child)]);
        let node = build(&parent, &registry, false).unwrap();
        assert_eq!(node.properties["child"], SchemaNode::reference("#/definitions/child"));
        assert_eq!(
            node.to_value().unwrap(),
            json!({ "type": "object", "properties": { "child": { "$ref": "#/definitions/child" } } })
        );
    }

    #[test]
    fn reference_fields_still_validate_annotations() {
        let child: TypeDesc = StructDesc::named("Child").field::<String>("Foo", "").into();
        let registry = DefinitionRegistry::from_definitions([("child", &child)]);
        let parent_with = |tags: &str| -> TypeDesc {
            StructDesc::named("Parent")
                .field_desc("Child", child.clone(), crate::desc::Tags::parse(tags))
                .into()
        };

        let err = build(&parent_with(r#"extensions:"{not json""#), &registry, false).unwrap_err();
        assert_eq!(err.field_path(), ["Child"]);
        assert!(matches!(err.root_cause(), SchemaError::ExtensionsParse { .. }));

        let err = build(&parent_with(r#"default:"x""#), &registry, false).unwrap_err();
        assert!(matches!(err.root_cause(), SchemaError::UnsupportedDefaultType { ty, .. } if ty == "object"));

        // same outcome when the child is inlined
        let err = build(&parent_with(r#"default:"x""#), &DefinitionRegistry::new(), false).unwrap_err();
        assert!(matches!(err.root_cause(), SchemaError::UnsupportedDefaultType { .. }));

        // well-formed annotations are accepted and left off the pointer
        let node = build(&parent_with(r#"description:"d" extensions:"{\"x\": 1}""#), &registry, false).unwrap();
        assert_eq!(node.properties["Child"], SchemaNode::reference("#/definitions/child"));
    }

    #[test]
    fn required_names_are_unique() {
        let ty: TypeDesc = StructDesc::named("Clash")
            .field::<String>("First", r#"json:"x" required:"true""#)
            .field::<i64>("Second", r#"json:"x" required:"true""#)
            .into();
        let node = build(&ty, &DefinitionRegistry::new(), false).unwrap();
        assert_eq!(node.required, ["x"]);
        assert_eq!(node.properties.len(), 1);
        assert_eq!(node.properties["x"].schema_type, Some(SchemaType::Integer));
    }

    #[test]
    fn definition_root_only_applies_at_the_top() {
        let node: TypeDesc = StructDesc::named("Node")
            .field::<String>("Name", "")
            .field_desc("Next", TypeDesc::Struct(StructDesc::named("Node")), Default::default())
            .into();
        let registry = DefinitionRegistry::from_definitions([("node", &node)]);
        let built = build(&node, &registry, true).unwrap();
        assert_eq!(built.schema_type, Some(SchemaType::Object));
        assert_eq!(built.properties["Next"], SchemaNode::reference("#/definitions/node"));
    }

    #[test]
    fn annotations_apply_to_nested_fields() {
        let ty: TypeDesc = StructDesc::named("Annotated")
            .field::<f32>("Float", r#"json:"float" min:"1.5" max:"42""#)
            .field::<i64>("Int", r#"json:"int" exclusiveMin:"-10" exclusiveMax:"0""#)
            .field::<i32>("AnswerToLife", r#"json:"answer" const:"42""#)
            .field::<String>("Fruit", r#"json:"fruit" enum:"apple|banana|pear""#)
            .field::<Option<u8>>("Level", r#"json:"level,omitempty" max:"9" default:"3""#)
            .into();
        assert_eq!(
            schema_of(&ty),
            json!({
                "type": "object",
                "properties": {
                    "float": { "type": "number", "minimum": 1.5, "maximum": 42 },
                    "int": { "type": "integer", "exclusiveMinimum": -10, "exclusiveMaximum": 0 },
                    "answer": { "type": "integer", "const": 42 },
                    "fruit": { "type": "string", "enum": ["apple", "banana", "pear"] },
                    "level": {
                        "anyOf": [{ "type": "integer" }, { "type": "null" }],
                        "maximum": 9,
                        "default": 3
                    }
                }
            })
        );
    }

    #[test]
    fn field_errors_carry_the_path() {
        let inner: TypeDesc = StructDesc::named("Inner").field::<i32>("Count", r#"default:"lots""#).into();
        let outer: TypeDesc = StructDesc::named("Outer").field_desc("Inner", inner, Default::default()).into();
        let err = build(&outer, &DefinitionRegistry::new(), false).unwrap_err();
        assert_eq!(err.field_path(), ["Inner", "Count"]);
        assert!(matches!(err.root_cause(), SchemaError::DefaultParse { .. }));
    }

    #[test]
    fn default_on_struct_field_is_rejected() {
        let inner: TypeDesc = StructDesc::named("Inner").into();
        let outer: TypeDesc = StructDesc::named("Outer")
            .field_desc("Inner", inner, crate::desc::Tags::parse(r#"default:"{}""#))
            .into();
        let err = build(&outer, &DefinitionRegistry::new(), false).unwrap_err();
        assert!(matches!(err.root_cause(), SchemaError::UnsupportedDefaultType { ty, .. } if ty == "object"));
    }
}
