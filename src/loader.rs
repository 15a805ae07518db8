//! Descriptor documents: type descriptions as data, for callers (such as the
//! CLI) that cannot implement [`crate::desc::Describe`].
//!
//! ```json
//! {
//!   "types": {
//!     "Item":  { "fields": [ { "name": "Foo", "type": "string", "tags": "required:\"true\"" } ] },
//!     "Order": { "fields": [ { "name": "Items", "type": "Vec<Item>" } ] }
//!   },
//!   "root": "Order",
//!   "definitions": { "item": "Item" }
//! }
//! ```
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::desc::{FieldDesc, FloatWidth, IntWidth, StructDesc, Tags, TypeDesc};
use crate::error::SchemaError;
use crate::generator::{Generator, Options};

static WRAPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(Option|Box|Vec|Map)\s*<\s*(.+?)\s*>\s*$").expect("wrapper pattern is valid")
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    #[serde(default)]
    pub types: IndexMap<String, TypeDecl>,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub definitions: IndexMap<String, String>,
    #[serde(default)]
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type", default = "any_type")]
    pub ty: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub hidden: bool,
}

fn any_type() -> String {
    "any".to_string()
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

impl Descriptor {
    pub fn from_json(src: &str) -> Result<Self, SchemaError> {
        from_str_with_path(src).map_err(SchemaError::Descriptor)
    }

    /// Fold `other` into `self`; later documents win on name clashes.
    pub fn merge(&mut self, other: Descriptor) {
        self.types.extend(other.types);
        self.definitions.extend(other.definitions);
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.schema.is_some() {
            self.schema = other.schema;
        }
    }

    /// Resolve a type expression against the declared types.
    pub fn resolve(&self, expr: &str) -> Result<TypeDesc, SchemaError> {
        self.resolver().resolve(expr)
    }

    /// Resolve everything and configure a generator. `root` overrides the
    /// document's own root expression.
    pub fn generator(&self, root: Option<&str>) -> Result<Generator, SchemaError> {
        let mut resolver = self.resolver();
        let mut generator = Generator::new().with_options(Options {
            schema: self.schema.clone().unwrap_or_default(),
        });
        for (name, expr) in &self.definitions {
            generator = generator.with_definition_desc(name.clone(), resolver.resolve(expr)?);
        }
        if let Some(root) = root.or(self.root.as_deref()) {
            generator = generator.with_root_desc(resolver.resolve(root)?);
        }
        Ok(generator)
    }

    /// Resolve every declared type once; reports the first broken declaration.
    pub fn check(&self) -> Result<usize, SchemaError> {
        let mut resolver = self.resolver();
        for name in self.types.keys() {
            resolver.resolve(name)?;
        }
        for expr in self.definitions.values().chain(self.root.iter()) {
            resolver.resolve(expr)?;
        }
        Ok(self.types.len())
    }

    fn resolver(&self) -> Resolver<'_> {
        let registered = self
            .definitions
            .values()
            .filter_map(|expr| definition_target(expr))
            .filter(|name| self.types.contains_key(*name))
            .map(str::to_string)
            .collect();
        Resolver::new(&self.types, registered)
    }
}

/// The declared type a definition expression registers, seen through
/// `Option`/`Box` the same way the registry keys definitions.
fn definition_target(expr: &str) -> Option<&str> {
    let mut expr = expr.trim();
    while let Some(caps) = WRAPPER.captures(expr) {
        match caps.get(1).map(|m| m.as_str()) {
            Some("Option" | "Box") => expr = caps.get(2)?.as_str(),
            _ => return None,
        }
    }
    primitive(expr).is_none().then_some(expr)
}

/// Turns type expressions into `TypeDesc` trees, memoizing declared types.
/// A declaration that contains itself is only accepted when the cycle passes
/// through a registered definition; the inner occurrence then resolves to a
/// field-less placeholder carrying the same key, which the walker emits as a
/// `$ref`.
struct Resolver<'a> {
    types: &'a IndexMap<String, TypeDecl>,
    registered: HashSet<String>,
    resolved: HashMap<String, TypeDesc>,
    stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn new(types: &'a IndexMap<String, TypeDecl>, registered: HashSet<String>) -> Self {
        Self { types, registered, resolved: HashMap::new(), stack: Vec::new() }
    }

    fn resolve(&mut self, expr: &str) -> Result<TypeDesc, SchemaError> {
        let expr = expr.trim();
        if let Some(caps) = WRAPPER.captures(expr) {
            let inner = Box::new(self.resolve(&caps[2])?);
            return Ok(match &caps[1] {
                "Option" => TypeDesc::Optional(inner),
                "Box" => TypeDesc::Pointer(inner),
                "Vec" => TypeDesc::Seq(inner),
                _ => TypeDesc::Map(inner),
            });
        }
        if let Some(primitive) = primitive(expr) {
            return Ok(primitive);
        }
        self.resolve_named(expr)
    }

    fn resolve_named(&mut self, name: &str) -> Result<TypeDesc, SchemaError> {
        if let Some(done) = self.resolved.get(name) {
            return Ok(done.clone());
        }
        let types = self.types;
        let Some(decl) = types.get(name) else {
            return Err(SchemaError::Descriptor(format!("unknown type {name:?}")));
        };
        if self.stack.iter().any(|s| s == name) {
            if self.registered.contains(name) {
                log::trace!("recursive reference to definition {name}");
                return Ok(TypeDesc::Struct(StructDesc::named(name.to_string())));
            }
            let mut cycle = self.stack.clone();
            cycle.push(name.to_string());
            return Err(SchemaError::Descriptor(format!("cyclic type reference: {}", cycle.join(" -> "))));
        }

        self.stack.push(name.to_string());
        let mut desc = StructDesc::named(name.to_string());
        for field in &decl.fields {
            let ty = self
                .resolve(&field.ty)
                .map_err(|e| SchemaError::Descriptor(format!("{name}.{}: {}", field.name, message_of(&e))))?;
            desc.fields.push(FieldDesc {
                ident: field.name.clone(),
                ty,
                visible: !field.hidden,
                tags: Tags::parse(&field.tags),
            });
        }
        self.stack.pop();

        let ty = TypeDesc::Struct(desc);
        log::trace!("resolved type {name}");
        self.resolved.insert(name.to_string(), ty.clone());
        Ok(ty)
    }
}

fn message_of(err: &SchemaError) -> String {
    match err {
        SchemaError::Descriptor(msg) => msg.clone(),
        other => other.to_string(),
    }
}

fn primitive(expr: &str) -> Option<TypeDesc> {
    Some(match expr {
        "bool" => TypeDesc::Bool,
        "i8" => TypeDesc::Integer(IntWidth::I8),
        "i16" => TypeDesc::Integer(IntWidth::I16),
        "i32" => TypeDesc::Integer(IntWidth::I32),
        "i64" => TypeDesc::Integer(IntWidth::I64),
        "isize" => TypeDesc::Integer(IntWidth::ISize),
        "u8" => TypeDesc::Integer(IntWidth::U8),
        "u16" => TypeDesc::Integer(IntWidth::U16),
        "u32" => TypeDesc::Integer(IntWidth::U32),
        "u64" => TypeDesc::Integer(IntWidth::U64),
        "usize" => TypeDesc::Integer(IntWidth::USize),
        "f32" => TypeDesc::Number(FloatWidth::F32),
        "f64" => TypeDesc::Number(FloatWidth::F64),
        "string" | "String" => TypeDesc::String,
        "datetime" => TypeDesc::DateTime,
        "bytes" => TypeDesc::Seq(Box::new(TypeDesc::Integer(IntWidth::U8))),
        "any" => TypeDesc::Any,
        _ => return None,
    })
}

// ------------------------------- Tests ------------------------------------ //
