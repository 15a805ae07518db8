//! Type description IR.
//!
//! Rust has no runtime reflection, so every type that wants a schema describes
//! itself as a [`TypeDesc`] tree, either through the [`Describe`] trait or by
//! building a [`StructDesc`] by hand (or from a descriptor document, see
//! `crate::loader`). The walker only ever sees this IR.
//!
//! Descriptions are built eagerly. A struct that contains itself (directly or
//! through other structs) recurses without bound when described; cycle
//! detection is not part of the engine.
pub mod describe;
pub mod tags;

use std::borrow::Cow;

use crate::schema::SchemaType;

pub use describe::Describe;
pub use tags::{JsonOptions, Tags};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    ISize,
    U8,
    U16,
    U32,
    U64,
    USize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F32,
    F64,
}

/// Shape of a type as far as schema generation is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDesc {
    Bool,
    Integer(IntWidth),
    Number(FloatWidth),
    String,
    /// Timestamp; rendered as an RFC 3339 `date-time` string.
    DateTime,
    /// Fully dynamic value (anything goes).
    Any,
    /// Nullable wrapper (`Option<T>`).
    Optional(Box<TypeDesc>),
    /// Non-nullable indirection (`Box<T>`, `Arc<T>`, `&T`).
    Pointer(Box<TypeDesc>),
    Seq(Box<TypeDesc>),
    /// String-keyed map; the payload is the value type.
    Map(Box<TypeDesc>),
    Struct(StructDesc),
}

/// A composite type: identity key plus fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDesc {
    /// Stable identity used for definition lookup.
    pub key: Cow<'static, str>,
    pub fields: Vec<FieldDesc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDesc {
    /// The field's own identifier; used as the property name when the `json`
    /// tag does not rename it.
    pub ident: String,
    pub ty: TypeDesc,
    /// Hidden fields emit no property; their tags decorate the enclosing object.
    pub visible: bool,
    pub tags: Tags,
}

impl TypeDesc {
    /// Fixed kind table: JSON type plus optional format. Wrappers and `Any`
    /// have no direct mapping.
    pub fn kind_mapping(&self) -> Option<(SchemaType, Option<&'static str>)> {
        match self {
            TypeDesc::Bool => Some((SchemaType::Boolean, None)),
            TypeDesc::Integer(_) => Some((SchemaType::Integer, None)),
            TypeDesc::Number(_) => Some((SchemaType::Number, None)),
            TypeDesc::String => Some((SchemaType::String, None)),
            TypeDesc::DateTime => Some((SchemaType::String, Some("date-time"))),
            TypeDesc::Seq(_) => Some((SchemaType::Array, None)),
            TypeDesc::Map(_) | TypeDesc::Struct(_) => Some((SchemaType::Object, None)),
            TypeDesc::Any | TypeDesc::Optional(_) | TypeDesc::Pointer(_) => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeDesc::Bool
                | TypeDesc::Integer(_)
                | TypeDesc::Number(_)
                | TypeDesc::String
                | TypeDesc::DateTime
        )
    }

    pub fn is_byte(&self) -> bool {
        matches!(self, TypeDesc::Integer(IntWidth::U8))
    }

    /// Peel off `Optional`/`Pointer` layers.
    pub fn unwrapped(&self) -> &TypeDesc {
        match self {
            TypeDesc::Optional(inner) | TypeDesc::Pointer(inner) => inner.unwrapped(),
            other => other,
        }
    }

    /// Identity key of the underlying struct, if any.
    pub fn struct_key(&self) -> Option<&str> {
        match self.unwrapped() {
            TypeDesc::Struct(s) => Some(&s.key),
            _ => None,
        }
    }

    /// Short human-readable name, used in error messages.
    pub fn display_name(&self) -> String {
        match self {
            TypeDesc::Bool => "bool".into(),
            TypeDesc::Integer(w) => format!("{w:?}").to_lowercase(),
            TypeDesc::Number(w) => format!("{w:?}").to_lowercase(),
            TypeDesc::String => "string".into(),
            TypeDesc::DateTime => "datetime".into(),
            TypeDesc::Any => "any".into(),
            TypeDesc::Optional(inner) => format!("Option<{}>", inner.display_name()),
            TypeDesc::Pointer(inner) => format!("Box<{}>", inner.display_name()),
            TypeDesc::Seq(inner) => format!("Vec<{}>", inner.display_name()),
            TypeDesc::Map(inner) => format!("Map<{}>", inner.display_name()),
            TypeDesc::Struct(s) => s.key.to_string(),
        }
    }
}

impl StructDesc {
    /// Struct keyed by the Rust type name of `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    pub fn named(key: impl Into<Cow<'static, str>>) -> Self {
        Self { key: key.into(), fields: Vec::new() }
    }

    /// Visible field whose type is described by `T`.
    pub fn field<T: Describe + ?Sized>(self, ident: &str, tags: &str) -> Self {
        self.field_desc(ident, T::describe(), Tags::parse(tags))
    }

    pub fn field_desc(mut self, ident: &str, ty: TypeDesc, tags: Tags) -> Self {
        self.fields.push(FieldDesc { ident: ident.to_string(), ty, visible: true, tags });
        self
    }

    /// Metadata-only field: never a property, its title/description/extensions
    /// are applied to the struct itself.
    pub fn hidden(mut self, ident: &str, tags: &str) -> Self {
        self.fields.push(FieldDesc {
            ident: ident.to_string(),
            ty: TypeDesc::Any,
            visible: false,
            tags: Tags::parse(tags),
        });
        self
    }
}

impl From<StructDesc> for TypeDesc {
    fn from(s: StructDesc) -> Self {
        TypeDesc::Struct(s)
    }
}

// ------------------------------- Tests ------------------------------------ //
