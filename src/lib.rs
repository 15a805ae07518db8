//! JSON Schema from type descriptions.
//!
//! Types describe their shape through [`Describe`] (or a hand-built
//! [`TypeDesc`]); a [`Generator`] walks those descriptions and assembles a
//! [`JsonSchema`] document, emitting registered composites once under
//! `definitions` and pointing at them with `$ref` elsewhere.
//!
//! ```
//! use json_typeschema::{Describe, Generator, StructDesc, TypeDesc};
//!
//! struct Message;
//!
//! impl Describe for Message {
//!     fn describe() -> TypeDesc {
//!         StructDesc::of::<Self>()
//!             .field::<String>("Data", r#"json:"data" required:"true""#)
//!             .field::<String>("Note", r#"json:"note,omitempty""#)
//!             .into()
//!     }
//! }
//!
//! let schema = Generator::new().with_root::<Message>().generate().unwrap();
//! assert_eq!(schema.root.required, ["data"]);
//! ```
pub mod desc;
pub mod error;
pub mod extract;
pub mod generator;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod walker;

pub use desc::{Describe, FieldDesc, StructDesc, Tags, TypeDesc};
pub use error::SchemaError;
pub use generator::{generate_schema_string, Generator, Options};
pub use loader::Descriptor;
pub use registry::DefinitionRegistry;
pub use schema::{ConstValue, DefaultValue, JsonSchema, SchemaNode, SchemaType, DEFAULT_SCHEMA};
