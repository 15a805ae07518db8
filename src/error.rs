use thiserror::Error;

/// Everything that can go wrong while turning a type description into a schema.
///
/// Failures are raised where the malformed annotation is found and then
/// wrapped on the way up: first with the field name, then with the definition
/// name or `root`.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("default not supported for type {ty:?} on property {property}")]
    UnsupportedDefaultType { ty: String, property: String },

    #[error("could not parse {literal:?} to {target} for property {property}")]
    DefaultParse {
        literal: String,
        target: &'static str,
        property: String,
    },

    #[error("invalid \"extensions\" tag value {raw:?}: {source}")]
    ExtensionsParse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid \"extensions\" tag value {raw:?}: expected a JSON object")]
    ExtensionsNotObject { raw: String },

    #[error("property:{field}:{source}")]
    Field {
        field: String,
        #[source]
        source: Box<SchemaError>,
    },

    #[error("error on root type {type_name}: {source}")]
    Root {
        type_name: String,
        #[source]
        source: Box<SchemaError>,
    },

    #[error("error on type {type_name} ({name}): {source}")]
    Definition {
        name: String,
        type_name: String,
        #[source]
        source: Box<SchemaError>,
    },

    /// A descriptor document could not be turned into type descriptions.
    #[error("descriptor: {0}")]
    Descriptor(String),

    #[error("encoding schema: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn in_field(self, field: &str) -> Self {
        SchemaError::Field { field: field.to_string(), source: Box::new(self) }
    }

    /// The innermost error, past all positional wrappers.
    pub fn root_cause(&self) -> &SchemaError {
        match self {
            SchemaError::Field { source, .. }
            | SchemaError::Root { source, .. }
            | SchemaError::Definition { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Field names from the outermost property down to the failure.
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut cur = self;
        loop {
            match cur {
                SchemaError::Field { field, source } => {
                    path.push(field.as_str());
                    cur = &**source;
                }
                SchemaError::Root { source, .. } | SchemaError::Definition { source, .. } => {
                    cur = &**source;
                }
                _ => return path,
            }
        }
    }
}
