//! Document assembly: registry first, then one walk per definition and one
//! for the root.
use indexmap::IndexMap;

use crate::desc::{Describe, TypeDesc};
use crate::error::SchemaError;
use crate::registry::DefinitionRegistry;
use crate::schema::{JsonSchema, DEFAULT_SCHEMA};
use crate::walker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Dialect URI written as `$schema`.
    pub schema: String,
}

impl Default for Options {
    fn default() -> Self {
        Self { schema: DEFAULT_SCHEMA.to_string() }
    }
}

/// Reusable generator configuration. Every [`Generator::generate`] call builds
/// a fresh, independent document.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    root: Option<TypeDesc>,
    definitions: IndexMap<String, TypeDesc>,
    options: Options,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty dialect URI falls back to [`DEFAULT_SCHEMA`].
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        if self.options.schema.is_empty() {
            self.options.schema = DEFAULT_SCHEMA.to_string();
        }
        self
    }

    pub fn with_root<T: Describe + ?Sized>(self) -> Self {
        self.with_root_desc(T::describe())
    }

    pub fn with_root_desc(mut self, root: TypeDesc) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_definition<T: Describe + ?Sized>(self, name: impl Into<String>) -> Self {
        self.with_definition_desc(name, T::describe())
    }

    /// Re-using a name replaces the earlier definition.
    pub fn with_definition_desc(mut self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.definitions.insert(name.into(), ty);
        self
    }

    pub fn with_definitions<I, N>(self, definitions: I) -> Self
    where
        I: IntoIterator<Item = (N, TypeDesc)>,
        N: Into<String>,
    {
        definitions
            .into_iter()
            .fold(self, |generator, (name, ty)| generator.with_definition_desc(name, ty))
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Build the document. All-or-nothing: the first failing walk aborts,
    /// tagged with the definition name or `root`.
    pub fn generate(&self) -> Result<JsonSchema, SchemaError> {
        let registry = DefinitionRegistry::from_definitions(
            self.definitions.iter().map(|(name, ty)| (name.as_str(), ty)),
        );
        let mut doc = JsonSchema { schema: self.options.schema.clone(), ..JsonSchema::default() };

        for (name, ty) in &self.definitions {
            log::debug!("generating definition {name}");
            let node = walker::build(ty, &registry, true).map_err(|source| SchemaError::Definition {
                name: name.clone(),
                type_name: ty.display_name(),
                source: Box::new(source),
            })?;
            doc.definitions.insert(name.clone(), node);
        }

        if let Some(root) = &self.root {
            log::debug!("generating root {}", root.display_name());
            doc.root = walker::build(root, &registry, false).map_err(|source| SchemaError::Root {
                type_name: root.display_name(),
                source: Box::new(source),
            })?;
        }

        Ok(doc)
    }
}

/// Pretty schema text for `T` with default options.
pub fn generate_schema_string<T: Describe + ?Sized>() -> Result<String, SchemaError> {
    let doc = Generator::new().with_root::<T>().generate()?;
    Ok(doc.to_json_string()?)
}

// ------------------------------- Tests ------------------------------------ //
