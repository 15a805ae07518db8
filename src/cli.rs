//! Minimal CLI: descriptor documents → (schema | check)
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use json_typeschema::Descriptor;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate JSON Schema documents from type descriptor files
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate and print the JSON Schema
    Schema(SchemaOut),
    /// load and resolve the descriptors without generating
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more descriptor files. May be literal paths or quoted glob patterns.
    /// Later files override type names declared by earlier ones.
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// root type expression (overrides the descriptor's `root`)
    #[arg(long)]
    root: Option<String>,

    /// dialect URI written as `$schema`
    #[arg(long)]
    schema: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Descriptor> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut merged = Descriptor::default();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read descriptor file {source_path_str}"))?;
            let descriptor = Descriptor::from_json(&source)
                .with_context(|| format!("failed to parse descriptor file {source_path_str}"))?;
            log::debug!("loaded {} types from {source_path_str}", descriptor.types.len());
            merged.merge(descriptor);
        }
        Ok(merged)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                let mut descriptor = target.input_settings.load()?;
                if let Some(schema) = target.schema.as_ref() {
                    descriptor.schema = Some(schema.clone());
                }
                let root = target.root.as_deref();
                if root.is_none() && descriptor.root.is_none() && descriptor.definitions.is_empty() {
                    bail!("nothing to generate: no root and no definitions");
                }

                let generator = descriptor.generator(root).context("failed to resolve types")?;
                let schema = generator.generate().context("failed to generate schema")?;
                let schema_src = schema.to_json_string()?;

                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(out, &schema_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    eprintln!("{} {}", "wrote".green(), out.display());
                } else {
                    println!("{schema_src}");
                }
                Ok(())
            }
            Command::Check(target) => {
                let descriptor = target.input_settings.load()?;
                let count = descriptor.check()?;
                eprintln!("{} {count} types resolved", "ok".green());
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
