//! sdgen
//!
//! One-stop facade over the sdgen crates.
//!
//! - Record model, validated instances and wire formats (re-exported from `sdgen-schema`)
//! - Language emitters and the XSD emitter (re-exported from `sdgen-compiler`)
//! - Helpers for loading description documents and generating from them

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

pub use sdgen_compiler::{check_format, generate_with, to_xsd, CompilerError, Emitter, EmitterOptions, Language};
pub use sdgen_schema::{
    Field, FieldDoc, FixedInt, Instance, IntKind, Primitive, Record, RecordBuilder, RecordDoc, SchemaDocument,
    SchemaError, TypeDesc, TypeExpr, ValidationError, ValidationErrorKind, Value, WireFormat,
};

/// Load a JSON or YAML description document and resolve `root`, or the
/// document's own root when `root` is `None`.
pub fn load_schema(path: impl AsRef<Path>, root: Option<&str>) -> Result<Arc<Record>, SchemaError> {
    let path = path.as_ref();
    let document = SchemaDocument::from_file(path)?;
    let record = match root {
        Some(name) => document.resolve_record(name)?,
        None => document.resolve()?,
    };
    debug!(path = %path.display(), record = record.name(), "loaded schema");
    Ok(record)
}

/// Generate `language` source for `record` with default options.
pub fn generate(record: &Record, language: Language) -> String {
    sdgen_compiler::generate_definition(record, language)
}

/// Pretty-printed JSON description document for `record`.
pub fn describe_to_json(record: &Record) -> Result<String, SchemaError> {
    SchemaDocument::from_record(record).to_json()
}

pub mod schema {
    pub use sdgen_schema::*;
}

pub mod compiler {
    pub use sdgen_compiler::*;
}
