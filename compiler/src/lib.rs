//! sdgen-compiler
//!
//! Turns a verified [Record](../sdgen_schema/struct.Record.html) into source
//! code. This crate implements:
//!  1) One emitter per target language (C++, Rust, Java, Go, C#, Swift),
//!     each producing the record types plus JSON/YAML/XML conversions,
//!  2) An XSD emitter for the XML form of a record,
//!  3) [Language](enum.Language.html) lookup and per-language
//!     [EmitterOptions](struct.EmitterOptions.html),
//!  4) Error types (`CompilerError`) and the `Emitter` trait.

pub mod compiler;
pub mod error;
pub mod gen_cpp;
pub mod gen_cs;
pub mod gen_go;
pub mod gen_java;
pub mod gen_rust;
pub mod gen_swift;
pub mod gen_xsd;
pub mod language;
pub mod traits;
pub mod utils;

pub use compiler::{generate_definition, generate_with, to_xsd};
pub use error::CompilerError;
pub use language::{check_format, EmitterOptions, Language};
pub use traits::Emitter;
