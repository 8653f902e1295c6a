use sdgen_schema::{Record, TypeDesc, WireFormat};

use crate::language::Language;

/// A code generator for one target language.
///
/// `generate_definition` returns a complete source file: the root record's
/// type, every nested record it reaches (each once, nested before
/// referencing), and text and file conversions for each format in
/// `formats()` on the root type.
pub trait Emitter {
    fn language(&self) -> Language;

    /// Wire formats the generated code can read and write.
    fn formats(&self) -> &'static [WireFormat];

    /// Target-language spelling of a field type.
    fn type_str(&self, ty: &TypeDesc) -> String;

    fn generate_definition(&self, record: &Record) -> String;

    fn supports(&self, format: WireFormat) -> bool {
        self.formats().contains(&format)
    }
}
