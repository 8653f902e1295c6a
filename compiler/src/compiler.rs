use sdgen_schema::Record;
use tracing::debug;

use crate::{
    gen_xsd,
    language::{EmitterOptions, Language},
};

/// Generate the complete `language` source file for `record` with the
/// default [EmitterOptions](struct.EmitterOptions.html).
pub fn generate_definition(record: &Record, language: Language) -> String {
    generate_with(record, language, &EmitterOptions::default())
}

/// Generate the complete `language` source file for `record`.
pub fn generate_with(record: &Record, language: Language, options: &EmitterOptions) -> String {
    let emitter = language.emitter(options);
    let source = emitter.generate_definition(record);
    debug!(
        record = record.name(),
        language = %language,
        bytes = source.len(),
        "generated definition"
    );
    source
}

/// Generate the XSD describing the XML form of `record`.
pub fn to_xsd(record: &Record) -> String {
    let xsd = gen_xsd::to_xsd(record);
    debug!(record = record.name(), bytes = xsd.len(), "generated xsd");
    xsd
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdgen_schema::TypeDesc;

    #[test]
    fn test_options_reach_the_emitter() {
        let record = Record::builder("Point")
            .field("x", TypeDesc::float())
            .build()
            .unwrap();
        let options = EmitterOptions {
            go_package:   "geometry".to_string(),
            java_package: Some("com.example.geometry".to_string()),
            cs_namespace: Some("Example.Geometry".to_string()),
        };

        assert!(generate_with(&record, Language::Go, &options).contains("package geometry"));
        assert!(generate_with(&record, Language::Java, &options).contains("package com.example.geometry;"));
        assert!(generate_with(&record, Language::CSharp, &options).contains("namespace Example.Geometry;"));
        assert!(generate_definition(&record, Language::Go).contains("package model"));
    }
}
