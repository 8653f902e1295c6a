use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::SchemaError,
    record::Record,
    types::{TypeDesc, NATIVE_TYPES},
    value::validate,
};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Names a record may not take because description documents would read them
/// as built-in types.
pub const RESERVED_NAMES: [&str; 2] = ["list", "optional"];

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Returns `Ok(())` if the record is well formed, or
/// `Err(SchemaError::VerifierError(_))` describing the first problem found.
pub fn verify_record(record: &Record) -> Result<(), SchemaError> {
    // 1) Record name
    if !is_identifier(record.name()) {
        return Err(SchemaError::VerifierError(format!(
            "The record name {} is not a valid identifier",
            quote(record.name())
        )));
    }
    if NATIVE_TYPES.contains(&record.name()) || RESERVED_NAMES.contains(&record.name()) {
        return Err(SchemaError::VerifierError(format!(
            "The record name {} is reserved",
            quote(record.name())
        )));
    }

    // 2) Field names: identifiers, no duplicates
    let mut seen = HashSet::new();
    for field in record.fields() {
        if !is_identifier(&field.name) {
            return Err(SchemaError::VerifierError(format!(
                "The field name {} in {} is not a valid identifier",
                quote(&field.name),
                quote(record.name())
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::VerifierError(format!(
                "The field {} is defined twice in {}",
                quote(&field.name),
                quote(record.name())
            )));
        }
    }

    // 3) At most one level of optionality anywhere in a descriptor
    for field in record.fields() {
        if has_nested_optional(&field.ty) {
            return Err(SchemaError::VerifierError(format!(
                "The field {} wraps an optional in another optional",
                quote(&field.name)
            )));
        }
    }

    // 4) Defaults must be valid values of the field type
    for field in record.fields() {
        if let Some(ref default) = field.default {
            let path = format!("{}.{}", record.name(), field.name);
            validate(&field.ty, default, &path).map_err(|e| {
                SchemaError::VerifierError(format!(
                    "The default for field {} is invalid: {}",
                    quote(&field.name),
                    e.kind
                ))
            })?;
        }
    }

    Ok(())
}

fn has_nested_optional(ty: &TypeDesc) -> bool {
    match ty {
        TypeDesc::Optional(inner) => matches!(**inner, TypeDesc::Optional(_)) || has_nested_optional(inner),
        TypeDesc::List(elem)      => has_nested_optional(elem),
        _                         => false,
    }
}

fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntKind;
    use serde_json::json;

    fn expect_verifier_error(result: Result<std::sync::Arc<Record>, SchemaError>, needle: &str) {
        match result {
            Err(SchemaError::VerifierError(msg)) => {
                assert!(msg.contains(needle), "unexpected message: {}", msg)
            }
            other => panic!("expected a VerifierError, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_duplicate_fields() {
        let result = Record::builder("Person")
            .field("name", TypeDesc::string())
            .field("name", TypeDesc::int())
            .build();
        expect_verifier_error(result, "defined twice");
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        expect_verifier_error(Record::builder("Bad Name").build(), "not a valid identifier");
        expect_verifier_error(
            Record::builder("Person").field("1st", TypeDesc::string()).build(),
            "not a valid identifier",
        );
    }

    #[test]
    fn test_rejects_reserved_record_names() {
        expect_verifier_error(Record::builder("string").build(), "reserved");
        expect_verifier_error(Record::builder("list").build(), "reserved");
    }

    #[test]
    fn test_rejects_hand_built_nested_optional() {
        let nested = TypeDesc::Optional(Box::new(TypeDesc::Optional(Box::new(TypeDesc::int()))));
        let result = Record::builder("Person").field("age", nested).build();
        expect_verifier_error(result, "optional in another optional");
    }

    #[test]
    fn test_checks_defaults() {
        let ok = Record::builder("Config")
            .field_with_default("retries", TypeDesc::fixed(IntKind::U8), json!(3))
            .field_with_default("tags", TypeDesc::list(TypeDesc::string()), json!([]))
            .build();
        assert!(ok.is_ok());

        let out_of_range = Record::builder("Config")
            .field_with_default("retries", TypeDesc::fixed(IntKind::U8), json!(300))
            .build();
        expect_verifier_error(out_of_range, "out of range");
    }
}
