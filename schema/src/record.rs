use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::SchemaError,
    types::TypeDesc,
    verifier::verify_record,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name:    String,
    pub ty:      TypeDesc,
    pub default: Option<serde_json::Value>,
}

/// A named, ordered set of typed fields. Field order is significant: every
/// emitter and every wire format writes fields in this order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name:   String,
    fields: Vec<Field>,
}

impl Record {
    pub fn builder(name: impl Into<String>) -> RecordBuilder {
        RecordBuilder {
            name:   name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Every distinct record reachable from this one, nested records before
    /// the records that reference them and `self` last. Records are
    /// deduplicated by name, so a record shared by several parents appears
    /// once.
    pub fn dependency_order(&self) -> Vec<&Record> {
        fn visit<'a>(record: &'a Record, seen: &mut HashSet<&'a str>, out: &mut Vec<&'a Record>) {
            if !seen.insert(record.name()) {
                return;
            }
            for field in &record.fields {
                for nested in field.ty.records() {
                    visit(nested, seen, out);
                }
            }
            out.push(record);
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        visit(self, &mut seen, &mut out);
        out
    }
}

/// Collects fields in declaration order and verifies them on `build`.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    name:   String,
    fields: Vec<Field>,
}

impl RecordBuilder {
    pub fn field(mut self, name: impl Into<String>, ty: TypeDesc) -> RecordBuilder {
        self.fields.push(Field {
            name: name.into(),
            ty,
            default: None,
        });
        self
    }

    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        ty: TypeDesc,
        default: serde_json::Value,
    ) -> RecordBuilder {
        self.fields.push(Field {
            name: name.into(),
            ty,
            default: Some(default),
        });
        self
    }

    pub fn build(self) -> Result<Arc<Record>, SchemaError> {
        let record = Record {
            name:   self.name,
            fields: self.fields,
        };
        verify_record(&record)?;
        Ok(Arc::new(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Arc<Record> {
        Record::builder("Address")
            .field("street", TypeDesc::string())
            .field("city", TypeDesc::string())
            .build()
            .unwrap()
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let person = Record::builder("Person")
            .field("name", TypeDesc::string())
            .field("age", TypeDesc::optional(TypeDesc::int()))
            .field("score", TypeDesc::float())
            .build()
            .unwrap();

        let names: Vec<&str> = person.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "age", "score"]);
        assert_eq!(person.field("age").unwrap().ty, TypeDesc::optional(TypeDesc::int()));
        assert!(person.field("missing").is_none());
    }

    #[test]
    fn test_dependency_order_dedups_shared_records() {
        let address = address();
        let person = Record::builder("Person")
            .field("home", TypeDesc::record(&address))
            .field("work", TypeDesc::optional(TypeDesc::record(&address)))
            .field("history", TypeDesc::list(TypeDesc::record(&address)))
            .build()
            .unwrap();

        let order: Vec<&str> = person.dependency_order().iter().map(|r| r.name()).collect();
        assert_eq!(order, ["Address", "Person"]);
    }

    #[test]
    fn test_dependency_order_nested_chain() {
        let address = address();
        let company = Record::builder("Company")
            .field("hq", TypeDesc::record(&address))
            .build()
            .unwrap();
        let person = Record::builder("Person")
            .field("employer", TypeDesc::record(&company))
            .field("home", TypeDesc::record(&address))
            .build()
            .unwrap();

        let order: Vec<&str> = person.dependency_order().iter().map(|r| r.name()).collect();
        assert_eq!(order, ["Address", "Company", "Person"]);
    }
}
