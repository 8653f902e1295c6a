//! Serde description documents: a JSON or YAML file that lists records and
//! their fields, resolved into a graph of [Record](../record/struct.Record.html)s.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::SchemaError,
    record::Record,
    types::{Primitive, TypeDesc},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Record returned by [resolve](#method.resolve). Defaults to the last
    /// record listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root:    Option<String>,
    pub records: IndexMap<String, RecordDoc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordDoc {
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name:    String,
    #[serde(rename = "type")]
    pub ty:      TypeExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

/// `string`, `Address`, `{list: T}` or `{optional: T}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    Named(String),
    List { list: Box<TypeExpr> },
    Optional { optional: Box<TypeExpr> },
}

impl TypeExpr {
    fn from_desc(ty: &TypeDesc) -> TypeExpr {
        match ty {
            TypeDesc::Primitive(p)    => TypeExpr::Named(p.name().to_string()),
            TypeDesc::Record(r)       => TypeExpr::Named(r.name().to_string()),
            TypeDesc::Dynamic         => TypeExpr::Named("any".to_string()),
            TypeDesc::List(elem)      => TypeExpr::List { list: Box::new(TypeExpr::from_desc(elem)) },
            TypeDesc::Optional(inner) => TypeExpr::Optional { optional: Box::new(TypeExpr::from_desc(inner)) },
        }
    }
}

impl SchemaDocument {
    pub fn from_json(text: &str) -> Result<SchemaDocument, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> Result<SchemaDocument, SchemaError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a `.json`, `.yaml` or `.yml` document.
    pub fn from_file(path: impl AsRef<Path>) -> Result<SchemaDocument, SchemaError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json"        => SchemaDocument::from_json(&text),
            "yaml" | "yml" => SchemaDocument::from_yaml(&text),
            _ => Err(SchemaError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// The document describing `record` and every record it reaches.
    pub fn from_record(record: &Record) -> SchemaDocument {
        let records = record
            .dependency_order()
            .into_iter()
            .map(|r| {
                let fields = r
                    .fields()
                    .iter()
                    .map(|f| FieldDoc {
                        name:    f.name.clone(),
                        ty:      TypeExpr::from_desc(&f.ty),
                        default: f.default.clone(),
                    })
                    .collect();
                (r.name().to_string(), RecordDoc { fields })
            })
            .collect();

        SchemaDocument {
            root: Some(record.name().to_string()),
            records,
        }
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String, SchemaError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root
            .as_deref()
            .or_else(|| self.records.keys().last().map(String::as_str))
    }

    /// Build the root record.
    pub fn resolve(&self) -> Result<Arc<Record>, SchemaError> {
        let root = self
            .root_name()
            .ok_or_else(|| SchemaError::UnknownRecord("<no records>".to_string()))?;
        self.resolve_record(root)
    }

    /// Build the record called `name` together with the records it nests.
    pub fn resolve_record(&self, name: &str) -> Result<Arc<Record>, SchemaError> {
        let mut resolver = Resolver {
            document: self,
            state:    HashMap::new(),
            built:    HashMap::new(),
        };
        resolver.record(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

struct Resolver<'a> {
    document: &'a SchemaDocument,
    state:    HashMap<String, Visit>,
    built:    HashMap<String, Arc<Record>>,
}

impl Resolver<'_> {
    fn record(&mut self, name: &str) -> Result<Arc<Record>, SchemaError> {
        match self.state.get(name) {
            Some(Visit::InProgress) => return Err(SchemaError::RecursiveRecord(name.to_string())),
            Some(Visit::Done) => {
                if let Some(record) = self.built.get(name) {
                    return Ok(Arc::clone(record));
                }
            }
            None => {}
        }

        let doc = self
            .document
            .records
            .get(name)
            .ok_or_else(|| SchemaError::UnknownRecord(name.to_string()))?;

        self.state.insert(name.to_string(), Visit::InProgress);
        let mut builder = Record::builder(name);
        for field in &doc.fields {
            let ty = self.type_desc(&field.ty)?;
            builder = match field.default {
                Some(ref default) => builder.field_with_default(field.name.as_str(), ty, default.clone()),
                None              => builder.field(field.name.as_str(), ty),
            };
        }
        let record = builder.build()?;
        self.state.insert(name.to_string(), Visit::Done);
        self.built.insert(name.to_string(), Arc::clone(&record));

        debug!(record = name, fields = record.fields().len(), "resolved record");
        Ok(record)
    }

    fn type_desc(&mut self, expr: &TypeExpr) -> Result<TypeDesc, SchemaError> {
        Ok(match expr {
            TypeExpr::List { list }         => TypeDesc::list(self.type_desc(list)?),
            TypeExpr::Optional { optional } => {
                let inner = self.type_desc(optional)?;
                if matches!(inner, TypeDesc::Optional(_)) {
                    return Err(SchemaError::VerifierError(
                        "An optional type may not wrap another optional".to_string(),
                    ));
                }
                TypeDesc::optional(inner)
            }
            TypeExpr::Named(name) if name == "any" => TypeDesc::Dynamic,
            TypeExpr::Named(name) => match Primitive::from_name(name) {
                Some(p) => TypeDesc::Primitive(p),
                None    => TypeDesc::Record(self.record(name)?),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntKind;
    use serde_json::json;

    const PERSON_YAML: &str = r#"
root: Person
records:
  Address:
    fields:
      - { name: city, type: string }
      - { name: zip_code, type: string }
  Person:
    fields:
      - { name: name, type: string }
      - { name: age, type: { optional: int } }
      - { name: id, type: u16 }
      - { name: home, type: Address }
      - { name: previous, type: { list: Address } }
      - { name: tags, type: { list: string }, default: [] }
      - { name: extra, type: any }
"#;

    #[test]
    fn test_resolve_yaml() {
        let person = SchemaDocument::from_yaml(PERSON_YAML).unwrap().resolve().unwrap();
        assert_eq!(person.name(), "Person");
        assert_eq!(person.field("age").unwrap().ty, TypeDesc::optional(TypeDesc::int()));
        assert_eq!(person.field("id").unwrap().ty, TypeDesc::fixed(IntKind::U16));
        assert_eq!(person.field("extra").unwrap().ty, TypeDesc::Dynamic);
        assert_eq!(person.field("tags").unwrap().default, Some(json!([])));
        assert_eq!(person.field("previous").unwrap().ty.describe(), "list<Address>");
    }

    #[test]
    fn test_shared_records_are_built_once() {
        let person = SchemaDocument::from_yaml(PERSON_YAML).unwrap().resolve().unwrap();
        let home = match &person.field("home").unwrap().ty {
            TypeDesc::Record(r) => Arc::clone(r),
            other => panic!("unexpected {:?}", other),
        };
        let previous = match &person.field("previous").unwrap().ty {
            TypeDesc::List(elem) => match elem.as_ref() {
                TypeDesc::Record(r) => Arc::clone(r),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        };
        assert!(Arc::ptr_eq(&home, &previous));
    }

    #[test]
    fn test_recursion_is_rejected() {
        let doc = SchemaDocument::from_json(
            r#"{ "root": "Node", "records": {
                "Node": { "fields": [ { "name": "next", "type": { "optional": "Node" } } ] }
            } }"#,
        )
        .unwrap();
        assert!(matches!(doc.resolve(), Err(SchemaError::RecursiveRecord(ref n)) if n == "Node"));
    }

    #[test]
    fn test_unknown_record() {
        let doc = SchemaDocument::from_yaml("records:\n  A:\n    fields:\n      - { name: b, type: B }\n").unwrap();
        assert!(matches!(doc.resolve(), Err(SchemaError::UnknownRecord(ref n)) if n == "B"));
    }

    #[test]
    fn test_root_defaults_to_last_record() {
        let doc = SchemaDocument::from_yaml(
            "records:\n  A:\n    fields: []\n  B:\n    fields:\n      - { name: a, type: A }\n",
        )
        .unwrap();
        assert_eq!(doc.root_name(), Some("B"));
        assert_eq!(doc.resolve().unwrap().name(), "B");
        assert_eq!(doc.resolve_record("A").unwrap().name(), "A");
    }

    #[test]
    fn test_nested_optional_in_document_is_rejected() {
        let doc = SchemaDocument::from_yaml(
            "records:\n  A:\n    fields:\n      - { name: x, type: { optional: { optional: int } } }\n",
        )
        .unwrap();
        assert!(matches!(doc.resolve(), Err(SchemaError::VerifierError(_))));
    }

    #[test]
    fn test_from_record_round_trips() {
        let document = SchemaDocument::from_yaml(PERSON_YAML).unwrap();
        let person = document.resolve().unwrap();
        let described = SchemaDocument::from_record(&person);
        assert_eq!(described.records.keys().collect::<Vec<_>>(), ["Address", "Person"]);
        assert_eq!(described, document);

        let reparsed = SchemaDocument::from_json(&described.to_json().unwrap()).unwrap();
        assert_eq!(reparsed.resolve().unwrap(), person);
    }

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("person.yml");
        fs::write(&yaml, PERSON_YAML).unwrap();
        assert_eq!(SchemaDocument::from_file(&yaml).unwrap().root_name(), Some("Person"));

        let toml = dir.path().join("person.toml");
        fs::write(&toml, PERSON_YAML).unwrap();
        assert!(matches!(SchemaDocument::from_file(&toml), Err(SchemaError::UnsupportedFormat(_))));
    }
}
