//! Text and file conversions for [Instance](../value/struct.Instance.html).
//!
//! JSON and YAML go through the native tree; XML lives in `xml.rs`.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

use crate::{error::SchemaError, record::Record, value::Instance, xml};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    Json,
    Yaml,
    Xml,
}

impl WireFormat {
    pub const ALL: [WireFormat; 3] = [WireFormat::Json, WireFormat::Yaml, WireFormat::Xml];

    pub fn name(self) -> &'static str {
        match self {
            WireFormat::Json => "json",
            WireFormat::Yaml => "yaml",
            WireFormat::Xml  => "xml",
        }
    }

    /// Guess the format from a file extension (`.json`, `.yaml`, `.yml`, `.xml`).
    pub fn from_path(path: &Path) -> Option<WireFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        ext.parse().ok()
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WireFormat {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json"        => Ok(WireFormat::Json),
            "yaml" | "yml" => Ok(WireFormat::Yaml),
            "xml"         => Ok(WireFormat::Xml),
            other         => Err(SchemaError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl Instance {
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(&self.to_native_tree())?)
    }

    pub fn from_json(record: &Arc<Record>, text: &str) -> Result<Instance, SchemaError> {
        let tree: Json = serde_json::from_str(text)?;
        Ok(Instance::from_native_tree(record, &tree)?)
    }

    pub fn to_yaml(&self) -> Result<String, SchemaError> {
        Ok(serde_yaml::to_string(&self.to_native_tree())?)
    }

    pub fn from_yaml(record: &Arc<Record>, text: &str) -> Result<Instance, SchemaError> {
        let tree: Json = serde_yaml::from_str(text)?;
        Ok(Instance::from_native_tree(record, &tree)?)
    }

    pub fn to_xml(&self) -> Result<String, SchemaError> {
        xml::write_instance(self)
    }

    pub fn from_xml(record: &Arc<Record>, text: &str) -> Result<Instance, SchemaError> {
        xml::read_instance(record, text)
    }

    /// Serialize to `format`.
    pub fn to_format(&self, format: WireFormat) -> Result<String, SchemaError> {
        match format {
            WireFormat::Json => self.to_json(),
            WireFormat::Yaml => self.to_yaml(),
            WireFormat::Xml  => self.to_xml(),
        }
    }

    /// Parse `text` as `format`.
    pub fn from_format(record: &Arc<Record>, format: WireFormat, text: &str) -> Result<Instance, SchemaError> {
        match format {
            WireFormat::Json => Instance::from_json(record, text),
            WireFormat::Yaml => Instance::from_yaml(record, text),
            WireFormat::Xml  => Instance::from_xml(record, text),
        }
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), SchemaError> {
        self.write_file(WireFormat::Json, path.as_ref())
    }

    pub fn from_json_file(record: &Arc<Record>, path: impl AsRef<Path>) -> Result<Instance, SchemaError> {
        Instance::read_file(record, WireFormat::Json, path.as_ref())
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<(), SchemaError> {
        self.write_file(WireFormat::Yaml, path.as_ref())
    }

    pub fn from_yaml_file(record: &Arc<Record>, path: impl AsRef<Path>) -> Result<Instance, SchemaError> {
        Instance::read_file(record, WireFormat::Yaml, path.as_ref())
    }

    pub fn to_xml_file(&self, path: impl AsRef<Path>) -> Result<(), SchemaError> {
        self.write_file(WireFormat::Xml, path.as_ref())
    }

    pub fn from_xml_file(record: &Arc<Record>, path: impl AsRef<Path>) -> Result<Instance, SchemaError> {
        Instance::read_file(record, WireFormat::Xml, path.as_ref())
    }

    pub fn write_file(&self, format: WireFormat, path: &Path) -> Result<(), SchemaError> {
        debug!(record = self.record().name(), %format, path = %path.display(), "writing instance");
        fs::write(path, self.to_format(format)?)?;
        Ok(())
    }

    pub fn read_file(record: &Arc<Record>, format: WireFormat, path: &Path) -> Result<Instance, SchemaError> {
        debug!(record = record.name(), %format, path = %path.display(), "reading instance");
        let text = fs::read_to_string(path)?;
        Instance::from_format(record, format, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntKind, TypeDesc};
    use crate::value::Value;
    use serde_json::json;

    fn person() -> Arc<Record> {
        Record::builder("Person")
            .field("name", TypeDesc::string())
            .field("age", TypeDesc::optional(TypeDesc::int()))
            .field("hobbies", TypeDesc::optional(TypeDesc::list(TypeDesc::string())))
            .field("id", TypeDesc::fixed(IntKind::U16))
            .field("score", TypeDesc::float())
            .build()
            .unwrap()
    }

    fn alice() -> Instance {
        Instance::from_native_tree(
            &person(),
            &json!({ "name": "Alice", "age": null, "hobbies": null, "id": 65535, "score": 0.1 }),
        )
        .unwrap()
    }

    #[test]
    fn test_json_round_trip_keeps_absent_fields_absent() {
        let text = alice().to_json().unwrap();
        let parsed = Instance::from_json(&person(), &text).unwrap();
        assert_eq!(parsed, alice());
        assert!(parsed.get("age").unwrap().is_null());
        assert!(parsed.get("hobbies").unwrap().is_null());
    }

    #[test]
    fn test_json_keys_follow_field_order() {
        let text = alice().to_json().unwrap();
        let name_at = text.find("\"name\"").unwrap();
        let age_at = text.find("\"age\"").unwrap();
        let score_at = text.find("\"score\"").unwrap();
        assert!(name_at < age_at && age_at < score_at);
    }

    #[test]
    fn test_yaml_round_trip() {
        let full = Instance::from_native_tree(
            &person(),
            &json!({ "name": "Bob", "age": 42, "hobbies": ["Chess", "Cooking"], "id": 7, "score": 2.5 }),
        )
        .unwrap();
        let text = full.to_yaml().unwrap();
        assert!(text.contains("name: Bob"));
        assert_eq!(Instance::from_yaml(&person(), &text).unwrap(), full);
    }

    #[test]
    fn test_empty_list_is_not_absent() {
        let with_empty = Instance::from_native_tree(
            &person(),
            &json!({ "name": "Dana", "hobbies": [], "id": 1, "score": 1.0 }),
        )
        .unwrap();
        for format in [WireFormat::Json, WireFormat::Yaml] {
            let text = with_empty.to_format(format).unwrap();
            let parsed = Instance::from_format(&person(), format, &text).unwrap();
            assert_eq!(parsed.get("hobbies"), Some(&Value::List(Vec::new())), "{}", format);
        }
    }

    #[test]
    fn test_file_helpers_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        for format in WireFormat::ALL {
            let path = dir.path().join(format!("alice.{}", format));
            alice().write_file(format, &path).unwrap();
            assert_eq!(WireFormat::from_path(&path), Some(format));
            assert_eq!(Instance::read_file(&person(), format, &path).unwrap(), alice());
        }

        let json_path = dir.path().join("direct.json");
        alice().to_json_file(&json_path).unwrap();
        assert_eq!(Instance::from_json_file(&person(), &json_path).unwrap(), alice());
    }

    #[test]
    fn test_reading_invalid_json_is_an_error() {
        assert!(matches!(Instance::from_json(&person(), "{"), Err(SchemaError::Json(_))));
        assert!(matches!(
            Instance::from_json(&person(), r#"{"name": "A", "id": 70000, "score": 1}"#),
            Err(SchemaError::Validation(ref e)) if e.is_out_of_range()
        ));
    }

    #[test]
    fn test_wire_format_names() {
        assert_eq!("YML".parse::<WireFormat>().unwrap(), WireFormat::Yaml);
        assert!("toml".parse::<WireFormat>().is_err());
    }
}
