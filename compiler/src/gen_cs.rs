use sdgen_schema::{access::unwrap_optional, Field, IntKind, Primitive, Record, TypeDesc, WireFormat};
use serde_json::Value as Json;

use crate::{
    language::Language,
    traits::Emitter,
    utils::{escape_csharp_keyword, quote, to_pascal_case},
};

/// Emits attribute-annotated classes for System.Text.Json, XmlSerializer
/// and YamlDotNet.
pub struct CSharpEmitter {
    namespace: Option<String>,
}

const FORMATS: &[WireFormat] = &[WireFormat::Json, WireFormat::Yaml, WireFormat::Xml];

impl CSharpEmitter {
    pub fn new(namespace: Option<String>) -> CSharpEmitter {
        CSharpEmitter { namespace }
    }
}

impl Emitter for CSharpEmitter {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn formats(&self) -> &'static [WireFormat] {
        FORMATS
    }

    fn type_str(&self, ty: &TypeDesc) -> String {
        match ty {
            TypeDesc::Primitive(p)    => primitive_type(*p).to_string(),
            TypeDesc::Record(r)       => r.name().to_string(),
            TypeDesc::List(elem)      => format!("List<{}>", self.type_str(elem)),
            TypeDesc::Optional(inner) => format!("{}?", self.type_str(inner)),
            TypeDesc::Dynamic         => "object".to_string(),
        }
    }

    fn generate_definition(&self, record: &Record) -> String {
        let mut cs_code: Vec<String> = Vec::new();

        cs_code.push("// Generated by sdgen. Do not edit.".to_string());
        cs_code.push("// Requires YamlDotNet.".to_string());
        cs_code.push("#nullable enable".to_string());
        cs_code.push("".to_string());
        for using in [
            "System",
            "System.Collections.Generic",
            "System.IO",
            "System.Text.Json",
            "System.Text.Json.Serialization",
            "System.Xml.Serialization",
            "YamlDotNet.Serialization",
        ] {
            cs_code.push(format!("using {};", using));
        }
        cs_code.push("".to_string());
        if let Some(ref namespace) = self.namespace {
            cs_code.push(format!("namespace {};", namespace));
            cs_code.push("".to_string());
        }

        for nested in record.dependency_order() {
            cs_code.push(self.generate_class(nested, nested.name() == record.name()));
        }

        cs_code.join("\n")
    }
}

fn primitive_type(p: Primitive) -> &'static str {
    match p {
        Primitive::String => "string",
        Primitive::Float  => "double",
        Primitive::Int    => "int",
        Primitive::Bool   => "bool",
        Primitive::Fixed(kind) => match kind {
            IntKind::I8  => "sbyte",
            IntKind::U8  => "byte",
            IntKind::I16 => "short",
            IntKind::U16 => "ushort",
            IntKind::I32 => "int",
            IntKind::U32 => "uint",
        },
    }
}

fn property_name(record: &Record, field: &Field) -> String {
    let name = escape_csharp_keyword(&to_pascal_case(&field.name));
    // A member may not share its enclosing type's name
    if name == record.name() {
        format!("{}Value", name)
    } else {
        name
    }
}

impl CSharpEmitter {
    fn initializer(&self, field: &Field) -> Option<String> {
        if let Some(ref default) = field.default {
            if let Some(literal) = default_literal(&field.ty, default) {
                return Some(literal);
            }
        }
        match field.ty {
            TypeDesc::Optional(_)                     => None,
            TypeDesc::Primitive(Primitive::String)    => Some("\"\"".to_string()),
            TypeDesc::List(_) | TypeDesc::Record(_)   => Some("new()".to_string()),
            TypeDesc::Dynamic                         => Some("new object()".to_string()),
            TypeDesc::Primitive(_)                    => None,
        }
    }

    fn generate_class(&self, record: &Record, is_root: bool) -> String {
        let name = record.name();
        let mut lines: Vec<String> = Vec::new();

        if is_root {
            lines.push(format!("[XmlRoot({})]", quote(name)));
        }
        lines.push(format!("public class {}", name));
        lines.push("{".to_string());
        if is_root {
            lines.push(
                "    private static readonly JsonSerializerOptions JsonOptions = new() { WriteIndented = true };"
                    .to_string(),
            );
            lines.push("".to_string());
        }

        for field in record.fields() {
            let key = quote(&field.name);
            lines.push(format!("    [JsonPropertyName({})]", key));
            match unwrap_optional(&field.ty) {
                TypeDesc::List(elem) => {
                    lines.push(format!("    [XmlArray({})]", key));
                    lines.push(format!("    [XmlArrayItem({})]", quote(&elem.item_name())));
                }
                _ => lines.push(format!("    [XmlElement({})]", key)),
            }
            lines.push(format!("    [YamlMember(Alias = {})]", key));

            let property = format!(
                "    public {} {} {{ get; set; }}",
                self.type_str(&field.ty),
                property_name(record, field)
            );
            match self.initializer(field) {
                Some(init) => lines.push(format!("{} = {};", property, init)),
                None => lines.push(property),
            }
            lines.push("".to_string());
        }

        if is_root {
            lines.extend(generate_entry_points(name));
        } else if lines.last().map_or(false, |l| l.is_empty()) {
            lines.pop();
        }

        lines.push("}".to_string());
        lines.push("".to_string());
        lines.join("\n")
    }
}

fn default_literal(ty: &TypeDesc, value: &Json) -> Option<String> {
    match (ty, value) {
        (TypeDesc::Optional(inner), _) => default_literal(inner, value),
        (TypeDesc::List(elem), Json::Array(items)) => {
            let literals = items
                .iter()
                .map(|item| default_literal(elem, item))
                .collect::<Option<Vec<_>>>()?;
            if literals.is_empty() {
                Some("new()".to_string())
            } else {
                Some(format!("new() {{ {} }}", literals.join(", ")))
            }
        }
        (TypeDesc::Primitive(Primitive::String), Json::String(s)) => Some(quote(s)),
        (TypeDesc::Primitive(Primitive::Bool), Json::Bool(b)) => Some(b.to_string()),
        (TypeDesc::Primitive(Primitive::Float), Json::Number(n)) => n.as_f64().map(|f| format!("{:?}", f)),
        (TypeDesc::Primitive(Primitive::Int), Json::Number(n))
        | (TypeDesc::Primitive(Primitive::Fixed(_)), Json::Number(n)) => n.as_i64().map(|i| i.to_string()),
        _ => None,
    }
}

fn generate_entry_points(name: &str) -> Vec<String> {
    let missing = |format: &str| format!("?? throw new InvalidDataException(\"empty {} document\")", format);
    vec![
        "    public string ToJson() => JsonSerializer.Serialize(this, JsonOptions);".to_string(),
        "".to_string(),
        format!(
            "    public static {n} FromJson(string json) =>\n        JsonSerializer.Deserialize<{n}>(json, JsonOptions) {m};",
            n = name,
            m = missing("JSON")
        ),
        "".to_string(),
        "    public string ToYaml() => new SerializerBuilder().Build().Serialize(this);".to_string(),
        "".to_string(),
        format!(
            "    public static {n} FromYaml(string yaml) =>\n        new DeserializerBuilder().Build().Deserialize<{n}?>(yaml) {m};",
            n = name,
            m = missing("YAML")
        ),
        "".to_string(),
        "    public string ToXml()".to_string(),
        "    {".to_string(),
        format!("        var serializer = new XmlSerializer(typeof({}));", name),
        "        using var writer = new StringWriter();".to_string(),
        "        serializer.Serialize(writer, this);".to_string(),
        "        return writer.ToString();".to_string(),
        "    }".to_string(),
        "".to_string(),
        format!("    public static {} FromXml(string xml)", name),
        "    {".to_string(),
        format!("        var serializer = new XmlSerializer(typeof({}));", name),
        "        using var reader = new StringReader(xml);".to_string(),
        format!("        return ({}?)serializer.Deserialize(reader) {};", name, missing("XML")),
        "    }".to_string(),
        "".to_string(),
        "    public void ToJsonFile(string path) => File.WriteAllText(path, ToJson());".to_string(),
        format!("    public static {} FromJsonFile(string path) => FromJson(File.ReadAllText(path));", name),
        "    public void ToYamlFile(string path) => File.WriteAllText(path, ToYaml());".to_string(),
        format!("    public static {} FromYamlFile(string path) => FromYaml(File.ReadAllText(path));", name),
        "    public void ToXmlFile(string path) => File.WriteAllText(path, ToXml());".to_string(),
        format!("    public static {} FromXmlFile(string path) => FromXml(File.ReadAllText(path));", name),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn person() -> Arc<Record> {
        let address = Record::builder("Address")
            .field("city", TypeDesc::string())
            .build()
            .unwrap();
        Record::builder("Person")
            .field("name", TypeDesc::string())
            .field("age", TypeDesc::optional(TypeDesc::int()))
            .field("id", TypeDesc::fixed(IntKind::U16))
            .field("hobbies", TypeDesc::optional(TypeDesc::list(TypeDesc::string())))
            .field("home", TypeDesc::record(&address))
            .field_with_default("nickname", TypeDesc::string(), json!("none"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_type_mapping() {
        let emitter = CSharpEmitter::new(None);
        assert_eq!(emitter.type_str(&TypeDesc::fixed(IntKind::U16)), "ushort");
        assert_eq!(emitter.type_str(&TypeDesc::fixed(IntKind::I8)), "sbyte");
        assert_eq!(emitter.type_str(&TypeDesc::optional(TypeDesc::int())), "int?");
        assert_eq!(emitter.type_str(&TypeDesc::list(TypeDesc::Dynamic)), "List<object>");
    }

    #[test]
    fn test_properties_and_attributes() {
        let code = CSharpEmitter::new(Some("Example.Model".to_string())).generate_definition(&person());
        assert!(code.contains("#nullable enable"));
        assert!(code.contains("namespace Example.Model;"));
        assert!(code.contains("[XmlRoot(\"Person\")]\npublic class Person"));
        assert!(code.contains("    [JsonPropertyName(\"name\")]\n    [XmlElement(\"name\")]\n    [YamlMember(Alias = \"name\")]\n    public string Name { get; set; } = \"\";"));
        assert!(code.contains("    public int? Age { get; set; }\n"));
        assert!(code.contains("    public ushort Id { get; set; }\n"));
        assert!(code.contains("    [XmlArray(\"hobbies\")]\n    [XmlArrayItem(\"string\")]"));
        assert!(code.contains("    public Address Home { get; set; } = new();"));
        assert!(code.contains("    public string Nickname { get; set; } = \"none\";"));
        assert!(code.find("public class Address").unwrap() < code.find("public class Person").unwrap());
    }

    #[test]
    fn test_entry_points() {
        let code = CSharpEmitter::new(None).generate_definition(&person());
        assert!(!code.contains("namespace "));
        for needle in [
            "public string ToJson()",
            "public static Person FromJson(string json)",
            "public string ToYaml()",
            "public static Person FromYaml(string yaml)",
            "public string ToXml()",
            "public static Person FromXml(string xml)",
            "public static Person FromXmlFile(string path)",
        ] {
            assert!(code.contains(needle), "missing {}", needle);
        }
        assert!(!code.contains("public static Address FromJson"));
    }

    #[test]
    fn test_property_named_like_its_class() {
        let record = Record::builder("Name").field("name", TypeDesc::string()).build().unwrap();
        let code = CSharpEmitter::new(None).generate_definition(&record);
        assert!(code.contains("public string NameValue { get; set; }"));
    }
}
