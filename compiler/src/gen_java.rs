use sdgen_schema::{Field, IntKind, Primitive, Record, TypeDesc, WireFormat};
use serde_json::Value as Json;

use crate::{
    language::Language,
    traits::Emitter,
    utils::{escape_java_keyword, quote},
};

/// Emits one public class per root record, with nested records as static
/// member classes. JSON and YAML use Jackson, XML uses JAXB annotations.
///
/// Java has no unsigned integers, so `u8`, `u16` and `u32` widen to `short`,
/// `int` and `long`. Values are checked against the Java type only.
pub struct JavaEmitter {
    package: Option<String>,
}

const FORMATS: &[WireFormat] = &[WireFormat::Json, WireFormat::Yaml, WireFormat::Xml];

impl JavaEmitter {
    pub fn new(package: Option<String>) -> JavaEmitter {
        JavaEmitter { package }
    }
}

impl Emitter for JavaEmitter {
    fn language(&self) -> Language {
        Language::Java
    }

    fn formats(&self) -> &'static [WireFormat] {
        FORMATS
    }

    fn type_str(&self, ty: &TypeDesc) -> String {
        match ty {
            TypeDesc::Primitive(p)    => primitive_type(*p).to_string(),
            TypeDesc::Record(r)       => r.name().to_string(),
            TypeDesc::List(elem)      => format!("List<{}>", boxed_type(self, elem)),
            TypeDesc::Optional(inner) => boxed_type(self, inner),
            TypeDesc::Dynamic         => "Object".to_string(),
        }
    }

    fn generate_definition(&self, record: &Record) -> String {
        let mut java_code: Vec<String> = Vec::new();

        java_code.push("// Generated by sdgen. Do not edit.".to_string());
        java_code.push("// Requires jackson-databind, jackson-dataformat-yaml and jakarta.xml.bind (JAXB).".to_string());
        if let Some(ref package) = self.package {
            java_code.push(format!("package {};", package));
        }
        java_code.push("".to_string());
        for import in [
            "com.fasterxml.jackson.annotation.JsonProperty",
            "com.fasterxml.jackson.databind.ObjectMapper",
            "com.fasterxml.jackson.databind.SerializationFeature",
            "com.fasterxml.jackson.dataformat.yaml.YAMLFactory",
            "jakarta.xml.bind.JAXBContext",
            "jakarta.xml.bind.JAXBException",
            "jakarta.xml.bind.Marshaller",
            "jakarta.xml.bind.annotation.XmlAccessType",
            "jakarta.xml.bind.annotation.XmlAccessorType",
            "jakarta.xml.bind.annotation.XmlElement",
            "jakarta.xml.bind.annotation.XmlElementWrapper",
            "jakarta.xml.bind.annotation.XmlRootElement",
            "java.io.IOException",
            "java.io.StringReader",
            "java.io.StringWriter",
            "java.nio.file.Files",
            "java.nio.file.Path",
            "java.util.ArrayList",
            "java.util.Arrays",
            "java.util.List",
            "java.util.Objects",
        ] {
            java_code.push(format!("import {};", import));
        }
        java_code.push("".to_string());

        let nested: Vec<&Record> = record
            .dependency_order()
            .into_iter()
            .filter(|r| r.name() != record.name())
            .collect();

        java_code.push(format!("@XmlRootElement(name = {})", quote(record.name())));
        java_code.push("@XmlAccessorType(XmlAccessType.FIELD)".to_string());
        java_code.push(format!("public class {} {{", record.name()));
        java_code.push(
            "    private static final ObjectMapper JSON = new ObjectMapper().enable(SerializationFeature.INDENT_OUTPUT);"
                .to_string(),
        );
        java_code.push("    private static final ObjectMapper YAML = new ObjectMapper(new YAMLFactory());".to_string());
        java_code.push("".to_string());
        java_code.extend(self.class_body(record, 1));
        java_code.push("".to_string());
        java_code.extend(generate_entry_points(record.name()));

        for r in nested {
            java_code.push("".to_string());
            java_code.push("    @XmlAccessorType(XmlAccessType.FIELD)".to_string());
            java_code.push(format!("    public static class {} {{", r.name()));
            java_code.extend(self.class_body(r, 2));
            java_code.push("    }".to_string());
        }

        java_code.push("}".to_string());
        java_code.join("\n")
    }
}

fn primitive_type(p: Primitive) -> &'static str {
    match p {
        Primitive::String => "String",
        Primitive::Float  => "double",
        Primitive::Int    => "int",
        Primitive::Bool   => "boolean",
        Primitive::Fixed(kind) => match kind {
            IntKind::I8  => "byte",
            IntKind::U8  => "short",
            IntKind::I16 => "short",
            IntKind::U16 => "int",
            IntKind::I32 => "int",
            IntKind::U32 => "long",
        },
    }
}

fn boxed_type(emitter: &JavaEmitter, ty: &TypeDesc) -> String {
    match emitter.type_str(ty).as_str() {
        "byte"    => "Byte".to_string(),
        "short"   => "Short".to_string(),
        "int"     => "Integer".to_string(),
        "long"    => "Long".to_string(),
        "double"  => "Double".to_string(),
        "boolean" => "Boolean".to_string(),
        other     => other.to_string(),
    }
}

/// A Java expression for a default value. Record defaults go through the
/// all-args constructor; keys missing from the object take that field's own
/// default.
fn default_literal(ty: &TypeDesc, value: &Json) -> Option<String> {
    match (ty, value) {
        (TypeDesc::Optional(_), Json::Null) => Some("null".to_string()),
        (TypeDesc::Optional(inner), _) => default_literal(inner, value),
        (TypeDesc::List(_), Json::Array(items)) if items.is_empty() => Some("new ArrayList<>()".to_string()),
        (TypeDesc::List(elem), Json::Array(items)) => {
            let literals = items
                .iter()
                .map(|item| default_literal(elem, item))
                .collect::<Option<Vec<_>>>()?;
            Some(format!("new ArrayList<>(Arrays.asList({}))", literals.join(", ")))
        }
        (TypeDesc::Record(r), Json::Object(map)) => {
            let args = r
                .fields()
                .iter()
                .map(|f| match map.get(&f.name).or(f.default.as_ref()) {
                    Some(v) => default_literal(&f.ty, v),
                    None if matches!(f.ty, TypeDesc::List(_)) => Some("new ArrayList<>()".to_string()),
                    None => Some("null".to_string()),
                })
                .collect::<Option<Vec<_>>>()?;
            Some(format!("new {}({})", r.name(), args.join(", ")))
        }
        (TypeDesc::Primitive(Primitive::String), Json::String(s)) => Some(quote(s)),
        (TypeDesc::Primitive(Primitive::Bool), Json::Bool(b)) => Some(b.to_string()),
        (TypeDesc::Primitive(Primitive::Float), Json::Number(n)) => n.as_f64().map(|f| format!("{:?}", f)),
        (TypeDesc::Primitive(Primitive::Int), Json::Number(n)) => {
            let i = n.as_i64()?;
            Some(match i32::try_from(i) {
                Ok(_)  => i.to_string(),
                Err(_) => format!("Math.toIntExact({}L)", i),
            })
        }
        (TypeDesc::Primitive(Primitive::Fixed(kind)), Json::Number(n)) => {
            let i = n.as_i64()?;
            Some(match primitive_type(Primitive::Fixed(*kind)) {
                "byte"  => format!("(byte) {}", i),
                "short" => format!("(short) {}", i),
                "long"  => format!("{}L", i),
                _       => i.to_string(),
            })
        }
        _ => None,
    }
}

impl JavaEmitter {
    fn field_decl(&self, field: &Field, pad: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let member = escape_java_keyword(&field.name);
        let ty = self.type_str(&field.ty);
        let required = !matches!(field.ty, TypeDesc::Optional(_)) && field.default.is_none();

        lines.push(format!("{}@JsonProperty({})", pad, quote(&field.name)));
        match sdgen_schema::access::unwrap_optional(&field.ty) {
            TypeDesc::List(elem) => {
                lines.push(format!("{}@XmlElementWrapper(name = {})", pad, quote(&field.name)));
                lines.push(format!("{}@XmlElement(name = {})", pad, quote(&elem.item_name())));
            }
            _ if required => lines.push(format!(
                "{}@XmlElement(name = {}, required = true)",
                pad,
                quote(&field.name)
            )),
            _ => lines.push(format!("{}@XmlElement(name = {})", pad, quote(&field.name))),
        }

        let initializer = match field.default {
            Some(ref default) => default_literal(&field.ty, default),
            None if matches!(field.ty, TypeDesc::List(_)) => Some("new ArrayList<>()".to_string()),
            None => None,
        };
        match initializer {
            Some(init) => lines.push(format!("{}public {} {} = {};", pad, ty, member, init)),
            None => lines.push(format!("{}public {} {};", pad, ty, member)),
        }
        lines
    }

    fn class_body(&self, record: &Record, level: usize) -> Vec<String> {
        let pad = "    ".repeat(level);
        let name = record.name();
        let members: Vec<String> = record.fields().iter().map(|f| escape_java_keyword(&f.name)).collect();
        let mut lines = Vec::new();

        for field in record.fields() {
            lines.extend(self.field_decl(field, &pad));
            lines.push("".to_string());
        }

        lines.push(format!("{}public {}() {{}}", pad, name));
        if !record.fields().is_empty() {
            lines.push("".to_string());
            let params: Vec<String> = record
                .fields()
                .iter()
                .zip(&members)
                .map(|(f, m)| format!("{} {}", self.type_str(&f.ty), m))
                .collect();
            lines.push(format!("{}public {}({}) {{", pad, name, params.join(", ")));
            for member in &members {
                lines.push(format!("{}    this.{} = {};", pad, member, member));
            }
            lines.push(format!("{}}}", pad));
        }
        lines.push("".to_string());

        lines.push(format!("{}@Override", pad));
        lines.push(format!("{}public boolean equals(Object other) {{", pad));
        lines.push(format!("{}    if (this == other) return true;", pad));
        lines.push(format!("{}    if (!(other instanceof {})) return false;", pad, name));
        if members.is_empty() {
            lines.push(format!("{}    return true;", pad));
        } else {
            lines.push(format!("{}    {} that = ({}) other;", pad, name, name));
            let comparisons: Vec<String> = members
                .iter()
                .map(|m| format!("Objects.equals({m}, that.{m})", m = m))
                .collect();
            let separator = format!("\n{}        && ", pad);
            lines.push(format!("{}    return {};", pad, comparisons.join(&separator)));
        }
        lines.push(format!("{}}}", pad));
        lines.push("".to_string());

        lines.push(format!("{}@Override", pad));
        lines.push(format!("{}public int hashCode() {{", pad));
        lines.push(format!("{}    return Objects.hash({});", pad, members.join(", ")));
        lines.push(format!("{}}}", pad));
        lines.push("".to_string());

        let parts: Vec<String> = members.iter().map(|m| format!("{m}=\" + {m} + \"", m = m)).collect();
        lines.push(format!("{}@Override", pad));
        lines.push(format!("{}public String toString() {{", pad));
        lines.push(format!("{}    return \"{}({})\";", pad, name, parts.join(", ")));
        lines.push(format!("{}}}", pad));
        lines
    }
}

fn generate_entry_points(name: &str) -> Vec<String> {
    vec![
        "    public String toJson() throws IOException {".to_string(),
        "        return JSON.writeValueAsString(this);".to_string(),
        "    }".to_string(),
        "".to_string(),
        format!("    public static {} fromJson(String json) throws IOException {{", name),
        format!("        return JSON.readValue(json, {}.class);", name),
        "    }".to_string(),
        "".to_string(),
        "    public String toYaml() throws IOException {".to_string(),
        "        return YAML.writeValueAsString(this);".to_string(),
        "    }".to_string(),
        "".to_string(),
        format!("    public static {} fromYaml(String yaml) throws IOException {{", name),
        format!("        return YAML.readValue(yaml, {}.class);", name),
        "    }".to_string(),
        "".to_string(),
        "    public String toXml() throws JAXBException {".to_string(),
        format!("        Marshaller marshaller = JAXBContext.newInstance({}.class).createMarshaller();", name),
        "        marshaller.setProperty(Marshaller.JAXB_FORMATTED_OUTPUT, Boolean.TRUE);".to_string(),
        "        StringWriter writer = new StringWriter();".to_string(),
        "        marshaller.marshal(this, writer);".to_string(),
        "        return writer.toString();".to_string(),
        "    }".to_string(),
        "".to_string(),
        format!("    public static {} fromXml(String xml) throws JAXBException {{", name),
        format!(
            "        return ({}) JAXBContext.newInstance({}.class).createUnmarshaller().unmarshal(new StringReader(xml));",
            name, name
        ),
        "    }".to_string(),
        "".to_string(),
        "    public void toJsonFile(Path path) throws IOException {".to_string(),
        "        Files.writeString(path, toJson());".to_string(),
        "    }".to_string(),
        "".to_string(),
        format!("    public static {} fromJsonFile(Path path) throws IOException {{", name),
        "        return fromJson(Files.readString(path));".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    public void toYamlFile(Path path) throws IOException {".to_string(),
        "        Files.writeString(path, toYaml());".to_string(),
        "    }".to_string(),
        "".to_string(),
        format!("    public static {} fromYamlFile(Path path) throws IOException {{", name),
        "        return fromYaml(Files.readString(path));".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    public void toXmlFile(Path path) throws IOException, JAXBException {".to_string(),
        "        Files.writeString(path, toXml());".to_string(),
        "    }".to_string(),
        "".to_string(),
        format!("    public static {} fromXmlFile(Path path) throws IOException, JAXBException {{", name),
        "        return fromXml(Files.readString(path));".to_string(),
        "    }".to_string(),
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
            .field("history", TypeDesc::list(TypeDesc::record(&address)))
            .field_with_default("retries", TypeDesc::fixed(IntKind::U32), json!(3))
            .build()
            .unwrap()
    }

    #[test]
    fn test_type_mapping_widens_unsigned() {
        let emitter = JavaEmitter::new(None);
        assert_eq!(emitter.type_str(&TypeDesc::fixed(IntKind::U8)), "short");
        assert_eq!(emitter.type_str(&TypeDesc::fixed(IntKind::U16)), "int");
        assert_eq!(emitter.type_str(&TypeDesc::fixed(IntKind::U32)), "long");
        assert_eq!(emitter.type_str(&TypeDesc::optional(TypeDesc::int())), "Integer");
        assert_eq!(emitter.type_str(&TypeDesc::list(TypeDesc::fixed(IntKind::I8))), "List<Byte>");
    }

    #[test]
    fn test_class_layout() {
        let code = JavaEmitter::new(Some("com.example.model".to_string())).generate_definition(&person());
        assert!(code.contains("package com.example.model;"));
        assert!(code.contains("@XmlRootElement(name = \"Person\")\n@XmlAccessorType(XmlAccessType.FIELD)\npublic class Person {"));
        assert!(code.contains("    public int id;"));
        assert!(code.contains("    public Integer age;"));
        assert!(code.contains("    @XmlElementWrapper(name = \"hobbies\")\n    @XmlElement(name = \"string\")\n    public List<String> hobbies;"));
        assert!(code.contains("    public List<Address> history = new ArrayList<>();"));
        assert!(code.contains("    public long retries = 3L;"));
        assert!(code.contains("    public static class Address {"));
        assert_eq!(code.matches("public static class Address").count(), 1);
    }

    #[test]
    fn test_entry_points() {
        let code = JavaEmitter::new(None).generate_definition(&person());
        assert!(!code.contains("package "));
        for needle in [
            "public String toJson()",
            "public static Person fromJson(String json)",
            "public String toYaml()",
            "public static Person fromYaml(String yaml)",
            "public String toXml()",
            "public static Person fromXml(String xml)",
            "public static Person fromXmlFile(Path path)",
        ] {
            assert!(code.contains(needle), "missing {}", needle);
        }
        assert!(!code.contains("public static Address fromJson"));
    }

    #[test]
    fn test_constructors_and_equality() {
        let code = JavaEmitter::new(None).generate_definition(&person());
        assert!(code.contains("    public Person() {}"));
        assert!(code.contains("public Person(String name, Integer age, int id, List<String> hobbies, List<Address> history, long retries) {"));
        assert!(code.contains("return Objects.hash(name, age, id, hobbies, history, retries);"));
        assert!(code.contains("        public Address() {}"));
    }

    #[test]
    fn test_record_and_wide_defaults() {
        let address = Record::builder("Address")
            .field("city", TypeDesc::string())
            .field_with_default("country", TypeDesc::string(), json!("NZ"))
            .field("lines", TypeDesc::optional(TypeDesc::list(TypeDesc::string())))
            .build()
            .unwrap();
        let marker = Record::builder("Marker").build().unwrap();
        let person = Record::builder("Person")
            .field_with_default("home", TypeDesc::record(&address), json!({ "city": "Wellington" }))
            .field_with_default("flag", TypeDesc::record(&marker), json!({}))
            .field_with_default("big", TypeDesc::int(), json!(5_000_000_000i64))
            .field_with_default("small", TypeDesc::int(), json!(12))
            .field_with_default("nick", TypeDesc::optional(TypeDesc::string()), json!(null))
            .field_with_default("scores", TypeDesc::list(TypeDesc::fixed(IntKind::U32)), json!([1, 2]))
            .build()
            .unwrap();
        let code = JavaEmitter::new(None).generate_definition(&person);

        assert!(code.contains("    public Address home = new Address(\"Wellington\", \"NZ\", null);"), "{}", code);
        assert!(code.contains("    public Marker flag = new Marker();"));
        assert!(code.contains("    public int big = Math.toIntExact(5000000000L);"));
        assert!(code.contains("    public int small = 12;"));
        assert!(code.contains("    public String nick = null;"));
        assert!(code.contains("    public List<Long> scores = new ArrayList<>(Arrays.asList(1L, 2L));"));
    }
}
