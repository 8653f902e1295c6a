use sdgen_schema::{Field, IntKind, Primitive, Record, TypeDesc, WireFormat};

use crate::{
    language::Language,
    traits::Emitter,
    utils::{escape_rust_keyword, quote, to_snake_case},
};

/// Emits serde-derived structs. XML goes through small hand-written
/// `write_xml`/`read_xml` methods on top of `roxmltree`, since list items are
/// tagged by schema type name.
pub struct RustEmitter;

const FORMATS: &[WireFormat] = &[WireFormat::Json, WireFormat::Yaml, WireFormat::Xml];

const PRELUDE: &str = r#"pub type SdgenResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn xml_leaf(out: &mut String, tag: &str, text: &str) {
    if text.is_empty() {
        out.push_str(&format!("<{}/>", tag));
    } else {
        out.push_str(&format!("<{}>{}</{}>", tag, xml_escape(text), tag));
    }
}

fn xml_child<'a, 'input>(node: roxmltree::Node<'a, 'input>, tag: &str) -> Option<roxmltree::Node<'a, 'input>> {
    node.children().find(|c| c.is_element() && c.has_tag_name(tag))
}

fn xml_text(node: roxmltree::Node) -> String {
    node.text().unwrap_or("").to_string()
}

fn xml_is_empty(node: roxmltree::Node) -> bool {
    !node.children().any(|c| c.is_element()) && node.text().map_or(true, |t| t.trim().is_empty())
}

fn xml_items<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    tag: &str,
) -> SdgenResult<Vec<roxmltree::Node<'a, 'input>>> {
    node.children()
        .filter(|c| c.is_element())
        .map(|c| {
            if c.has_tag_name(tag) {
                Ok(c)
            } else {
                Err(format!("expected <{}> list item, found <{}>", tag, c.tag_name().name()).into())
            }
        })
        .collect()
}"#;

impl Emitter for RustEmitter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn formats(&self) -> &'static [WireFormat] {
        FORMATS
    }

    fn type_str(&self, ty: &TypeDesc) -> String {
        match ty {
            TypeDesc::Primitive(p)    => primitive_type(*p).to_string(),
            TypeDesc::Record(r)       => r.name().to_string(),
            TypeDesc::List(elem)      => format!("Vec<{}>", self.type_str(elem)),
            TypeDesc::Optional(inner) => format!("Option<{}>", self.type_str(inner)),
            TypeDesc::Dynamic         => "serde_json::Value".to_string(),
        }
    }

    fn generate_definition(&self, record: &Record) -> String {
        let mut rust_code: Vec<String> = Vec::new();

        rust_code.push("// Generated by sdgen. Do not edit.".to_string());
        rust_code.push("// Dependencies: serde (derive), serde_json, serde_yaml, roxmltree.".to_string());
        rust_code.push("#![allow(dead_code)]".to_string());
        rust_code.push("".to_string());
        rust_code.push("use serde::{Deserialize, Serialize};".to_string());
        rust_code.push("use std::path::Path;".to_string());
        rust_code.push("".to_string());
        rust_code.push(PRELUDE.to_string());
        rust_code.push("".to_string());

        for nested in record.dependency_order() {
            rust_code.push(self.generate_struct(nested));
            rust_code.push(self.generate_xml_impl(nested));
        }

        rust_code.push(generate_entry_points(record.name()));
        rust_code.join("\n")
    }
}

fn primitive_type(p: Primitive) -> &'static str {
    match p {
        Primitive::String => "String",
        Primitive::Float  => "f64",
        Primitive::Int    => "i64",
        Primitive::Bool   => "bool",
        Primitive::Fixed(kind) => match kind {
            IntKind::I8  => "i8",
            IntKind::U8  => "u8",
            IntKind::I16 => "i16",
            IntKind::U16 => "u16",
            IntKind::I32 => "i32",
            IntKind::U32 => "u32",
        },
    }
}

fn member_name(field: &Field) -> String {
    escape_rust_keyword(&to_snake_case(&field.name))
}

/// A raw string literal whose `#` delimiter is longer than any `"#` run in `text`.
fn raw_string(text: &str) -> String {
    let mut longest = 0;
    for (i, _) in text.match_indices('"') {
        let run = text[i + 1..].chars().take_while(|&c| c == '#').count();
        longest = longest.max(run);
    }
    let hashes = "#".repeat(longest + 1);
    format!("r{h}\"{t}\"{h}", h = hashes, t = text)
}

fn default_fn_name(record: &Record, field: &Field) -> String {
    format!("default_{}_{}", to_snake_case(record.name()), to_snake_case(&field.name))
}

impl RustEmitter {
    fn generate_struct(&self, record: &Record) -> String {
        let mut fields = Vec::new();
        let mut default_fns = Vec::new();

        for field in record.fields() {
            let member = member_name(field);
            let field_type = self.type_str(&field.ty);
            if member.trim_start_matches("r#") != field.name {
                fields.push(format!("    #[serde(rename = {})]", quote(&field.name)));
            }
            if let Some(ref default) = field.default {
                let fn_name = default_fn_name(record, field);
                fields.push(format!("    #[serde(default = {})]", quote(&fn_name)));
                default_fns.push(format!(
                    "fn {}() -> {} {{\n    serde_json::from_str({}).unwrap_or_default()\n}}\n",
                    fn_name,
                    field_type,
                    raw_string(&default.to_string())
                ));
            } else if matches!(field.ty, TypeDesc::Optional(_)) {
                fields.push("    #[serde(default)]".to_string());
            }
            fields.push(format!("    pub {}: {},", member, field_type));
        }

        let derived = "#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]";
        let struct_def = format!(
            "{}\npub struct {} {{\n{}\n}}\n",
            derived,
            record.name(),
            fields.join("\n")
        );

        if default_fns.is_empty() {
            struct_def
        } else {
            format!("{}\n{}", struct_def, default_fns.join("\n"))
        }
    }

    fn generate_xml_impl(&self, record: &Record) -> String {
        let mut impl_lines = Vec::new();

        impl_lines.push(format!("impl {} {{", record.name()));
        impl_lines.push("    fn write_xml(&self, out: &mut String, tag: &str) {".to_string());
        impl_lines.push("        out.push_str(&format!(\"<{}>\", tag));".to_string());
        for field in record.fields() {
            let expr = format!("self.{}", member_name(field));
            impl_lines.extend(self.xml_write(&field.ty, &expr, &quote(&field.name), 0, 2));
        }
        impl_lines.push("        out.push_str(&format!(\"</{}>\", tag));".to_string());
        impl_lines.push("    }".to_string());
        impl_lines.push("".to_string());

        impl_lines.push("    fn read_xml(node: roxmltree::Node) -> SdgenResult<Self> {".to_string());
        impl_lines.push("        let mut value = Self::default();".to_string());
        for field in record.fields() {
            let member = member_name(field);
            impl_lines.push(format!("        if let Some(child) = xml_child(node, {}) {{", quote(&field.name)));
            impl_lines.push(format!(
                "            value.{} = {};",
                member,
                self.xml_read(&field.ty, "child", 0)
            ));
            impl_lines.push("        } else {".to_string());
            if field.default.is_some() {
                impl_lines.push(format!("            value.{} = {}();", member, default_fn_name(record, field)));
            } else if matches!(field.ty, TypeDesc::Optional(_)) {
                impl_lines.push(format!("            value.{} = None;", member));
            } else {
                impl_lines.push(format!(
                    "            return Err(\"missing element <{}> in <{}>\".into());",
                    field.name,
                    record.name()
                ));
            }
            impl_lines.push("        }".to_string());
        }
        impl_lines.push("        Ok(value)".to_string());
        impl_lines.push("    }".to_string());
        impl_lines.push("}".to_string());
        impl_lines.push("".to_string());

        impl_lines.join("\n")
    }

    /// Statements appending `expr` as element `tag` to `out`.
    fn xml_write(&self, ty: &TypeDesc, expr: &str, tag: &str, depth: usize, indent: usize) -> Vec<String> {
        let pad = "    ".repeat(indent);
        match ty {
            TypeDesc::Primitive(_) | TypeDesc::Dynamic => {
                vec![format!("{}xml_leaf(out, {}, &{}.to_string());", pad, tag, expr)]
            }
            TypeDesc::Record(_) => vec![format!("{}{}.write_xml(out, {});", pad, expr, tag)],
            TypeDesc::Optional(inner) => {
                let present = format!("present{}", depth);
                let mut lines = vec![format!("{}match &{} {{", pad, expr)];
                lines.push(format!("{}    Some({}) => {{", pad, present));
                lines.extend(self.xml_write(inner, &present, tag, depth + 1, indent + 2));
                lines.push(format!("{}    }}", pad));
                lines.push(format!("{}    None => xml_leaf(out, {}, \"\"),", pad, tag));
                lines.push(format!("{}}}", pad));
                lines
            }
            TypeDesc::List(elem) => {
                let item = format!("item{}", depth);
                let mut lines = vec![
                    format!("{}out.push_str(&format!(\"<{{}}>\", {}));", pad, tag),
                    format!("{}for {} in {}.iter() {{", pad, item, expr),
                ];
                lines.extend(self.xml_write(elem, &item, &quote(&elem.item_name()), depth + 1, indent + 1));
                lines.push(format!("{}}}", pad));
                lines.push(format!("{}out.push_str(&format!(\"</{{}}>\", {}));", pad, tag));
                lines
            }
        }
    }

    /// An expression reading element `node` as `ty`; `?` propagates errors.
    fn xml_read(&self, ty: &TypeDesc, node: &str, depth: usize) -> String {
        match ty {
            TypeDesc::Primitive(Primitive::String) => format!("xml_text({})", node),
            TypeDesc::Primitive(p) => format!("xml_text({}).trim().parse::<{}>()?", node, primitive_type(*p)),
            TypeDesc::Dynamic => format!(
                "serde_json::from_str(xml_text({n}).trim()).unwrap_or_else(|_| serde_json::Value::String(xml_text({n})))",
                n = node
            ),
            TypeDesc::Record(r) => format!("{}::read_xml({})?", r.name(), node),
            TypeDesc::Optional(inner) => format!(
                "if xml_is_empty({}) {{ None }} else {{ Some({}) }}",
                node,
                self.xml_read(inner, node, depth)
            ),
            TypeDesc::List(elem) => {
                let item = format!("item{}", depth);
                format!(
                    "xml_items({node}, {tag})?\n                .into_iter()\n                .map(|{item}| -> SdgenResult<{ty}> {{ Ok({read}) }})\n                .collect::<SdgenResult<Vec<_>>>()?",
                    node = node,
                    tag = quote(&elem.item_name()),
                    item = item,
                    ty = self.type_str(elem),
                    read = self.xml_read(elem, &item, depth + 1)
                )
            }
        }
    }
}

fn generate_entry_points(name: &str) -> String {
    let lines = vec![
        format!("impl {} {{", name),
        "    pub fn to_json(&self) -> serde_json::Result<String> {".to_string(),
        "        serde_json::to_string_pretty(self)".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn from_json(text: &str) -> serde_json::Result<Self> {".to_string(),
        "        serde_json::from_str(text)".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {".to_string(),
        "        serde_yaml::to_string(self)".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {".to_string(),
        "        serde_yaml::from_str(text)".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn to_xml(&self) -> String {".to_string(),
        "        let mut out = String::from(\"<?xml version=\\\"1.0\\\" encoding=\\\"UTF-8\\\"?>\\n\");".to_string(),
        format!("        self.write_xml(&mut out, {});", quote(name)),
        "        out".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn from_xml(text: &str) -> SdgenResult<Self> {".to_string(),
        "        let doc = roxmltree::Document::parse(text)?;".to_string(),
        "        let root = doc.root_element();".to_string(),
        format!("        if !root.has_tag_name({}) {{", quote(name)),
        format!(
            "            return Err(format!(\"expected root element <{}>, found <{{}}>\", root.tag_name().name()).into());",
            name
        ),
        "        }".to_string(),
        "        Self::read_xml(root)".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn to_json_file(&self, path: impl AsRef<Path>) -> SdgenResult<()> {".to_string(),
        "        std::fs::write(path, self.to_json()?)?;".to_string(),
        "        Ok(())".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn from_json_file(path: impl AsRef<Path>) -> SdgenResult<Self> {".to_string(),
        "        Ok(Self::from_json(&std::fs::read_to_string(path)?)?)".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> SdgenResult<()> {".to_string(),
        "        std::fs::write(path, self.to_yaml()?)?;".to_string(),
        "        Ok(())".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn from_yaml_file(path: impl AsRef<Path>) -> SdgenResult<Self> {".to_string(),
        "        Ok(Self::from_yaml(&std::fs::read_to_string(path)?)?)".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn to_xml_file(&self, path: impl AsRef<Path>) -> SdgenResult<()> {".to_string(),
        "        std::fs::write(path, self.to_xml())?;".to_string(),
        "        Ok(())".to_string(),
        "    }".to_string(),
        "".to_string(),
        "    pub fn from_xml_file(path: impl AsRef<Path>) -> SdgenResult<Self> {".to_string(),
        "        Self::from_xml(&std::fs::read_to_string(path)?)".to_string(),
        "    }".to_string(),
        "}".to_string(),
    ];
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn person() -> Arc<Record> {
        let address = Record::builder("Address")
            .field("city", TypeDesc::string())
            .field("zipCode", TypeDesc::string())
            .build()
            .unwrap();
        Record::builder("Person")
            .field("name", TypeDesc::string())
            .field("age", TypeDesc::optional(TypeDesc::int()))
            .field("id", TypeDesc::fixed(IntKind::U16))
            .field("type", TypeDesc::string())
            .field("addresses", TypeDesc::list(TypeDesc::record(&address)))
            .field_with_default("tags", TypeDesc::list(TypeDesc::string()), json!(["new"]))
            .field("extra", TypeDesc::Dynamic)
            .build()
            .unwrap()
    }

    #[test]
    fn test_type_mapping() {
        let emitter = RustEmitter;
        assert_eq!(emitter.type_str(&TypeDesc::fixed(IntKind::U16)), "u16");
        assert_eq!(
            emitter.type_str(&TypeDesc::list(TypeDesc::optional(TypeDesc::int()))),
            "Vec<Option<i64>>"
        );
        assert_eq!(emitter.type_str(&TypeDesc::Dynamic), "serde_json::Value");
    }

    #[test]
    fn test_raw_string_outgrows_hash_runs() {
        assert_eq!(raw_string("[\"a\"]"), "r#\"[\"a\"]\"#");
        assert_eq!(raw_string("\"x\"#y\""), "r##\"\"x\"#y\"\"##");

        let record = Record::builder("Note")
            .field_with_default("tag", TypeDesc::string(), json!("a\"#b"))
            .build()
            .unwrap();
        let code = RustEmitter.generate_definition(&record);
        assert!(code.contains("serde_json::from_str(r##\"\"a\\\"#b\"\"##).unwrap_or_default()"));
    }

    #[test]
    fn test_struct_fields() {
        let code = RustEmitter.generate_definition(&person());
        assert!(code.contains("pub struct Person {"));
        assert!(code.contains("    pub name: String,"));
        assert!(code.contains("    #[serde(default)]\n    pub age: Option<i64>,"));
        assert!(code.contains("    pub id: u16,"));
        assert!(code.contains("    pub r#type: String,"));
        assert!(code.contains("    #[serde(rename = \"zipCode\")]\n    pub zip_code: String,"));
        assert!(code.contains("    #[serde(default = \"default_person_tags\")]"));
        assert!(code.contains("fn default_person_tags() -> Vec<String> {"));
        assert!(code.contains("    pub extra: serde_json::Value,"));
    }

    #[test]
    fn test_nested_records_emitted_once_before_root() {
        let code = RustEmitter.generate_definition(&person());
        assert_eq!(code.matches("pub struct Address {").count(), 1);
        assert!(code.find("pub struct Address {").unwrap() < code.find("pub struct Person {").unwrap());
    }

    #[test]
    fn test_xml_code() {
        let code = RustEmitter.generate_definition(&person());
        assert!(code.contains("value.id = xml_text(child).trim().parse::<u16>()?;"));
        assert!(code.contains("xml_items(child, \"Address\")?"));
        assert!(code.contains("Address::read_xml(item0)?"));
        assert!(code.contains("item0.write_xml(out, \"Address\");"));
        assert!(code.contains("return Err(\"missing element <name> in <Person>\".into());"));
        assert!(code.contains("value.tags = default_person_tags();"));
    }

    #[test]
    fn test_entry_points_on_root_only() {
        let code = RustEmitter.generate_definition(&person());
        assert_eq!(code.matches("pub fn to_json(&self)").count(), 1);
        assert!(code.contains("impl Person {\n    pub fn to_json(&self)"));
        for name in ["from_json_file", "to_yaml_file", "from_xml_file"] {
            assert!(code.contains(name), "missing {}", name);
        }
    }
}
