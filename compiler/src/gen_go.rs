//! Go structs with explicit `json`, `yaml` and `xml` field tags.
//!
//! Every record gets a `New<Record>()` constructor carrying the field
//! defaults, with required lists set to empty slices. JSON and YAML decode
//! into that value, so keys missing from a document keep their defaults.
//! `encoding/xml` appends to slices that already hold items, so XML decodes
//! into the zero value instead; every writer emits all fields, so only
//! hand-written XML can miss a default.
//! After each decode `normalize()` turns nil required slices back into
//! empty ones, so an empty list is written as `[]` and not `null`.
//!
//! Limitations of the Go toolchain that the output does not paper over:
//! - `encoding/json` writes `[]uint8` as base64 text, so a list of `u8`
//!   round-trips through Go but not through the other targets' JSON.
//! - `encoding/xml` cannot read an element back into `interface{}`, so
//!   dynamic fields are written to XML but come back empty.

use sdgen_schema::{access::unwrap_optional, Field, IntKind, Primitive, Record, TypeDesc, WireFormat};
use serde_json::Value as Json;

use crate::{
    language::Language,
    traits::Emitter,
    utils::{quote, to_pascal_case},
};

pub struct GoEmitter {
    package: String,
}

const FORMATS: &[WireFormat] = &[WireFormat::Json, WireFormat::Yaml, WireFormat::Xml];

const PRELUDE: &str = "func sdgenPtr[T any](v T) *T {\n\treturn &v\n}\n";

impl GoEmitter {
    pub fn new(package: impl Into<String>) -> GoEmitter {
        GoEmitter { package: package.into() }
    }
}

impl Emitter for GoEmitter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn formats(&self) -> &'static [WireFormat] {
        FORMATS
    }

    fn type_str(&self, ty: &TypeDesc) -> String {
        match ty {
            TypeDesc::Primitive(p)    => primitive_type(*p).to_string(),
            TypeDesc::Record(r)       => to_pascal_case(r.name()),
            TypeDesc::List(elem)      => format!("[]{}", self.type_str(elem)),
            TypeDesc::Optional(inner) => format!("*{}", self.type_str(inner)),
            TypeDesc::Dynamic         => "interface{}".to_string(),
        }
    }

    fn generate_definition(&self, record: &Record) -> String {
        let mut go_code: Vec<String> = Vec::new();

        go_code.push("// Code generated by sdgen. DO NOT EDIT.".to_string());
        go_code.push("".to_string());
        go_code.push(format!("package {}", self.package));
        go_code.push("".to_string());
        go_code.push("import (".to_string());
        go_code.push("\t\"encoding/json\"".to_string());
        go_code.push("\t\"encoding/xml\"".to_string());
        go_code.push("\t\"os\"".to_string());
        go_code.push("".to_string());
        go_code.push("\t\"gopkg.in/yaml.v3\"".to_string());
        go_code.push(")".to_string());
        go_code.push("".to_string());
        go_code.push(PRELUDE.to_string());

        for nested in record.dependency_order() {
            go_code.push(self.generate_struct(nested, nested.name() == record.name()));
            go_code.push(self.generate_constructor(nested));
            go_code.push(self.generate_normalize(nested));
        }

        go_code.push(generate_entry_points(&to_pascal_case(record.name())));
        go_code.join("\n")
    }
}

fn primitive_type(p: Primitive) -> &'static str {
    match p {
        Primitive::String => "string",
        Primitive::Float  => "float64",
        Primitive::Int    => "int",
        Primitive::Bool   => "bool",
        Primitive::Fixed(kind) => match kind {
            IntKind::I8  => "int8",
            IntKind::U8  => "uint8",
            IntKind::I16 => "int16",
            IntKind::U16 => "uint16",
            IntKind::I32 => "int32",
            IntKind::U32 => "uint32",
        },
    }
}

fn member_name(field: &Field) -> String {
    to_pascal_case(&field.name)
}

/// `(name, type, tag)` rows laid out in columns, the way gofmt aligns them.
fn aligned(rows: &[(String, String, String)]) -> Vec<String> {
    let name_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0);
    let type_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(name, ty, tag)| {
            format!(
                "\t{:name_width$} {:type_width$} {}",
                name,
                ty,
                tag,
                name_width = name_width,
                type_width = type_width
            )
        })
        .collect()
}

impl GoEmitter {
    fn generate_struct(&self, record: &Record, is_root: bool) -> String {
        let mut rows: Vec<(String, String, String)> = Vec::new();

        if is_root {
            rows.push((
                "XMLName".to_string(),
                "xml.Name".to_string(),
                format!("`json:\"-\" yaml:\"-\" xml:\"{}\"`", record.name()),
            ));
        }
        for field in record.fields() {
            let optional = matches!(field.ty, TypeDesc::Optional(_));
            let omit = if optional { ",omitempty" } else { "" };
            let xml_tag = match unwrap_optional(&field.ty) {
                TypeDesc::List(elem) => format!("{}>{}", field.name, elem.item_name()),
                _ => format!("{}{}", field.name, omit),
            };
            rows.push((
                member_name(field),
                self.type_str(&field.ty),
                format!("`json:\"{n}{o}\" yaml:\"{n}{o}\" xml:\"{x}\"`", n = field.name, o = omit, x = xml_tag),
            ));
        }

        let mut lines = vec![format!("type {} struct {{", to_pascal_case(record.name()))];
        lines.extend(aligned(&rows));
        lines.push("}".to_string());
        lines.push("".to_string());
        lines.join("\n")
    }

    /// `New<Record>()`: field defaults, empty required lists and constructed
    /// nested records.
    fn generate_constructor(&self, record: &Record) -> String {
        let name = to_pascal_case(record.name());
        let inits: Vec<(String, String)> = record
            .fields()
            .iter()
            .filter_map(|f| self.value_expr(&f.ty, f.default.as_ref()).map(|e| (member_name(f), e)))
            .collect();

        let mut lines = vec![format!("func New{}() {} {{", name, name)];
        if inits.is_empty() {
            lines.push(format!("\treturn {}{{}}", name));
        } else {
            let width = inits.iter().map(|(m, _)| m.len() + 1).max().unwrap_or(0);
            lines.push(format!("\treturn {}{{", name));
            for (member, expr) in inits {
                lines.push(format!("\t\t{:width$} {},", format!("{}:", member), expr, width = width));
            }
            lines.push("\t}".to_string());
        }
        lines.push("}".to_string());
        lines.push("".to_string());
        lines.join("\n")
    }

    /// Go expression for a field of type `ty` starting out as `value`, or
    /// `None` when the zero value already is that.
    fn value_expr(&self, ty: &TypeDesc, value: Option<&Json>) -> Option<String> {
        match (ty, value) {
            (TypeDesc::Optional(inner), Some(v)) if !v.is_null() => {
                let expr = self.value_expr(inner, Some(v))?;
                Some(format!("sdgenPtr[{}]({})", self.type_str(inner), expr))
            }
            (TypeDesc::Optional(_), _) => None,
            (TypeDesc::List(elem), Some(Json::Array(items))) => {
                let exprs = items
                    .iter()
                    .map(|item| self.value_expr(elem, Some(item)).or_else(|| zero_expr(self, elem)))
                    .collect::<Option<Vec<_>>>()?;
                Some(format!("{}{{{}}}", self.type_str(ty), exprs.join(", ")))
            }
            (TypeDesc::List(_), None) => Some(format!("{}{{}}", self.type_str(ty))),
            (TypeDesc::Record(r), None) => Some(format!("New{}()", to_pascal_case(r.name()))),
            (TypeDesc::Record(r), Some(Json::Object(map))) => {
                let inits: Vec<String> = r
                    .fields()
                    .iter()
                    .filter_map(|f| {
                        let value = map.get(&f.name).or(f.default.as_ref());
                        self.value_expr(&f.ty, value).map(|e| format!("{}: {}", member_name(f), e))
                    })
                    .collect();
                Some(format!("{}{{{}}}", to_pascal_case(r.name()), inits.join(", ")))
            }
            (TypeDesc::Primitive(Primitive::String), Some(Json::String(s))) => Some(quote(s)),
            (TypeDesc::Primitive(Primitive::Bool), Some(Json::Bool(b))) => Some(b.to_string()),
            (TypeDesc::Primitive(Primitive::Float), Some(Json::Number(n))) => {
                n.as_f64().map(|f| format!("{:?}", f))
            }
            (TypeDesc::Primitive(_), Some(Json::Number(n))) => Some(n.to_string()),
            _ => None,
        }
    }

    /// `normalize` turns slices left nil by a decoder back into empty ones,
    /// so a required empty list is written as `[]` and not `null`.
    fn generate_normalize(&self, record: &Record) -> String {
        let mut body: Vec<String> = Vec::new();
        for field in record.fields() {
            let member = format!("m.{}", member_name(field));
            body.extend(normalize_stmts(self, &field.ty, &member, "\t"));
        }

        let mut lines = vec![format!("func (m *{}) normalize() {{", to_pascal_case(record.name()))];
        lines.extend(body);
        lines.push("}".to_string());
        lines.push("".to_string());
        lines.join("\n")
    }
}

fn zero_expr(emitter: &GoEmitter, ty: &TypeDesc) -> Option<String> {
    match ty {
        TypeDesc::Optional(_) | TypeDesc::Dynamic => Some("nil".to_string()),
        _ => emitter.value_expr(ty, None),
    }
}

fn normalize_stmts(emitter: &GoEmitter, ty: &TypeDesc, expr: &str, indent: &str) -> Vec<String> {
    match ty {
        TypeDesc::Record(_) => vec![format!("{}{}.normalize()", indent, expr)],
        TypeDesc::Optional(inner) => match inner.as_ref() {
            TypeDesc::Record(_) => vec![
                format!("{}if {} != nil {{", indent, expr),
                format!("{}\t{}.normalize()", indent, expr),
                format!("{}}}", indent),
            ],
            _ => Vec::new(),
        },
        TypeDesc::List(elem) => {
            let mut lines = vec![
                format!("{}if {} == nil {{", indent, expr),
                format!("{}\t{} = {}{{}}", indent, expr, emitter.type_str(ty)),
                format!("{}}}", indent),
            ];
            let item = format!("{}[i]", expr);
            let inner = normalize_stmts(emitter, elem, &item, &format!("{}\t", indent));
            if !inner.is_empty() && matches!(elem.as_ref(), TypeDesc::Record(_) | TypeDesc::Optional(_)) {
                lines.push(format!("{}for i := range {} {{", indent, expr));
                lines.extend(inner);
                lines.push(format!("{}}}", indent));
            }
            lines
        }
        TypeDesc::Primitive(_) | TypeDesc::Dynamic => Vec::new(),
    }
}

fn generate_entry_points(name: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("func (m *{}) ToJSON() (string, error) {{", name));
    lines.push("\tb, err := json.MarshalIndent(m, \"\", \"  \")".to_string());
    lines.push("\treturn string(b), err".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());
    lines.push(format!("func {}FromJSON(data string) (*{}, error) {{", name, name));
    lines.push(format!("\tm := New{}()", name));
    lines.push("\tif err := json.Unmarshal([]byte(data), &m); err != nil {".to_string());
    lines.push("\t\treturn nil, err".to_string());
    lines.push("\t}".to_string());
    lines.push("\tm.normalize()".to_string());
    lines.push("\treturn &m, nil".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());

    lines.push(format!("func (m *{}) ToYAML() (string, error) {{", name));
    lines.push("\tb, err := yaml.Marshal(m)".to_string());
    lines.push("\treturn string(b), err".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());
    lines.push(format!("func {}FromYAML(data string) (*{}, error) {{", name, name));
    lines.push(format!("\tm := New{}()", name));
    lines.push("\tif err := yaml.Unmarshal([]byte(data), &m); err != nil {".to_string());
    lines.push("\t\treturn nil, err".to_string());
    lines.push("\t}".to_string());
    lines.push("\tm.normalize()".to_string());
    lines.push("\treturn &m, nil".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());

    lines.push(format!("func (m *{}) ToXML() (string, error) {{", name));
    lines.push("\tb, err := xml.MarshalIndent(m, \"\", \"  \")".to_string());
    lines.push("\tif err != nil {".to_string());
    lines.push("\t\treturn \"\", err".to_string());
    lines.push("\t}".to_string());
    lines.push("\treturn xml.Header + string(b), nil".to_string());
    lines.push("}".to_string());
    lines.push("".to_string());
    lines.push(format!("func {}FromXML(data string) (*{}, error) {{", name, name));
    lines.push(format!("\tvar m {}", name));
    lines.push("\tif err := xml.Unmarshal([]byte(data), &m); err != nil {".to_string());
    lines.push("\t\treturn nil, err".to_string());
    lines.push("\t}".to_string());
    lines.push("\tm.normalize()".to_string());
    lines.push("\treturn &m, nil".to_string());
    lines.push("}".to_string());

    for format in ["JSON", "YAML", "XML"] {
        lines.push("".to_string());
        lines.push(format!("func (m *{}) To{}File(path string) error {{", name, format));
        lines.push(format!("\ttext, err := m.To{}()", format));
        lines.push("\tif err != nil {".to_string());
        lines.push("\t\treturn err".to_string());
        lines.push("\t}".to_string());
        lines.push("\treturn os.WriteFile(path, []byte(text), 0o644)".to_string());
        lines.push("}".to_string());
        lines.push("".to_string());
        lines.push(format!("func {}From{}File(path string) (*{}, error) {{", name, format, name));
        lines.push("\tdata, err := os.ReadFile(path)".to_string());
        lines.push("\tif err != nil {".to_string());
        lines.push("\t\treturn nil, err".to_string());
        lines.push("\t}".to_string());
        lines.push(format!("\treturn {}From{}(string(data))", name, format));
        lines.push("}".to_string());
    }
    lines.push("".to_string());

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
            .build()
            .unwrap();
        Record::builder("Person")
            .field("name", TypeDesc::string())
            .field("age", TypeDesc::optional(TypeDesc::int()))
            .field("id", TypeDesc::fixed(IntKind::U16))
            .field("hobbies", TypeDesc::optional(TypeDesc::list(TypeDesc::string())))
            .field("home", TypeDesc::record(&address))
            .build()
            .unwrap()
    }

    #[test]
    fn test_type_mapping() {
        let emitter = GoEmitter::new("model");
        assert_eq!(emitter.type_str(&TypeDesc::fixed(IntKind::U16)), "uint16");
        assert_eq!(emitter.type_str(&TypeDesc::optional(TypeDesc::int())), "*int");
        assert_eq!(emitter.type_str(&TypeDesc::list(TypeDesc::Dynamic)), "[]interface{}");
    }

    #[test]
    fn test_struct_tags() {
        let code = GoEmitter::new("people").generate_definition(&person());
        assert!(code.starts_with("// Code generated by sdgen. DO NOT EDIT."));
        assert!(code.contains("package people"));
        assert!(code.contains("\tXMLName xml.Name  `json:\"-\" yaml:\"-\" xml:\"Person\"`\n"));
        assert!(code.contains("\tName    string    `json:\"name\" yaml:\"name\" xml:\"name\"`\n"));
        assert!(code.contains("\tAge     *int      `json:\"age,omitempty\" yaml:\"age,omitempty\" xml:\"age,omitempty\"`\n"));
        assert!(code.contains("\tId      uint16    `json:\"id\" yaml:\"id\" xml:\"id\"`\n"));
        assert!(code.contains(
            "\tHobbies *[]string `json:\"hobbies,omitempty\" yaml:\"hobbies,omitempty\" xml:\"hobbies>string\"`\n"
        ));
        assert!(code.contains("\tHome    Address   `json:\"home\" yaml:\"home\" xml:\"home\"`\n"));
        assert_eq!(code.matches("XMLName").count(), 1);
        assert!(code.find("type Address struct").unwrap() < code.find("type Person struct").unwrap());
    }

    #[test]
    fn test_constructor_carries_defaults() {
        let record = Record::builder("Job")
            .field("name", TypeDesc::string())
            .field_with_default("retries", TypeDesc::fixed(IntKind::U8), json!(7))
            .field_with_default("label", TypeDesc::optional(TypeDesc::string()), json!("batch"))
            .field_with_default("tags", TypeDesc::list(TypeDesc::string()), json!(["a", "b"]))
            .field("steps", TypeDesc::list(TypeDesc::int()))
            .build()
            .unwrap();
        let code = GoEmitter::new("model").generate_definition(&record);

        let constructor = "func NewJob() Job {\n\treturn Job{\n\
            \t\tRetries: 7,\n\
            \t\tLabel:   sdgenPtr[string](\"batch\"),\n\
            \t\tTags:    []string{\"a\", \"b\"},\n\
            \t\tSteps:   []int{},\n\
            \t}\n}\n";
        assert!(code.contains(constructor), "{}", code);
        assert!(code.contains("func JobFromJSON(data string) (*Job, error) {\n\tm := NewJob()\n"));
        assert!(code.contains("func JobFromYAML(data string) (*Job, error) {\n\tm := NewJob()\n"));
    }

    #[test]
    fn test_nested_record_defaults() {
        let address = Record::builder("Address")
            .field("city", TypeDesc::string())
            .field_with_default("country", TypeDesc::string(), json!("NZ"))
            .build()
            .unwrap();
        let person = Record::builder("Person")
            .field("home", TypeDesc::record(&address))
            .field_with_default("work", TypeDesc::record(&address), json!({ "city": "Wellington" }))
            .build()
            .unwrap();
        let code = GoEmitter::new("model").generate_definition(&person);

        assert!(code.contains("func NewAddress() Address {\n\treturn Address{\n\t\tCountry: \"NZ\",\n\t}\n}"));
        assert!(code.contains("\t\tHome: NewAddress(),\n"));
        assert!(code.contains("\t\tWork: Address{City: \"Wellington\", Country: \"NZ\"},\n"));
    }

    #[test]
    fn test_empty_lists_survive_decoding() {
        let address = Record::builder("Address")
            .field("lines", TypeDesc::list(TypeDesc::string()))
            .build()
            .unwrap();
        let person = Record::builder("Person")
            .field("hobbies", TypeDesc::list(TypeDesc::string()))
            .field("history", TypeDesc::list(TypeDesc::record(&address)))
            .field("work", TypeDesc::optional(TypeDesc::record(&address)))
            .build()
            .unwrap();
        let code = GoEmitter::new("model").generate_definition(&person);

        assert!(code.contains("func (m *Address) normalize() {\n\tif m.Lines == nil {\n\t\tm.Lines = []string{}\n\t}\n}"));
        assert!(code.contains("\tif m.Hobbies == nil {\n\t\tm.Hobbies = []string{}\n\t}\n"));
        assert!(code.contains("\tfor i := range m.History {\n\t\tm.History[i].normalize()\n\t}\n"));
        assert!(code.contains("\tif m.Work != nil {\n\t\tm.Work.normalize()\n\t}\n"));
        assert!(code.contains("func PersonFromXML(data string) (*Person, error) {\n\tvar m Person\n"));
        assert_eq!(code.matches("\tm.normalize()\n").count(), 3);
    }

    #[test]
    fn test_entry_points() {
        let code = GoEmitter::new("model").generate_definition(&person());
        for needle in [
            "func (m *Person) ToJSON() (string, error)",
            "func PersonFromJSON(data string) (*Person, error)",
            "func (m *Person) ToYAML() (string, error)",
            "func PersonFromYAML(data string) (*Person, error)",
            "func (m *Person) ToXML() (string, error)",
            "func PersonFromXML(data string) (*Person, error)",
            "func (m *Person) ToXMLFile(path string) error",
            "func PersonFromYAMLFile(path string) (*Person, error)",
        ] {
            assert!(code.contains(needle), "missing {}", needle);
        }
        assert!(!code.contains("func AddressFromJSON"));
    }
}
