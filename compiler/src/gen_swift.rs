//! Swift `Codable` structs. Foundation ships a JSON coder only, so Swift
//! output reads and writes JSON and nothing else.

use sdgen_schema::{IntKind, Primitive, Record, TypeDesc, WireFormat};
use serde_json::Value as Json;

use crate::{
    language::Language,
    traits::Emitter,
    utils::{escape_swift_keyword, quote},
};

pub struct SwiftEmitter;

const FORMATS: &[WireFormat] = &[WireFormat::Json];

const JSON_VALUE: &str = r#"public enum JSONValue: Codable, Equatable {
    case null
    case bool(Bool)
    case number(Double)
    case string(String)
    case array([JSONValue])
    case object([String: JSONValue])

    public init(from decoder: Decoder) throws {
        let container = try decoder.singleValueContainer()
        if container.decodeNil() {
            self = .null
        } else if let value = try? container.decode(Bool.self) {
            self = .bool(value)
        } else if let value = try? container.decode(Double.self) {
            self = .number(value)
        } else if let value = try? container.decode(String.self) {
            self = .string(value)
        } else if let value = try? container.decode([JSONValue].self) {
            self = .array(value)
        } else {
            self = .object(try container.decode([String: JSONValue].self))
        }
    }

    public func encode(to encoder: Encoder) throws {
        var container = encoder.singleValueContainer()
        switch self {
        case .null:              try container.encodeNil()
        case .bool(let value):   try container.encode(value)
        case .number(let value): try container.encode(value)
        case .string(let value): try container.encode(value)
        case .array(let value):  try container.encode(value)
        case .object(let value): try container.encode(value)
        }
    }
}
"#;

impl Emitter for SwiftEmitter {
    fn language(&self) -> Language {
        Language::Swift
    }

    fn formats(&self) -> &'static [WireFormat] {
        FORMATS
    }

    fn type_str(&self, ty: &TypeDesc) -> String {
        match ty {
            TypeDesc::Primitive(p)    => primitive_type(*p).to_string(),
            TypeDesc::Record(r)       => r.name().to_string(),
            TypeDesc::List(elem)      => format!("[{}]", self.type_str(elem)),
            TypeDesc::Optional(inner) => format!("{}?", self.type_str(inner)),
            TypeDesc::Dynamic         => "JSONValue".to_string(),
        }
    }

    fn generate_definition(&self, record: &Record) -> String {
        let records = record.dependency_order();
        let mut swift_code: Vec<String> = Vec::new();

        swift_code.push("// Generated by sdgen. Do not edit.".to_string());
        swift_code.push("// JSON only: YAML and XML conversions are not generated for Swift.".to_string());
        swift_code.push("import Foundation".to_string());
        swift_code.push("".to_string());

        if records.iter().any(|r| r.fields().iter().any(|f| uses_dynamic(&f.ty))) {
            swift_code.push(JSON_VALUE.to_string());
        }

        for nested in &records {
            swift_code.push(self.generate_struct(nested));
        }

        swift_code.push(generate_entry_points(record.name()));
        swift_code.join("\n")
    }
}

fn primitive_type(p: Primitive) -> &'static str {
    match p {
        Primitive::String => "String",
        Primitive::Float  => "Double",
        Primitive::Int    => "Int",
        Primitive::Bool   => "Bool",
        Primitive::Fixed(kind) => match kind {
            IntKind::I8  => "Int8",
            IntKind::U8  => "UInt8",
            IntKind::I16 => "Int16",
            IntKind::U16 => "UInt16",
            IntKind::I32 => "Int32",
            IntKind::U32 => "UInt32",
        },
    }
}

fn uses_dynamic(ty: &TypeDesc) -> bool {
    match ty {
        TypeDesc::Dynamic => true,
        TypeDesc::List(inner) | TypeDesc::Optional(inner) => uses_dynamic(inner),
        TypeDesc::Primitive(_) | TypeDesc::Record(_) => false,
    }
}

impl SwiftEmitter {
    fn generate_struct(&self, record: &Record) -> String {
        let mut lines = vec![format!("public struct {}: Codable, Equatable {{", record.name())];
        for field in record.fields() {
            lines.push(format!(
                "    public var {}: {}",
                escape_swift_keyword(&field.name),
                self.type_str(&field.ty)
            ));
        }
        lines.push("}".to_string());
        lines.push("".to_string());

        // Synthesized decoding requires every non-optional key, so records
        // with defaults decode through `decodeIfPresent` instead.
        let defaults: Vec<_> = record
            .fields()
            .iter()
            .filter_map(|f| f.default.as_ref().and_then(|d| default_literal(&f.ty, d)).map(|lit| (f, lit)))
            .collect();
        if !defaults.is_empty() {
            lines.push(format!("extension {} {{", record.name()));
            lines.push("    public init(from decoder: Decoder) throws {".to_string());
            lines.push("        let container = try decoder.container(keyedBy: CodingKeys.self)".to_string());
            for field in record.fields() {
                let member = escape_swift_keyword(&field.name);
                let ty = self.type_str(&field.ty);
                let key = field.name.as_str();
                let literal = defaults.iter().find(|(f, _)| f.name == field.name).map(|(_, lit)| lit);
                let line = match (literal, &field.ty) {
                    (Some(lit), TypeDesc::Optional(inner)) => format!(
                        "        self.{} = try container.decodeIfPresent({}.self, forKey: .{}) ?? {}",
                        member, self.type_str(inner), key, lit
                    ),
                    (Some(lit), _) => format!(
                        "        self.{} = try container.decodeIfPresent({}.self, forKey: .{}) ?? {}",
                        member, ty, key, lit
                    ),
                    (None, TypeDesc::Optional(inner)) => format!(
                        "        self.{} = try container.decodeIfPresent({}.self, forKey: .{})",
                        member, self.type_str(inner), key
                    ),
                    (None, _) => format!(
                        "        self.{} = try container.decode({}.self, forKey: .{})",
                        member, ty, key
                    ),
                };
                lines.push(line);
            }
            lines.push("    }".to_string());
            lines.push("}".to_string());
            lines.push("".to_string());
        }

        lines.join("\n")
    }
}

/// Swift expression for a default. Records use the memberwise initializer,
/// leaving out optionals that have no value.
fn default_literal(ty: &TypeDesc, value: &Json) -> Option<String> {
    match (ty, value) {
        (TypeDesc::Optional(inner), _) => default_literal(inner, value),
        (TypeDesc::Record(r), Json::Object(map)) => {
            let mut args = Vec::new();
            for field in r.fields() {
                let label = escape_swift_keyword(&field.name);
                match (map.get(&field.name).or(field.default.as_ref()), &field.ty) {
                    (None, TypeDesc::Optional(_)) | (Some(Json::Null), TypeDesc::Optional(_)) => {}
                    (None, TypeDesc::List(_)) => args.push(format!("{}: []", label)),
                    (None, _) => return None,
                    (Some(v), _) => args.push(format!("{}: {}", label, default_literal(&field.ty, v)?)),
                }
            }
            Some(format!("{}({})", r.name(), args.join(", ")))
        }
        (TypeDesc::List(elem), Json::Array(items)) => {
            let literals = items
                .iter()
                .map(|item| default_literal(elem, item))
                .collect::<Option<Vec<_>>>()?;
            Some(format!("[{}]", literals.join(", ")))
        }
        (TypeDesc::Primitive(Primitive::String), Json::String(s)) => Some(quote(s)),
        (TypeDesc::Primitive(Primitive::Bool), Json::Bool(b)) => Some(b.to_string()),
        (TypeDesc::Primitive(Primitive::Float), Json::Number(n)) => n.as_f64().map(|f| format!("{:?}", f)),
        (TypeDesc::Primitive(Primitive::Int), Json::Number(n))
        | (TypeDesc::Primitive(Primitive::Fixed(_)), Json::Number(n)) => n.as_i64().map(|i| i.to_string()),
        _ => None,
    }
}

fn generate_entry_points(name: &str) -> String {
    let lines = vec![
        format!("extension {} {{", name),
        "    public func toJSON() throws -> String {".to_string(),
        "        let encoder = JSONEncoder()".to_string(),
        "        encoder.outputFormatting = .prettyPrinted".to_string(),
        "        return String(decoding: try encoder.encode(self), as: UTF8.self)".to_string(),
        "    }".to_string(),
        "".to_string(),
        format!("    public static func fromJSON(_ json: String) throws -> {} {{", name),
        format!("        try JSONDecoder().decode({}.self, from: Data(json.utf8))", name),
        "    }".to_string(),
        "".to_string(),
        "    public func toJSONFile(_ url: URL) throws {".to_string(),
        "        try toJSON().write(to: url, atomically: true, encoding: .utf8)".to_string(),
        "    }".to_string(),
        "".to_string(),
        format!("    public static func fromJSONFile(_ url: URL) throws -> {} {{", name),
        "        try fromJSON(String(contentsOf: url, encoding: .utf8))".to_string(),
        "    }".to_string(),
        "}".to_string(),
        "".to_string(),
    ];
    lines.join("\n")
}
