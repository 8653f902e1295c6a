//! C++17 header generation: plain structs with nlohmann/json, yaml-cpp and
//! rapidxml glue.
//!
//! Scalar conversions go through the `sdgen::Codec<T>` templates emitted in
//! the header prelude, which range-check fixed-width integers on every read
//! path. XML is written field by field because list items are tagged with
//! the schema type name, which C++ types alone cannot recover (`int` and
//! `int32_t` are the same type).

use sdgen_schema::{IntKind, Primitive, Record, TypeDesc, WireFormat};

use crate::{
    language::Language,
    traits::Emitter,
    utils::{escape_cpp_keyword, quote},
};

pub struct CppEmitter;

const FORMATS: &[WireFormat] = &[WireFormat::Json, WireFormat::Yaml, WireFormat::Xml];

const PRELUDE: &str = r#"#ifndef SDGEN_CPP_SUPPORT
#define SDGEN_CPP_SUPPORT
namespace sdgen {

inline std::string format_double(double value) {
    std::ostringstream out;
    out.precision(std::numeric_limits<double>::max_digits10);
    out << value;
    return out.str();
}

template <typename T>
T checked_int(long long value) {
    if (value < static_cast<long long>(std::numeric_limits<T>::min()) ||
        value > static_cast<long long>(std::numeric_limits<T>::max())) {
        throw std::out_of_range("sdgen: integer " + std::to_string(value) + " out of range");
    }
    return static_cast<T>(value);
}

template <typename T>
T parse_int(const std::string& text) {
    std::size_t used = 0;
    long long value = std::stoll(text, &used);
    while (used < text.size() && std::isspace(static_cast<unsigned char>(text[used]))) {
        ++used;
    }
    if (used != text.size()) {
        throw std::invalid_argument("sdgen: not an integer: " + text);
    }
    return checked_int<T>(value);
}

inline nlohmann::json yaml_to_json(const YAML::Node& node) {
    switch (node.Type()) {
    case YAML::NodeType::Map: {
        nlohmann::json out = nlohmann::json::object();
        for (const auto& entry : node) {
            out[entry.first.as<std::string>()] = yaml_to_json(entry.second);
        }
        return out;
    }
    case YAML::NodeType::Sequence: {
        nlohmann::json out = nlohmann::json::array();
        for (const auto& item : node) {
            out.push_back(yaml_to_json(item));
        }
        return out;
    }
    case YAML::NodeType::Scalar: {
        if (node.Tag() == "!") {
            return node.Scalar();
        }
        nlohmann::json parsed = nlohmann::json::parse(node.Scalar(), nullptr, false);
        return parsed.is_discarded() ? nlohmann::json(node.Scalar()) : parsed;
    }
    default:
        return nullptr;
    }
}

template <typename T, typename Enable = void>
struct Codec {
    static nlohmann::json to_json(const T& value) { return value.to_json(); }
    static T from_json(const nlohmann::json& j) { return T::from_json(j); }
    static YAML::Node to_yaml(const T& value) { return value.to_yaml(); }
    static T from_yaml(const YAML::Node& node) { return T::from_yaml(node); }
};

template <>
struct Codec<std::string> {
    static nlohmann::json to_json(const std::string& value) { return value; }
    static std::string from_json(const nlohmann::json& j) { return j.get<std::string>(); }
    static YAML::Node to_yaml(const std::string& value) { return YAML::Node(value); }
    static std::string from_yaml(const YAML::Node& node) { return node.as<std::string>(); }
    static std::string to_text(const std::string& value) { return value; }
    static std::string from_text(const std::string& text) { return text; }
};

template <>
struct Codec<double> {
    static nlohmann::json to_json(double value) { return value; }
    static double from_json(const nlohmann::json& j) {
        return j.is_string() ? std::stod(j.get<std::string>()) : j.get<double>();
    }
    static YAML::Node to_yaml(double value) { return YAML::Node(format_double(value)); }
    static double from_yaml(const YAML::Node& node) { return std::stod(node.Scalar()); }
    static std::string to_text(double value) { return format_double(value); }
    static double from_text(const std::string& text) { return std::stod(text); }
};

template <>
struct Codec<bool> {
    static nlohmann::json to_json(bool value) { return value; }
    static bool from_json(const nlohmann::json& j) {
        return j.is_string() ? from_text(j.get<std::string>()) : j.get<bool>();
    }
    static YAML::Node to_yaml(bool value) { return YAML::Node(value); }
    static bool from_yaml(const YAML::Node& node) { return node.as<bool>(); }
    static std::string to_text(bool value) { return value ? "true" : "false"; }
    static bool from_text(const std::string& text) {
        if (text == "true") return true;
        if (text == "false") return false;
        throw std::invalid_argument("sdgen: not a boolean: " + text);
    }
};

template <typename T>
struct Codec<T, std::enable_if_t<std::is_integral_v<T> && !std::is_same_v<T, bool>>> {
    static nlohmann::json to_json(T value) { return static_cast<long long>(value); }
    static T from_json(const nlohmann::json& j) {
        return j.is_string() ? parse_int<T>(j.get<std::string>()) : checked_int<T>(j.get<long long>());
    }
    static YAML::Node to_yaml(T value) { return YAML::Node(static_cast<long long>(value)); }
    static T from_yaml(const YAML::Node& node) { return parse_int<T>(node.Scalar()); }
    static std::string to_text(T value) { return std::to_string(static_cast<long long>(value)); }
    static T from_text(const std::string& text) { return parse_int<T>(text); }
};

template <>
struct Codec<nlohmann::json> {
    static nlohmann::json to_json(const nlohmann::json& value) { return value; }
    static nlohmann::json from_json(const nlohmann::json& j) { return j; }
    static YAML::Node to_yaml(const nlohmann::json& value) { return YAML::Load(value.dump()); }
    static nlohmann::json from_yaml(const YAML::Node& node) { return yaml_to_json(node); }
    static std::string to_text(const nlohmann::json& value) { return value.dump(); }
    static nlohmann::json from_text(const std::string& text) {
        nlohmann::json parsed = nlohmann::json::parse(text, nullptr, false);
        return parsed.is_discarded() ? nlohmann::json(text) : parsed;
    }
};

template <typename T>
struct Codec<std::optional<T>> {
    static nlohmann::json to_json(const std::optional<T>& value) {
        return value ? Codec<T>::to_json(*value) : nlohmann::json(nullptr);
    }
    static std::optional<T> from_json(const nlohmann::json& j) {
        if (j.is_null()) return std::nullopt;
        return Codec<T>::from_json(j);
    }
    static YAML::Node to_yaml(const std::optional<T>& value) {
        return value ? Codec<T>::to_yaml(*value) : YAML::Node(YAML::NodeType::Null);
    }
    static std::optional<T> from_yaml(const YAML::Node& node) {
        if (!node || node.IsNull()) return std::nullopt;
        return Codec<T>::from_yaml(node);
    }
};

template <typename T>
struct Codec<std::vector<T>> {
    static nlohmann::json to_json(const std::vector<T>& value) {
        nlohmann::json out = nlohmann::json::array();
        for (const auto& item : value) out.push_back(Codec<T>::to_json(item));
        return out;
    }
    static std::vector<T> from_json(const nlohmann::json& j) {
        std::vector<T> out;
        for (const auto& item : j) out.push_back(Codec<T>::from_json(item));
        return out;
    }
    static YAML::Node to_yaml(const std::vector<T>& value) {
        YAML::Node out(YAML::NodeType::Sequence);
        for (const auto& item : value) out.push_back(Codec<T>::to_yaml(item));
        return out;
    }
    static std::vector<T> from_yaml(const YAML::Node& node) {
        std::vector<T> out;
        for (const auto& item : node) out.push_back(Codec<T>::from_yaml(item));
        return out;
    }
};

inline rapidxml::xml_node<>* xml_append(rapidxml::xml_document<>& doc, rapidxml::xml_node<>* parent,
                                        const char* tag) {
    auto* node = doc.allocate_node(rapidxml::node_element, doc.allocate_string(tag));
    parent->append_node(node);
    return node;
}

inline void xml_append_text(rapidxml::xml_document<>& doc, rapidxml::xml_node<>* parent, const char* tag,
                            const std::string& text) {
    auto* node = xml_append(doc, parent, tag);
    if (!text.empty()) {
        node->value(doc.allocate_string(text.c_str(), text.size()), text.size());
    }
}

inline std::string xml_text(const rapidxml::xml_node<>* node) {
    return std::string(node->value(), node->value_size());
}

inline bool xml_is_empty(const rapidxml::xml_node<>* node) {
    for (auto* child = node->first_node(); child; child = child->next_sibling()) {
        if (child->type() == rapidxml::node_element) return false;
    }
    std::string text = xml_text(node);
    return text.find_first_not_of(" \t\r\n") == std::string::npos;
}

inline void xml_expect_tag(const rapidxml::xml_node<>* node, const char* tag) {
    if (std::string(node->name(), node->name_size()) != tag) {
        throw std::runtime_error("sdgen: expected <" + std::string(tag) + "> list item, found <" +
                                 std::string(node->name(), node->name_size()) + ">");
    }
}

}  // namespace sdgen
#endif  // SDGEN_CPP_SUPPORT"#;

impl Emitter for CppEmitter {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn formats(&self) -> &'static [WireFormat] {
        FORMATS
    }

    fn type_str(&self, ty: &TypeDesc) -> String {
        match ty {
            TypeDesc::Primitive(p)    => primitive_type(*p).to_string(),
            TypeDesc::Record(r)       => r.name().to_string(),
            TypeDesc::List(elem)      => format!("std::vector<{}>", self.type_str(elem)),
            TypeDesc::Optional(inner) => format!("std::optional<{}>", self.type_str(inner)),
            TypeDesc::Dynamic         => "nlohmann::json".to_string(),
        }
    }

    fn generate_definition(&self, record: &Record) -> String {
        let mut cpp_code: Vec<String> = Vec::new();

        cpp_code.push("// Generated by sdgen. Do not edit.".to_string());
        cpp_code.push("// Requires C++17, nlohmann/json, yaml-cpp and rapidxml.".to_string());
        cpp_code.push("#pragma once".to_string());
        cpp_code.push("".to_string());
        for header in [
            "<cctype>", "<cstdint>", "<fstream>", "<iterator>", "<limits>", "<optional>",
            "<sstream>", "<stdexcept>", "<string>", "<type_traits>", "<vector>",
        ] {
            cpp_code.push(format!("#include {}", header));
        }
        cpp_code.push("".to_string());
        cpp_code.push("#include <nlohmann/json.hpp>".to_string());
        cpp_code.push("#include <rapidxml/rapidxml.hpp>".to_string());
        cpp_code.push("#include <rapidxml/rapidxml_print.hpp>".to_string());
        cpp_code.push("#include <yaml-cpp/yaml.h>".to_string());
        cpp_code.push("".to_string());
        cpp_code.push(PRELUDE.to_string());
        cpp_code.push("".to_string());

        for nested in record.dependency_order() {
            cpp_code.push(self.generate_struct(nested, nested.name() == record.name()));
        }

        cpp_code.push(generate_file_helpers(record.name()));
        cpp_code.join("\n")
    }
}

fn primitive_type(p: Primitive) -> &'static str {
    match p {
        Primitive::String => "std::string",
        Primitive::Float  => "double",
        Primitive::Int    => "int",
        Primitive::Bool   => "bool",
        Primitive::Fixed(kind) => match kind {
            IntKind::I8  => "int8_t",
            IntKind::U8  => "uint8_t",
            IntKind::I16 => "int16_t",
            IntKind::U16 => "uint16_t",
            IntKind::I32 => "int32_t",
            IntKind::U32 => "uint32_t",
        },
    }
}

/// Required fields without a default must be present on read.
fn is_required(field: &sdgen_schema::Field) -> bool {
    field.default.is_none() && !matches!(field.ty, TypeDesc::Optional(_))
}

impl CppEmitter {
    fn generate_struct(&self, record: &Record, is_root: bool) -> String {
        let name = record.name();
        let mut lines: Vec<String> = Vec::new();

        lines.push(format!("struct {} {{", name));
        for field in record.fields() {
            let ty = self.type_str(&field.ty);
            let member = escape_cpp_keyword(&field.name);
            match field.default {
                Some(ref default) => lines.push(format!(
                    "    {ty} {member} = sdgen::Codec<{ty}>::from_json(nlohmann::json::parse(R\"sdgen({json})sdgen\"));",
                    ty = ty,
                    member = member,
                    json = default
                )),
                None => lines.push(format!("    {} {}{{}};", ty, member)),
            }
        }
        lines.push("".to_string());

        // JSON
        lines.push("    nlohmann::json to_json() const {".to_string());
        lines.push("        nlohmann::json j = nlohmann::json::object();".to_string());
        for field in record.fields() {
            lines.push(format!(
                "        j[{}] = sdgen::Codec<{}>::to_json(this->{});",
                quote(&field.name),
                self.type_str(&field.ty),
                escape_cpp_keyword(&field.name)
            ));
        }
        lines.push("        return j;".to_string());
        lines.push("    }".to_string());
        lines.push("".to_string());

        lines.push(format!("    static {} from_json(const nlohmann::json& j) {{", name));
        lines.push(format!("        {} value;", name));
        for field in record.fields() {
            let key = quote(&field.name);
            let assign = format!(
                "value.{} = sdgen::Codec<{}>::from_json(j.at({}));",
                escape_cpp_keyword(&field.name),
                self.type_str(&field.ty),
                key
            );
            if is_required(field) {
                lines.push(format!("        {}", assign));
            } else {
                lines.push(format!("        if (j.contains({})) {}", key, assign));
            }
        }
        lines.push("        return value;".to_string());
        lines.push("    }".to_string());
        lines.push("".to_string());

        // YAML
        lines.push("    YAML::Node to_yaml() const {".to_string());
        lines.push("        YAML::Node node(YAML::NodeType::Map);".to_string());
        for field in record.fields() {
            lines.push(format!(
                "        node[{}] = sdgen::Codec<{}>::to_yaml(this->{});",
                quote(&field.name),
                self.type_str(&field.ty),
                escape_cpp_keyword(&field.name)
            ));
        }
        lines.push("        return node;".to_string());
        lines.push("    }".to_string());
        lines.push("".to_string());

        lines.push(format!("    static {} from_yaml(const YAML::Node& node) {{", name));
        lines.push(format!("        {} value;", name));
        for field in record.fields() {
            let key = quote(&field.name);
            let assign = format!(
                "value.{} = sdgen::Codec<{}>::from_yaml(node[{}]);",
                escape_cpp_keyword(&field.name),
                self.type_str(&field.ty),
                key
            );
            if is_required(field) {
                lines.push(format!("        if (!node[{}]) throw std::runtime_error(\"sdgen: missing field {}.{}\");", key, name, field.name));
                lines.push(format!("        {}", assign));
            } else {
                lines.push(format!("        if (node[{}]) {}", key, assign));
            }
        }
        lines.push("        return value;".to_string());
        lines.push("    }".to_string());
        lines.push("".to_string());

        // XML
        lines.push(
            "    void append_xml(rapidxml::xml_document<>& doc, rapidxml::xml_node<>* parent, const char* tag) const {"
                .to_string(),
        );
        lines.push("        auto* node = sdgen::xml_append(doc, parent, tag);".to_string());
        for field in record.fields() {
            let expr = format!("this->{}", escape_cpp_keyword(&field.name));
            lines.extend(self.xml_write(&field.ty, &expr, "node", &quote(&field.name), 0, 2));
        }
        lines.push("    }".to_string());
        lines.push("".to_string());

        lines.push(format!(
            "    static {} from_xml_node(const rapidxml::xml_node<>* node) {{",
            name
        ));
        lines.push(format!("        {} value;", name));
        for field in record.fields() {
            let target = format!("value.{}", escape_cpp_keyword(&field.name));
            lines.push(format!(
                "        if (const auto* child = node->first_node({})) {{",
                quote(&field.name)
            ));
            lines.extend(self.xml_read(&field.ty, &target, "child", 0, 3));
            if is_required(field) {
                lines.push("        } else {".to_string());
                lines.push(format!(
                    "            throw std::runtime_error(\"sdgen: missing element <{}> in <{}>\");",
                    field.name, name
                ));
            }
            lines.push("        }".to_string());
        }
        lines.push("        return value;".to_string());
        lines.push("    }".to_string());

        if is_root {
            lines.push("".to_string());
            lines.extend(generate_text_helpers(name));
        }

        lines.push("};".to_string());
        lines.push("".to_string());
        lines.join("\n")
    }

    /// Statements appending `expr` of type `ty` as element `tag` under `parent`.
    fn xml_write(&self, ty: &TypeDesc, expr: &str, parent: &str, tag: &str, depth: usize, indent: usize) -> Vec<String> {
        let pad = "    ".repeat(indent);
        match ty {
            TypeDesc::Primitive(_) | TypeDesc::Dynamic => vec![format!(
                "{}sdgen::xml_append_text(doc, {}, {}, sdgen::Codec<{}>::to_text({}));",
                pad,
                parent,
                tag,
                self.type_str(ty),
                expr
            )],
            TypeDesc::Record(_) => vec![format!("{}{}.append_xml(doc, {}, {});", pad, expr, parent, tag)],
            TypeDesc::Optional(inner) => {
                let mut lines = vec![format!("{}if ({}) {{", pad, expr)];
                lines.extend(self.xml_write(inner, &format!("(*{})", expr), parent, tag, depth, indent + 1));
                lines.push(format!("{}}} else {{", pad));
                lines.push(format!("{}    sdgen::xml_append(doc, {}, {});", pad, parent, tag));
                lines.push(format!("{}}}", pad));
                lines
            }
            TypeDesc::List(elem) => {
                let list = format!("list{}", depth);
                let item = format!("item{}", depth);
                let mut lines = vec![
                    format!("{}{{", pad),
                    format!("{}    auto* {} = sdgen::xml_append(doc, {}, {});", pad, list, parent, tag),
                    format!("{}    for (const auto& {} : {}) {{", pad, item, expr),
                ];
                lines.extend(self.xml_write(elem, &item, &list, &quote(&elem.item_name()), depth + 1, indent + 2));
                lines.push(format!("{}    }}", pad));
                lines.push(format!("{}}}", pad));
                lines
            }
        }
    }

    /// Statements reading element `node` into `target` of type `ty`.
    fn xml_read(&self, ty: &TypeDesc, target: &str, node: &str, depth: usize, indent: usize) -> Vec<String> {
        let pad = "    ".repeat(indent);
        match ty {
            TypeDesc::Primitive(_) | TypeDesc::Dynamic => vec![format!(
                "{}{} = sdgen::Codec<{}>::from_text(sdgen::xml_text({}));",
                pad,
                target,
                self.type_str(ty),
                node
            )],
            TypeDesc::Record(r) => vec![format!("{}{} = {}::from_xml_node({});", pad, target, r.name(), node)],
            TypeDesc::Optional(inner) => {
                let tmp = format!("present{}", depth);
                let mut lines = vec![
                    format!("{}if (sdgen::xml_is_empty({})) {{", pad, node),
                    format!("{}    {} = std::nullopt;", pad, target),
                    format!("{}}} else {{", pad),
                    format!("{}    {} {};", pad, self.type_str(inner), tmp),
                ];
                lines.extend(self.xml_read(inner, &tmp, node, depth + 1, indent + 1));
                lines.push(format!("{}    {} = std::move({});", pad, target, tmp));
                lines.push(format!("{}}}", pad));
                lines
            }
            TypeDesc::List(elem) => {
                let item = format!("item{}", depth);
                let value = format!("element{}", depth);
                let mut lines = vec![
                    format!("{}{}.clear();", pad, target),
                    format!(
                        "{}for (const auto* {item} = {node}->first_node(); {item}; {item} = {item}->next_sibling()) {{",
                        pad,
                        item = item,
                        node = node
                    ),
                    format!("{}    if ({}->type() != rapidxml::node_element) continue;", pad, item),
                    format!("{}    sdgen::xml_expect_tag({}, {});", pad, item, quote(&elem.item_name())),
                    format!("{}    {} {};", pad, self.type_str(elem), value),
                ];
                lines.extend(self.xml_read(elem, &value, &item, depth + 1, indent + 1));
                lines.push(format!("{}    {}.push_back(std::move({}));", pad, target, value));
                lines.push(format!("{}}}", pad));
                lines
            }
        }
    }
}

fn generate_text_helpers(name: &str) -> Vec<String> {
    vec![
        "    std::string to_json_string(int indent = 2) const { return to_json().dump(indent); }".to_string(),
        format!(
            "    static {} from_json_string(const std::string& text) {{ return from_json(nlohmann::json::parse(text)); }}",
            name
        ),
        "".to_string(),
        "    std::string to_yaml_string() const {".to_string(),
        "        YAML::Emitter out;".to_string(),
        "        out << to_yaml();".to_string(),
        "        return out.c_str();".to_string(),
        "    }".to_string(),
        format!(
            "    static {} from_yaml_string(const std::string& text) {{ return from_yaml(YAML::Load(text)); }}",
            name
        ),
        "".to_string(),
        "    std::string to_xml() const {".to_string(),
        "        rapidxml::xml_document<> doc;".to_string(),
        "        auto* decl = doc.allocate_node(rapidxml::node_declaration);".to_string(),
        "        decl->append_attribute(doc.allocate_attribute(\"version\", \"1.0\"));".to_string(),
        "        decl->append_attribute(doc.allocate_attribute(\"encoding\", \"UTF-8\"));".to_string(),
        "        doc.append_node(decl);".to_string(),
        format!("        append_xml(doc, &doc, {});", quote(name)),
        "        std::string out;".to_string(),
        "        rapidxml::print(std::back_inserter(out), doc);".to_string(),
        "        return out;".to_string(),
        "    }".to_string(),
        "".to_string(),
        format!("    static {} from_xml(const std::string& text) {{", name),
        "        std::vector<char> buffer(text.begin(), text.end());".to_string(),
        "        buffer.push_back('\\0');".to_string(),
        "        rapidxml::xml_document<> doc;".to_string(),
        "        doc.parse<0>(buffer.data());".to_string(),
        format!("        const auto* root = doc.first_node({});", quote(name)),
        format!(
            "        if (root == nullptr) throw std::runtime_error(\"sdgen: missing root element <{}>\");",
            name
        ),
        "        return from_xml_node(root);".to_string(),
        "    }".to_string(),
    ]
}

fn generate_file_helpers(name: &str) -> String {
    let instance = "value";
    let lines = vec![
        format!("inline void to_json_file(const {}& {}, const std::string& path) {{", name, instance),
        "    std::ofstream file(path);".to_string(),
        format!("    file << {}.to_json_string();", instance),
        "}".to_string(),
        "".to_string(),
        format!("inline {} from_json_file(const std::string& path) {{", name),
        "    std::ifstream file(path);".to_string(),
        format!("    return {}::from_json(nlohmann::json::parse(file));", name),
        "}".to_string(),
        "".to_string(),
        format!("inline void to_yaml_file(const {}& {}, const std::string& path) {{", name, instance),
        "    std::ofstream file(path);".to_string(),
        format!("    file << {}.to_yaml_string();", instance),
        "}".to_string(),
        "".to_string(),
        format!("inline {} from_yaml_file(const std::string& path) {{", name),
        format!("    return {}::from_yaml(YAML::LoadFile(path));", name),
        "}".to_string(),
        "".to_string(),
        format!("inline void to_xml_file(const {}& {}, const std::string& path) {{", name, instance),
        "    std::ofstream file(path);".to_string(),
        format!("    file << {}.to_xml();", instance),
        "}".to_string(),
        "".to_string(),
        format!("inline {} from_xml_file(const std::string& path) {{", name),
        "    std::ifstream file(path);".to_string(),
        "    std::stringstream buffer;".to_string(),
        "    buffer << file.rdbuf();".to_string(),
        format!("    return {}::from_xml(buffer.str());", name),
        "}".to_string(),
        "".to_string(),
    ];
    lines.join("\n")
}
