//! XML Schema for the documents produced by the `to_xml` conversions.
//!
//! List fields are a wrapper element around repeated item elements, the
//! same shape the instance runtime and every generated XML codec use. The
//! occurrence bounds sit on the item element, not on the field element.
//!
//! Absent optionals are written as empty elements (`<age/>`), so optional
//! numbers and booleans are typed `<base>OrEmpty` (the base type or the empty
//! string) and optional records `<Record>OrEmptyType` (all fields or none).

use std::collections::{BTreeSet, HashSet};

use sdgen_schema::{Field, IntKind, Primitive, Record, TypeDesc};
use tracing::trace;

const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Emit an XSD document describing `record` and every record it reaches.
/// Each distinct record becomes one `xs:complexType` named `<Record>Type`,
/// nested records before the ones that reference them.
pub fn to_xsd(record: &Record) -> String {
    let mut optional_records: HashSet<&str> = HashSet::new();
    let mut empty_scalars: BTreeSet<&'static str> = BTreeSet::new();
    for nested in record.dependency_order() {
        for field in nested.fields() {
            note_optionals(&field.ty, false, &mut optional_records, &mut empty_scalars);
        }
    }

    let mut xsd: Vec<String> = Vec::new();
    xsd.push("<?xml version=\"1.0\" encoding=\"UTF-8\"?>".to_string());
    xsd.push(format!("<xs:schema xmlns:xs=\"{}\">", XS_NAMESPACE));
    xsd.push(format!(
        "  <xs:element name=\"{}\" type=\"{}\"/>",
        record.name(),
        type_name(record)
    ));

    for base in &empty_scalars {
        xsd.extend(or_empty_simple_type(base));
    }

    let mut emitted: HashSet<String> = HashSet::new();
    emit_complex_type(record, &optional_records, &mut emitted, &mut xsd);

    xsd.push("</xs:schema>".to_string());
    xsd.push("".to_string());
    xsd.join("\n")
}

fn type_name(record: &Record) -> String {
    format!("{}Type", record.name())
}

/// Records and scalar bases that appear where an empty element means absent.
fn note_optionals<'a>(
    ty: &'a TypeDesc,
    optional: bool,
    records: &mut HashSet<&'a str>,
    scalars: &mut BTreeSet<&'static str>,
) {
    match ty {
        TypeDesc::Optional(inner) => note_optionals(inner, true, records, scalars),
        TypeDesc::List(elem) => note_optionals(elem, false, records, scalars),
        TypeDesc::Record(r) if optional && !r.fields().is_empty() => {
            records.insert(r.name());
        }
        TypeDesc::Primitive(p) if optional && *p != Primitive::String => {
            scalars.insert(xs_base(*p));
        }
        _ => {}
    }
}

fn or_empty_simple_type(base: &str) -> Vec<String> {
    vec![
        format!("  <xs:simpleType name=\"{}OrEmpty\">", base),
        format!("    <xs:union memberTypes=\"xs:{}\">", base),
        "      <xs:simpleType>".to_string(),
        "        <xs:restriction base=\"xs:string\">".to_string(),
        "          <xs:length value=\"0\"/>".to_string(),
        "        </xs:restriction>".to_string(),
        "      </xs:simpleType>".to_string(),
        "    </xs:union>".to_string(),
        "  </xs:simpleType>".to_string(),
    ]
}

fn emit_complex_type(
    record: &Record,
    optional_records: &HashSet<&str>,
    emitted: &mut HashSet<String>,
    out: &mut Vec<String>,
) {
    if !emitted.insert(record.name().to_string()) {
        return;
    }
    for field in record.fields() {
        for nested in field.ty.records() {
            emit_complex_type(nested, optional_records, emitted, out);
        }
    }

    trace!(record = record.name(), "emitting complex type");
    let mut elements: Vec<String> = Vec::new();
    for field in record.fields() {
        elements.extend(field_element(field, 6));
    }

    out.push(format!("  <xs:complexType name=\"{}\">", type_name(record)));
    out.push("    <xs:sequence>".to_string());
    out.extend(elements.iter().cloned());
    out.push("    </xs:sequence>".to_string());
    out.push("  </xs:complexType>".to_string());

    if optional_records.contains(record.name()) {
        out.push(format!("  <xs:complexType name=\"{}OrEmptyType\">", record.name()));
        out.push("    <xs:sequence minOccurs=\"0\">".to_string());
        out.extend(elements);
        out.push("    </xs:sequence>".to_string());
        out.push("  </xs:complexType>".to_string());
    }
}

fn field_element(field: &Field, indent: usize) -> Vec<String> {
    let (ty, optional) = match field.ty {
        TypeDesc::Optional(ref inner) => (inner.as_ref(), true),
        ref other => (other, false),
    };
    let occurs = if optional { " minOccurs=\"0\"" } else { "" };
    element(&field.name, ty, optional, occurs, indent)
}

/// One `xs:element`. Lists expand into an anonymous complex type whose single
/// item element repeats.
fn element(name: &str, ty: &TypeDesc, optional: bool, occurs: &str, indent: usize) -> Vec<String> {
    let pad = " ".repeat(indent);
    match ty {
        TypeDesc::List(elem) => {
            let (item, item_optional) = match elem.as_ref() {
                TypeDesc::Optional(inner) => (inner.as_ref(), true),
                other                     => (other, false),
            };
            let mut lines = vec![
                format!("{}<xs:element name=\"{}\"{}>", pad, name, occurs),
                format!("{}  <xs:complexType>", pad),
                format!("{}    <xs:sequence>", pad),
            ];
            lines.extend(element(
                &item.item_name(),
                item,
                item_optional,
                " minOccurs=\"0\" maxOccurs=\"unbounded\"",
                indent + 6,
            ));
            lines.push(format!("{}    </xs:sequence>", pad));
            lines.push(format!("{}  </xs:complexType>", pad));
            lines.push(format!("{}</xs:element>", pad));
            lines
        }
        other => vec![format!(
            "{}<xs:element name=\"{}\" type=\"{}\"{}/>",
            pad,
            name,
            type_ref(other, optional),
            occurs
        )],
    }
}

/// Type attribute for a non-list element. `optional` picks the variant that
/// also accepts an empty element.
fn type_ref(ty: &TypeDesc, optional: bool) -> String {
    match ty {
        TypeDesc::Primitive(Primitive::String) => "xs:string".to_string(),
        TypeDesc::Primitive(p) if optional     => format!("{}OrEmpty", xs_base(*p)),
        TypeDesc::Primitive(p)                 => format!("xs:{}", xs_base(*p)),
        TypeDesc::Record(r) if optional && !r.fields().is_empty() => format!("{}OrEmptyType", r.name()),
        TypeDesc::Record(r)                    => type_name(r),
        TypeDesc::Optional(inner)              => type_ref(inner, true),
        TypeDesc::List(_)
        | TypeDesc::Dynamic                    => "xs:anyType".to_string(),
    }
}

fn xs_base(p: Primitive) -> &'static str {
    match p {
        Primitive::String => "string",
        Primitive::Float  => "double",
        Primitive::Int    => "long",
        Primitive::Bool   => "boolean",
        Primitive::Fixed(kind) => match kind {
            IntKind::I8  => "byte",
            IntKind::U8  => "unsignedByte",
            IntKind::I16 => "short",
            IntKind::U16 => "unsignedShort",
            IntKind::I32 => "int",
            IntKind::U32 => "unsignedInt",
        },
    }
}
