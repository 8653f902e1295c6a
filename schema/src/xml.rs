//! XML form of an [Instance](../value/struct.Instance.html).
//!
//! The root element is named after the record and each field becomes a child
//! element named after the field. Nested records are subtrees, lists wrap one
//! element per item tagged with the item's type name (`string`, `u16`,
//! `Address`, ...), and absent optionals are written as empty elements.

use std::sync::Arc;

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::Value as Json;
use tracing::trace;

use crate::{
    access::{unwrap_list, unwrap_optional},
    error::{SchemaError, ValidationError, ValidationErrorKind},
    record::Record,
    types::TypeDesc,
    value::{missing_value, validate, Instance, Value},
};

pub(crate) fn write_instance(instance: &Instance) -> Result<String, SchemaError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_record(&mut writer, instance.record().name(), instance)?;
    String::from_utf8(writer.into_inner()).map_err(|e| SchemaError::XmlShape(e.to_string()))
}

fn write_record(writer: &mut Writer<Vec<u8>>, tag: &str, instance: &Instance) -> Result<(), SchemaError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    if instance.record().fields().is_empty() {
        // `<tag></tag>`: a self-closing tag would read back as an absent optional.
        writer.write_event(Event::Text(BytesText::new("")))?;
    }
    for field in instance.record().fields() {
        let value = instance.get(&field.name).unwrap_or(&Value::Null);
        write_value(writer, &field.name, &field.ty, value)?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_value(writer: &mut Writer<Vec<u8>>, tag: &str, ty: &TypeDesc, value: &Value) -> Result<(), SchemaError> {
    match value {
        Value::Null => write_empty(writer, tag),
        Value::Object(instance) => write_record(writer, tag, instance),
        Value::List(items) if items.is_empty() => write_empty(writer, tag),
        Value::List(items) => {
            let elem = unwrap_list(unwrap_optional(ty));
            let item_tag = elem.item_name();
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            for item in items {
                write_value(writer, &item_tag, elem, item)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
            Ok(())
        }
        scalar => {
            let text = scalar.to_string();
            if text.is_empty() {
                return write_empty(writer, tag);
            }
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
            Ok(())
        }
    }
}

fn write_empty(writer: &mut Writer<Vec<u8>>, tag: &str) -> Result<(), SchemaError> {
    writer.write_event(Event::Empty(BytesStart::new(tag)))?;
    Ok(())
}

/// Minimal element tree; attributes, comments and processing instructions are
/// dropped while reading.
#[derive(Debug, Default)]
struct Element {
    tag:          String,
    text:         String,
    children:     Vec<Element>,
    self_closing: bool,
}

impl Element {
    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.trim().is_empty()
    }

    fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }
}

fn parse_document(text: &str) -> Result<Element, SchemaError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if root.is_some() {
                    return Err(SchemaError::XmlShape("content after the root element".to_string()));
                }
                stack.push(Element {
                    tag: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    ..Element::default()
                });
            }
            Event::Empty(e) => {
                let element = Element {
                    tag: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    self_closing: true,
                    ..Element::default()
                };
                close(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| SchemaError::XmlShape("unbalanced closing tag".to_string()))?;
                close(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(SchemaError::XmlShape(format!("element <{}> is never closed", open.tag)));
    }
    root.ok_or_else(|| SchemaError::XmlShape("document has no root element".to_string()))
}

fn close(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) -> Result<(), SchemaError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(SchemaError::XmlShape("more than one root element".to_string())),
    }
    Ok(())
}

pub(crate) fn read_instance(record: &Arc<Record>, text: &str) -> Result<Instance, SchemaError> {
    let root = parse_document(text)?;
    if root.tag != record.name() {
        return Err(SchemaError::XmlShape(format!(
            "expected root element <{}>, found <{}>",
            record.name(),
            root.tag
        )));
    }
    trace!(record = record.name(), children = root.children.len(), "reading xml instance");
    Ok(read_record(record, &root, "$")?)
}

fn read_record(record: &Arc<Record>, element: &Element, path: &str) -> Result<Instance, ValidationError> {
    if let Some(unknown) = element.children.iter().find(|c| record.field(&c.tag).is_none()) {
        return Err(ValidationError::new(
            &format!("{}.{}", path, unknown.tag),
            ValidationErrorKind::UnknownField,
        ));
    }
    if element.children.is_empty() && !element.text.trim().is_empty() {
        return Err(ValidationError::wrong_shape(path, record.name(), "text"));
    }

    let mut fields = IndexMap::with_capacity(record.fields().len());
    for field in record.fields() {
        let field_path = format!("{}.{}", path, field.name);
        let value = match element.child(&field.name) {
            Some(child) => read_value(&field.ty, child, &field_path)?,
            None        => missing_value(field, &field_path)?,
        };
        fields.insert(field.name.clone(), value);
    }
    Ok(Instance::from_values(record, fields))
}

fn read_value(ty: &TypeDesc, element: &Element, path: &str) -> Result<Value, ValidationError> {
    match ty {
        TypeDesc::Optional(inner) if element.is_empty() => match inner.as_ref() {
            TypeDesc::Record(r) if r.fields().is_empty() && !element.self_closing => {
                read_value(inner, element, path)
            }
            _ => Ok(Value::Null),
        },
        TypeDesc::Optional(inner) => read_value(inner, element, path),
        TypeDesc::Dynamic if element.is_empty() => Ok(Value::Any(Json::Null)),
        TypeDesc::Dynamic => {
            let text = element.text.trim();
            Ok(Value::Any(
                serde_json::from_str(text).unwrap_or_else(|_| Json::String(text.to_string())),
            ))
        }
        TypeDesc::Record(record) => read_record(record, element, path).map(Value::Object),
        TypeDesc::List(elem) => {
            if element.children.is_empty() && !element.text.trim().is_empty() {
                return Err(ValidationError::wrong_shape(path, ty.describe(), "text"));
            }
            let item_tag = elem.item_name();
            element
                .children
                .iter()
                .enumerate()
                .map(|(i, child)| {
                    let item_path = format!("{}[{}]", path, i);
                    if child.tag != item_tag {
                        return Err(ValidationError::wrong_shape(
                            &item_path,
                            item_tag.as_str(),
                            format!("<{}>", child.tag),
                        ));
                    }
                    read_value(elem, child, &item_path)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        TypeDesc::Primitive(p) => {
            if !element.children.is_empty() {
                return Err(ValidationError::wrong_shape(path, p.name(), "element"));
            }
            validate(ty, &Json::String(element.text.clone()), path)
        }
    }
}
