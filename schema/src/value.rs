use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::{
    access::is_optional,
    error::{ValidationError, ValidationErrorKind},
    record::{Field, Record},
    types::{FixedInt, Primitive, TypeDesc},
};

/// This type holds validated record data.
///
/// Every `Value` inside an [Instance](struct.Instance.html) has already been
/// checked against its field's type descriptor, so fixed-width integers are
/// in range and nested objects carry their own record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An absent optional value.
    Null,
    Bool(bool),
    Int(i64),
    Fixed(FixedInt),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Object(Instance),
    Any(Json),
}

impl Value {
    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `None` for other value kinds.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// A convenience method to extract the value out of an [Int](#variant.Int)
    /// or a [Fixed](#variant.Fixed). Returns `None` for other value kinds.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(value)   => Some(value),
            Value::Fixed(value) => Some(value.get()),
            _ => None,
        }
    }

    /// A convenience method to extract the value out of a [Float](#variant.Float).
    /// Returns `None` for other value kinds.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(value) => Some(value),
            _ => None,
        }
    }

    /// A convenience method to extract the value out of a [String](#variant.String).
    /// Returns `None` for other value kinds.
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::String(ref value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// A convenience method to get the items out of a [List](#variant.List).
    /// Returns `None` for other value kinds.
    pub fn as_list(&self) -> Option<&[Value]> {
        match *self {
            Value::List(ref values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match *self {
            Value::Object(ref instance) => Some(instance),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// A convenience method to extract a field out of an [Object](#variant.Object).
    /// Returns `None` for other value kinds or if the field isn't present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match *self {
            Value::Object(ref instance) => instance.get(name),
            _ => None,
        }
    }

    /// The runtime type name: `string`, `int`, `u16`, a record name, and so
    /// on. XML list items are tagged with it.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null              => "null".to_string(),
            Value::Bool(_)           => "bool".to_string(),
            Value::Int(_)            => "int".to_string(),
            Value::Fixed(value)      => value.kind().name().to_string(),
            Value::Float(_)          => "float".to_string(),
            Value::String(_)         => "string".to_string(),
            Value::List(_)           => "list".to_string(),
            Value::Object(instance)  => instance.record().name().to_string(),
            Value::Any(_)            => "any".to_string(),
        }
    }

    pub fn to_native_tree(&self) -> Json {
        match self {
            Value::Null             => Json::Null,
            Value::Bool(value)      => Json::Bool(*value),
            Value::Int(value)       => Json::from(*value),
            Value::Fixed(value)     => Json::from(value.get()),
            Value::Float(value)     => serde_json::Number::from_f64(*value)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(value)    => Json::String(value.clone()),
            Value::List(values)     => Json::Array(values.iter().map(Value::to_native_tree).collect()),
            Value::Object(instance) => instance.to_native_tree(),
            Value::Any(value)       => value.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null          => Ok(()),
            Value::Bool(value)   => write!(f, "{}", value),
            Value::Int(value)    => write!(f, "{}", value),
            Value::Fixed(value)  => write!(f, "{}", value),
            Value::Float(value)  => write!(f, "{}", value),
            Value::String(value) => f.write_str(value),
            Value::Any(value)    => write!(f, "{}", value),
            other                => write!(f, "{}", other.to_native_tree()),
        }
    }
}

/// A validated value of one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    record: Arc<Record>,
    fields: IndexMap<String, Value>,
}

impl Instance {
    /// Build an instance from already constructed values. The values are
    /// checked the same way a native tree would be.
    pub fn new<I, K>(record: &Arc<Record>, values: I) -> Result<Instance, ValidationError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let map: serde_json::Map<String, Json> = values
            .into_iter()
            .map(|(name, value)| (name.into(), value.to_native_tree()))
            .collect();
        Instance::from_map(record, &map, "$")
    }

    /// Construct an instance from a nested native tree, coercing scalars and
    /// validating fixed-width ranges.
    pub fn from_native_tree(record: &Arc<Record>, tree: &Json) -> Result<Instance, ValidationError> {
        match tree {
            Json::Object(map) => Instance::from_map(record, map, "$"),
            other => Err(ValidationError::wrong_shape("$", record.name(), json_kind(other))),
        }
    }

    pub(crate) fn from_map(
        record: &Arc<Record>,
        map: &serde_json::Map<String, Json>,
        path: &str,
    ) -> Result<Instance, ValidationError> {
        if let Some(unknown) = map.keys().find(|key| record.field(key).is_none()) {
            return Err(ValidationError::new(
                &format!("{}.{}", path, unknown),
                ValidationErrorKind::UnknownField,
            ));
        }

        let mut fields = IndexMap::with_capacity(record.fields().len());
        for field in record.fields() {
            let field_path = format!("{}.{}", path, field.name);
            let value = match map.get(&field.name) {
                Some(tree) => validate(&field.ty, tree, &field_path)?,
                None       => missing_value(field, &field_path)?,
            };
            fields.insert(field.name.clone(), value);
        }

        Ok(Instance {
            record: Arc::clone(record),
            fields,
        })
    }

    pub(crate) fn from_values(record: &Arc<Record>, fields: IndexMap<String, Value>) -> Instance {
        Instance {
            record: Arc::clone(record),
            fields,
        }
    }

    pub fn record(&self) -> &Arc<Record> {
        &self.record
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field values in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn to_native_tree(&self) -> Json {
        let map: serde_json::Map<String, Json> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_native_tree()))
            .collect();
        Json::Object(map)
    }
}

/// The value a field takes when its key is absent: the declared default,
/// `Null` for optionals, otherwise a `MissingField` error.
pub(crate) fn missing_value(field: &Field, path: &str) -> Result<Value, ValidationError> {
    match field.default {
        Some(ref default)              => validate(&field.ty, default, path),
        None if is_optional(&field.ty) => Ok(Value::Null),
        None => Err(ValidationError::new(path, ValidationErrorKind::MissingField)),
    }
}

/// Check `tree` against `ty` and convert it to a [Value](enum.Value.html).
pub fn validate(ty: &TypeDesc, tree: &Json, path: &str) -> Result<Value, ValidationError> {
    match ty {
        TypeDesc::Optional(inner) => {
            if tree.is_null() {
                Ok(Value::Null)
            } else {
                validate(inner, tree, path)
            }
        }
        TypeDesc::Dynamic => Ok(Value::Any(tree.clone())),
        _ if tree.is_null() => Err(ValidationError::wrong_shape(path, ty.describe(), "null")),
        TypeDesc::Primitive(p) => validate_primitive(*p, tree, path),
        TypeDesc::Record(record) => match tree {
            Json::Object(map) => Ok(Value::Object(Instance::from_map(record, map, path)?)),
            other => Err(ValidationError::wrong_shape(path, record.name(), json_kind(other))),
        },
        TypeDesc::List(elem) => match tree {
            Json::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| validate(elem, item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Err(ValidationError::wrong_shape(path, ty.describe(), json_kind(other))),
        },
    }
}

fn validate_primitive(p: Primitive, tree: &Json, path: &str) -> Result<Value, ValidationError> {
    let mismatch = || ValidationError::wrong_shape(path, p.name(), json_kind(tree));

    match p {
        Primitive::String => match tree {
            Json::String(s) => Ok(Value::String(s.clone())),
            _ => Err(mismatch()),
        },
        Primitive::Bool => match tree {
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::String(s) => match s.trim() {
                "true"  => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _       => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
        Primitive::Float => match tree {
            Json::Number(n) => n.as_f64().map(Value::Float).ok_or_else(mismatch),
            Json::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        Primitive::Int => {
            let value = coerce_int(tree).ok_or_else(mismatch)?;
            i64::try_from(value).map(Value::Int).map_err(|_| mismatch())
        }
        Primitive::Fixed(kind) => {
            let value = coerce_int(tree).ok_or_else(mismatch)?;
            FixedInt::checked(kind, value, path).map(Value::Fixed)
        }
    }
}

/// Integers, integral floats and numeric strings are accepted as integers.
fn coerce_int(tree: &Json) -> Option<i128> {
    match tree {
        Json::Number(n) => {
            if let Some(v) = n.as_i64() {
                Some(v as i128)
            } else if let Some(v) = n.as_u64() {
                Some(v as i128)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 1e38)
                    .map(|f| f as i128)
            }
        }
        Json::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
}

fn json_kind(tree: &Json) -> &'static str {
    match tree {
        Json::Null      => "null",
        Json::Bool(_)   => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_)  => "array",
        Json::Object(_) => "object",
    }
}
