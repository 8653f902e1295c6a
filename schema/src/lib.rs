//! Record model and instance runtime for sdgen.
//!
//! A [Record](record/struct.Record.html) is a named, ordered list of typed
//! fields. Field types are [TypeDesc](types/enum.TypeDesc.html) trees built
//! from primitives, nested records, lists, optionals and a dynamic fallback.
//! An [Instance](value/struct.Instance.html) is a validated value of one
//! record and converts to and from JSON, YAML and XML.
//!
//! ```
//! use sdgen_schema::*;
//!
//! let point = Record::builder("Point")
//!     .field("x", TypeDesc::fixed(IntKind::I16))
//!     .field("label", TypeDesc::optional(TypeDesc::string()))
//!     .build()
//!     .unwrap();
//!
//! let value = Instance::from_json(&point, r#"{"x": -5}"#).unwrap();
//! assert_eq!(value.get("x").unwrap().as_int(), Some(-5));
//! assert!(value.get("label").unwrap().is_null());
//! assert!(Instance::from_json(&point, r#"{"x": 40000}"#).is_err());
//! ```

pub mod access;
pub mod description;
pub mod error;
pub mod formats;
pub mod record;
pub mod types;
pub mod value;
pub mod verifier;
mod xml;

pub use description::{FieldDoc, RecordDoc, SchemaDocument, TypeExpr};
pub use error::{SchemaError, ValidationError, ValidationErrorKind};
pub use formats::WireFormat;
pub use record::{Field, Record, RecordBuilder};
pub use types::{FixedInt, IntKind, Primitive, TypeDesc, NATIVE_TYPES};
pub use value::{validate, Instance, Value};
pub use verifier::{is_identifier, verify_record};
