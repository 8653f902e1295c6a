//! Read-only queries shared by every emitter.
//!
//! The `unwrap_*` helpers return the descriptor unchanged when it is not of
//! the requested variant, so callers can normalize without branching.

use crate::{
    record::{Field, Record},
    types::TypeDesc,
};

pub fn fields(record: &Record) -> &[Field] {
    record.fields()
}

pub fn name(record: &Record) -> &str {
    record.name()
}

pub fn is_list(ty: &TypeDesc) -> bool {
    matches!(ty, TypeDesc::List(_))
}

pub fn is_optional(ty: &TypeDesc) -> bool {
    matches!(ty, TypeDesc::Optional(_))
}

pub fn unwrap_list(ty: &TypeDesc) -> &TypeDesc {
    match ty {
        TypeDesc::List(elem) => elem,
        other                => other,
    }
}

pub fn unwrap_optional(ty: &TypeDesc) -> &TypeDesc {
    match ty {
        TypeDesc::Optional(inner) => inner,
        other                     => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_is_identity_on_other_variants() {
        let plain = TypeDesc::string();
        assert_eq!(unwrap_list(&plain), &plain);
        assert_eq!(unwrap_optional(&plain), &plain);
    }

    #[test]
    fn test_optional_list_unwraps_in_order() {
        let ty = TypeDesc::optional(TypeDesc::list(TypeDesc::int()));
        assert!(is_optional(&ty));
        assert!(!is_list(&ty));

        let inner = unwrap_optional(&ty);
        assert!(is_list(inner));
        assert_eq!(unwrap_list(inner), &TypeDesc::int());
    }
}
