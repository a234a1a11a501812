//! Type annotation tree.
//!
//! Surface-syntax type annotations, as attached to `let`/`const` declarations,
//! function parameters, and `define-object` fields. Consumed by statement
//! emission to choose between a direct assignment, a range-checked
//! conversion, or duck-typed object validation — the core performs no static
//! type inference beyond this single-level dispatch.

use serde::{Deserialize, Serialize};

use crate::value_kind::ValueKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeAnnotation {
    Primitive(ValueKind),
    Array(Box<TypeAnnotation>),
    /// Named `object` type, validated structurally against a `define-object`
    /// registration at runtime.
    Object(String),
    /// No annotation was written; the emitter performs no conversion.
    Unknown,
}

impl TypeAnnotation {
    pub fn display_name(&self) -> String {
        match self {
            TypeAnnotation::Primitive(kind) => format!("{:?}", kind).to_lowercase(),
            TypeAnnotation::Array(inner) => format!("array<{}>", inner.display_name()),
            TypeAnnotation::Object(name) => name.clone(),
            TypeAnnotation::Unknown => "?".to_string(),
        }
    }

    /// Whether this annotation requires `validate_object_type` at assignment
    /// rather than a plain conversion helper.
    pub fn needs_object_validation(&self) -> bool {
        matches!(self, TypeAnnotation::Array(inner) if inner.needs_object_validation())
            || matches!(self, TypeAnnotation::Object(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_display_name() {
        let ty = TypeAnnotation::Array(Box::new(TypeAnnotation::Primitive(ValueKind::I32)));
        assert_eq!(ty.display_name(), "array<i32>");
    }

    #[test]
    fn object_needs_validation() {
        assert!(TypeAnnotation::Object("Point".into()).needs_object_validation());
        assert!(!TypeAnnotation::Primitive(ValueKind::Bool).needs_object_validation());
    }
}
