//! Runtime value kind tags.
//!
//! `HmlValue` itself is an opaque handle owned by the runtime library; the
//! core never inspects its representation. `ValueKind` is the compile-time
//! enumeration of the kinds the runtime discriminates at its boundary —
//! used to pick literal constructors, FFI marshaling, and the runtime-type
//! branches the expression emitter generates for polymorphic methods.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Rune,
    String,
    Array,
    Object,
    Ptr,
    Buffer,
    File,
    Task,
    Channel,
    Function,
}

impl ValueKind {
    /// The runtime constructor function name for a value of this kind,
    /// e.g. `ValueKind::I32.ctor_name()` == `"hml_val_i32"`.
    pub fn ctor_name(self) -> &'static str {
        match self {
            ValueKind::Null => "hml_val_null",
            ValueKind::Bool => "hml_val_bool",
            ValueKind::I8 => "hml_val_i8",
            ValueKind::I16 => "hml_val_i16",
            ValueKind::I32 => "hml_val_i32",
            ValueKind::I64 => "hml_val_i64",
            ValueKind::U8 => "hml_val_u8",
            ValueKind::U16 => "hml_val_u16",
            ValueKind::U32 => "hml_val_u32",
            ValueKind::U64 => "hml_val_u64",
            ValueKind::F32 => "hml_val_f32",
            ValueKind::F64 => "hml_val_f64",
            ValueKind::Rune => "hml_val_rune",
            ValueKind::String => "hml_val_string",
            ValueKind::Array => "hml_val_array",
            ValueKind::Object => "hml_val_object",
            ValueKind::Ptr => "hml_val_ptr",
            ValueKind::Buffer => "hml_val_buffer",
            ValueKind::File => "hml_val_file",
            ValueKind::Task => "hml_val_task",
            ValueKind::Channel => "hml_val_channel",
            ValueKind::Function => "hml_val_function",
        }
    }

    /// The runtime type-tag constant tested by generated `if`/`else` ladders
    /// that branch on a value's kind at runtime, e.g. `HML_KIND_ARRAY`.
    pub fn tag_constant(self) -> String {
        format!("HML_KIND_{}", format!("{:?}", self).to_uppercase())
    }

    /// Smallest integer kind that can hold a given literal without truncation,
    /// per the emitter's literal rule: values fitting in 32 bits become
    /// `i32`, otherwise `i64`.
    pub fn for_integer_literal(value: i64) -> ValueKind {
        if value >= i32::MIN as i64 && value <= i32::MAX as i64 {
            ValueKind::I32
        } else {
            ValueKind::I64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_literal_is_i32() {
        assert_eq!(ValueKind::for_integer_literal(42), ValueKind::I32);
        assert_eq!(ValueKind::for_integer_literal(i32::MAX as i64), ValueKind::I32);
    }

    #[test]
    fn large_literal_is_i64() {
        assert_eq!(
            ValueKind::for_integer_literal(i32::MAX as i64 + 1),
            ValueKind::I64
        );
    }

    #[test]
    fn tag_constant_naming() {
        assert_eq!(ValueKind::Array.tag_constant(), "HML_KIND_ARRAY");
    }
}
