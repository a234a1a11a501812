//! FFI wrapper emitter (component K).
//!
//! For every `extern fn name(params) -> ret` declaration anywhere in the
//! program, emits a C function `hml_fn_<name>` that lazily resolves the
//! symbol via the runtime's dynamic-loader helper, builds a types array, and
//! forwards to the runtime's `ffi_call` marshaling entry point.
//!
//! `CType` here is adapted from the interpreter-era FFI type system
//! (`ffi::types::ExternType`/`CType`) to the codegen core's `ValueKind`
//! vocabulary rather than a separate typechecker `Type` enum.

use crate::ast::Param;
use crate::value_kind::ValueKind;

/// C-compatible extern types nameable in `extern fn` declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternType {
    CInt,
    CLong,
    CDouble,
    CCharPtr,
    CVoid,
    CBool,
}

impl ExternType {
    pub fn from_type_annotation(ann: &crate::type_annotation::TypeAnnotation) -> ExternType {
        use crate::type_annotation::TypeAnnotation as T;
        match ann {
            T::Primitive(ValueKind::I8 | ValueKind::I16 | ValueKind::I32) => ExternType::CInt,
            T::Primitive(ValueKind::I64 | ValueKind::U32 | ValueKind::U64) => ExternType::CLong,
            T::Primitive(ValueKind::F32 | ValueKind::F64) => ExternType::CDouble,
            T::Primitive(ValueKind::String) => ExternType::CCharPtr,
            T::Primitive(ValueKind::Bool) => ExternType::CBool,
            _ => ExternType::CVoid,
        }
    }

    /// The project's FFI type-enum constant name emitted into the generated
    /// types array, e.g. `HML_FFI_INT`.
    pub fn tag_constant(self) -> &'static str {
        match self {
            ExternType::CInt => "HML_FFI_INT",
            ExternType::CLong => "HML_FFI_LONG",
            ExternType::CDouble => "HML_FFI_DOUBLE",
            ExternType::CCharPtr => "HML_FFI_CHAR_PTR",
            ExternType::CVoid => "HML_FFI_VOID",
            ExternType::CBool => "HML_FFI_BOOL",
        }
    }
}

/// Emit the C wrapper function for one `extern fn` declaration. `lib_static`
/// is the per-program FFI library handle static (`_ffi_lib`); `ptr_static`
/// is this function's own lazily-resolved symbol pointer static.
pub fn emit_extern_wrapper(
    name: &str,
    params: &[Param],
    return_type: &crate::type_annotation::TypeAnnotation,
) -> String {
    let ret_extern = ExternType::from_type_annotation(return_type);
    let param_externs: Vec<ExternType> = params
        .iter()
        .map(|p| ExternType::from_type_annotation(&p.type_annotation))
        .collect();

    let lib_static = "_ffi_lib";
    let ptr_static = format!("_ffi_ptr_{name}");

    let mut types_array = format!("{}", ret_extern.tag_constant());
    for p in &param_externs {
        types_array.push_str(&format!(", {}", p.tag_constant()));
    }

    let param_list = (0..params.len())
        .map(|i| format!("HmlValue arg{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let args_array = if params.is_empty() {
        "NULL".to_string()
    } else {
        format!(
            "(HmlValue[]){{ {} }}",
            (0..params.len()).map(|i| format!("arg{i}")).collect::<Vec<_>>().join(", ")
        )
    };

    format!(
        "HmlValue hml_fn_{name}(HmlClosureEnv *_env, {param_list}) {{\n    \
         (void)_env;\n    \
         if ({ptr_static} == NULL) {{\n        \
         {ptr_static} = hml_ffi_resolve_symbol({lib_static}, \"{name}\");\n    \
         }}\n    \
         HmlFfiType _types[] = {{ {types_array} }};\n    \
         HmlValue _args[] = {{ {args_array} }};\n    \
         return hml_ffi_call({ptr_static}, _types, {param_count}, _args);\n\
         }}\n",
        param_count = params.len() + 1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_annotation::TypeAnnotation;

    #[test]
    fn wraps_extern_fn_with_lazy_symbol_resolution() {
        let params = vec![Param { name: "path".into(), type_annotation: TypeAnnotation::Primitive(ValueKind::String) }];
        let c = emit_extern_wrapper("fopen64", &params, &TypeAnnotation::Primitive(ValueKind::I32));
        assert!(c.contains("hml_fn_fopen64"));
        assert!(c.contains("_ffi_ptr_fopen64 == NULL"));
        assert!(c.contains("hml_ffi_resolve_symbol"));
        assert!(c.contains("HML_FFI_CHAR_PTR"));
    }

    #[test]
    fn extern_type_maps_numeric_annotations() {
        assert_eq!(
            ExternType::from_type_annotation(&TypeAnnotation::Primitive(ValueKind::I32)),
            ExternType::CInt
        );
        assert_eq!(
            ExternType::from_type_annotation(&TypeAnnotation::Primitive(ValueKind::F64)),
            ExternType::CDouble
        );
    }
}
