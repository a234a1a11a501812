//! Method dispatch table, adapted from the interpreter-era dispatch table to
//! the codegen core's `(method_name, arity)` → runtime-helper convention
//! (4.G, path 2). Some method names exist on more than one runtime kind
//! (`slice`/`find`/`contains` on `string` vs `array`; `close` on `file` vs
//! `channel`); those resolve to a list of `(kind tag, helper)` pairs that the
//! expression emitter turns into a runtime-type if/else ladder instead of a
//! single direct call.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodDispatch {
    /// One runtime helper regardless of the receiver's kind.
    Unique(String),
    /// Dispatch on the receiver's runtime kind tag at runtime.
    RuntimeBranch(Vec<(String, String)>),
    /// Not in the static table; falls through to the dynamic
    /// `call_method(receiver, name, args)` helper.
    Dynamic,
}

pub fn resolve_method(method_name: &str) -> MethodDispatch {
    let unique = |name: &str| MethodDispatch::Unique(name.to_string());
    let branch = |pairs: &[(&str, &str)]| {
        MethodDispatch::RuntimeBranch(
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        )
    };

    match method_name {
        "push" => unique("hml_array_push"),
        "pop" => unique("hml_array_pop"),
        "shift" => unique("hml_array_shift"),
        "unshift" => unique("hml_array_unshift"),
        "reverse" => unique("hml_array_reverse"),
        "sort" => unique("hml_array_sort"),
        "includes" => unique("hml_array_includes"),
        "indexOf" => unique("hml_array_index_of"),
        "lastIndexOf" => unique("hml_array_last_index_of"),
        "concat" => unique("hml_array_concat"),
        "flatten" => unique("hml_array_flatten"),
        "join" => unique("hml_array_join"),
        "len" => unique("hml_len"),
        "keys" => unique("hml_object_keys"),
        "values" => unique("hml_object_values"),
        "slice" => branch(&[
            ("HML_KIND_STRING", "hml_string_slice"),
            ("HML_KIND_ARRAY", "hml_array_slice"),
        ]),
        "find" => branch(&[
            ("HML_KIND_STRING", "hml_string_find"),
            ("HML_KIND_ARRAY", "hml_array_find"),
        ]),
        "contains" => branch(&[
            ("HML_KIND_STRING", "hml_string_contains"),
            ("HML_KIND_ARRAY", "hml_array_contains"),
        ]),
        "close" => branch(&[
            ("HML_KIND_FILE", "hml_file_close"),
            ("HML_KIND_CHANNEL", "hml_channel_close"),
        ]),
        "read" => branch(&[
            ("HML_KIND_FILE", "hml_file_read"),
            ("HML_KIND_BUFFER", "hml_buffer_read"),
        ]),
        "write" => branch(&[
            ("HML_KIND_FILE", "hml_file_write"),
            ("HML_KIND_BUFFER", "hml_buffer_write"),
        ]),
        "toUpperCase" => unique("hml_string_to_upper"),
        "toLowerCase" => unique("hml_string_to_lower"),
        "trim" => unique("hml_string_trim"),
        "split" => unique("hml_string_split"),
        "replace" => unique("hml_string_replace"),
        "send" => unique("hml_channel_send"),
        "recv" => unique("hml_channel_recv"),
        _ => MethodDispatch::Dynamic,
    }
}

/// Mutating array methods that return the modified collection itself.
pub fn is_array_mutating_collection(helper: &str) -> bool {
    matches!(
        helper,
        "hml_array_push" | "hml_array_unshift" | "hml_array_reverse" | "hml_array_sort"
    )
}

/// Mutating array methods that return a `[extracted_value, new_array]` pair
/// (pop/shift pattern) rather than a single value.
pub fn is_array_mutating_pair(helper: &str) -> bool {
    matches!(helper, "hml_array_pop" | "hml_array_shift")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_is_a_unique_array_helper() {
        assert_eq!(resolve_method("push"), MethodDispatch::Unique("hml_array_push".to_string()));
        assert!(is_array_mutating_collection("hml_array_push"));
    }

    #[test]
    fn slice_branches_on_runtime_kind() {
        match resolve_method("slice") {
            MethodDispatch::RuntimeBranch(branches) => assert_eq!(branches.len(), 2),
            _ => panic!("expected runtime branch"),
        }
    }

    #[test]
    fn unknown_method_falls_through_to_dynamic_dispatch() {
        assert_eq!(resolve_method("frobnicate"), MethodDispatch::Dynamic);
    }

    #[test]
    fn pop_is_a_mutating_pair() {
        assert!(is_array_mutating_pair("hml_array_pop"));
        assert!(!is_array_mutating_pair("hml_array_push"));
    }
}
