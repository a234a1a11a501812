//! Stable error and warning code constants.
//!
//! Codes are grouped by the pass that raises them. `UNKNOWN_EXPORT` and
//! `UNSUPPORTED_CONSTRUCT` are the two tolerant errors: codegen emits a
//! `// ERROR:` comment and a null substitute for these rather than aborting.

/// Lexer/parser failed to produce a valid parse tree.
pub const PARSE_FAILURE: &str = "HM1001";
/// A module file could not be read or does not exist.
pub const MODULE_LOAD: &str = "HM1002";
/// An `import` path did not resolve to a known module.
pub const IMPORT_RESOLUTION: &str = "HM1003";
/// Two or more modules import each other, directly or transitively.
pub const CIRCULAR_DEPENDENCY: &str = "HM1004";
/// Assignment to a `const`-bound name.
pub const CONST_REASSIGNMENT: &str = "HM1005";
/// Import references a name the target module does not export. Tolerant.
pub const UNKNOWN_EXPORT: &str = "HM1006";
/// An AST node has no codegen lowering. Tolerant.
pub const UNSUPPORTED_CONSTRUCT: &str = "HM1007";
/// Fallback for errors raised without a specific code.
pub const GENERIC_ERROR: &str = "HM9999";

/// Unused local variable or parameter.
pub const UNUSED_VARIABLE: &str = "HM2001";
/// Statement following an unconditional `return`/`throw`/`break`/`continue`.
pub const UNREACHABLE_CODE: &str = "HM2002";
/// A name is declared twice in the same scope.
pub const DUPLICATE_DECLARATION: &str = "HM2003";
/// A module-level function is never called or exported.
pub const UNUSED_FUNCTION: &str = "HM2004";
/// An inner declaration shadows an outer one.
pub const SHADOWING: &str = "HM2005";
/// `if`/`while` condition is a literal `true`/`false`.
pub const CONSTANT_CONDITION: &str = "HM2006";
/// Type annotation adds no information beyond inference.
pub const UNNECESSARY_ANNOTATION: &str = "HM2007";
/// Imported name is never referenced in the importing module.
pub const UNUSED_IMPORT: &str = "HM2008";
/// Fallback for warnings raised without a specific code.
pub const GENERIC_WARNING: &str = "HM2999";
