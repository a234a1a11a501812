//! Warning configuration and collection system
//!
//! Provides configurable warning levels (allow/warn/deny) per warning code,
//! with support for global warning level and per-code overrides.

use crate::diagnostic::{error_codes, Diagnostic, DiagnosticLevel};
use std::collections::{HashMap, HashSet};

/// Warning severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningLevel {
    /// Suppress the warning entirely
    Allow,
    /// Emit as a warning (default)
    Warn,
    /// Promote to an error
    Deny,
}

/// Warning kind classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    UnusedVariable,
    UnreachableCode,
    DuplicateDeclaration,
    UnusedFunction,
    Shadowing,
    ConstantCondition,
    UnnecessaryAnnotation,
    UnusedImport,
    /// Import references a name the target module does not export.
    UnknownExport,
    /// An AST node has no codegen lowering.
    UnsupportedConstruct,
}

impl WarningKind {
    /// Get the error code for this warning kind
    pub fn code(&self) -> &'static str {
        match self {
            WarningKind::UnusedVariable => error_codes::UNUSED_VARIABLE,
            WarningKind::UnreachableCode => error_codes::UNREACHABLE_CODE,
            WarningKind::DuplicateDeclaration => error_codes::DUPLICATE_DECLARATION,
            WarningKind::UnusedFunction => error_codes::UNUSED_FUNCTION,
            WarningKind::Shadowing => error_codes::SHADOWING,
            WarningKind::ConstantCondition => error_codes::CONSTANT_CONDITION,
            WarningKind::UnnecessaryAnnotation => error_codes::UNNECESSARY_ANNOTATION,
            WarningKind::UnusedImport => error_codes::UNUSED_IMPORT,
            WarningKind::UnknownExport => error_codes::UNKNOWN_EXPORT,
            WarningKind::UnsupportedConstruct => error_codes::UNSUPPORTED_CONSTRUCT,
        }
    }

    /// Parse from error code string
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            c if c == error_codes::UNUSED_VARIABLE => Some(WarningKind::UnusedVariable),
            c if c == error_codes::UNREACHABLE_CODE => Some(WarningKind::UnreachableCode),
            c if c == error_codes::DUPLICATE_DECLARATION => Some(WarningKind::DuplicateDeclaration),
            c if c == error_codes::UNUSED_FUNCTION => Some(WarningKind::UnusedFunction),
            c if c == error_codes::SHADOWING => Some(WarningKind::Shadowing),
            c if c == error_codes::CONSTANT_CONDITION => Some(WarningKind::ConstantCondition),
            c if c == error_codes::UNNECESSARY_ANNOTATION => Some(WarningKind::UnnecessaryAnnotation),
            c if c == error_codes::UNUSED_IMPORT => Some(WarningKind::UnusedImport),
            c if c == error_codes::UNKNOWN_EXPORT => Some(WarningKind::UnknownExport),
            c if c == error_codes::UNSUPPORTED_CONSTRUCT => Some(WarningKind::UnsupportedConstruct),
            _ => None,
        }
    }
}

/// Warning configuration controlling which warnings are emitted
#[derive(Debug, Clone)]
pub struct WarningConfig {
    /// Global warning level (default: Warn)
    pub default_level: WarningLevel,
    /// Per-code overrides
    overrides: HashMap<String, WarningLevel>,
    /// Codes explicitly allowed (suppressed)
    allow_set: HashSet<String>,
    /// Codes explicitly denied (promoted to errors)
    deny_set: HashSet<String>,
}

impl WarningConfig {
    /// Create a default warning config (all warnings enabled)
    pub fn new() -> Self {
        Self {
            default_level: WarningLevel::Warn,
            overrides: HashMap::new(),
            allow_set: HashSet::new(),
            deny_set: HashSet::new(),
        }
    }

    /// Create a config that suppresses all warnings
    pub fn allow_all() -> Self {
        Self {
            default_level: WarningLevel::Allow,
            overrides: HashMap::new(),
            allow_set: HashSet::new(),
            deny_set: HashSet::new(),
        }
    }

    /// Create a config that denies all warnings (treats as errors)
    pub fn deny_all() -> Self {
        Self {
            default_level: WarningLevel::Deny,
            overrides: HashMap::new(),
            allow_set: HashSet::new(),
            deny_set: HashSet::new(),
        }
    }

    /// Allow (suppress) a specific warning code
    pub fn allow(&mut self, code: impl Into<String>) {
        let code = code.into();
        self.deny_set.remove(&code);
        self.allow_set.insert(code.clone());
        self.overrides.insert(code, WarningLevel::Allow);
    }

    /// Deny (promote to error) a specific warning code
    pub fn deny(&mut self, code: impl Into<String>) {
        let code = code.into();
        self.allow_set.remove(&code);
        self.deny_set.insert(code.clone());
        self.overrides.insert(code, WarningLevel::Deny);
    }

    /// Set a specific warning code to warn level
    pub fn warn(&mut self, code: impl Into<String>) {
        let code = code.into();
        self.allow_set.remove(&code);
        self.deny_set.remove(&code);
        self.overrides.insert(code, WarningLevel::Warn);
    }

    /// Get the effective level for a warning code
    pub fn level_for(&self, code: &str) -> WarningLevel {
        if let Some(level) = self.overrides.get(code) {
            *level
        } else {
            self.default_level
        }
    }

    /// Check if a code is allowed (suppressed)
    pub fn is_allowed(&self, code: &str) -> bool {
        self.level_for(code) == WarningLevel::Allow
    }

    /// Check if a code is denied (promoted to error)
    pub fn is_denied(&self, code: &str) -> bool {
        self.level_for(code) == WarningLevel::Deny
    }
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Warning emitter that collects and filters warnings
#[derive(Debug, Clone)]
pub struct WarningEmitter {
    config: WarningConfig,
    warnings: Vec<Diagnostic>,
    errors: Vec<Diagnostic>,
}

impl WarningEmitter {
    /// Create a new warning emitter with the given config
    pub fn new(config: WarningConfig) -> Self {
        Self {
            config,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Create with default config
    pub fn default_config() -> Self {
        Self::new(WarningConfig::new())
    }

    /// Emit a warning diagnostic, applying config rules
    pub fn emit(&mut self, diag: Diagnostic) {
        let level = self.config.level_for(&diag.code);
        match level {
            WarningLevel::Allow => {
                // Suppressed, don't collect
            }
            WarningLevel::Warn => {
                self.warnings.push(diag);
            }
            WarningLevel::Deny => {
                // Promote to error
                let error = Diagnostic {
                    level: DiagnosticLevel::Error,
                    ..diag
                };
                self.errors.push(error);
            }
        }
    }

    /// Get collected warnings
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Get warnings promoted to errors
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Check if any warnings were collected
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if any warnings were promoted to errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get all diagnostics (warnings + promoted errors)
    pub fn all_diagnostics(&self) -> Vec<Diagnostic> {
        let mut all = self.errors.clone();
        all.extend(self.warnings.clone());
        all
    }

    /// Get the warning config
    pub fn config(&self) -> &WarningConfig {
        &self.config
    }

    /// Clear all collected diagnostics
    pub fn clear(&mut self) {
        self.warnings.clear();
        self.errors.clear();
    }

    /// Total count of warnings + errors
    pub fn count(&self) -> usize {
        self.warnings.len() + self.errors.len()
    }
}

/// Build a `WarningConfig` from `hamlet.toml`'s `[warnings]` table, as parsed
/// into `hamlet_config::ProjectConfig.warnings` (code -> "allow"|"warn"|"deny").
pub fn config_from_project(warnings: &HashMap<String, String>) -> WarningConfig {
    let mut config = WarningConfig::new();

    for (code, level) in warnings {
        match level.as_str() {
            "allow" => config.allow(code.clone()),
            "deny" => config.deny(code.clone()),
            "warn" => config.warn(code.clone()),
            _ => {}
        }
    }

    config
}
