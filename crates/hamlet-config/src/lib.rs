//! Configuration surface for the Hamlet toolchain.
//!
//! Everything the core codegen (`hamlet-core`) treats as "environment
//! configuration exposed by the surrounding CLI" lives here: stdlib-root
//! discovery/override, diagnostic color mode, and an optional per-project
//! `hamlet.toml`. The codegen core itself never reads the environment or
//! the filesystem for configuration — it is handed a resolved `BuildConfig`.

mod stdlib_root;

pub use stdlib_root::{discover_stdlib_root, StdlibRootSource};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading project configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Diagnostic color policy, mirrored by `hamlet_core::diagnostic::formatter::ColorMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPreference {
    Always,
    Never,
    #[default]
    Auto,
}

/// Project-level configuration, loaded from an optional `hamlet.toml` next
/// to the entry file (or the current directory).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Explicit stdlib root override. Takes priority over the four-step
    /// probe in `discover_stdlib_root` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdlib_root: Option<PathBuf>,

    /// Diagnostic color output policy.
    #[serde(default)]
    pub color: ColorPreference,

    /// Default warning level overrides, keyed by warning code (e.g. `"HM2001"`).
    #[serde(default)]
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub warnings: std::collections::HashMap<String, String>,
}

impl ProjectConfig {
    /// Load from `hamlet.toml` at `path`. Returns the default config if the
    /// file doesn't exist — an explicit config file is optional.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load `hamlet.toml` from `project_dir`, falling back to a user-level
    /// config in the platform config directory (`~/.config/hamlet/config.toml`
    /// on Linux) when the project itself carries none. Project settings always
    /// take priority field-by-field is not attempted — the first file found wins,
    /// matching the teacher's single-layer `atlas-config` resolution.
    pub fn load_with_user_fallback(project_dir: &Path) -> Result<Self, ConfigError> {
        let project_path = project_dir.join("hamlet.toml");
        if project_path.exists() {
            return Self::load(&project_path);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_path = config_dir.join("hamlet").join("config.toml");
            if user_path.exists() {
                return Self::load(&user_path);
            }
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = ProjectConfig::load(Path::new("/nonexistent/hamlet.toml")).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn parses_stdlib_root_and_color() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hamlet.toml");
        std::fs::write(&path, "stdlib_root = \"/opt/hamlet/stdlib\"\ncolor = \"never\"\n").unwrap();

        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.stdlib_root, Some(PathBuf::from("/opt/hamlet/stdlib")));
        assert_eq!(config.color, ColorPreference::Never);
    }

    #[test]
    fn rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hamlet.toml");
        std::fs::write(&path, "bogus_field = true\n").unwrap();

        assert!(matches!(
            ProjectConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
