//! Stdlib root discovery.
//!
//! Implements the four-step probe the core's module resolver relies on for
//! `@stdlib/...` imports: `<exe_dir>/stdlib`, `<exe_dir>/../stdlib`,
//! `<cwd>/stdlib`, and a fixed system path. An explicit override — via the
//! `HAMLET_STDLIB_ROOT` environment variable or a project config's
//! `stdlib_root` key — always wins over the probe.

use std::path::{Path, PathBuf};

/// Where the chosen stdlib root came from. Surfaced to the CLI's `-v` logging
/// so users can see why a particular root was picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdlibRootSource {
    /// `HAMLET_STDLIB_ROOT` environment variable.
    EnvOverride,
    /// `stdlib_root` key in `hamlet.toml`.
    ProjectConfig,
    /// `<exe_dir>/stdlib`.
    NextToExecutable,
    /// `<exe_dir>/../stdlib`.
    ExecutableParent,
    /// `<cwd>/stdlib`.
    CurrentDirectory,
    /// Fixed system-wide install path.
    SystemPath,
}

const SYSTEM_STDLIB_PATH: &str = "/usr/local/share/hamlet/stdlib";

/// Discover the stdlib root, honoring overrides first.
///
/// `project_override` is the `stdlib_root` field from `ProjectConfig`, if any.
/// `exe_path` and `cwd` are injected (rather than read via `std::env`) so the
/// probe order is unit-testable without touching the real filesystem layout.
pub fn discover_stdlib_root(
    project_override: Option<&Path>,
    exe_path: Option<&Path>,
    cwd: &Path,
    exists: impl Fn(&Path) -> bool,
) -> Option<(PathBuf, StdlibRootSource)> {
    if let Ok(env_path) = std::env::var("HAMLET_STDLIB_ROOT") {
        return Some((PathBuf::from(env_path), StdlibRootSource::EnvOverride));
    }

    if let Some(path) = project_override {
        return Some((path.to_path_buf(), StdlibRootSource::ProjectConfig));
    }

    if let Some(exe) = exe_path {
        if let Some(exe_dir) = exe.parent() {
            let candidate = exe_dir.join("stdlib");
            if exists(&candidate) {
                return Some((candidate, StdlibRootSource::NextToExecutable));
            }

            if let Some(parent) = exe_dir.parent() {
                let candidate = parent.join("stdlib");
                if exists(&candidate) {
                    return Some((candidate, StdlibRootSource::ExecutableParent));
                }
            }
        }
    }

    let candidate = cwd.join("stdlib");
    if exists(&candidate) {
        return Some((candidate, StdlibRootSource::CurrentDirectory));
    }

    let system = PathBuf::from(SYSTEM_STDLIB_PATH);
    if exists(&system) {
        return Some((system, StdlibRootSource::SystemPath));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn never_exists(_: &Path) -> bool {
        false
    }

    #[test]
    #[serial]
    fn env_override_always_wins() {
        std::env::set_var("HAMLET_STDLIB_ROOT", "/tmp/custom-stdlib");
        let (root, source) = discover_stdlib_root(
            Some(Path::new("/ignored")),
            Some(Path::new("/usr/bin/hamlet")),
            Path::new("/home/user"),
            never_exists,
        )
        .unwrap();
        std::env::remove_var("HAMLET_STDLIB_ROOT");

        assert_eq!(root, PathBuf::from("/tmp/custom-stdlib"));
        assert_eq!(source, StdlibRootSource::EnvOverride);
    }

    #[test]
    #[serial]
    fn project_config_wins_over_probing() {
        std::env::remove_var("HAMLET_STDLIB_ROOT");
        let (root, source) = discover_stdlib_root(
            Some(Path::new("/opt/hamlet/stdlib")),
            Some(Path::new("/usr/bin/hamlet")),
            Path::new("/home/user"),
            never_exists,
        )
        .unwrap();

        assert_eq!(root, PathBuf::from("/opt/hamlet/stdlib"));
        assert_eq!(source, StdlibRootSource::ProjectConfig);
    }

    #[test]
    #[serial]
    fn falls_back_through_probe_order() {
        std::env::remove_var("HAMLET_STDLIB_ROOT");
        let exists = |p: &Path| p == Path::new("/home/user/stdlib");
        let (root, source) = discover_stdlib_root(
            None,
            Some(Path::new("/usr/bin/hamlet")),
            Path::new("/home/user"),
            exists,
        )
        .unwrap();

        assert_eq!(root, PathBuf::from("/home/user/stdlib"));
        assert_eq!(source, StdlibRootSource::CurrentDirectory);
    }

    #[test]
    #[serial]
    fn no_candidate_exists_returns_none() {
        std::env::remove_var("HAMLET_STDLIB_ROOT");
        let result = discover_stdlib_root(
            None,
            Some(Path::new("/usr/bin/hamlet")),
            Path::new("/home/user"),
            never_exists,
        );
        assert!(result.is_none());
    }
}
