pub mod build;
pub mod run;

use std::path::{Path, PathBuf};

use hamlet_config::ProjectConfig;

/// Shared setup for both `build` and `run`: load the project config next to
/// the entry file (falling back to the user-level config), then resolve the
/// stdlib root, honoring an explicit CLI override first.
pub(crate) fn resolve_stdlib_root(
    entry_file: &Path,
    cli_override: Option<&Path>,
) -> Option<PathBuf> {
    let project_dir = entry_file.parent().unwrap_or_else(|| Path::new("."));
    let config = ProjectConfig::load_with_user_fallback(project_dir).unwrap_or_default();

    let override_path = cli_override.or(config.stdlib_root.as_deref());
    let exe_path = std::env::current_exe().ok();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let (root, source) =
        hamlet_config::discover_stdlib_root(override_path, exe_path.as_deref(), &cwd, |p| p.exists())?;
    tracing::info!(?source, root = %root.display(), "selected stdlib root");
    Some(root)
}
