//! Run command — compile a Hamlet source file to C, link it, and execute it.

use anyhow::{bail, Result};
use std::path::Path;

use crate::commands::build;

/// Compile `file`, link the result with `cc`, then execute the binary,
/// forwarding its exit status.
pub fn run(file: &Path, cc: &str, stdlib_root: Option<&Path>, json_output: bool) -> Result<()> {
    let binary_path = build::run(file, None, Some(cc), stdlib_root, json_output)?;

    let status = std::process::Command::new(&binary_path).status()?;
    if !status.success() {
        bail!("{} exited with status {}", binary_path.display(), status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_source_file_is_an_error() {
        let result = run(Path::new("/nonexistent/does-not-exist.hml"), "cc", None, false);
        assert!(result.is_err());
    }

    #[test]
    fn missing_source_never_reaches_the_compiler_invocation() {
        // Guards against accidentally shelling out before validating the
        // entry file exists — `cc` here is deliberately unresolvable.
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.hml");
        let result = run(&missing, "definitely-not-a-real-compiler", None, false);
        assert!(result.is_err());
    }
}
