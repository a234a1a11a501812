//! Build command — compile a Hamlet source file to C.

use anyhow::{bail, Context, Result};
use hamlet_core::Diagnostic;
use std::path::{Path, PathBuf};

use crate::commands::resolve_stdlib_root;

/// Compile `file` to C, write it to `emit_c` (or `file` with a `.c`
/// extension), and optionally invoke `cc` on the result.
pub fn run(
    file: &Path,
    emit_c: Option<&Path>,
    cc: Option<&str>,
    stdlib_root: Option<&Path>,
    json_output: bool,
) -> Result<PathBuf> {
    if !file.exists() {
        bail!("source file not found: {}", file.display());
    }

    let project_dir = file.parent().unwrap_or_else(|| Path::new("."));
    let resolver = {
        let mut resolver = hamlet_core::ModuleResolver::new(project_dir.to_path_buf());
        if let Some(root) = resolve_stdlib_root(file, stdlib_root) {
            resolver = resolver.with_stdlib_root(root);
        }
        resolver
    };

    let program = match hamlet_core::compile(file, resolver) {
        Ok(program) => program,
        Err(diagnostics) => {
            print_diagnostics(&diagnostics, json_output);
            bail!("compilation failed for {}", file.display());
        }
    };

    if !program.diagnostics.is_empty() {
        print_diagnostics(&program.diagnostics, json_output);
    }

    let output_path = emit_c
        .map(Path::to_path_buf)
        .unwrap_or_else(|| file.with_extension("c"));
    std::fs::write(&output_path, &program.source)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    tracing::info!(path = %output_path.display(), "wrote generated C source");
    println!("compiled {} -> {}", file.display(), output_path.display());

    if let Some(cc) = cc {
        let binary_path = output_path.with_extension("");
        let status = std::process::Command::new(cc)
            .arg(&output_path)
            .arg("-o")
            .arg(&binary_path)
            .status()
            .with_context(|| format!("failed to invoke C compiler: {cc}"))?;
        if !status.success() {
            bail!("{cc} exited with status {status}");
        }
        println!("linked {} -> {}", output_path.display(), binary_path.display());
        return Ok(binary_path);
    }

    Ok(output_path)
}

fn print_diagnostics(diagnostics: &[Diagnostic], json_output: bool) {
    if json_output {
        for diag in diagnostics {
            if let Ok(line) = diag.to_json_string() {
                println!("{line}");
            }
        }
    } else {
        for diag in diagnostics {
            eprintln!("{}", diag.to_human_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_generated_c_next_to_source() {
        let dir = tempdir().unwrap();
        let entry = dir.path().join("main.hml");
        std::fs::write(&entry, "let x = 1;\nprint(x);\n").unwrap();

        let output = run(&entry, None, None, None, false).unwrap();
        assert_eq!(output, entry.with_extension("c"));
        let contents = std::fs::read_to_string(&output).unwrap();
        assert!(contents.contains("int main(void)"));
    }

    #[test]
    fn missing_source_file_is_an_error() {
        let result = run(Path::new("/nonexistent/does-not-exist.hml"), None, None, None, false);
        assert!(result.is_err());
    }

    #[test]
    fn honors_explicit_emit_c_path() {
        let dir = tempdir().unwrap();
        let entry = dir.path().join("main.hml");
        std::fs::write(&entry, "let x = 1;\n").unwrap();
        let out = dir.path().join("custom.c");

        let output = run(&entry, Some(&out), None, None, false).unwrap();
        assert_eq!(output, out);
        assert!(out.exists());
    }
}
