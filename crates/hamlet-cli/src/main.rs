//! Hamlet compiler driver.
//!
//! Thin argument-parsing and orchestration shell around `hamlet-core`:
//! resolve the stdlib root, build a `ModuleResolver`, hand the entry file to
//! `hamlet_core::compile`, and either write the emitted C or additionally
//! shell out to a C compiler (and, for `run`, the resulting binary).

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The Hamlet compiler.
#[derive(Parser)]
#[command(name = "hamlet", version, about = "Compiles Hamlet source to C")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity. Pass twice for trace-level output.
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a Hamlet source file to C.
    Build {
        /// Entry-point .hml file.
        file: PathBuf,

        /// Output path for the generated C source. Defaults to the input
        /// path with its extension replaced by `.c`.
        #[arg(long = "emit-c")]
        emit_c: Option<PathBuf>,

        /// Path to a C compiler to additionally invoke on the emitted source.
        #[arg(long)]
        cc: Option<String>,

        /// Override the stdlib root instead of probing for it.
        #[arg(long)]
        stdlib_root: Option<PathBuf>,

        /// Print diagnostics as newline-delimited JSON instead of the
        /// human-readable format.
        #[arg(long)]
        json: bool,
    },
    /// Compile and immediately run a Hamlet source file.
    Run {
        /// Entry-point .hml file.
        file: PathBuf,

        /// Path to a C compiler to invoke on the emitted source.
        #[arg(long, default_value = "cc")]
        cc: String,

        /// Override the stdlib root instead of probing for it.
        #[arg(long)]
        stdlib_root: Option<PathBuf>,

        /// Print diagnostics as newline-delimited JSON instead of the
        /// human-readable format.
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("hamlet_cli={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Build { file, emit_c, cc, stdlib_root, json } => {
            commands::build::run(&file, emit_c.as_deref(), cc.as_deref(), stdlib_root.as_deref(), json)
                .map(|_| ())
        }
        Command::Run { file, cc, stdlib_root, json } => {
            commands::run::run(&file, &cc, stdlib_root.as_deref(), json)
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
