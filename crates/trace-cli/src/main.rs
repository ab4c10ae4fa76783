//! Command-line driver: compiles and traces a single C/C++ source file,
//! printing the resulting state sequence as JSON.

use std::{fs, path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use trace_engine::{CompilerConfig, EngineLimits, SessionManager};

#[derive(Parser)]
#[command(name = "trace")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trace a C/C++ program's execution as a sequence of states", long_about = None)]
struct Cli {
    /// Source file to trace
    file: PathBuf,

    /// Compiler binary to invoke for syntax validation (defaults to $CXX, then g++)
    #[arg(long)]
    compiler: Option<String>,

    /// Compiler timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error reading {}: {err}", cli.file.display());
            return ExitCode::FAILURE;
        }
    };

    let mut compiler = CompilerConfig::default();
    if let Some(binary) = cli.compiler {
        compiler.binary = binary;
    }
    if let Some(secs) = cli.timeout_secs {
        compiler.timeout = Duration::from_secs(secs);
    }

    let manager = SessionManager::new(EngineLimits::default(), compiler);

    let started = match manager.start_session(source) {
        Ok(started) => started,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(session_id = %started.session_id, total_steps = started.total_steps, "trace started");

    let mut states = vec![started.initial_state.to_json()];
    for _ in 1..started.total_steps {
        match manager.step_forward(&started.session_id) {
            Ok(outcome) => states.push(outcome.state.to_json()),
            Err(err) => {
                eprintln!("error stepping: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
    manager.end_session(&started.session_id);

    match serde_json::to_string_pretty(&states) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error serializing trace: {err}");
            ExitCode::FAILURE
        }
    }
}
