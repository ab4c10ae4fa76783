//! The native compiler validator.
//!
//! The engine never executes compiled code; `g++` is invoked purely to
//! reject syntactically invalid input before a trace is built. Every
//! artifact lives under a UUID-scoped temp directory and is removed on
//! every exit path, even though the resource here is a subprocess and
//! temp files rather than an interpreter budget.

use std::{
    fs,
    io::Write,
    path::Path,
    process::{Command, Stdio},
    time::{Duration, Instant},
};

use uuid::Uuid;

use crate::error::CompileError;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Which compiler binary to invoke and how long to wait for it (spec
/// section 4.8): `--compiler` overrides the binary (default `$CXX`, then
/// `g++`); `--timeout-secs` overrides the 30s wall-clock budget.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub binary: String,
    pub timeout: Duration,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            binary: std::env::var("CXX").unwrap_or_else(|_| "g++".to_owned()),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Validates `source` against a C++17 toolchain. `Ok(())` means the native
/// compiler accepted it; any other outcome is a [`CompileError`].
pub fn validate(source: &str, config: &CompilerConfig) -> Result<(), CompileError> {
    let scope = Uuid::new_v4();
    let dir = std::env::temp_dir().join(format!("trace-engine-{scope}"));
    fs::create_dir_all(&dir).map_err(io_as_toolchain_error)?;
    let result = compile_in(&dir, source, config);
    let _ = fs::remove_dir_all(&dir);
    result
}

fn compile_in(dir: &Path, source: &str, config: &CompilerConfig) -> Result<(), CompileError> {
    let src_path = dir.join("main.cpp");
    let out_path = dir.join("main.out");
    write_source(&src_path, source)?;

    let mut child = Command::new(&config.binary)
        .args(["-std=c++17", "-fsyntax-only"])
        .arg(&src_path)
        .arg("-o")
        .arg(&out_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(io_as_toolchain_error)?;

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().map_err(io_as_toolchain_error)? {
            let output = child.wait_with_output().map_err(io_as_toolchain_error)?;
            return if status.success() {
                Ok(())
            } else {
                let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
                diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
                Err(CompileError::Rejected(diagnostics))
            };
        }
        if start.elapsed() > config.timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CompileError::TimedOut);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn write_source(path: &Path, source: &str) -> Result<(), CompileError> {
    let mut file = fs::File::create(path).map_err(io_as_toolchain_error)?;
    file.write_all(source.as_bytes()).map_err(io_as_toolchain_error)
}

fn io_as_toolchain_error(err: std::io::Error) -> CompileError {
    CompileError::ToolchainUnavailable(err.to_string())
}
