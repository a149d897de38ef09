use std::{io, os::unix::process::CommandExt, path::Path, process::Stdio};

use nix::{
    sys::signal::{Signal, killpg},
    unistd::Pid,
};
use thiserror::Error;
use tokio::{process::Command, time::timeout};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::CompilerSettings,
    models::{CompileResult, CompileStatus},
};

const SOURCE_FILE: &str = "main.cpp";
const OUTPUT_FILE: &str = "output";
const BINARY_FILE: &str = "test";

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Failed to create work directory: {0}")]
    WorkDir(#[source] io::Error),
    #[error("Failed to write source file: {0}")]
    Source(#[source] io::Error),
    #[error("Failed to spawn compilation process: {0}")]
    Spawn(#[source] io::Error),
    #[error("Failed to wait for compilation process: {0}")]
    Wait(#[source] io::Error),
    #[error("Failed to read compiler output: {0}")]
    Output(#[source] io::Error),
}

/// Compiles `source` inside a fresh directory under the configured work dir.
///
/// The directory is removed again once the compiler output has been read,
/// whatever the outcome.
pub async fn compile(
    settings: &CompilerSettings,
    id: Uuid,
    source: &[u8],
) -> Result<CompileResult, CompileError> {
    let work_dir = settings.work_dir.join(id.to_string());
    tokio::fs::create_dir_all(&work_dir)
        .await
        .map_err(CompileError::WorkDir)?;

    let result = compile_in(settings, id, &work_dir, source).await;

    if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
        warn!("Failed to clean up {}: {e}", work_dir.display());
    }

    result
}

async fn compile_in(
    settings: &CompilerSettings,
    id: Uuid,
    work_dir: &Path,
    source: &[u8],
) -> Result<CompileResult, CompileError> {
    tokio::fs::write(work_dir.join(SOURCE_FILE), source)
        .await
        .map_err(CompileError::Source)?;

    // stdout and stderr share one file so diagnostics keep their order
    let output_path = work_dir.join(OUTPUT_FILE);
    let stdout = tokio::fs::File::create(&output_path)
        .await
        .map_err(CompileError::Output)?
        .into_std()
        .await;
    let stderr = stdout.try_clone().map_err(CompileError::Output)?;

    debug!("Starting compilation for job {id}");

    let mut command = std::process::Command::new(&settings.program);
    command
        .args(&settings.flags)
        .args(["-o", BINARY_FILE, SOURCE_FILE])
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .process_group(0);

    let mut child = Command::from(command)
        .kill_on_drop(true)
        .spawn()
        .map_err(CompileError::Spawn)?;

    let status = match timeout(settings.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            if status.success() {
                debug!("Compilation succeeded for job {id}");
                CompileStatus::Succeeded
            } else {
                debug!(
                    "Compilation failed for job {id} with exit code {:?}",
                    status.code()
                );
                CompileStatus::Failed {
                    exit_code: status.code(),
                }
            }
        }
        Ok(Err(e)) => return Err(CompileError::Wait(e)),
        Err(_) => {
            warn!(
                "Compilation for job {id} exceeded {:?}, killing it",
                settings.timeout
            );
            kill_process_group(child.id());
            if let Err(e) = child.kill().await {
                debug!("Compiler for job {id} already gone: {e}");
            }
            CompileStatus::TimedOut
        }
    };

    let raw = tokio::fs::read(&output_path)
        .await
        .map_err(CompileError::Output)?;
    let mut output = String::from_utf8_lossy(&raw).into_owned();

    if status == CompileStatus::TimedOut {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&format!(
            "Compilation timed out after {:?}\n",
            settings.timeout
        ));
    }

    Ok(CompileResult { status, output })
}

/// The compiler driver forks its own children (cc1plus, as, ld), so the
/// whole group has to go, not just the direct child.
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };

    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        warn!("Failed to kill process group {pid}: {e}");
    }
}
