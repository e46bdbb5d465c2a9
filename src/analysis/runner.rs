use crate::{Error, Result, config::AnalysisConfig};
use std::{
    ffi::OsStr,
    process::{ExitStatus, Stdio},
    time::Duration,
};
use tokio::{
    io::AsyncReadExt,
    process::{Child, Command},
    time::timeout,
};
use tracing::{debug, warn};

/// Everything the process wrote, plus how it ended.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Spawns a fixed command, appends per-call arguments, and buffers stdout
/// and stderr until the process exits.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    command: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            timeout: None,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
            .with_timeout(config.timeout_secs.map(Duration::from_secs))
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs the process to completion. A non-zero exit is not an error here;
    /// failing to spawn, to read the pipes, or to finish in time is.
    pub async fn run<I, S>(&self, extra_args: I) -> Result<ProcessOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .args(extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            command = %self.command,
            args = ?self.args,
            timeout_secs = ?self.timeout.map(|t| t.as_secs_f32()),
            "Spawning external process"
        );

        let mut child = cmd.spawn().map_err(|e| {
            Error::external_process(format!("failed to spawn {}: {}", self.command, e), "")
        })?;

        let Some(limit) = self.timeout else {
            return collect_output(&mut child).await;
        };

        match timeout(limit, collect_output(&mut child)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    command = %self.command,
                    "External process did not exit within {:?}, killing it",
                    limit
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill external process {}: {}", self.command, e);
                }
                Err(Error::external_process(
                    format!("{} timed out after {:?}", self.command, limit),
                    "",
                ))
            }
        }
    }
}

async fn collect_output(child: &mut Child) -> Result<ProcessOutput> {
    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| Error::internal("stdout of external process was not captured"))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| Error::internal("stderr of external process was not captured"))?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let (status, _, _) = tokio::try_join!(
        child.wait(),
        stdout_pipe.read_to_end(&mut stdout),
        stderr_pipe.read_to_end(&mut stderr),
    )?;

    debug!(
        "External process exited with {} ({} bytes stdout, {} bytes stderr)",
        status,
        stdout.len(),
        stderr.len()
    );

    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
    })
}
