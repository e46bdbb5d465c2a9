mod runner;
mod uploads;

pub use runner::{ProcessOutput, ProcessRunner};
pub use uploads::{ImageSlot, UploadStore, UploadedImageSet};

use crate::{Error, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Runs the external analyzer over one image set and interprets its output.
#[derive(Debug, Clone)]
pub struct ColorAnalyzer {
    runner: ProcessRunner,
}

impl ColorAnalyzer {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }

    /// Spawns the analyzer with the three paths, waits for it to exit,
    /// removes the uploads, then parses stdout.
    ///
    /// The uploads are removed before this returns, whatever the outcome.
    pub async fn analyze(&self, images: UploadedImageSet) -> Result<Value> {
        let outcome = self.runner.run(images.paths()).await;
        images.cleanup().await;

        let output = outcome?;
        interpret(output)
    }
}

fn interpret(output: ProcessOutput) -> Result<Value> {
    let stderr = output.stderr_lossy();

    if !output.success() {
        warn!(
            "External analyzer failed with {} ({} bytes of stdout discarded)",
            output.status,
            output.stdout.len()
        );
        return Err(Error::external_process(
            format!("analyzer exited with {}", output.status),
            stderr,
        ));
    }

    if !stderr.is_empty() {
        debug!(stderr = %stderr, "External analyzer wrote to stderr");
    }

    let value: Value = serde_json::from_slice(&output.stdout).map_err(|e| {
        Error::invalid_output(format!(
            "{} (stdout: {:?})",
            e,
            String::from_utf8_lossy(&output.stdout)
        ))
    })?;

    info!("External analyzer succeeded");
    Ok(value)
}
