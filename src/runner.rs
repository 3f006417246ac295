//! AppleScript execution.
//!
//! Every outbound automation call flows through the [`ScriptRunner`] trait so
//! the server can be exercised in tests with a recording fake. The production
//! implementation shells out to `osascript` under a hard timeout.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Default wall-clock budget for a single `osascript` invocation.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure modes of a single automation call.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("failed to launch osascript: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("AppleScript execution failed: {stderr}")]
    ScriptFailed { stderr: String },

    #[error("AppleScript execution timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Stateless collaborator that executes one AppleScript and returns its
/// trimmed stdout.
#[async_trait]
pub trait ScriptRunner: Send + Sync + std::fmt::Debug {
    async fn run(&self, script: &str) -> Result<String, AutomationError>;
}

/// Production runner: `osascript -e <script>`.
///
/// The script is passed as a direct argument rather than through a shell, so
/// the script text itself needs no quoting. A timed-out process cannot be
/// interrupted mid-script; whatever state the partial run left behind in
/// Things 3 stays as-is.
#[derive(Debug, Clone)]
pub struct OsascriptRunner {
    timeout: Duration,
}

impl OsascriptRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for OsascriptRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_TIMEOUT)
    }
}

#[async_trait]
impl ScriptRunner for OsascriptRunner {
    async fn run(&self, script: &str) -> Result<String, AutomationError> {
        let started = std::time::Instant::now();
        let output = tokio::time::timeout(
            self.timeout,
            Command::new("osascript").arg("-e").arg(script).output(),
        )
        .await
        .map_err(|_| AutomationError::Timeout(self.timeout))??;

        tracing::debug!(
            script_bytes = script.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            success = output.status.success(),
            "osascript finished"
        );

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(%stderr, "osascript reported failure");
            Err(AutomationError::ScriptFailed { stderr })
        }
    }
}
