//! Command results and the serializable report types.
//!
//! [`CommandResult`] is what the runner produces. The `*Response` types are the
//! JSON shape of a dispatch batch, shared by the CLI's JSON output and the MCP
//! tools; they derive `JsonSchema` for MCP protocol compatibility.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::dispatch::{DispatchReport, RemoteOutcome};
use super::error::{CleanupError, ErrorKind};
use super::spec::RemoteSpec;

/// Output of a remote command that completed within its timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommandResult {
    /// Exit status reported by the remote; -1 when the process died by signal.
    pub exit_status: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Name of the terminating signal, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
}

impl CommandResult {
    /// Check if command succeeded (exit status 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_status == 0 && self.signal.is_none()
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Result of one remote within a batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RemoteOutcomeResponse {
    /// `user@host:port` of the end host
    pub remote: String,
    /// Hops taken, e.g. `ssh://a@jump:22 -> ssh://b@db:22`
    pub route: String,
    /// Whether the task completed (a non-zero exit status still counts)
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Connections that failed to close (secondary diagnostics)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleanup_errors: Vec<CleanupError>,
    /// RFC3339 timestamps
    pub started_at: String,
    pub finished_at: String,
}

impl From<&RemoteOutcome> for RemoteOutcomeResponse {
    fn from(outcome: &RemoteOutcome) -> Self {
        let (ok, exit_status, signal, stdout, stderr, error_kind, error) = match &outcome.result {
            Ok(result) => (
                true,
                Some(result.exit_status),
                result.signal.clone(),
                result.stdout_lossy(),
                result.stderr_lossy(),
                None,
                None,
            ),
            Err(e) => (
                false,
                None,
                None,
                String::new(),
                String::new(),
                Some(e.kind()),
                Some(e.to_string()),
            ),
        };

        Self {
            remote: outcome.remote.clone(),
            route: outcome.route.clone(),
            ok,
            exit_status,
            signal,
            stdout,
            stderr,
            error_kind,
            error,
            cleanup_errors: outcome.cleanup_errors.clone(),
            started_at: outcome.started_at.to_rfc3339(),
            finished_at: outcome.finished_at.to_rfc3339(),
        }
    }
}

/// Result of a whole dispatch batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DispatchResponse {
    pub batch_id: String,
    /// Name of the task that was dispatched
    pub task: String,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<RemoteOutcomeResponse>,
}

impl From<&DispatchReport> for DispatchResponse {
    fn from(report: &DispatchReport) -> Self {
        let outcomes: Vec<RemoteOutcomeResponse> =
            report.outcomes.iter().map(RemoteOutcomeResponse::from).collect();
        let failed = outcomes.iter().filter(|o| !o.ok).count();

        Self {
            batch_id: report.batch_id.to_string(),
            task: report.task.clone(),
            succeeded: outcomes.len() - failed,
            failed,
            outcomes,
        }
    }
}

/// A resolved remote, as returned by `remote_resolve`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedRemoteResponse {
    pub remote: String,
    pub route: String,
    pub hops: usize,
    pub sudo: bool,
    pub strict_host_key_checking: bool,
    pub login_timeout_secs: u64,
    pub cmd_timeout_secs: u64,
}

impl From<&RemoteSpec> for ResolvedRemoteResponse {
    fn from(spec: &RemoteSpec) -> Self {
        Self {
            remote: spec.identity(),
            route: spec.route(),
            hops: spec.hop_count(),
            sudo: spec.sudo_password().is_some(),
            strict_host_key_checking: spec.options().strict_host_key_checking,
            login_timeout_secs: spec.login_timeout().as_secs(),
            cmd_timeout_secs: spec.cmd_timeout().as_secs(),
        }
    }
}

/// Every remote of a resolution, in input order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedRemotesResponse {
    pub remotes: Vec<ResolvedRemoteResponse>,
}
