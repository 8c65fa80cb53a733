//! Units of work run against an end host.

use async_trait::async_trait;

use super::error::RemoteError;
use super::runner::run_command;
use super::spec::RemoteSpec;
use super::transport::Connection;
use super::types::CommandResult;

/// A unit of work dispatched to every remote of a batch.
#[async_trait]
pub trait RemoteTask: Send + Sync {
    /// Identifier used in logs and reports.
    fn name(&self) -> &str;

    async fn run(&self, session: &Session<'_>) -> Result<CommandResult, RemoteError>;
}

/// The end host of a built chain, as seen by a task.
///
/// Commands run through a session inherit the remote's sudo setting
/// and command timeout.
pub struct Session<'a> {
    conn: &'a dyn Connection,
    spec: &'a RemoteSpec,
}

impl<'a> Session<'a> {
    pub fn new(conn: &'a dyn Connection, spec: &'a RemoteSpec) -> Self {
        Self { conn, spec }
    }

    pub fn spec(&self) -> &RemoteSpec {
        self.spec
    }

    pub async fn run(&self, argv: &[String]) -> Result<CommandResult, RemoteError> {
        self.run_inner(argv, None).await
    }

    /// Run `argv` with `input` written to its stdin.
    pub async fn run_with_input(
        &self,
        argv: &[String],
        input: &[u8],
    ) -> Result<CommandResult, RemoteError> {
        self.run_inner(argv, Some(input)).await
    }

    async fn run_inner(
        &self,
        argv: &[String],
        input: Option<&[u8]>,
    ) -> Result<CommandResult, RemoteError> {
        run_command(
            self.conn,
            argv,
            self.spec.sudo_password(),
            input,
            self.spec.cmd_timeout(),
        )
        .await
    }
}
