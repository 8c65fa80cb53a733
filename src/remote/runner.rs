//! Command execution on the end host of a chain.
//!
//! The argument vector is joined with spaces and handed to the remote shell.
//! With privilege escalation the command runs through `sudo -S`, which reads
//! the password from stdin; the secret never appears on a command line.

use std::time::Duration;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::descriptor::Secret;
use super::error::RemoteError;
use super::transport::Connection;
use super::types::CommandResult;

/// Join an argument vector into one shell command line.
pub fn join_argv(argv: &[String]) -> String {
    argv.join(" ")
}

/// Wrap a command to run as root. `-p ''` suppresses the prompt so it does
/// not end up in stderr.
pub fn wrap_sudo(command: &str) -> String {
    format!("sudo -S -p '' {command}")
}

/// Run `argv` on `conn`, bounded by `timeout` from the moment it is submitted.
///
/// A non-zero exit status is returned as data. On timeout the local wait is
/// abandoned; the remote process may keep running.
pub async fn run_command(
    conn: &dyn Connection,
    argv: &[String],
    sudo: Option<&Secret>,
    input: Option<&[u8]>,
    timeout: Duration,
) -> Result<CommandResult, RemoteError> {
    if argv.is_empty() {
        return Err(RemoteError::Fatal("empty command".to_string()));
    }

    let command = join_argv(argv);
    debug!(command = %command, sudo = sudo.is_some(), "running command");

    let (command, stdin) = match sudo {
        Some(secret) => {
            let mut stdin = secret.with_newline();
            if let Some(input) = input {
                stdin.extend_from_slice(input);
            }
            (wrap_sudo(&command), Some(stdin))
        }
        None => (command, input.map(|i| Zeroizing::new(i.to_vec()))),
    };

    let stdin = stdin.as_deref().map(Vec::as_slice);
    match tokio::time::timeout(timeout, conn.exec(&command, stdin)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout = ?timeout, "command timed out");
            Err(RemoteError::CommandTimedOut { timeout })
        }
    }
}
