//! Built-in units of work.
//!
//! Each task is constructed from the command-line words following its name
//! and runs the same way on every remote of a batch.

use std::path::Path;

use async_trait::async_trait;

use crate::remote::{CommandResult, RemoteError, RemoteTask, Session};

/// Runs an arbitrary command line.
pub struct ExecTask {
    argv: Vec<String>,
}

impl ExecTask {
    pub fn new(argv: Vec<String>) -> Result<Self, RemoteError> {
        if argv.is_empty() {
            return Err(RemoteError::Fatal("exec needs a command".to_string()));
        }
        Ok(Self { argv })
    }
}

#[async_trait]
impl RemoteTask for ExecTask {
    fn name(&self) -> &str {
        "exec"
    }

    async fn run(&self, session: &Session<'_>) -> Result<CommandResult, RemoteError> {
        session.run(&self.argv).await
    }
}

/// Prints the remote host name.
pub struct HostnameTask;

#[async_trait]
impl RemoteTask for HostnameTask {
    fn name(&self) -> &str {
        "hostname"
    }

    async fn run(&self, session: &Session<'_>) -> Result<CommandResult, RemoteError> {
        session.run(&["hostname".to_string()]).await
    }
}

/// Reports file system disk space usage, one POSIX line per file system.
pub struct DiskFreeTask {
    human: bool,
}

impl DiskFreeTask {
    pub fn new(human: bool) -> Self {
        Self { human }
    }

    fn argv(&self) -> Vec<String> {
        let mut argv = vec!["df".to_string(), "-P".to_string()];
        if self.human {
            argv.push("-h".to_string());
        }
        argv
    }
}

#[async_trait]
impl RemoteTask for DiskFreeTask {
    fn name(&self) -> &str {
        "df"
    }

    async fn run(&self, session: &Session<'_>) -> Result<CommandResult, RemoteError> {
        session.run(&self.argv()).await
    }
}

/// Prints a remote file.
pub struct CatTask {
    path: String,
}

impl CatTask {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RemoteTask for CatTask {
    fn name(&self) -> &str {
        "cat"
    }

    async fn run(&self, session: &Session<'_>) -> Result<CommandResult, RemoteError> {
        session
            .run(&["cat".to_string(), "--".to_string(), self.path.clone()])
            .await
    }
}

/// Pipes a local shell script into `bash -s` on the remote.
pub struct ScriptTask {
    script: Vec<u8>,
}

impl ScriptTask {
    pub fn new(script: impl Into<Vec<u8>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    /// Read the script from a local file.
    pub fn from_file(path: &Path) -> Result<Self, RemoteError> {
        let script = std::fs::read(path).map_err(|e| {
            RemoteError::Fatal(format!("failed to read script {}: {e}", path.display()))
        })?;
        Ok(Self::new(script))
    }
}

#[async_trait]
impl RemoteTask for ScriptTask {
    fn name(&self) -> &str {
        "script"
    }

    async fn run(&self, session: &Session<'_>) -> Result<CommandResult, RemoteError> {
        session
            .run_with_input(&["bash".to_string(), "-s".to_string()], &self.script)
            .await
    }
}
