//! Explicit registry of the commands the CLI can dispatch.
//!
//! Commands are registered by name at startup; there is no discovery. A
//! factory turns the words after the command name into a task, rejecting
//! malformed usage before any connection is opened.

use std::collections::BTreeMap;
use std::path::Path;

use crate::remote::{RemoteError, RemoteTask};
use crate::tasks::{CatTask, DiskFreeTask, ExecTask, HostnameTask, ScriptTask};

/// Builds a task from the command's arguments.
pub type TaskFactory = fn(&[String]) -> Result<Box<dyn RemoteTask>, RemoteError>;

/// A registered command.
#[derive(Clone)]
pub struct CommandEntry {
    pub name: &'static str,
    pub usage: &'static str,
    pub about: &'static str,
    factory: TaskFactory,
}

/// Command name to factory.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    entries: BTreeMap<&'static str, CommandEntry>,
}

fn usage_error(usage: &str) -> RemoteError {
    RemoteError::Fatal(format!("usage: {usage}"))
}

fn exec_factory(args: &[String]) -> Result<Box<dyn RemoteTask>, RemoteError> {
    if args.is_empty() {
        return Err(usage_error("exec <command> [args...]"));
    }
    Ok(Box::new(ExecTask::new(args.to_vec())?))
}

fn hostname_factory(args: &[String]) -> Result<Box<dyn RemoteTask>, RemoteError> {
    if !args.is_empty() {
        return Err(usage_error("hostname"));
    }
    Ok(Box::new(HostnameTask))
}

fn df_factory(args: &[String]) -> Result<Box<dyn RemoteTask>, RemoteError> {
    match args {
        [] => Ok(Box::new(DiskFreeTask::new(false))),
        [flag] if flag == "--human" || flag == "-h" => Ok(Box::new(DiskFreeTask::new(true))),
        _ => Err(usage_error("df [-h|--human]")),
    }
}

fn cat_factory(args: &[String]) -> Result<Box<dyn RemoteTask>, RemoteError> {
    match args {
        [path] => Ok(Box::new(CatTask::new(path.clone()))),
        _ => Err(usage_error("cat <remote-path>")),
    }
}

fn script_factory(args: &[String]) -> Result<Box<dyn RemoteTask>, RemoteError> {
    match args {
        [path] => Ok(Box::new(ScriptTask::from_file(Path::new(path))?)),
        _ => Err(usage_error("script <local-file>")),
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register("exec", "exec <command> [args...]", "Run a command line", exec_factory)
            .register("hostname", "hostname", "Print the host name", hostname_factory)
            .register("df", "df [-h|--human]", "Report disk space usage", df_factory)
            .register("cat", "cat <remote-path>", "Print a remote file", cat_factory)
            .register(
                "script",
                "script <local-file>",
                "Run a local shell script with bash",
                script_factory,
            );
        registry
    }

    /// Add or replace a command.
    pub fn register(
        &mut self,
        name: &'static str,
        usage: &'static str,
        about: &'static str,
        factory: TaskFactory,
    ) -> &mut Self {
        self.entries.insert(
            name,
            CommandEntry {
                name,
                usage,
                about,
                factory,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.get(name)
    }

    /// Registered commands, sorted by name.
    pub fn entries(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.values()
    }

    /// Build the task for `name` from its arguments.
    pub fn create(&self, name: &str, args: &[String]) -> Result<Box<dyn RemoteTask>, RemoteError> {
        let entry = self.get(name).ok_or_else(|| {
            RemoteError::Fatal(format!(
                "unknown command '{name}', see --list-commands"
            ))
        })?;
        (entry.factory)(args)
    }

    /// One line per command, for `--list-commands`.
    pub fn describe(&self) -> String {
        let width = self.entries().map(|e| e.usage.len()).max().unwrap_or(0);
        self.entries()
            .map(|e| format!("  {:<width$}  {}\n", e.usage, e.about))
            .collect()
    }
}
