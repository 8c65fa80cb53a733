//! In-memory connector for tests.
//!
//! Records every open, exec and close in one shared log so tests can assert
//! hop ordering and cleanup directly.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::descriptor::RemoteDescriptor;
use super::error::RemoteError;
use super::transport::{Connection, Connector, HopOptions};
use super::types::CommandResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Open { host: String, via: Option<String> },
    Exec { host: String, command: String, input: Option<Vec<u8>> },
    Close { host: String },
}

#[derive(Default)]
struct Behavior {
    fail_open: HashMap<String, RemoteError>,
    fail_close: HashSet<String>,
    open_delay: HashMap<String, Duration>,
    exec_delay: HashMap<String, Duration>,
    exec_result: HashMap<String, Result<CommandResult, RemoteError>>,
}

/// Connector whose hops are keyed by host name.
#[derive(Clone, Default)]
pub(crate) struct MockConnector {
    events: Arc<Mutex<Vec<Event>>>,
    behavior: Arc<Mutex<Behavior>>,
    active_execs: Arc<AtomicUsize>,
    peak_execs: Arc<AtomicUsize>,
}

impl MockConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_open(self, host: &str, error: RemoteError) -> Self {
        self.with_behavior(|b| {
            b.fail_open.insert(host.to_string(), error);
        })
    }

    pub(crate) fn fail_close(self, host: &str) -> Self {
        self.with_behavior(|b| {
            b.fail_close.insert(host.to_string());
        })
    }

    pub(crate) fn open_delay(self, host: &str, delay: Duration) -> Self {
        self.with_behavior(|b| {
            b.open_delay.insert(host.to_string(), delay);
        })
    }

    pub(crate) fn exec_delay(self, host: &str, delay: Duration) -> Self {
        self.with_behavior(|b| {
            b.exec_delay.insert(host.to_string(), delay);
        })
    }

    pub(crate) fn exec_result(self, host: &str, result: Result<CommandResult, RemoteError>) -> Self {
        self.with_behavior(|b| {
            b.exec_result.insert(host.to_string(), result);
        })
    }

    fn with_behavior(self, f: impl FnOnce(&mut Behavior)) -> Self {
        f(&mut self.behavior.lock().unwrap());
        self
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Hosts in the order they were opened.
    pub(crate) fn opened(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Open { host, .. } => Some(host),
                _ => None,
            })
            .collect()
    }

    /// Hosts in the order they were closed.
    pub(crate) fn closed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Close { host } => Some(host),
                _ => None,
            })
            .collect()
    }

    /// Executed commands as `(host, command)`.
    pub(crate) fn execs(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Exec { host, command, .. } => Some((host, command)),
                _ => None,
            })
            .collect()
    }

    /// Highest number of commands that were running at the same time.
    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak_execs.load(Ordering::SeqCst)
    }
}

pub(crate) struct MockConnection {
    host: String,
    connector: MockConnector,
}

#[async_trait]
impl Connector for MockConnector {
    type Conn = MockConnection;

    async fn open(
        &self,
        hop: &RemoteDescriptor,
        via: Option<&MockConnection>,
        _options: &HopOptions,
    ) -> Result<MockConnection, RemoteError> {
        let (delay, failure) = {
            let behavior = self.behavior.lock().unwrap();
            (
                behavior.open_delay.get(&hop.host).copied(),
                behavior.fail_open.get(&hop.host).cloned(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = failure {
            return Err(error);
        }

        self.events.lock().unwrap().push(Event::Open {
            host: hop.host.clone(),
            via: via.map(|c| c.host.clone()),
        });

        Ok(MockConnection {
            host: hop.host.clone(),
            connector: self.clone(),
        })
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn exec(
        &self,
        command: &str,
        input: Option<&[u8]>,
    ) -> Result<CommandResult, RemoteError> {
        let connector = &self.connector;
        connector.events.lock().unwrap().push(Event::Exec {
            host: self.host.clone(),
            command: command.to_string(),
            input: input.map(<[u8]>::to_vec),
        });

        let (delay, result) = {
            let behavior = connector.behavior.lock().unwrap();
            (
                behavior.exec_delay.get(&self.host).copied(),
                behavior.exec_result.get(&self.host).cloned(),
            )
        };

        let running = connector.active_execs.fetch_add(1, Ordering::SeqCst) + 1;
        connector.peak_execs.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        connector.active_execs.fetch_sub(1, Ordering::SeqCst);

        result.unwrap_or_else(|| {
            Ok(CommandResult {
                exit_status: 0,
                stdout: format!("{}\n", self.host).into_bytes(),
                stderr: Vec::new(),
                signal: None,
            })
        })
    }

    async fn close(&self) -> Result<(), RemoteError> {
        let connector = &self.connector;
        connector.events.lock().unwrap().push(Event::Close {
            host: self.host.clone(),
        });

        if connector.behavior.lock().unwrap().fail_close.contains(&self.host) {
            return Err(RemoteError::TransportLost(format!("{} refused to close", self.host)));
        }
        Ok(())
    }
}

/// Task that runs a fixed argument vector.
pub(crate) struct ArgvTask(pub(crate) Vec<String>);

impl ArgvTask {
    pub(crate) fn new(argv: &[&str]) -> Self {
        Self(argv.iter().map(|a| a.to_string()).collect())
    }
}

#[async_trait]
impl super::task::RemoteTask for ArgvTask {
    fn name(&self) -> &str {
        "argv"
    }

    async fn run(
        &self,
        session: &super::task::Session<'_>,
    ) -> Result<CommandResult, RemoteError> {
        session.run(&self.0).await
    }
}
