//! Fan-out of one task across many remotes.
//!
//! Every remote runs its own acquire/use/release pipeline. Pipelines run
//! concurrently up to `max_parallel` and share nothing but the connector and
//! the cancellation token, so a slow or failing remote only affects itself.
//! The report holds one outcome per remote, in input order.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use chrono::{DateTime, Utc};
use futures::{FutureExt, StreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, error, info, info_span, warn};
use uuid::Uuid;

use super::config::resolve_max_parallel;
use super::error::{CleanupError, RemoteError};
use super::lifecycle::{ScopedOutcome, run_scoped};
use super::spec::RemoteSpec;
use super::task::RemoteTask;
use super::transport::Connector;
use super::types::CommandResult;

/// Outcome of one remote in a batch.
#[derive(Debug, Clone)]
pub struct RemoteOutcome {
    /// Position of the remote in the dispatched list.
    pub index: usize,
    /// `user@host:port` of the end host.
    pub remote: String,
    pub route: String,
    pub result: Result<CommandResult, RemoteError>,
    /// Secondary: hops that failed to close.
    pub cleanup_errors: Vec<CleanupError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RemoteOutcome {
    /// The task completed; its exit status is data and not considered here.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of one dispatch batch.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub batch_id: Uuid,
    pub task: String,
    pub outcomes: Vec<RemoteOutcome>,
}

impl DispatchReport {
    /// First outcome for `remote` (`user@host:port`).
    pub fn get(&self, remote: &str) -> Option<&RemoteOutcome> {
        self.outcomes.iter().find(|o| o.remote == remote)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RemoteOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(RemoteOutcome::is_success)
    }

    /// Process exit code: 0 when every remote succeeded, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// Runs tasks across remotes with a shared connector.
pub struct Dispatcher<K: Connector> {
    connector: K,
    span: Span,
    cancel: CancellationToken,
    max_parallel: usize,
}

impl<K: Connector> Dispatcher<K> {
    pub fn new(connector: K) -> Self {
        Self {
            connector,
            span: info_span!("dispatcher"),
            cancel: CancellationToken::new(),
            max_parallel: resolve_max_parallel(None),
        }
    }

    /// Parent span for every batch; all events of the dispatcher are emitted
    /// inside it.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `task` once per spec and collect every outcome.
    pub async fn dispatch(&self, specs: &[RemoteSpec], task: &dyn RemoteTask) -> DispatchReport {
        let batch_id = Uuid::new_v4();
        let task_name = task.name().to_string();
        let batch_span = info_span!(
            parent: &self.span,
            "batch",
            batch = %batch_id,
            task = %task_name,
            remotes = specs.len()
        );

        batch_span.in_scope(|| info!("dispatching"));

        let runs: Vec<_> = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let span = info_span!(
                    parent: &batch_span,
                    "remote",
                    remote = %spec.identity(),
                    route = %spec.route()
                );
                self.run_one(index, spec, task, batch_id).instrument(span)
            })
            .collect();

        let mut outcomes: Vec<RemoteOutcome> = stream::iter(runs)
            .buffer_unordered(self.max_parallel)
            .collect()
            .await;

        outcomes.sort_by_key(|o| o.index);

        let report = DispatchReport {
            batch_id,
            task: task_name,
            outcomes,
        };

        batch_span.in_scope(|| {
            info!(
                succeeded = report.outcomes.len() - report.failures().count(),
                failed = report.failures().count(),
                "batch finished"
            )
        });

        report
    }

    async fn run_one(
        &self,
        index: usize,
        spec: &RemoteSpec,
        task: &dyn RemoteTask,
        batch_id: Uuid,
    ) -> RemoteOutcome {
        let remote = spec.identity();
        let started_at = Utc::now();

        let scoped = AssertUnwindSafe(run_scoped(&self.connector, spec, task, &self.cancel))
            .catch_unwind()
            .await;
        let ScopedOutcome {
            result,
            cleanup_errors,
        } = scoped.unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            warn!(
                remote = %remote,
                task = task.name(),
                batch = %batch_id,
                panic = %message,
                "task panicked, chain dropped without orderly release"
            );
            ScopedOutcome {
                result: Err(RemoteError::Fatal(format!("task panicked: {message}"))),
                cleanup_errors: Vec::new(),
            }
        });

        let finished_at = Utc::now();

        match &result {
            Ok(done) if done.success() => info!("remote succeeded"),
            Ok(done) => warn!(
                remote = %remote,
                task = task.name(),
                batch = %batch_id,
                exit_status = done.exit_status,
                signal = ?done.signal,
                "command exited with non-zero status"
            ),
            Err(e) => error!(
                remote = %remote,
                task = task.name(),
                batch = %batch_id,
                kind = %e.kind(),
                error = %e,
                "remote failed"
            ),
        }

        for cleanup in &cleanup_errors {
            warn!(
                remote = %remote,
                batch = %batch_id,
                hop = %cleanup.hop,
                index = cleanup.index,
                error = %cleanup.reason,
                "connection cleanup failed"
            );
        }

        RemoteOutcome {
            index,
            remote,
            route: spec.route(),
            result,
            cleanup_errors,
            started_at,
            finished_at,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
