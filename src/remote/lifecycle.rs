//! Scoped acquisition of a connection chain.
//!
//! [`run_scoped`] is the only way the dispatcher touches a chain: acquire,
//! use, release. Release runs on every path out of the use phase (success,
//! error, timeout, cancellation) and closes the hops innermost first. Close
//! failures travel next to the primary result and never replace it.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::chain::{BuildFailure, ConnectionChain, build_chain};
use super::error::{CleanupError, RemoteError};
use super::spec::RemoteSpec;
use super::task::{RemoteTask, Session};
use super::transport::{Connection, Connector};
use super::types::CommandResult;

/// Owns a fully built chain until it is released.
pub struct ChainGuard<C: Connection> {
    chain: ConnectionChain<C>,
    released: bool,
}

impl<C: Connection> ChainGuard<C> {
    /// Build the chain for `spec`. A failed build has already been cleaned up.
    pub async fn acquire<K>(
        connector: &K,
        spec: &RemoteSpec,
        cancel: &CancellationToken,
    ) -> Result<Self, BuildFailure>
    where
        K: Connector<Conn = C>,
    {
        let chain = build_chain(connector, spec, cancel).await?;
        Ok(Self {
            chain,
            released: false,
        })
    }

    pub fn end_host(&self) -> Option<&C> {
        self.chain.end_host()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Close every hop innermost first. A second call closes nothing.
    pub async fn release(&mut self) -> Vec<CleanupError> {
        if self.released {
            return Vec::new();
        }
        self.released = true;
        debug!(hops = self.chain.len(), "releasing chain");
        self.chain.close_all().await
    }
}

impl<C: Connection> Drop for ChainGuard<C> {
    fn drop(&mut self) {
        if !self.released && !self.chain.is_empty() {
            warn!(
                hops = self.chain.len(),
                "chain dropped without release, connections close with their handles"
            );
        }
    }
}

/// Result of one acquire/use/release cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedOutcome {
    pub result: Result<CommandResult, RemoteError>,
    pub cleanup_errors: Vec<CleanupError>,
}

/// Build the chain for `spec`, run `task` on its end host, and release it.
pub async fn run_scoped<K: Connector>(
    connector: &K,
    spec: &RemoteSpec,
    task: &dyn RemoteTask,
    cancel: &CancellationToken,
) -> ScopedOutcome {
    let mut guard = match ChainGuard::acquire(connector, spec, cancel).await {
        Ok(guard) => guard,
        Err(failure) => {
            return ScopedOutcome {
                result: Err(failure.error),
                cleanup_errors: failure.cleanup_errors,
            };
        }
    };

    let result = match guard.end_host() {
        Some(conn) => {
            let session = Session::new(conn, spec);
            tokio::select! {
                biased;

                _ = cancel.cancelled() => Err(RemoteError::Cancelled),

                result = task.run(&session) => result,
            }
        }
        None => Err(RemoteError::Fatal("chain has no end host".to_string())),
    };

    let cleanup_errors = guard.release().await;
    ScopedOutcome {
        result,
        cleanup_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::descriptor::RemoteDescriptor;
    use crate::remote::error::ErrorKind;
    use crate::remote::testing::{ArgvTask, MockConnector};
    use std::time::Duration;

    fn spec(jumps: &[&str], end: &str) -> RemoteSpec {
        RemoteSpec::new(
            jumps.iter().map(|h| RemoteDescriptor::new(*h)).collect(),
            RemoteDescriptor::new(end),
            Duration::from_secs(60),
            Duration::from_secs(10),
        )
        .unwrap()
    }

    mod guard {
        use super::*;

        #[tokio::test]
        async fn test_release_is_idempotent() {
            let connector = MockConnector::new();
            let spec = spec(&["j1", "j2"], "end");
            let mut guard = ChainGuard::acquire(&connector, &spec, &CancellationToken::new())
                .await
                .unwrap();

            assert!(guard.release().await.is_empty());
            assert!(guard.is_released());
            assert!(guard.release().await.is_empty());
            assert_eq!(connector.closed(), ["end", "j2", "j1"]);
        }

        #[tokio::test]
        async fn test_end_host_is_last_hop() {
            let connector = MockConnector::new();
            let spec = spec(&["j1"], "end");
            let mut guard = ChainGuard::acquire(&connector, &spec, &CancellationToken::new())
                .await
                .unwrap();

            let result = guard.end_host().unwrap().exec("hostname", None).await.unwrap();
            assert_eq!(result.stdout, b"end\n");
            guard.release().await;
        }
    }

    mod scoped {
        use super::*;

        #[tokio::test]
        async fn test_success_releases_in_reverse() {
            let connector = MockConnector::new();
            let spec = spec(&["j1", "j2"], "end");

            let outcome = run_scoped(
                &connector,
                &spec,
                &ArgvTask::new(&["hostname"]),
                &CancellationToken::new(),
            )
            .await;

            assert_eq!(outcome.result.unwrap().stdout, b"end\n");
            assert!(outcome.cleanup_errors.is_empty());
            assert_eq!(connector.closed(), ["end", "j2", "j1"]);
            assert_eq!(connector.execs(), [("end".to_string(), "hostname".to_string())]);
        }

        #[tokio::test]
        async fn test_use_failure_still_releases() {
            let connector = MockConnector::new()
                .exec_result("end", Err(RemoteError::TransportLost("reset".into())));
            let spec = spec(&["j1"], "end");

            let outcome = run_scoped(
                &connector,
                &spec,
                &ArgvTask::new(&["uptime"]),
                &CancellationToken::new(),
            )
            .await;

            assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::TransportLost);
            assert_eq!(connector.closed(), ["end", "j1"]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_command_timeout_then_release() {
            let connector = MockConnector::new().exec_delay("end", Duration::from_secs(60));
            let spec = spec(&["j1"], "end");

            let outcome = run_scoped(
                &connector,
                &spec,
                &ArgvTask::new(&["sleep", "60"]),
                &CancellationToken::new(),
            )
            .await;

            assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::CommandTimedOut);
            assert_eq!(connector.closed(), ["end", "j1"]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_cancel_during_use_releases() {
            let connector = MockConnector::new().exec_delay("end", Duration::from_secs(8));
            let spec = spec(&["j1"], "end");
            let cancel = CancellationToken::new();

            let trigger = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                trigger.cancel();
            });

            let outcome =
                run_scoped(&connector, &spec, &ArgvTask::new(&["sleep", "8"]), &cancel).await;

            assert_eq!(outcome.result, Err(RemoteError::Cancelled));
            assert_eq!(connector.closed(), ["end", "j1"]);
        }

        #[tokio::test]
        async fn test_close_error_does_not_mask_result() {
            let connector = MockConnector::new().fail_close("end");
            let spec = spec(&["j1"], "end");

            let outcome = run_scoped(
                &connector,
                &spec,
                &ArgvTask::new(&["hostname"]),
                &CancellationToken::new(),
            )
            .await;

            assert!(outcome.result.is_ok());
            assert_eq!(outcome.cleanup_errors.len(), 1);
            assert_eq!(outcome.cleanup_errors[0].index, 1);
            assert_eq!(connector.closed(), ["end", "j1"]);
        }

        #[tokio::test]
        async fn test_every_close_failure_collected() {
            let connector = MockConnector::new()
                .exec_result("end", Err(RemoteError::TransportLost("reset".into())))
                .fail_close("end")
                .fail_close("j1");
            let spec = spec(&["j1"], "end");

            let outcome = run_scoped(
                &connector,
                &spec,
                &ArgvTask::new(&["uptime"]),
                &CancellationToken::new(),
            )
            .await;

            assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::TransportLost);
            let indices: Vec<_> = outcome.cleanup_errors.iter().map(|e| e.index).collect();
            assert_eq!(indices, [1, 0]);
        }

        #[tokio::test]
        async fn test_build_failure_skips_task() {
            let connector = MockConnector::new().fail_open(
                "end",
                RemoteError::AuthenticationFailed {
                    hop: "end".into(),
                    reason: "denied".into(),
                },
            );
            let spec = spec(&["j1"], "end");

            let outcome = run_scoped(
                &connector,
                &spec,
                &ArgvTask::new(&["hostname"]),
                &CancellationToken::new(),
            )
            .await;

            assert_eq!(
                outcome.result.unwrap_err().kind(),
                ErrorKind::AuthenticationFailed
            );
            assert!(connector.execs().is_empty());
            assert_eq!(connector.closed(), ["j1"]);
        }
    }
}
