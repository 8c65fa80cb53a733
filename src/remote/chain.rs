//! Connection chain: the ordered hops to one end host.
//!
//! [`build_chain`] opens the hops of a [`RemoteSpec`] strictly in sequence,
//! each tunneled through the previous one. The whole build shares one
//! deadline (`login_timeout`). On any failure the hops opened so far are
//! closed innermost first before the error is returned, so a caller never
//! receives a partially open chain.

use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::{CleanupError, RemoteError};
use super::spec::RemoteSpec;
use super::transport::{Connection, Connector};

/// Open connections of one chain, index 0 = outermost jump host, last = end host.
pub struct ConnectionChain<C: Connection> {
    hops: Vec<(String, C)>,
}

impl<C: Connection> ConnectionChain<C> {
    pub(crate) fn new() -> Self {
        Self { hops: Vec::new() }
    }

    pub(crate) fn push(&mut self, label: String, conn: C) {
        self.hops.push((label, conn));
    }

    /// The most recently opened hop; a new hop is tunneled through it.
    pub(crate) fn last(&self) -> Option<&C> {
        self.hops.last().map(|(_, conn)| conn)
    }

    /// Connection to the end host of a fully built chain.
    pub fn end_host(&self) -> Option<&C> {
        self.last()
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Hop labels in opening order.
    pub fn labels(&self) -> Vec<&str> {
        self.hops.iter().map(|(label, _)| label.as_str()).collect()
    }

    /// Close every hop, innermost first.
    ///
    /// A failed close does not stop the others. Each hop is removed before it
    /// is closed, so calling this again closes nothing.
    pub async fn close_all(&mut self) -> Vec<CleanupError> {
        let mut errors = Vec::new();

        while let Some((label, conn)) = self.hops.pop() {
            let index = self.hops.len();
            debug!(hop = %label, index, "closing hop");

            if let Err(e) = conn.close().await {
                warn!(hop = %label, index, error = %e, "failed to close hop");
                errors.push(CleanupError {
                    index,
                    hop: label,
                    reason: e.to_string(),
                });
            }
        }

        errors
    }
}

/// A failed build: the primary error plus any failures closing the hops that
/// had been opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    pub error: RemoteError,
    pub cleanup_errors: Vec<CleanupError>,
}

/// Deadline used when `login_timeout` reaches past what `Instant` can hold.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Open every hop of `spec`: jump hosts outermost first, then the end host.
pub async fn build_chain<K: Connector>(
    connector: &K,
    spec: &RemoteSpec,
    cancel: &CancellationToken,
) -> Result<ConnectionChain<K::Conn>, BuildFailure> {
    let login_timeout = spec.login_timeout();
    let now = Instant::now();
    let deadline = now
        .checked_add(login_timeout)
        .unwrap_or_else(|| now + FAR_FUTURE);
    let mut chain = ConnectionChain::new();

    for hop in spec.hops() {
        let label = hop.to_string();
        debug!(hop = %label, index = chain.len(), "opening hop");

        let attempt = tokio::select! {
            biased;

            _ = cancel.cancelled() => Err(RemoteError::Cancelled),

            opened = timeout_at(deadline, connector.open(hop, chain.last(), spec.options())) => {
                opened.unwrap_or_else(|_| {
                    Err(RemoteError::LoginTimedOut {
                        hop: label.clone(),
                        timeout: login_timeout,
                    })
                })
            }
        };

        match attempt {
            Ok(conn) => chain.push(label, conn),
            Err(error) => {
                warn!(hop = %label, index = chain.len(), error = %error, "failed to open hop");
                let cleanup_errors = chain.close_all().await;
                return Err(BuildFailure {
                    error,
                    cleanup_errors,
                });
            }
        }
    }

    Ok(chain)
}
