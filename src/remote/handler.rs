//! russh client handler with optional known_hosts verification.

use russh::{client, keys};
use tracing::{debug, warn};

/// Client handler for one hop.
///
/// With strict checking, the server key must be listed for the hop in
/// `~/.ssh/known_hosts`; an unknown or changed key is refused and surfaces as
/// [`russh::Error::UnknownKey`]. Without it every key is accepted, similar to
/// `StrictHostKeyChecking=no` in OpenSSH, and a warning is logged.
pub(crate) struct HostKeyHandler {
    host: String,
    port: u16,
    strict: bool,
}

impl HostKeyHandler {
    pub(crate) fn new(host: impl Into<String>, port: u16, strict: bool) -> Self {
        Self {
            host: host.into(),
            port,
            strict,
        }
    }

    /// Decide on a known_hosts lookup result.
    fn verdict(&self, lookup: Result<bool, keys::Error>) -> bool {
        match lookup {
            Ok(true) => {
                debug!(host = %self.host, port = self.port, "host key matches known_hosts");
                true
            }
            Ok(false) => {
                warn!(host = %self.host, port = self.port, "host key not found in known_hosts");
                false
            }
            Err(e) => {
                warn!(host = %self.host, port = self.port, error = %e, "host key verification failed");
                false
            }
        }
    }
}

impl client::Handler for HostKeyHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        if !self.strict {
            warn!(
                host = %self.host,
                port = self.port,
                "host key not verified, connection has reduced assurance"
            );
            return Ok(true);
        }

        let lookup = keys::check_known_hosts(&self.host, self.port, server_public_key);
        Ok(self.verdict(lookup))
    }
}
