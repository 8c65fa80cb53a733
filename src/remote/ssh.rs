//! russh implementation of the transport seam.
//!
//! ## Connection Lifecycle
//!
//! 1. **Client Configuration**: keepalive every 30 seconds (max 3 missed),
//!    no inactivity timeout and optional zlib compression. Hop deadlines are
//!    enforced by the chain builder, not by the transport.
//!
//! 2. **Connection Establishment**: the first hop is a plain TCP connection.
//!    Every further hop runs over a `direct-tcpip` channel opened on the
//!    previous hop, so only the first hop needs to be routable from here.
//!
//! 3. **Authentication**: an [`AuthChain`] per hop (password, key file,
//!    agent). Authentication failures are never retried.
//!
//! 4. **Command Execution**: one session channel per command, with stdin fed
//!    from the caller and stdout, stderr, exit status or signal collected.

use std::sync::Arc;

use async_trait::async_trait;
use russh::{ChannelMsg, Disconnect, Sig, client};
use tracing::{debug, info, warn};

use super::auth::{AuthChain, AuthError, AuthStrategy};
use super::config::{KEEPALIVE_INTERVAL, KEEPALIVE_MAX};
use super::descriptor::RemoteDescriptor;
use super::error::{RemoteError, classify_handshake_error};
use super::handler::HostKeyHandler;
use super::transport::{Connection, Connector, HopOptions};
use super::types::CommandResult;

/// Build russh client configuration.
///
/// - No inactivity timeout; a chain must stay open while later hops log in
/// - Keepalive interval of 30 seconds with max 3 keepalives
/// - Compression preference based on `compress` (ZLIB if enabled, NONE if disabled)
pub(crate) fn build_client_config(compress: bool) -> Arc<client::Config> {
    let compression = if compress {
        (&[russh::compression::ZLIB, russh::compression::NONE][..]).into()
    } else {
        (&[russh::compression::NONE][..]).into()
    };

    let preferred = russh::Preferred {
        compression,
        ..Default::default()
    };

    Arc::new(client::Config {
        inactivity_timeout: None,
        keepalive_interval: Some(KEEPALIVE_INTERVAL),
        keepalive_max: KEEPALIVE_MAX,
        preferred,
        ..Default::default()
    })
}

/// Host as understood by the socket layer and known_hosts: IPv6 literals
/// without brackets.
fn socket_host(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

/// Name of a terminating signal, without the `SIG` prefix.
fn signal_name(signal: &Sig) -> String {
    match signal {
        Sig::Custom(name) => name.clone(),
        other => format!("{other:?}"),
    }
}

/// Opens hops over SSH with russh.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    /// Overrides `HopOptions::compression` when set.
    compression: Option<bool>,
}

impl SshConnector {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compression = Some(compress);
        self
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Conn = SshConnection;

    async fn open(
        &self,
        hop: &RemoteDescriptor,
        via: Option<&SshConnection>,
        options: &HopOptions,
    ) -> Result<SshConnection, RemoteError> {
        let label = hop.to_string();
        let host = socket_host(&hop.host);
        let compress = self.compression.unwrap_or(options.compression);
        let config = build_client_config(compress);
        let handler = HostKeyHandler::new(host, hop.port, options.strict_host_key_checking);

        let mut handle = match via {
            None => {
                debug!(hop = %label, "connecting");
                client::connect(config, (host, hop.port), handler)
                    .await
                    .map_err(|e| classify_handshake_error(&label, &e))?
            }
            Some(previous) => {
                debug!(hop = %label, via = %previous.label, "opening tunnel");
                let channel = previous
                    .handle
                    .channel_open_direct_tcpip(host, u32::from(hop.port), "127.0.0.1", 0)
                    .await
                    .map_err(|e| RemoteError::HostUnreachable {
                        hop: label.clone(),
                        reason: format!("failed to open tunnel through {}: {e}", previous.label),
                    })?;

                client::connect_stream(config, channel.into_stream(), handler)
                    .await
                    .map_err(|e| classify_handshake_error(&label, &e))?
            }
        };

        let username = hop.effective_user();
        let auth_chain = AuthChain::for_hop(hop, options.identity_file.as_deref());

        let outcome = auth_chain.authenticate(&mut handle, &username).await;
        let failure = match outcome {
            Ok(true) => None,
            Ok(false) => Some(RemoteError::AuthenticationFailed {
                hop: label.clone(),
                reason: "no authentication methods succeeded".to_string(),
            }),
            Err(AuthError::Transport(e)) => Some(classify_handshake_error(&label, &e)),
            Err(e) => Some(RemoteError::AuthenticationFailed {
                hop: label.clone(),
                reason: e.to_string(),
            }),
        };

        if let Some(error) = failure {
            let disconnected = handle
                .disconnect(Disconnect::ByApplication, "", "English")
                .await;
            disconnect_succeeded(&label, disconnected);
            return Err(error);
        }

        info!(hop = %label, user = %username, "hop authenticated");
        Ok(SshConnection { handle, label })
    }
}

/// An authenticated russh session to one hop.
pub struct SshConnection {
    handle: client::Handle<HostKeyHandler>,
    label: String,
}

impl SshConnection {
    /// Display form of the hop, without secrets.
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[async_trait]
impl Connection for SshConnection {
    async fn exec(
        &self,
        command: &str,
        input: Option<&[u8]>,
    ) -> Result<CommandResult, RemoteError> {
        let lost = |e: russh::Error| RemoteError::TransportLost(format!("{}: {e}", self.label));

        let mut channel = self.handle.channel_open_session().await.map_err(lost)?;
        channel.exec(true, command).await.map_err(lost)?;

        if let Some(input) = input {
            channel.data(input).await.map_err(lost)?;
        }
        channel.eof().await.map_err(lost)?;

        // Pre-allocate buffers to reduce reallocations during output collection
        let mut stdout = Vec::with_capacity(4096);
        let mut stderr = Vec::with_capacity(1024);
        let mut exit_status: Option<i32> = None;
        let mut signal: Option<String> = None;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => stdout.extend_from_slice(&data),
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    // ext == 1 is stderr in SSH protocol
                    if ext == 1 {
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status: code }) => {
                    exit_status = Some(i32::try_from(code).unwrap_or(i32::MAX));
                }
                Some(ChannelMsg::ExitSignal { signal_name: sig, .. }) => {
                    exit_status = Some(-1);
                    signal = Some(signal_name(&sig));
                }
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            }
        }

        match exit_status {
            Some(exit_status) => Ok(CommandResult {
                exit_status,
                stdout,
                stderr,
                signal,
            }),
            None => Err(RemoteError::TransportLost(format!(
                "{}: channel closed without exit status",
                self.label
            ))),
        }
    }

    async fn close(&self) -> Result<(), RemoteError> {
        if self.handle.is_closed() {
            return Ok(());
        }
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| RemoteError::TransportLost(format!("{}: {e}", self.label)))
    }
}

/// Log a disconnect that failed while another error is already on its way out.
fn disconnect_succeeded(label: &str, result: Result<(), russh::Error>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(hop = %label, error = %e, "failed to disconnect after authentication failure");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    mod client_config {
        use super::*;

        #[test]
        fn test_no_inactivity_timeout() {
            let config = build_client_config(true);
            assert_eq!(config.inactivity_timeout, None);
        }

        #[test]
        fn test_keepalive_settings() {
            let config = build_client_config(false);
            assert_eq!(config.keepalive_interval, Some(Duration::from_secs(30)));
            assert_eq!(config.keepalive_max, 3);
        }

        #[test]
        fn test_compression_enabled() {
            let config = build_client_config(true);
            // ZLIB first, NONE as fallback
            assert_eq!(config.preferred.compression.len(), 2);
        }

        #[test]
        fn test_compression_disabled() {
            let config = build_client_config(false);
            assert_eq!(config.preferred.compression.len(), 1);
        }
    }

    mod helpers {
        use super::*;

        #[test]
        fn test_socket_host_strips_brackets() {
            assert_eq!(socket_host("[::1]"), "::1");
            assert_eq!(socket_host("db01"), "db01");
            assert_eq!(socket_host("fe80::1"), "fe80::1");
        }

        #[test]
        fn test_disconnect_failure_is_reported() {
            assert!(disconnect_succeeded("ssh://u@h:22", Ok(())));
            assert!(!disconnect_succeeded("ssh://u@h:22", Err(russh::Error::Disconnect)));
        }

        #[test]
        fn test_signal_names() {
            assert_eq!(signal_name(&Sig::KILL), "KILL");
            assert_eq!(signal_name(&Sig::Custom("WINCH".into())), "WINCH");
        }
    }

    #[test]
    fn test_connector_compression_override() {
        let connector = SshConnector::new().with_compression(false);
        assert_eq!(connector.compression, Some(false));
    }
}
