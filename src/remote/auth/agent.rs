//! SSH agent authentication.

use async_trait::async_trait;
use russh::{client, keys};
use tracing::debug;

use crate::remote::handler::HostKeyHandler;

use super::traits::{AuthError, AuthStrategy};

/// Tries each identity held by the agent at `SSH_AUTH_SOCK` until one is
/// accepted.
#[derive(Default)]
pub struct AgentAuth;

#[async_trait]
impl AuthStrategy for AgentAuth {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<HostKeyHandler>,
        username: &str,
    ) -> Result<bool, AuthError> {
        let mut agent = keys::agent::client::AgentClient::connect_env()
            .await
            .map_err(|e| AuthError::Agent(format!("failed to connect: {e}")))?;

        let identities = agent
            .request_identities()
            .await
            .map_err(|e| AuthError::Agent(format!("failed to list identities: {e}")))?;

        if identities.is_empty() {
            return Err(AuthError::Agent("no identities found".to_string()));
        }

        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .ok()
            .flatten()
            .flatten();

        for identity in identities {
            debug!(comment = ?identity.comment(), "trying agent identity");

            match handle
                .authenticate_publickey_with(username, identity, hash_alg, &mut agent)
                .await
            {
                Ok(result) if result.success() => return Ok(true),
                Ok(_) => continue,
                Err(e) => {
                    debug!(error = %e, "agent identity failed, trying next");
                    continue;
                }
            }
        }

        Ok(false)
    }

    fn name(&self) -> &'static str {
        "agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_auth_name() {
        assert_eq!(AgentAuth.name(), "agent");
    }

    #[test]
    fn test_agent_auth_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AgentAuth>();
    }
}
