//! Private key file SSH authentication.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use russh::{client, keys};
use tracing::debug;

use crate::remote::handler::HostKeyHandler;

use super::traits::{AuthError, AuthStrategy};

/// Public key authentication with a passphrase-less private key file.
pub struct KeyAuth {
    key_path: PathBuf,
}

impl KeyAuth {
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
        }
    }
}

#[async_trait]
impl AuthStrategy for KeyAuth {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<HostKeyHandler>,
        username: &str,
    ) -> Result<bool, AuthError> {
        let key_pair = keys::load_secret_key(&self.key_path, None).map_err(|e| AuthError::Key {
            path: self.key_path.display().to_string(),
            reason: e.to_string(),
        })?;

        // For RSA keys, use the best supported hash algorithm
        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .ok()
            .flatten()
            .flatten();
        debug!(?hash_alg, "using RSA hash algorithm for key auth");

        let key_with_hash = keys::PrivateKeyWithHashAlg::new(Arc::new(key_pair), hash_alg);
        let result = handle.authenticate_publickey(username, key_with_hash).await?;

        Ok(result.success())
    }

    fn name(&self) -> &'static str {
        "key"
    }
}
