//! Password-based SSH authentication.

use async_trait::async_trait;
use russh::client;

use crate::remote::descriptor::Secret;
use crate::remote::handler::HostKeyHandler;

use super::traits::{AuthError, AuthStrategy};

/// Password authentication with the secret taken from the remote URI.
pub struct PasswordAuth {
    password: Secret,
}

impl PasswordAuth {
    pub fn new(password: Secret) -> Self {
        Self { password }
    }
}

#[async_trait]
impl AuthStrategy for PasswordAuth {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<HostKeyHandler>,
        username: &str,
    ) -> Result<bool, AuthError> {
        let result = handle
            .authenticate_password(username, self.password.expose())
            .await?;

        Ok(result.success())
    }

    fn name(&self) -> &'static str {
        "password"
    }
}
