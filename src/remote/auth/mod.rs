//! Authentication strategies for SSH hops.
//!
//! Each hop is authenticated by an [`AuthChain`] built from its descriptor:
//!
//! - [`PasswordAuth`]: the secret embedded in the remote URI
//! - [`KeyAuth`]: the private key given with `--identity`
//! - [`AgentAuth`]: identities from `SSH_AUTH_SOCK`, used only when neither
//!   of the above is available

mod agent;
mod chain;
mod key;
mod password;
mod traits;

pub use agent::AgentAuth;
pub use chain::AuthChain;
pub use key::KeyAuth;
pub use password::PasswordAuth;
pub use traits::{AuthError, AuthStrategy};
