//! Configuration resolution for remote execution.
//!
//! Values are resolved with a three-tier priority system:
//!
//! 1. **Parameter** - Explicitly provided value, e.g. a CLI flag (highest priority)
//! 2. **Environment Variable** - Value from environment variable
//! 3. **Default** - Built-in default value (lowest priority)
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `JUMPRUN_CMD_TIMEOUT` | 10s | Remote command timeout in seconds |
//! | `JUMPRUN_LOGIN_TIMEOUT` | 120s | Timeout for opening the whole chain in seconds |
//! | `JUMPRUN_MAX_PARALLEL` | 16 | Remotes processed concurrently per batch |
//! | `JUMPRUN_COMPRESSION` | true | Enable zlib compression |

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default remote command timeout in seconds
pub const DEFAULT_CMD_TIMEOUT_SECS: u64 = 10;

/// Default login timeout in seconds, covering every hop of the chain
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 2 * 60;

/// Default number of remotes handled concurrently
pub const DEFAULT_MAX_PARALLEL: usize = 16;

/// SSH keepalive interval
pub(crate) const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Missed keepalives before the transport is considered dead
pub(crate) const KEEPALIVE_MAX: usize = 3;

/// Environment variable name for the command timeout
pub const CMD_TIMEOUT_ENV_VAR: &str = "JUMPRUN_CMD_TIMEOUT";

/// Environment variable name for the login timeout
pub const LOGIN_TIMEOUT_ENV_VAR: &str = "JUMPRUN_LOGIN_TIMEOUT";

/// Environment variable name for the concurrency limit
pub const MAX_PARALLEL_ENV_VAR: &str = "JUMPRUN_MAX_PARALLEL";

/// Environment variable name for compression
pub const COMPRESSION_ENV_VAR: &str = "JUMPRUN_COMPRESSION";

fn from_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse::<T>().ok())
}

/// Resolve the command timeout with priority: parameter -> env var -> default
pub fn resolve_cmd_timeout(secs_param: Option<u64>) -> Duration {
    let secs = secs_param
        .or_else(|| from_env(CMD_TIMEOUT_ENV_VAR))
        .unwrap_or(DEFAULT_CMD_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Resolve the login timeout with priority: parameter -> env var -> default
pub fn resolve_login_timeout(secs_param: Option<u64>) -> Duration {
    let secs = secs_param
        .or_else(|| from_env(LOGIN_TIMEOUT_ENV_VAR))
        .unwrap_or(DEFAULT_LOGIN_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Resolve the concurrency limit with priority: parameter -> env var -> default.
/// Zero is treated as one.
pub fn resolve_max_parallel(param: Option<usize>) -> usize {
    param
        .or_else(|| from_env(MAX_PARALLEL_ENV_VAR))
        .unwrap_or(DEFAULT_MAX_PARALLEL)
        .max(1)
}

/// Resolve the compression setting with priority: parameter -> env var -> default (true)
pub fn resolve_compression(compress_param: Option<bool>) -> bool {
    if let Some(compress) = compress_param {
        return compress;
    }

    if let Ok(env_compress) = env::var(COMPRESSION_ENV_VAR) {
        return env_compress.eq_ignore_ascii_case("true") || env_compress == "1";
    }

    true
}
