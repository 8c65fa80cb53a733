//! Remote descriptor parsing.
//!
//! A remote is given either as a full URI
//! (`ssh://[user[:secret]@]host[:port]`) or as a bare host. A bare host is
//! merged into a template descriptor: it keeps the template's user, secret and
//! port and only replaces the host (and the port, if one is given as
//! `host:port` or `[v6]:port`).
//!
//! Parsing is pure: no I/O, no name resolution.

use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;
use zeroize::Zeroizing;

use super::error::RemoteError;

/// The only transport scheme accepted in remote URIs.
pub const SSH_SCHEME: &str = "ssh";

/// Default port of the SSH transport.
pub const SSH_PORT: u16 = 22;

/// A password or passphrase that is wiped from memory on drop and never
/// printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the cleartext. Use immediately, do not store or log.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// The cleartext followed by a newline, for feeding a prompt on stdin.
    pub fn with_newline(&self) -> Zeroizing<Vec<u8>> {
        let mut bytes = self.0.as_bytes().to_vec();
        bytes.push(b'\n');
        Zeroizing::new(bytes)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// Position of a descriptor in a connection chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Jump,
    End,
}

/// One hop of a connection chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDescriptor {
    pub user: Option<String>,
    pub secret: Option<Secret>,
    pub host: String,
    pub port: u16,
    pub role: Role,
}

impl RemoteDescriptor {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            user: None,
            secret: None,
            host: host.into(),
            port: SSH_PORT,
            role: Role::End,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(Secret::new(secret));
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn scheme(&self) -> &'static str {
        SSH_SCHEME
    }

    /// User to log in as: the descriptor's user, else `$USER`, else `root`.
    pub fn effective_user(&self) -> String {
        self.user
            .clone()
            .or_else(|| std::env::var("USER").ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| "root".to_string())
    }

    /// `user@host:port`, used as the remote identity in reports and logs.
    pub fn identity(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}:{}", user, self.host, self.port),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}

impl fmt::Display for RemoteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", SSH_SCHEME, self.identity())
    }
}

/// Parse a remote given on the command line.
///
/// Full URIs stand on their own. A bare host requires `template` and inherits
/// everything from it except the host (and an explicit port).
pub fn parse_remote(
    input: &str,
    template: Option<&RemoteDescriptor>,
) -> Result<RemoteDescriptor, RemoteError> {
    let input = input.trim();

    if input.contains("://") {
        return parse_uri(input);
    }

    let Some(template) = template else {
        return Err(RemoteError::malformed(
            input,
            "a bare host needs a preceding ssh:// remote to inherit credentials from",
        ));
    };

    let (host, port) = split_bare_host(input)?;
    let mut descriptor = template.clone().with_role(Role::End);
    descriptor.host = host;
    if let Some(port) = port {
        descriptor.port = port;
    }
    Ok(descriptor)
}

fn parse_uri(input: &str) -> Result<RemoteDescriptor, RemoteError> {
    let url = Url::parse(input).map_err(|e| RemoteError::malformed(input, e.to_string()))?;

    if url.scheme() != SSH_SCHEME {
        return Err(RemoteError::malformed(
            input,
            format!("unsupported scheme '{}', expected '{}'", url.scheme(), SSH_SCHEME),
        ));
    }

    let host = url.host_str().unwrap_or_default();
    if host.is_empty() {
        return Err(RemoteError::malformed(input, "host is empty"));
    }

    let mut descriptor = RemoteDescriptor::new(host).with_port(url.port().unwrap_or(SSH_PORT));
    if !url.username().is_empty() {
        descriptor = descriptor.with_user(decode_userinfo(input, url.username(), "user")?);
    }
    if let Some(password) = url.password() {
        descriptor = descriptor.with_secret(decode_userinfo(input, password, "password")?);
    }
    Ok(descriptor)
}

/// Userinfo comes out of the URL percent-encoded.
fn decode_userinfo(input: &str, encoded: &str, what: &str) -> Result<String, RemoteError> {
    percent_decode_str(encoded)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| RemoteError::malformed(input, format!("{what} is not valid UTF-8")))
}

/// Split `host`, `host:port`, `[v6]` or `[v6]:port`. An unbracketed string
/// with more than one colon is an IPv6 literal without a port.
fn split_bare_host(input: &str) -> Result<(String, Option<u16>), RemoteError> {
    if input.is_empty() {
        return Err(RemoteError::malformed(input, "host is empty"));
    }

    if let Some(rest) = input.strip_prefix('[') {
        let Some((host, tail)) = rest.split_once(']') else {
            return Err(RemoteError::malformed(input, "unterminated '[' in IPv6 host"));
        };
        if host.is_empty() {
            return Err(RemoteError::malformed(input, "host is empty"));
        }
        let port = match tail.strip_prefix(':') {
            Some(port) => Some(parse_port(input, port)?),
            None if tail.is_empty() => None,
            None => return Err(RemoteError::malformed(input, "unexpected text after ']'")),
        };
        return Ok((format!("[{host}]"), port));
    }

    match input.matches(':').count() {
        0 => Ok((input.to_string(), None)),
        1 => {
            let (host, port) = input.rsplit_once(':').unwrap_or((input, ""));
            if host.is_empty() {
                return Err(RemoteError::malformed(input, "host is empty"));
            }
            Ok((host.to_string(), Some(parse_port(input, port)?)))
        }
        _ => Ok((input.to_string(), None)),
    }
}

fn parse_port(input: &str, port: &str) -> Result<u16, RemoteError> {
    port.parse::<u16>()
        .map_err(|e| RemoteError::malformed(input, format!("invalid port number: {e}")))
}
