//! SSH connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::model::ConnectionConfig;
use crate::platform::ConnectionDefaults;

/// Host key verification mode, analogous to OpenSSH's
/// `StrictHostKeyChecking`.
#[derive(Debug, Clone, Copy, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    /// Matches common SSH client behavior.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For lab use only.
    Disabled,
}

/// Authentication method for SSH sessions.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// No authentication (test servers).
    None,

    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        path: PathBuf,
        passphrase: Option<String>,
    },
}

/// Resolved SSH parameters for one connection attempt.
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMethod,

    /// TCP connect + handshake timeout.
    pub timeout: Duration,

    /// Authentication phase timeout.
    pub auth_timeout: Duration,

    pub terminal_width: u32,
    pub terminal_height: u32,

    pub host_key_verification: HostKeyVerification,

    /// Explicit known_hosts path; `None` uses the user default.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Resolve a device connection config against the platform's connection
    /// defaults. Explicit per-connection values win; the platform defaults
    /// only fill timeouts left unset.
    pub fn resolve(config: &ConnectionConfig, defaults: Option<&ConnectionDefaults>) -> Self {
        let timeout = defaults
            .map(|d| Duration::from_secs(d.timeout_secs))
            .unwrap_or(config.timeout);
        let auth_timeout = defaults
            .map(|d| Duration::from_secs(d.auth_timeout_secs))
            .unwrap_or(config.auth_timeout);

        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            auth: AuthMethod::Password(config.password.clone()),
            timeout: config.timeout.max(timeout),
            auth_timeout: config.auth_timeout.max(auth_timeout),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
