//! Error types for netpulse.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for netpulse operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Platform configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Command lookup/formatting errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Collection driver errors
    #[error("Collector error: {0}")]
    Collector(#[from] CollectorError),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key changed versus known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host key unknown in strict verification mode
    #[error("Unknown host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts file error
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Prompt was not seen within the timeout
    #[error("Prompt not found within {0:?}")]
    PromptTimeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Platform configuration document errors.
///
/// Only the strict `PlatformRegistry::from_json` path surfaces these;
/// `PlatformRegistry::load` degrades to the built-in fallback platform.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Document is not valid JSON / does not match the schema
    #[error("Invalid platform configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document parsed but contains no platforms
    #[error("Platform configuration contains no platforms")]
    Empty,

    /// Could not read the configuration file
    #[error("Could not read platform configuration: {0}")]
    Io(#[from] io::Error),
}

/// Command lookup/formatting errors.
///
/// Callers must treat any of these as "capability unavailable" and skip the
/// command rather than sending something malformed to the device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Platform is not present in the registry
    #[error("Platform '{0}' not found")]
    PlatformNotFound(String),

    /// Platform exists but does not define this command kind
    #[error("Command '{kind}' not supported on {platform}")]
    CommandNotSupported { platform: String, kind: String },

    /// Command template references a parameter that was not supplied
    #[error("Missing parameter '{name}' for command '{kind}'")]
    MissingParameter { kind: String, name: String },
}

/// Collection driver errors.
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Collector not connected
    #[error("Collector not connected")]
    NotConnected,

    /// The collector task is gone (channel closed)
    #[error("Collector task has shut down")]
    TaskGone,
}

/// Result type alias using netpulse's Error.
pub type Result<T> = std::result::Result<T, Error>;
