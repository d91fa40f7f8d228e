//! Transport boundary: the only I/O seam in the crate.
//!
//! A [`Session`] executes CLI commands over an established connection; a
//! [`Connector`] opens sessions. The collector is generic over both so that
//! tests drive it with scripted sessions instead of live SSH.

mod buffer;
pub mod config;
mod ssh;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::ConnectionConfig;
use crate::platform::ConnectionDefaults;

pub use buffer::PatternBuffer;
pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::{SshConnector, SshSession};

/// An established interactive session with one device.
///
/// A session belongs exclusively to one collector for its lifetime; it is
/// never shared or accessed from two call sites concurrently.
#[async_trait]
pub trait Session: Send {
    /// Execute one command and return its cleaned output (echo and trailing
    /// prompt stripped).
    async fn execute(&mut self, command: &str, timeout: Duration) -> Result<String>;

    /// Tear the session down. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// Opens sessions from connection parameters.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        config: &ConnectionConfig,
        defaults: Option<&ConnectionDefaults>,
    ) -> Result<Box<dyn Session>>;
}
