//! SSH session implementation over russh.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use regex::bytes::Regex;
use russh::client::{self, Handle, Msg};
use russh::keys::{load_secret_key, PrivateKeyWithHashAlg, PublicKey};
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use super::{Connector, Session};
use crate::error::{Result, TransportError};
use crate::model::ConnectionConfig;
use crate::platform::ConnectionDefaults;

/// Prompt tail for the platforms this crate drives: `#`, `>`, `$`, `%`.
const DEFAULT_PROMPT: &str = r"[$#>%]\s*$";

/// Opens [`SshSession`]s. Stateless; one connector can serve any number of
/// collectors.
#[derive(Debug, Default)]
pub struct SshConnector {
    host_key_verification: HostKeyVerification,
}

impl SshConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host_key_verification(verification: HostKeyVerification) -> Self {
        Self {
            host_key_verification: verification,
        }
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
        defaults: Option<&ConnectionDefaults>,
    ) -> Result<Box<dyn Session>> {
        let mut ssh_config = SshConfig::resolve(config, defaults);
        ssh_config.host_key_verification = self.host_key_verification;
        let session = SshSession::connect(ssh_config).await?;
        Ok(Box::new(session))
    }
}

/// One interactive PTY session over an authenticated SSH connection.
pub struct SshSession {
    handle: Handle<SshHandler>,
    channel: Channel<Msg>,
    buffer: PatternBuffer,
    prompt: Regex,
    closed: bool,
}

impl SshSession {
    /// Connect, authenticate, and open a PTY shell channel.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let client_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));
        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            verification: config.host_key_verification,
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("connecting to {}", config.socket_addr());
        let mut handle = tokio::time::timeout(
            config.timeout,
            client::connect(client_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // Surface the detailed host-key error stored by check_server_key
            // instead of russh's generic UnknownKey
            if let Some(hk_err) = host_key_error.lock().unwrap().take() {
                hk_err
            } else {
                TransportError::Ssh(e)
            }
        })?;

        tokio::time::timeout(config.auth_timeout, authenticate(&mut handle, &config))
            .await
            .map_err(|_| TransportError::Timeout(config.auth_timeout))??;

        let channel = handle
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_pty(
                true,
                "xterm",
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        let prompt = Regex::new(DEFAULT_PROMPT).unwrap();

        let mut session = Self {
            handle,
            channel,
            buffer: PatternBuffer::default(),
            prompt,
            closed: false,
        };

        // Consume the login banner and first prompt; best effort
        if let Err(e) = session.read_until_prompt(Duration::from_secs(3)).await {
            debug!("no banner prompt within grace period: {e}");
        }
        session.buffer.clear();

        Ok(session)
    }

    async fn read_until_prompt(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::PromptTimeout(timeout).into());
            }

            match tokio::time::timeout(remaining, self.channel.wait()).await {
                Err(_) => return Err(TransportError::PromptTimeout(timeout).into()),
                Ok(None) => return Err(TransportError::Disconnected.into()),
                Ok(Some(ChannelMsg::Data { data })) => {
                    self.buffer.extend(&data);
                    if self.buffer.tail_contains(&self.prompt) {
                        return Ok(());
                    }
                }
                Ok(Some(ChannelMsg::ExtendedData { data, .. })) => {
                    self.buffer.extend(&data);
                }
                Ok(Some(ChannelMsg::Eof)) | Ok(Some(ChannelMsg::Close)) => {
                    return Err(TransportError::Disconnected.into());
                }
                Ok(Some(_)) => {}
            }
        }
    }
}

#[async_trait]
impl Session for SshSession {
    async fn execute(&mut self, command: &str, timeout: Duration) -> Result<String> {
        if self.closed {
            return Err(TransportError::Disconnected.into());
        }

        self.buffer.clear();
        let payload = format!("{command}\n");
        self.channel
            .data(payload.as_bytes())
            .await
            .map_err(TransportError::Ssh)?;

        self.read_until_prompt(timeout).await?;

        let raw = self.buffer.take();
        Ok(clean_output(
            &String::from_utf8_lossy(&raw),
            command,
            &self.prompt,
        ))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

async fn authenticate(handle: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
    let success = match &config.auth {
        AuthMethod::None => handle
            .authenticate_none(&config.username)
            .await
            .map_err(TransportError::Ssh)?
            .success(),
        AuthMethod::Password(password) => handle
            .authenticate_password(&config.username, password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success(),
        AuthMethod::PrivateKey { path, passphrase } => {
            let key = load_secret_key(path, passphrase.as_deref())
                .map_err(|e| TransportError::Key(e.to_string()))?;
            let hash_alg = handle
                .best_supported_rsa_hash()
                .await
                .map_err(TransportError::Ssh)?
                .flatten();
            handle
                .authenticate_publickey(
                    &config.username,
                    PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                )
                .await
                .map_err(TransportError::Ssh)?
                .success()
        }
    };

    if !success {
        return Err(TransportError::AuthenticationFailed {
            user: config.username.clone(),
        }
        .into());
    }
    Ok(())
}

/// Strip the echoed command from the front and the trailing prompt line
/// from the back of raw PTY output.
fn clean_output(raw: &str, command: &str, prompt: &Regex) -> String {
    let mut lines: Vec<&str> = raw.lines().collect();

    if let Some(first) = lines.first() {
        if first.trim().ends_with(command.trim()) {
            lines.remove(0);
        }
    }

    while let Some(last) = lines.last() {
        let trimmed = last.trim_end();
        if trimmed.is_empty() || prompt.is_match(trimmed.as_bytes()) {
            lines.pop();
        } else {
            break;
        }
    }

    lines.join("\n")
}

struct SshHandler {
    host: String,
    port: u16,
    verification: HostKeyVerification,
    known_hosts_path: Option<std::path::PathBuf>,
    /// Detailed host-key failure for connect() to surface instead of
    /// russh's generic error.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// `Ok(true)` when the key matches known_hosts, `Ok(false)` when the
    /// host is unknown, `Err` when the key changed.
    fn check_known_hosts(
        &self,
        pubkey: &PublicKey,
    ) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };
        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("failed to save host key: {e}");
                    }
                    Ok(true)
                }
                Err(e) => {
                    *self.host_key_error.lock().unwrap() = Some(e);
                    Ok(false)
                }
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    *self.host_key_error.lock().unwrap() =
                        Some(TransportError::HostKeyUnknown {
                            host: self.host.clone(),
                            port: self.port,
                        });
                    Ok(false)
                }
                Err(e) => {
                    *self.host_key_error.lock().unwrap() = Some(e);
                    Ok(false)
                }
            },
        }
    }
}
