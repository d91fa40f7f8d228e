//! Core data model: parsed records, normalized telemetry shapes, and
//! connection metadata.
//!
//! Parsed records stay a generic field map because template field sets are
//! data-driven; everything downstream of the normalizer is a defined struct.

use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Serialize;

/// A single field value extracted by a template.
///
/// Multi-path route templates capture repeated values for one row, so a field
/// can be either a scalar or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// First non-empty value: the scalar itself, or the first non-empty
    /// list element.
    pub fn first_non_empty(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => {
                let s = s.trim();
                (!s.is_empty()).then_some(s)
            }
            FieldValue::List(items) => items
                .iter()
                .map(|s| s.trim())
                .find(|s| !s.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_non_empty().is_none()
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(s)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// One row matched by a template: ordered field name → value.
pub type ParsedRecord = IndexMap<String, FieldValue>;

/// Normalized neighbor entry (CDP/LLDP), platform-agnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedNeighbor {
    pub local_interface: String,
    pub neighbor_device: String,
    pub neighbor_interface: String,
    pub neighbor_ip: String,
    pub neighbor_platform: String,
    pub neighbor_capability: String,
    /// "CDP" or "LLDP".
    pub protocol_used: String,
}

/// Normalized ARP/neighbor-table entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedArpEntry {
    pub ip_address: String,
    pub mac_address: String,
    pub interface: String,
    pub age: String,
    pub entry_type: String,
    pub state: String,
}

/// Normalized route entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedRoute {
    /// Destination in CIDR form where derivable (e.g. "10.0.0.0/24").
    pub network: String,
    /// Never empty after normalization: a concrete address, a multi-path
    /// join ("a | b"), or one of "Directly Connected" / "Interface Only" /
    /// "Unspecified".
    pub next_hop: String,
    /// Canonical protocol name ("Static", "OSPF", ...).
    pub protocol: String,
    pub mask: String,
    pub interface: String,
    pub metric: String,
    pub admin_distance: String,
    pub age: String,
    pub vrf: String,
}

impl NormalizedRoute {
    pub fn new() -> Self {
        Self {
            vrf: "default".to_string(),
            ..Self::default()
        }
    }
}

/// Normalized system identity information from a "show version"-style command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedSystemInfo {
    pub hostname: String,
    pub version: String,
    pub model: String,
    pub serial: String,
    pub uptime: String,
    pub software_version: String,
    pub config_register: String,
}

impl NormalizedSystemInfo {
    pub fn is_empty(&self) -> bool {
        self.hostname.is_empty()
            && self.version.is_empty()
            && self.model.is_empty()
            && self.serial.is_empty()
            && self.uptime.is_empty()
            && self.software_version.is_empty()
            && self.config_register.is_empty()
    }
}

/// Memory usage in fixed units (MB / percent), regardless of the source
/// platform's native unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemoryUsage {
    pub used_percent: f64,
    pub total_mb: u64,
    pub used_mb: u64,
    pub free_mb: u64,
}

/// Alert level derived from fixed metric thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
}

/// Normalized system metrics for one collection cycle.
///
/// Lowest-common-denominator shape: what every supported platform can
/// actually provide, in fixed units.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedSystemMetrics {
    /// Current CPU utilization, percent.
    pub cpu_percent: f64,
    /// 1-minute CPU/load average where the platform reports one.
    pub cpu_1min: f64,
    /// 5-minute CPU/load average where the platform reports one.
    pub cpu_5min: f64,
    pub memory: MemoryUsage,
    /// 0.0 when the platform has no temperature sensing.
    pub temperature_celsius: f64,
    /// Originating platform name.
    pub platform: String,
    pub timestamp: SystemTime,
}

impl NormalizedSystemMetrics {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            cpu_percent: 0.0,
            cpu_1min: 0.0,
            cpu_5min: 0.0,
            memory: MemoryUsage::default(),
            temperature_celsius: 0.0,
            platform: platform.into(),
            timestamp: SystemTime::now(),
        }
    }

    /// Alert level from fixed thresholds: CPU > 80%, memory > 85%, or
    /// temperature > 70°C is critical; CPU > 60% or memory > 70% is warning.
    pub fn alert_level(&self) -> AlertLevel {
        let temp_high = self.temperature_celsius > 70.0;
        if self.cpu_percent > 80.0 || self.memory.used_percent > 85.0 || temp_high {
            AlertLevel::Critical
        } else if self.cpu_percent > 60.0 || self.memory.used_percent > 70.0 {
            AlertLevel::Warning
        } else {
            AlertLevel::Normal
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "CPU: {:.1}%, Memory: {:.1}% ({}/{} MB)",
            self.cpu_percent,
            self.memory.used_percent,
            self.memory.used_mb,
            self.memory.total_mb
        )
    }
}

/// Device identity, populated at connection time and refined by the one-shot
/// system-info gather.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceInfo {
    pub hostname: String,
    pub host: String,
    pub platform: String,
    pub model: String,
    pub version: String,
    pub serial: String,
    pub uptime: String,
}

impl DeviceInfo {
    /// Fold normalized system info into the identity, keeping connection-time
    /// defaults for anything the gather did not produce.
    pub fn apply(&mut self, info: &NormalizedSystemInfo) {
        if !info.hostname.is_empty() {
            self.hostname = info.hostname.clone();
        }
        if !info.version.is_empty() {
            self.version = info.version.clone();
        }
        if !info.model.is_empty() {
            self.model = info.model.clone();
        }
        if !info.serial.is_empty() {
            self.serial = info.serial.clone();
        }
        if !info.uptime.is_empty() {
            self.uptime = info.uptime.clone();
        }
    }
}

/// Raw command output with parsing metadata, emitted once per executed
/// capability. Useful for debugging and template authoring even when
/// normalization also succeeds.
#[derive(Debug, Clone)]
pub struct RawCommandOutput {
    pub command: String,
    pub output: String,
    pub platform: String,
    pub timestamp: SystemTime,
    pub template_used: Option<String>,
    pub parsed_successfully: bool,
}

/// Immutable per-connection configuration.
///
/// Created once per connection attempt and owned by that connection's
/// collector for its lifetime. Credentials are held as secrets and never
/// logged or persisted by this crate.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub hostname: String,
    pub host: String,
    pub platform: String,
    pub username: String,
    pub password: SecretString,
    /// Enable/secret password where the platform needs one.
    pub enable_secret: Option<SecretString>,
    pub port: u16,
    pub timeout: Duration,
    pub auth_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(
        hostname: impl Into<String>,
        host: impl Into<String>,
        platform: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            host: host.into(),
            platform: platform.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            enable_secret: None,
            port: 22,
            timeout: Duration::from_secs(30),
            auth_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auth_timeout(mut self, auth_timeout: Duration) -> Self {
        self.auth_timeout = auth_timeout;
        self
    }
}
