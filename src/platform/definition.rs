//! Platform definition: the declarative per-platform command/template/mapping
//! schema loaded from the platforms configuration document.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;

fn default_timeout() -> u64 {
    30
}

fn default_auth_timeout() -> u64 {
    10
}

fn default_device_type() -> String {
    "cisco_ios".to_string()
}

fn default_base_path() -> String {
    "templates/textfsm".to_string()
}

fn default_neighbor_protocol() -> String {
    "cdp".to_string()
}

/// Netmiko-style connection defaults for one platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionDefaults {
    /// Transport device-type tag (e.g. "cisco_ios", "linux").
    #[serde(default = "default_device_type")]
    pub device_type: String,

    /// Fast-mode flag (reduced inter-write delays on capable platforms).
    #[serde(default, rename = "fast_cli")]
    pub fast_mode: bool,

    /// Connection timeout, seconds.
    #[serde(default = "default_timeout", rename = "timeout")]
    pub timeout_secs: u64,

    /// Authentication timeout, seconds.
    #[serde(default = "default_auth_timeout", rename = "auth_timeout")]
    pub auth_timeout_secs: u64,
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            device_type: default_device_type(),
            fast_mode: false,
            timeout_secs: default_timeout(),
            auth_timeout_secs: default_auth_timeout(),
        }
    }
}

/// Which template namespace this platform's outputs are parsed with.
///
/// Platforms can share a namespace (e.g. an IOS-XE platform parsing with
/// cisco_ios templates).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateConfig {
    /// Template namespace; defaults to the platform name when absent.
    #[serde(default, rename = "platform")]
    pub namespace: String,

    /// Filesystem fallback location for templates.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

/// One capability's invocation recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    /// Literal command string; may contain `{param}` placeholders.
    pub command: String,

    /// Parsing template identifier (filename within the namespace).
    #[serde(default)]
    pub template: String,

    /// Per-command execution timeout, seconds.
    #[serde(default = "default_timeout", rename = "timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub description: String,

    /// Named parameters the command string expects.
    #[serde(default)]
    pub parameters: Vec<String>,

    /// Alternative command strings to try when the primary form fails.
    #[serde(default)]
    pub fallback_commands: Vec<String>,
}

/// Capability flags for one platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub supports_vrf: bool,
    #[serde(default)]
    pub supports_cdp: bool,
    #[serde(default)]
    pub supports_lldp: bool,
    #[serde(default)]
    pub supports_temperature: bool,
    /// Primary neighbor-discovery protocol ("cdp" or "lldp").
    #[serde(default = "default_neighbor_protocol")]
    pub neighbor_protocol: String,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_vrf: false,
            supports_cdp: false,
            supports_lldp: false,
            supports_temperature: false,
            neighbor_protocol: default_neighbor_protocol(),
        }
    }
}

/// Complete definition of one device platform family.
///
/// Loaded once at startup, immutable thereafter, looked up by name on every
/// command cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformDefinition {
    /// Unique key; filled in from the document key during load.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, rename = "netmiko")]
    pub connection: ConnectionDefaults,

    #[serde(default)]
    pub templates: TemplateConfig,

    /// Command-kind → invocation recipe, in declared order.
    #[serde(default)]
    pub commands: IndexMap<String, CommandSpec>,

    /// Mapping-category → (raw value → canonical value).
    #[serde(default)]
    pub field_mappings: HashMap<String, HashMap<String, String>>,

    #[serde(default)]
    pub capabilities: Capabilities,
}

impl PlatformDefinition {
    /// The template namespace for this platform (falls back to the platform
    /// name when the config omits one).
    pub fn template_namespace(&self) -> &str {
        if self.templates.namespace.is_empty() {
            &self.name
        } else {
            &self.templates.namespace
        }
    }

    pub fn command(&self, kind: &str) -> Option<&CommandSpec> {
        self.commands.get(kind)
    }
}
