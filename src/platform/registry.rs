//! Platform registry: loads the platforms configuration document and serves
//! lookups for every command cycle.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;

use super::definition::{ConnectionDefaults, PlatformDefinition};
use super::fallback;
use crate::error::{CommandError, ConfigError};
use crate::parser::TemplateParser;

/// Default platforms document bundled with the crate.
const DEFAULT_PLATFORMS_JSON: &str = include_str!("../../config/platforms.json");

#[derive(Debug, Deserialize)]
struct PlatformsDocument {
    #[serde(default)]
    platforms: HashMap<String, PlatformDefinition>,
}

/// Registry of platform definitions.
///
/// Immutable after load; share via `Arc` across collectors.
#[derive(Debug)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Load the registry from an optional explicit path, falling back to the
    /// bundled default document. Any read or parse failure degrades to the
    /// built-in minimal platform rather than failing hard.
    pub fn load(path: Option<&Path>) -> Self {
        if let Some(path) = path {
            match fs::read_to_string(path) {
                Ok(content) => match Self::from_json(&content) {
                    Ok(registry) => {
                        info!(
                            "loaded {} platform definitions from {}",
                            registry.platforms.len(),
                            path.display()
                        );
                        return registry;
                    }
                    Err(e) => warn!("bad platforms config at {}: {}", path.display(), e),
                },
                Err(e) => warn!("could not read {}: {}", path.display(), e),
            }
        }

        match Self::from_json(DEFAULT_PLATFORMS_JSON) {
            Ok(registry) => {
                debug!(
                    "loaded {} platform definitions from bundled config",
                    registry.platforms.len()
                );
                registry
            }
            Err(e) => {
                warn!("bundled platforms config unusable ({}), using built-in fallback", e);
                Self::builtin_fallback()
            }
        }
    }

    /// Strict parse of a platforms document. Used by `load` internally and by
    /// tooling that wants the error instead of the fallback.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let document: PlatformsDocument = serde_json::from_str(content)?;
        if document.platforms.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut platforms = document.platforms;
        for (name, def) in platforms.iter_mut() {
            def.name = name.clone();
            if def.display_name.is_empty() {
                def.display_name = name.clone();
            }
        }

        Ok(Self { platforms })
    }

    /// Registry containing only the built-in minimal platform.
    pub fn builtin_fallback() -> Self {
        let def = fallback::cisco_ios();
        let mut platforms = HashMap::new();
        platforms.insert(def.name.clone(), def);
        Self { platforms }
    }

    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    /// All registered platform names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.platforms.keys().map(String::as_str)
    }

    /// Format a command for a platform, substituting `{param}` placeholders
    /// from `params`. Never panics: absent platforms, unsupported command
    /// kinds, and missing parameters all come back as typed errors for the
    /// caller to skip on.
    pub fn format_command(
        &self,
        platform: &str,
        kind: &str,
        params: &HashMap<&str, &str>,
    ) -> Result<String, CommandError> {
        let def = self
            .get(platform)
            .ok_or_else(|| CommandError::PlatformNotFound(platform.to_string()))?;

        let spec = def
            .command(kind)
            .ok_or_else(|| CommandError::CommandNotSupported {
                platform: platform.to_string(),
                kind: kind.to_string(),
            })?;

        substitute_params(&spec.command, kind, params)
    }

    /// Alternative command strings for a platform command, parameters
    /// substituted. Forms whose parameters cannot be satisfied are skipped.
    pub fn fallback_commands(
        &self,
        platform: &str,
        kind: &str,
        params: &HashMap<&str, &str>,
    ) -> Vec<String> {
        self.get(platform)
            .and_then(|def| def.command(kind))
            .map(|spec| {
                spec.fallback_commands
                    .iter()
                    .filter_map(|form| substitute_params(form, kind, params).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The (template namespace, template id) pair for a platform command.
    /// None when the platform or command is absent or carries no template;
    /// the capability is then treated as unavailable.
    pub fn template_ref(&self, platform: &str, kind: &str) -> Option<(String, String)> {
        let def = self.get(platform)?;
        let spec = def.command(kind)?;
        if spec.template.is_empty() {
            return None;
        }
        Some((def.template_namespace().to_string(), spec.template.clone()))
    }

    /// Field-mapping table for a platform and category; empty when absent.
    pub fn field_mapping(&self, platform: &str, category: &str) -> HashMap<String, String> {
        self.get(platform)
            .and_then(|def| def.field_mappings.get(category))
            .cloned()
            .unwrap_or_default()
    }

    pub fn connection_defaults(&self, platform: &str) -> Option<&ConnectionDefaults> {
        self.get(platform).map(|def| &def.connection)
    }

    /// Per-command timeout, falling back to the platform connection timeout.
    pub fn command_timeout(&self, platform: &str, kind: &str) -> Duration {
        let secs = self
            .get(platform)
            .and_then(|def| def.command(kind))
            .map(|spec| spec.timeout_secs)
            .or_else(|| self.connection_defaults(platform).map(|c| c.timeout_secs))
            .unwrap_or(30);
        Duration::from_secs(secs)
    }

    /// Diagnostic check of one platform's command/template wiring.
    pub fn validate_platform(&self, platform: &str, parser: &TemplateParser) -> PlatformValidation {
        let Some(def) = self.get(platform) else {
            return PlatformValidation {
                valid: false,
                errors: vec![format!("Platform '{platform}' not found")],
                missing_templates: Vec::new(),
                available_commands: Vec::new(),
            };
        };

        let mut errors = Vec::new();
        let mut missing_templates = Vec::new();
        let mut available_commands = Vec::new();

        for (kind, spec) in &def.commands {
            available_commands.push(kind.clone());
            if !spec.template.is_empty() && !parser.template_exists(&spec.template) {
                missing_templates.push(spec.template.clone());
                errors.push(format!("Template not found for {}: {}", kind, spec.template));
            }
        }

        PlatformValidation {
            valid: errors.is_empty(),
            errors,
            missing_templates,
            available_commands,
        }
    }
}

/// Result of `validate_platform`.
#[derive(Debug)]
pub struct PlatformValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub missing_templates: Vec<String>,
    pub available_commands: Vec<String>,
}

fn substitute_params(
    command: &str,
    kind: &str,
    params: &HashMap<&str, &str>,
) -> Result<String, CommandError> {
    let mut out = String::with_capacity(command.len());
    let mut rest = command;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            // Unbalanced brace, keep literally
            out.push_str(&rest[open..]);
            return Ok(out);
        };
        let name = &after[..close];
        match params.get(name) {
            Some(value) => out.push_str(value),
            None => {
                return Err(CommandError::MissingParameter {
                    kind: kind.to_string(),
                    name: name.to_string(),
                })
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
