//! TextFSM output parsing.
//!
//! [`TemplateParser`] resolves template names against the bundled set (and an
//! optional fallback directory), caches the sources, and turns raw CLI output
//! into [`ParsedRecord`]s. Parsing is strictly best-effort: a missing
//! template, a template that fails to compile, or output the template does
//! not match all come back as `None`, and the caller falls back to raw
//! output. A parse failure must never take the collection cycle down.

mod store;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use log::{debug, warn};
use textfsm_rust::Template;

use crate::model::{FieldValue, ParsedRecord};

/// Thread-safe template resolver and parser with a source cache.
#[derive(Debug, Default)]
pub struct TemplateParser {
    fallback_dir: Option<PathBuf>,
    cache: RwLock<HashMap<String, Arc<str>>>,
}

impl TemplateParser {
    /// Parser over the bundled template set only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that also resolves template names against `dir` when the
    /// bundled set has no match.
    pub fn with_fallback_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            fallback_dir: Some(dir.into()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Parse `raw` with the named template. `None` means the output could not
    /// be structured (unknown template, compile failure, or no match) and the
    /// caller should keep the raw text.
    pub fn parse(&self, template: &str, raw: &str) -> Option<Vec<ParsedRecord>> {
        let source = self.template_source(template)?;

        let compiled = match Template::parse_str(&source) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!("template {template} failed to compile: {e}");
                return None;
            }
        };

        let mut parser = compiled.parser();
        let dicts = match parser.parse_text_to_dicts(raw) {
            Ok(dicts) => dicts,
            Err(e) => {
                debug!("template {template} did not match output: {e}");
                return None;
            }
        };

        if dicts.is_empty() {
            debug!("template {template} produced no records");
            return None;
        }

        let declared = declared_fields(&source);
        Some(
            dicts
                .into_iter()
                .map(|dict| record_from_dict(dict, &declared))
                .collect(),
        )
    }

    /// Whether `template` resolves against the bundled set or fallback dir.
    pub fn template_exists(&self, template: &str) -> bool {
        self.template_source(template).is_some()
    }

    /// Names of every resolvable template, bundled first, then any extras
    /// from the fallback directory. Sorted and de-duplicated.
    pub fn list_available_templates(&self) -> Vec<String> {
        let mut names: Vec<String> = store::BUNDLED_TEMPLATES
            .iter()
            .map(|(name, _)| (*name).to_string())
            .collect();

        if let Some(dir) = &self.fallback_dir {
            if let Ok(entries) = fs::read_dir(dir) {
                for entry in entries.flatten() {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if name.ends_with(".textfsm") {
                        names.push(name);
                    }
                }
            }
        }

        names.sort();
        names.dedup();
        names
    }

    /// Diagnostic check of a single template: resolvable, compilable, and
    /// which fields it declares.
    pub fn validate_template(&self, template: &str) -> TemplateValidation {
        let Some(source) = self.template_source(template) else {
            return TemplateValidation {
                exists: false,
                parseable: false,
                field_names: Vec::new(),
                errors: vec![format!("Template '{template}' not found")],
            };
        };

        let field_names = declared_fields(&source);
        match Template::parse_str(&source) {
            Ok(_) => TemplateValidation {
                exists: true,
                parseable: true,
                field_names,
                errors: Vec::new(),
            },
            Err(e) => TemplateValidation {
                exists: true,
                parseable: false,
                field_names,
                errors: vec![e.to_string()],
            },
        }
    }

    /// Drop all cached template sources. Subsequent lookups for
    /// filesystem-resolved templates re-read from disk.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    fn template_source(&self, template: &str) -> Option<Arc<str>> {
        if template.is_empty() {
            return None;
        }

        if let Ok(cache) = self.cache.read() {
            if let Some(source) = cache.get(template) {
                return Some(source.clone());
            }
        }

        // Bundled set first, then the filesystem fallback location
        let source: Option<Arc<str>> = store::bundled(template)
            .map(Arc::from)
            .or_else(|| {
                self.fallback_dir
                    .as_ref()
                    .and_then(|dir| fs::read_to_string(dir.join(template)).ok())
                    .map(Arc::from)
            });

        if let Some(source) = &source {
            if let Ok(mut cache) = self.cache.write() {
                cache.insert(template.to_string(), source.clone());
            }
        }
        source
    }
}

/// Result of [`TemplateParser::validate_template`].
#[derive(Debug)]
pub struct TemplateValidation {
    pub exists: bool,
    pub parseable: bool,
    pub field_names: Vec<String>,
    pub errors: Vec<String>,
}

/// Convert one TextFSM dict into a record with stable key order. The dict
/// keys come back lowercased, so each one is mapped back to the casing the
/// template declared; field mappings and normalization match on that casing.
fn record_from_dict(dict: HashMap<String, String>, declared: &[String]) -> ParsedRecord {
    let mut pairs: Vec<(String, String)> = dict
        .into_iter()
        .map(|(key, value)| {
            let key = declared
                .iter()
                .find(|name| name.eq_ignore_ascii_case(&key))
                .cloned()
                .unwrap_or(key);
            (key, value)
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .into_iter()
        .map(|(key, value)| (key, FieldValue::Scalar(value)))
        .collect()
}

/// Field names from `Value [options] NAME (regex)` declarations.
fn declared_fields(source: &str) -> Vec<String> {
    let mut fields = Vec::new();
    for line in source.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("Value ") else {
            continue;
        };
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let Some(paren) = tokens.iter().position(|t| t.starts_with('(')) else {
            continue;
        };
        if paren > 0 {
            fields.push(tokens[paren - 1].to_string());
        }
    }
    fields
}
