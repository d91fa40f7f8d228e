//! Field normalization: platform-specific parsed records in, canonical
//! domain objects out.
//!
//! Every routine here is a pure data transformation parameterized only by
//! the platform registry (field-mapping tables and capability flags). Edge
//! cases resolve to documented fallbacks, never errors: a malformed row is
//! dropped or filled with a sentinel, and one bad row never aborts the rest
//! of the batch.

mod arp;
mod neighbors;
mod routes;
mod system;

use std::sync::Arc;

use crate::model::{
    MemoryUsage, NormalizedArpEntry, NormalizedNeighbor, NormalizedRoute, NormalizedSystemInfo,
    NormalizedSystemMetrics, ParsedRecord,
};
use crate::platform::{PlatformFamily, PlatformRegistry};

/// Normalizer over a shared platform registry.
#[derive(Debug, Clone)]
pub struct Normalizer {
    registry: Arc<PlatformRegistry>,
}

impl Normalizer {
    pub fn new(registry: Arc<PlatformRegistry>) -> Self {
        Self { registry }
    }

    /// Normalize neighbor-discovery records. Rows with an empty
    /// `neighbor_device` are kept: a bare `local_interface` is still
    /// informative, unlike ARP and route rows.
    pub fn neighbors(
        &self,
        records: &[ParsedRecord],
        platform: &str,
        command_hint: &str,
    ) -> Vec<NormalizedNeighbor> {
        neighbors::normalize(&self.registry, records, platform, command_hint)
    }

    /// Normalize ARP/neighbor-table records. Rows without an IP address
    /// are dropped.
    pub fn arp(&self, records: &[ParsedRecord], platform: &str) -> Vec<NormalizedArpEntry> {
        arp::normalize(&self.registry, records, platform)
    }

    /// Normalize route-table records. Rows without a network are dropped;
    /// `next_hop` is always synthesized when absent.
    pub fn routes(&self, records: &[ParsedRecord], platform: &str) -> Vec<NormalizedRoute> {
        routes::normalize(&self.registry, records, platform)
    }

    /// Normalize a system-info record (first record wins, as `show version`
    /// style output yields a single row).
    pub fn system_info(&self, records: &[ParsedRecord], platform: &str) -> NormalizedSystemInfo {
        system::normalize_info(&self.registry, records, platform)
    }

    /// CPU utilization percentage, or `None` when the platform family has
    /// no recognized extraction path.
    pub fn cpu_percent(&self, records: &[ParsedRecord], platform: &str) -> Option<f64> {
        system::cpu_percent(records, PlatformFamily::from_platform(platform))
    }

    /// Memory usage, or `None` when nothing matched. `None` distinguishes
    /// "no data" from "zero usage".
    pub fn memory(&self, records: &[ParsedRecord], platform: &str) -> Option<MemoryUsage> {
        system::memory(records, PlatformFamily::from_platform(platform))
    }

    /// First numeric temperature reading found in the records, Celsius.
    pub fn temperature(&self, records: &[ParsedRecord]) -> Option<f64> {
        system::temperature(records)
    }

    /// Build a metrics object from CPU-capability records. On Arista the
    /// same `top` output carries memory and load data, which is folded in.
    pub fn metrics_from_cpu(
        &self,
        records: &[ParsedRecord],
        platform: &str,
    ) -> Option<NormalizedSystemMetrics> {
        system::metrics_from_cpu(records, platform)
    }

    /// Build a memory-only metrics object from memory-capability records.
    pub fn metrics_from_memory(
        &self,
        records: &[ParsedRecord],
        platform: &str,
    ) -> Option<NormalizedSystemMetrics> {
        system::metrics_from_memory(records, platform)
    }
}

/// First candidate field present in `record` with a non-empty value,
/// trimmed. List values contribute their first non-empty element.
pub(crate) fn pick_field(record: &ParsedRecord, candidates: &[&str]) -> Option<String> {
    for name in candidates {
        if let Some(value) = record.get(*name) {
            if let Some(s) = value.first_non_empty() {
                let s = s.trim();
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

/// Title-case a raw token: first letter of each word upper, rest lower.
pub(crate) fn title_case(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for (i, word) in token.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            for c in chars {
                out.extend(c.to_lowercase());
            }
        }
    }
    out
}

#[cfg(test)]
pub(crate) fn test_registry() -> Arc<PlatformRegistry> {
    Arc::new(PlatformRegistry::load(None))
}
