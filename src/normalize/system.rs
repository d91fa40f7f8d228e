//! System identity and metrics normalization.

use regex::Regex;

use crate::model::{
    FieldValue, MemoryUsage, NormalizedSystemInfo, NormalizedSystemMetrics, ParsedRecord,
};
use crate::platform::{PlatformFamily, PlatformRegistry};

use super::pick_field;

const HOSTNAME: &[&str] = &["HOSTNAME", "hostname", "device_name"];
const VERSION: &[&str] = &["VERSION", "version", "software_version", "KERNEL_VERSION"];
const MODEL: &[&str] = &["HARDWARE", "hardware", "MODEL", "model", "platform"];
const SERIAL: &[&str] = &["SERIAL", "serial", "SERIAL_NUMBER", "serial_number"];
const UPTIME: &[&str] = &["UPTIME", "uptime"];
const SOFTWARE_IMAGE: &[&str] = &["SOFTWARE_IMAGE", "software_image", "image", "IMAGE"];
const CONFIG_REGISTER: &[&str] = &["CONFIG_REGISTER", "config_register"];

const TEMPERATURE: &[&str] = &["TEMPERATURE", "TEMP", "TEMP_CELSIUS", "INLET_TEMP", "CPU_TEMP"];

pub(super) fn normalize_info(
    registry: &PlatformRegistry,
    records: &[ParsedRecord],
    platform: &str,
) -> NormalizedSystemInfo {
    let mut info = NormalizedSystemInfo::default();
    let Some(record) = records.first() else {
        return info;
    };

    let declared = registry.field_mapping(platform, "system_info_fields");
    if !declared.is_empty() {
        // Platform config maps template field -> canonical field directly
        for (template_field, canonical) in &declared {
            let Some(value) = record.get(template_field) else {
                continue;
            };
            let Some(value) = field_string(canonical, value) else {
                continue;
            };
            assign(&mut info, canonical, value);
        }
    } else {
        if let Some(v) = joined_or_first("hostname", record, HOSTNAME) {
            info.hostname = v;
        }
        if let Some(v) = joined_or_first("version", record, VERSION) {
            info.version = v;
        }
        if let Some(v) = joined_or_first("model", record, MODEL) {
            info.model = v;
        }
        if let Some(v) = joined_or_first("serial", record, SERIAL) {
            info.serial = v;
        }
        if let Some(v) = joined_or_first("uptime", record, UPTIME) {
            info.uptime = v;
        }
        if let Some(v) = joined_or_first("software_version", record, SOFTWARE_IMAGE) {
            info.software_version = v;
        }
        if let Some(v) = joined_or_first("config_register", record, CONFIG_REGISTER) {
            info.config_register = v;
        }
    }

    info
}

fn assign(info: &mut NormalizedSystemInfo, canonical: &str, value: String) {
    match canonical {
        "hostname" => info.hostname = value,
        "version" => info.version = value,
        "model" => info.model = value,
        "serial" => info.serial = value,
        "uptime" => info.uptime = value,
        "software_version" | "image" => info.software_version = value,
        "config_register" => info.config_register = value,
        _ => {}
    }
}

/// Serial and model can be list-valued on chassis platforms; those join
/// with ", " instead of taking the first element.
fn field_string(canonical: &str, value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Scalar(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        FieldValue::List(items) => {
            let cleaned: Vec<&str> = items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if cleaned.is_empty() {
                None
            } else if matches!(canonical, "serial" | "model") {
                Some(cleaned.join(", "))
            } else {
                Some(cleaned[0].to_string())
            }
        }
    }
}

fn joined_or_first(canonical: &str, record: &ParsedRecord, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(value) = record.get(*name) {
            if let Some(s) = field_string(canonical, value) {
                return Some(s);
            }
        }
    }
    None
}

pub(super) fn cpu_percent(records: &[ParsedRecord], family: PlatformFamily) -> Option<f64> {
    let record = records.first()?;

    match family {
        f if f.is_cisco() => {
            pick_float(record, &["CPU_USAGE_5_SEC", "CPU_5_SEC", "CPU_USAGE"])
        }
        PlatformFamily::AristaEos => {
            if let Some(idle) = pick_float(record, &["GLOBAL_CPU_PERCENT_IDLE"]) {
                Some(100.0 - idle)
            } else {
                let user = pick_float(record, &["GLOBAL_CPU_PERCENT_USER"])?;
                let system = pick_float(record, &["GLOBAL_CPU_PERCENT_SYSTEM"])?;
                Some(user + system)
            }
        }
        PlatformFamily::Linux => {
            pick_float(record, &["CPU_PERCENT", "CPU_USAGE", "USER_PERCENT"])
        }
        _ => None,
    }
}

pub(super) fn memory(records: &[ParsedRecord], family: PlatformFamily) -> Option<MemoryUsage> {
    match family {
        f if f.is_cisco() => cisco_memory(records),
        PlatformFamily::AristaEos => arista_memory(records.first()?),
        PlatformFamily::Linux => linux_memory(records.first()?),
        _ => None,
    }
}

/// Cisco reports byte counts per pool; the "Processor" pool is the one
/// that matters. MB values truncate (integer division) while the percent
/// is computed on the raw byte counts.
fn cisco_memory(records: &[ParsedRecord]) -> Option<MemoryUsage> {
    for record in records {
        let pool = record.get("POOL").and_then(|v| v.first_non_empty());
        if pool != Some("Processor") {
            continue;
        }
        let total = pick_u64(record, &["TOTAL"])?;
        let used = pick_u64(record, &["USED"])?;
        let free = pick_u64(record, &["FREE"])?;
        if total == 0 {
            continue;
        }
        return Some(MemoryUsage {
            used_percent: (used as f64 / total as f64) * 100.0,
            total_mb: total / (1024 * 1024),
            used_mb: used / (1024 * 1024),
            free_mb: free / (1024 * 1024),
        });
    }
    None
}

fn arista_memory(record: &ParsedRecord) -> Option<MemoryUsage> {
    let total = pick_float(record, &["GLOBAL_MEM_TOTAL"])?;
    let used = pick_float(record, &["GLOBAL_MEM_USED"]).unwrap_or(0.0);
    let free = pick_float(record, &["GLOBAL_MEM_FREE"]).unwrap_or(0.0);
    let unit = record
        .get("GLOBAL_MEM_UNIT")
        .and_then(|v| v.first_non_empty())
        .unwrap_or("KiB");

    let to_mb = |v: f64| -> u64 {
        match unit.to_lowercase().as_str() {
            "kib" | "k" => (v / 1024.0) as u64,
            "gib" | "g" => (v * 1024.0) as u64,
            _ => v as u64,
        }
    };

    let total_mb = to_mb(total);
    let mut used_mb = to_mb(used);
    let free_mb = to_mb(free);
    if used_mb == 0 && free_mb > 0 {
        used_mb = total_mb.saturating_sub(free_mb);
    }
    if total_mb == 0 {
        return None;
    }

    Some(MemoryUsage {
        used_percent: (used_mb as f64 / total_mb as f64) * 100.0,
        total_mb,
        used_mb,
        free_mb,
    })
}

/// `free -m` style output, already in MB. Used and free derive from each
/// other when only one is reported.
fn linux_memory(record: &ParsedRecord) -> Option<MemoryUsage> {
    let total_mb = pick_u64(record, &["MEM_TOTAL", "TOTAL_MEMORY", "TOTAL"])?;
    let used = pick_u64(record, &["MEM_USED", "USED"]);
    let free = pick_u64(record, &["MEM_FREE", "FREE"]);

    let (used_mb, free_mb) = match (used, free) {
        (Some(u), Some(f)) => (u, f),
        (Some(u), None) => (u, total_mb.saturating_sub(u)),
        (None, Some(f)) => (total_mb.saturating_sub(f), f),
        (None, None) => return None,
    };
    if total_mb == 0 {
        return None;
    }

    Some(MemoryUsage {
        used_percent: (used_mb as f64 / total_mb as f64) * 100.0,
        total_mb,
        used_mb,
        free_mb,
    })
}

/// First numeric reading found in any temperature-flavored field.
pub(super) fn temperature(records: &[ParsedRecord]) -> Option<f64> {
    let number = Regex::new(r"[-+]?\d+(\.\d+)?").ok()?;
    for record in records {
        for name in TEMPERATURE {
            let Some(raw) = record.get(*name).and_then(|v| v.first_non_empty()) else {
                continue;
            };
            if let Some(m) = number.find(raw) {
                if let Ok(v) = m.as_str().parse::<f64>() {
                    return Some(v);
                }
            }
        }
    }
    None
}

pub(super) fn metrics_from_cpu(
    records: &[ParsedRecord],
    platform: &str,
) -> Option<NormalizedSystemMetrics> {
    let family = PlatformFamily::from_platform(platform);
    let record = records.first()?;
    let mut metrics = NormalizedSystemMetrics::new(platform);

    metrics.cpu_percent = cpu_percent(records, family)?;

    match family {
        f if f.is_cisco() => {
            metrics.cpu_1min = pick_float(record, &["CPU_USAGE_1_MIN"]).unwrap_or(0.0);
            metrics.cpu_5min = pick_float(record, &["CPU_USAGE_5_MIN"]).unwrap_or(0.0);
        }
        PlatformFamily::AristaEos => {
            // Arista's top output carries memory and load in the same rows
            metrics.cpu_1min =
                pick_float(record, &["GLOBAL_LOAD_AVERAGE_1_MINUTES", "LOAD_1MIN"]).unwrap_or(0.0);
            metrics.cpu_5min =
                pick_float(record, &["GLOBAL_LOAD_AVERAGE_5_MINUTES", "LOAD_5MIN"]).unwrap_or(0.0);
            if let Some(mem) = arista_memory(record) {
                metrics.memory = mem;
            }
        }
        PlatformFamily::Linux => {
            metrics.cpu_1min = pick_float(record, &["LOAD_1MIN"]).unwrap_or(0.0);
            metrics.cpu_5min = pick_float(record, &["LOAD_5MIN"]).unwrap_or(0.0);
        }
        _ => {}
    }

    if let Some(t) = temperature(records) {
        metrics.temperature_celsius = t;
    }

    Some(metrics)
}

pub(super) fn metrics_from_memory(
    records: &[ParsedRecord],
    platform: &str,
) -> Option<NormalizedSystemMetrics> {
    let family = PlatformFamily::from_platform(platform);

    // Arista memory rides along with CPU output, so reuse the full path
    if family == PlatformFamily::AristaEos {
        return metrics_from_cpu(records, platform);
    }

    let mem = memory(records, family)?;
    let mut metrics = NormalizedSystemMetrics::new(platform);
    metrics.memory = mem;
    Some(metrics)
}

fn pick_float(record: &ParsedRecord, names: &[&str]) -> Option<f64> {
    for name in names {
        if let Some(raw) = record.get(*name).and_then(|v| v.first_non_empty()) {
            if let Ok(v) = raw.trim().parse::<f64>() {
                return Some(v);
            }
        }
    }
    None
}

fn pick_u64(record: &ParsedRecord, names: &[&str]) -> Option<u64> {
    for name in names {
        if let Some(raw) = record.get(*name).and_then(|v| v.first_non_empty()) {
            if let Ok(v) = raw.trim().parse::<u64>() {
                return Some(v);
            }
        }
    }
    None
}
