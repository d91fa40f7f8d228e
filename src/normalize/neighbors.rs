//! Neighbor-discovery (CDP/LLDP) normalization.

use crate::model::{NormalizedNeighbor, ParsedRecord};
use crate::platform::PlatformRegistry;

use super::pick_field;

const LOCAL_INTERFACE: &[&str] = &["LOCAL_INTERFACE", "local_interface", "local_port"];
const NEIGHBOR_DEVICE: &[&str] = &[
    "NEIGHBOR_NAME",
    "neighbor",
    "neighbor_id",
    "device_id",
    "system_name",
];
const NEIGHBOR_INTERFACE: &[&str] = &[
    "NEIGHBOR_INTERFACE",
    "NEIGHBOR_PORT_ID",
    "neighbor_interface",
    "neighbor_port",
    "remote_port",
];
const NEIGHBOR_IP: &[&str] = &["MGMT_ADDRESS", "neighbor_ip", "management_ip", "mgmt_ip"];
const NEIGHBOR_PLATFORM: &[&str] = &[
    "PLATFORM",
    "platform",
    "neighbor_platform",
    "system_description",
    "NEIGHBOR_DESCRIPTION",
];
const NEIGHBOR_CAPABILITY: &[&str] = &["CAPABILITIES", "capabilities", "capability"];

pub(super) fn normalize(
    registry: &PlatformRegistry,
    records: &[ParsedRecord],
    platform: &str,
    command_hint: &str,
) -> Vec<NormalizedNeighbor> {
    let protocol_used = protocol_used(registry, platform, command_hint);

    records
        .iter()
        .map(|record| NormalizedNeighbor {
            local_interface: pick_field(record, LOCAL_INTERFACE).unwrap_or_default(),
            neighbor_device: pick_field(record, NEIGHBOR_DEVICE).unwrap_or_default(),
            neighbor_interface: pick_field(record, NEIGHBOR_INTERFACE).unwrap_or_default(),
            neighbor_ip: pick_field(record, NEIGHBOR_IP).unwrap_or_default(),
            neighbor_platform: pick_field(record, NEIGHBOR_PLATFORM).unwrap_or_default(),
            neighbor_capability: pick_field(record, NEIGHBOR_CAPABILITY).unwrap_or_default(),
            protocol_used: protocol_used.clone(),
        })
        .collect()
}

/// The platform's declared discovery protocol wins over the command hint;
/// the hint only decides when the platform is unknown to the registry.
fn protocol_used(registry: &PlatformRegistry, platform: &str, command_hint: &str) -> String {
    if let Some(def) = registry.get(platform) {
        return def.capabilities.neighbor_protocol.to_uppercase();
    }

    let hint = command_hint.to_lowercase();
    if hint.contains("lldp") {
        "LLDP".to_string()
    } else if hint.contains("cdp") {
        "CDP".to_string()
    } else {
        String::new()
    }
}
