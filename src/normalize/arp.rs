//! ARP / neighbor-table normalization.

use crate::model::{NormalizedArpEntry, ParsedRecord};
use crate::platform::{PlatformFamily, PlatformRegistry};

use super::pick_field;

const IP_ADDRESS: &[&str] = &["IP_ADDRESS", "address", "ip", "ip_address", "protocol_address"];
const MAC_ADDRESS: &[&str] = &["MAC_ADDRESS", "mac", "mac_address", "hardware_addr", "hwaddr"];
const INTERFACE: &[&str] = &["INTERFACE", "interface", "intf", "port"];
const AGE: &[&str] = &["AGE", "age", "age_min"];
const TYPE: &[&str] = &["TYPE", "type", "encap_type"];
const STATE: &[&str] = &["STATE", "state", "flags"];

pub(super) fn normalize(
    registry: &PlatformRegistry,
    records: &[ParsedRecord],
    platform: &str,
) -> Vec<NormalizedArpEntry> {
    let family = PlatformFamily::from_platform(platform);
    let state_mapping = registry.field_mapping(platform, "arp_states");

    records
        .iter()
        .filter_map(|record| {
            let mut entry = NormalizedArpEntry {
                ip_address: pick_field(record, IP_ADDRESS).unwrap_or_default(),
                mac_address: pick_field(record, MAC_ADDRESS).unwrap_or_default(),
                interface: pick_field(record, INTERFACE).unwrap_or_default(),
                age: pick_field(record, AGE).unwrap_or_default(),
                entry_type: pick_field(record, TYPE).unwrap_or_default(),
                state: pick_field(record, STATE).unwrap_or_default(),
            };

            if entry.ip_address.is_empty() {
                return None;
            }

            match family {
                PlatformFamily::Linux => {
                    if !entry.state.is_empty() {
                        entry.state = if let Some(mapped) = state_mapping.get(&entry.state) {
                            mapped.clone()
                        } else {
                            builtin_state(&entry.state)
                        };
                    }
                }
                family if family.is_cisco() => {
                    if entry.entry_type.is_empty() {
                        entry.entry_type = "ARPA".to_string();
                    }
                }
                _ => {}
            }

            Some(entry)
        })
        .collect()
}

fn builtin_state(raw: &str) -> String {
    match raw {
        "REACHABLE" => "Active".to_string(),
        "STALE" => "Incomplete".to_string(),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{test_registry, Normalizer};
    use crate::model::ParsedRecord;

    fn record(pairs: &[(&str, &str)]) -> ParsedRecord {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).into())).collect()
    }

    #[test]
    fn cisco_empty_type_defaults_to_arpa() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![record(&[
            ("IP_ADDRESS", "10.0.0.1"),
            ("MAC_ADDRESS", "aabb.cc00.0100"),
            ("INTERFACE", "Gi0/1"),
        ])];

        let out = normalizer.arp(&records, "cisco_ios");
        assert_eq!(out[0].entry_type, "ARPA");
    }

    #[test]
    fn linux_states_translate_via_config() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![
            record(&[("IP_ADDRESS", "192.168.1.1"), ("STATE", "REACHABLE")]),
            record(&[("IP_ADDRESS", "192.168.1.2"), ("STATE", "STALE")]),
            record(&[("IP_ADDRESS", "192.168.1.3"), ("STATE", "NOARP")]),
        ];

        let out = normalizer.arp(&records, "linux");
        assert_eq!(out[0].state, "Active");
        assert_eq!(out[1].state, "Incomplete");
        // Unmapped states pass through untouched
        assert_eq!(out[2].state, "NOARP");
    }

    #[test]
    fn rows_without_ip_are_dropped() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![
            record(&[("MAC_ADDRESS", "aabb.cc00.0100")]),
            record(&[("IP_ADDRESS", "10.0.0.2"), ("MAC_ADDRESS", "aabb.cc00.0200")]),
        ];

        let out = normalizer.arp(&records, "cisco_ios");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ip_address, "10.0.0.2");
    }

    #[test]
    fn arista_type_stays_empty() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![record(&[("IP_ADDRESS", "10.1.1.1")])];
        let out = normalizer.arp(&records, "arista_eos");
        assert!(out[0].entry_type.is_empty());
    }
}
