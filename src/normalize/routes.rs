//! Route-table normalization.
//!
//! Vendor route dumps disagree on practically every field name and shape,
//! so extraction runs off per-family candidate tables, then applies the
//! family's network/mask combination rule, a fixed next-hop precedence,
//! and protocol-code translation. A row survives only if it has a network;
//! `next_hop` is always synthesized when nothing concrete was captured.

use crate::model::{FieldValue, NormalizedRoute, ParsedRecord};
use crate::platform::{PlatformFamily, PlatformRegistry};

use super::title_case;

struct RouteCandidates {
    network: &'static [&'static str],
    mask: &'static [&'static str],
    next_hop: &'static [&'static str],
    interface: &'static [&'static str],
    protocol: &'static [&'static str],
    metric: &'static [&'static str],
    admin_distance: &'static [&'static str],
    age: &'static [&'static str],
    vrf: &'static [&'static str],
}

const CISCO: RouteCandidates = RouteCandidates {
    network: &["NETWORK", "network"],
    mask: &["MASK", "PREFIX_LENGTH", "mask"],
    next_hop: &["NEXT_HOP", "NEXTHOP_IP", "nexthop"],
    interface: &["INTERFACE", "NEXTHOP_IF", "interface"],
    protocol: &["PROTOCOL", "protocol"],
    metric: &["METRIC", "metric"],
    admin_distance: &["DISTANCE", "admin_distance"],
    age: &["UPTIME", "age"],
    vrf: &["VRF", "vrf"],
};

const ARISTA: RouteCandidates = RouteCandidates {
    network: &["PREFIX", "NETWORK", "network"],
    mask: &["PREFIX_LENGTH", "MASK", "mask"],
    next_hop: &["VIA", "NEXT_HOP", "NEXTHOP_IP", "nexthop"],
    interface: &["INTERFACE", "NEXTHOP_IF", "interface"],
    protocol: &["ROUTE_TYPE", "PROTOCOL", "protocol"],
    metric: &["METRIC", "COST", "metric"],
    admin_distance: &["AD", "DISTANCE", "admin_distance"],
    age: &["AGE", "UPTIME", "age"],
    vrf: &["VRF", "TABLE", "vrf"],
};

const LINUX: RouteCandidates = RouteCandidates {
    network: &["NETWORK", "DESTINATION", "DST", "network"],
    mask: &["PREFIX_LENGTH", "PREFIXLEN", "MASK", "mask"],
    next_hop: &["NEXT_HOP", "GATEWAY", "VIA", "nexthop"],
    interface: &["INTERFACE", "DEV", "interface"],
    protocol: &["PROTOCOL", "PROTO", "protocol"],
    metric: &["METRIC", "metric"],
    admin_distance: &["DISTANCE", "admin_distance"],
    age: &["AGE", "age"],
    vrf: &["TABLE", "vrf"],
};

// Merged table for platforms outside the known families.
const GENERIC: RouteCandidates = RouteCandidates {
    network: &["NETWORK", "PREFIX", "DESTINATION", "DEST", "network", "destination"],
    mask: &["PREFIX_LENGTH", "MASK", "NETMASK", "mask", "prefix_length"],
    next_hop: &["NEXTHOP_IP", "NEXT_HOP", "VIA", "GATEWAY", "nexthop", "gateway"],
    interface: &["NEXTHOP_IF", "INTERFACE", "INTF", "PORT", "DEV", "interface", "port"],
    protocol: &["PROTOCOL", "ROUTE_TYPE", "PROTO", "SOURCE", "protocol", "source"],
    metric: &["METRIC", "COST", "metric", "cost"],
    admin_distance: &["DISTANCE", "AD", "PREFERENCE", "admin_distance", "preference"],
    age: &["UPTIME", "AGE", "TIME", "age", "uptime"],
    vrf: &["VRF", "TABLE", "ROUTING_TABLE", "vrf", "table"],
};

fn candidates(family: PlatformFamily) -> &'static RouteCandidates {
    match family {
        PlatformFamily::CiscoIos | PlatformFamily::CiscoNxos => &CISCO,
        PlatformFamily::AristaEos => &ARISTA,
        PlatformFamily::Linux => &LINUX,
        PlatformFamily::Generic => &GENERIC,
    }
}

pub(super) fn normalize(
    registry: &PlatformRegistry,
    records: &[ParsedRecord],
    platform: &str,
) -> Vec<NormalizedRoute> {
    let family = PlatformFamily::from_platform(platform);
    let table = candidates(family);
    let protocol_mapping = registry.field_mapping(platform, "protocols");

    let mut routes: Vec<NormalizedRoute> = Vec::new();
    for record in records {
        let mut route = extract(record, table);
        combine_network(&mut route, family);
        determine_next_hop(&mut route, record, family);
        if !route.protocol.is_empty() {
            route.protocol = normalize_protocol(&route.protocol, family, &protocol_mapping);
        }
        // A route without a network is noise from a partial template match
        if route.network.is_empty() {
            continue;
        }
        // Multi-path continuation rows repeat the prefix; fold them into
        // the previous route rather than emitting duplicates
        if let Some(prev) = routes.last_mut() {
            if prev.network == route.network
                && prev.protocol == route.protocol
                && prev.vrf == route.vrf
            {
                merge_multipath(prev, &route);
                continue;
            }
        }
        routes.push(route);
    }
    routes
}

const SYNTHESIZED_HOPS: &[&str] = &["Directly Connected", "Interface Only", "Unspecified"];

fn merge_multipath(prev: &mut NormalizedRoute, next: &NormalizedRoute) {
    append_path(&mut prev.next_hop, &next.next_hop, true);
    append_path(&mut prev.interface, &next.interface, false);
}

fn append_path(existing: &mut String, incoming: &str, skip_synthesized: bool) {
    if incoming.is_empty() || (skip_synthesized && SYNTHESIZED_HOPS.contains(&incoming)) {
        return;
    }
    if existing.is_empty() || (skip_synthesized && SYNTHESIZED_HOPS.contains(&existing.as_str())) {
        *existing = incoming.to_string();
        return;
    }
    if existing.split(" | ").any(|part| part == incoming) {
        return;
    }
    existing.push_str(" | ");
    existing.push_str(incoming);
}

fn extract(record: &ParsedRecord, table: &RouteCandidates) -> NormalizedRoute {
    let mut route = NormalizedRoute::new();

    if let Some(v) = super::pick_field(record, table.network) {
        route.network = v;
    }
    if let Some(v) = super::pick_field(record, table.mask) {
        route.mask = v;
    }
    // Multi-path rows carry list-valued next hops and interfaces: those two
    // columns de-duplicate and join with " | ", next hops additionally drop
    // "connected" placeholders. Every other column takes the first
    // non-empty element.
    if let Some(v) = joined(record, table.next_hop, true) {
        route.next_hop = v;
    }
    if let Some(v) = joined(record, table.interface, false) {
        route.interface = v;
    }
    if let Some(v) = super::pick_field(record, table.protocol) {
        route.protocol = v;
    }
    if let Some(v) = super::pick_field(record, table.metric) {
        route.metric = v;
    }
    if let Some(v) = super::pick_field(record, table.admin_distance) {
        route.admin_distance = v;
    }
    if let Some(v) = super::pick_field(record, table.age) {
        route.age = v;
    }
    if let Some(v) = super::pick_field(record, table.vrf) {
        route.vrf = v;
    }

    route
}

/// First candidate that yields a value, with list values de-duplicated and
/// joined rather than reduced to their first element.
fn joined(record: &ParsedRecord, names: &[&str], filter_connected: bool) -> Option<String> {
    for name in names {
        let Some(value) = record.get(*name) else {
            continue;
        };
        let out = match value {
            FieldValue::Scalar(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
            FieldValue::List(items) => join_list(items, filter_connected),
        };
        if out.is_some() {
            return out;
        }
    }
    None
}

fn join_list(items: &[String], filter_connected: bool) -> Option<String> {
    let mut cleaned: Vec<&str> = Vec::new();
    for item in items {
        let t = item.trim();
        if t.is_empty() {
            continue;
        }
        if filter_connected && t == "connected" {
            continue;
        }
        if !cleaned.contains(&t) {
            cleaned.push(t);
        }
    }
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join(" | "))
    }
}

fn combine_network(route: &mut NormalizedRoute, family: PlatformFamily) {
    let has_slash = route.network.contains('/');
    match family {
        PlatformFamily::CiscoIos | PlatformFamily::CiscoNxos => {
            if !route.network.is_empty() && !route.mask.is_empty() && !has_slash {
                if route.mask == "0" && route.network == "0.0.0.0" {
                    route.network = "0.0.0.0/0".to_string();
                } else if route.mask != "0" {
                    route.network = format!("{}/{}", route.network, route.mask);
                }
            }
        }
        PlatformFamily::AristaEos => {
            if !route.network.is_empty() && !route.mask.is_empty() && !has_slash {
                route.network = format!("{}/{}", route.network, route.mask);
            }
        }
        PlatformFamily::Linux => {
            if route.network == "default" {
                route.network = "0.0.0.0/0".to_string();
            } else if !route.network.is_empty() && !has_slash && !route.mask.is_empty() {
                route.network = format!("{}/{}", route.network, route.mask);
            }
        }
        PlatformFamily::Generic => {}
    }
}

/// Fixed precedence; runs on the raw (pre-translation) protocol code.
fn determine_next_hop(route: &mut NormalizedRoute, record: &ParsedRecord, family: PlatformFamily) {
    let direct = record
        .get("DIRECT")
        .and_then(|v| v.first_non_empty())
        .unwrap_or("");
    let hop_is_placeholder = route.next_hop.is_empty() || route.next_hop == "connected";

    if direct == "directly" && hop_is_placeholder {
        route.next_hop = "Directly Connected".to_string();
    } else if !hop_is_placeholder {
        // Concrete next hop already extracted, keep it
    } else if !route.interface.is_empty() {
        let connected_protocol = if family.is_cisco() {
            matches!(route.protocol.as_str(), "C" | "Connected" | "L" | "Local")
        } else {
            matches!(route.protocol.as_str(), "C" | "Connected")
        };
        route.next_hop = if connected_protocol {
            "Directly Connected".to_string()
        } else {
            "Interface Only".to_string()
        };
    } else {
        route.next_hop = "Unspecified".to_string();
    }
}

fn builtin_protocols(family: PlatformFamily) -> &'static [(&'static str, &'static str)] {
    const CISCO_IOS: &[(&str, &str)] = &[
        ("S", "Static"),
        ("S*", "Static Default"),
        ("C", "Connected"),
        ("L", "Local"),
        ("O", "OSPF"),
        ("OI", "OSPF Inter-Area"),
        ("OE", "OSPF External"),
        ("ON", "OSPF NSSA"),
        ("B", "BGP"),
        ("D", "EIGRP"),
        ("R", "RIP"),
        ("I", "IGRP"),
        ("M", "Mobile"),
        ("N", "NAT"),
    ];
    const CISCO_NXOS: &[(&str, &str)] = &[
        ("S", "Static"),
        ("C", "Connected"),
        ("L", "Local"),
        ("O", "OSPF"),
        ("OI", "OSPF Inter-Area"),
        ("OE", "OSPF External"),
        ("B", "BGP"),
        ("D", "EIGRP"),
        ("E", "EIGRP"),
        ("R", "RIP"),
        ("I", "ISIS"),
    ];
    const ARISTA: &[(&str, &str)] = &[
        ("S", "Static"),
        ("S*", "Static Default"),
        ("C", "Connected"),
        ("O", "OSPF"),
        ("OI", "OSPF Inter-Area"),
        ("OE", "OSPF External"),
        ("ON", "OSPF NSSA"),
        ("B", "BGP"),
        ("BI", "BGP Internal"),
        ("BE", "BGP External"),
        ("I", "ISIS"),
        ("i", "ISIS"),
        ("L1", "ISIS Level-1"),
        ("L2", "ISIS Level-2"),
        ("K", "Kernel"),
        ("D", "EIGRP"),
        ("E", "EIGRP"),
        ("R", "RIP"),
        ("M", "Mobile"),
        ("static", "Static"),
        ("connected", "Connected"),
        ("ospf", "OSPF"),
        ("bgp", "BGP"),
        ("isis", "ISIS"),
        ("kernel", "Kernel"),
        ("rip", "RIP"),
    ];
    const LINUX: &[(&str, &str)] = &[
        ("static", "Static"),
        ("connected", "Connected"),
        ("kernel", "Kernel"),
        ("ospf", "OSPF"),
        ("bgp", "BGP"),
        ("dhcp", "DHCP"),
    ];

    match family {
        PlatformFamily::CiscoIos | PlatformFamily::Generic => CISCO_IOS,
        PlatformFamily::CiscoNxos => CISCO_NXOS,
        PlatformFamily::AristaEos => ARISTA,
        PlatformFamily::Linux => LINUX,
    }
}

/// Protocol code translation: platform config table first, then the
/// built-in family table (exact, case-insensitive, then flag-stripped with
/// a `*` suffix meaning the default route), finally a title-cased
/// passthrough so unknown codes never fail.
fn normalize_protocol(
    raw: &str,
    family: PlatformFamily,
    config_mapping: &std::collections::HashMap<String, String>,
) -> String {
    let code = raw.trim();

    if let Some(mapped) = config_mapping.get(code) {
        return mapped.clone();
    }

    let table = builtin_protocols(family);
    if let Some((_, name)) = table.iter().find(|(c, _)| *c == code) {
        return (*name).to_string();
    }
    if let Some((_, name)) = table.iter().find(|(c, _)| c.eq_ignore_ascii_case(code)) {
        return (*name).to_string();
    }

    let base = code.trim_end_matches(['*', '%', '+']);
    if let Some((_, name)) = table.iter().find(|(c, _)| *c == base) {
        return if code.contains('*') {
            format!("{name} Default")
        } else {
            (*name).to_string()
        };
    }

    title_case(code)
}

#[cfg(test)]
mod tests {
    use super::super::{test_registry, Normalizer};
    use crate::model::ParsedRecord;

    fn record(pairs: &[(&str, &str)]) -> ParsedRecord {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).into())).collect()
    }

    #[test]
    fn cisco_network_mask_combines_to_cidr() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![record(&[
            ("PROTOCOL", "O"),
            ("NETWORK", "172.16.1.0"),
            ("MASK", "24"),
            ("NEXT_HOP", "10.0.0.2"),
            ("INTERFACE", "Gi0/1"),
        ])];

        let out = normalizer.routes(&records, "cisco_ios");
        assert_eq!(out[0].network, "172.16.1.0/24");
        assert_eq!(out[0].protocol, "OSPF");
        assert_eq!(out[0].next_hop, "10.0.0.2");
    }

    #[test]
    fn cisco_default_route_sentinel() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![record(&[
            ("PROTOCOL", "S*"),
            ("NETWORK", "0.0.0.0"),
            ("MASK", "0"),
            ("NEXT_HOP", "10.0.0.1"),
        ])];

        let out = normalizer.routes(&records, "cisco_ios");
        assert_eq!(out[0].network, "0.0.0.0/0");
        assert_eq!(out[0].protocol, "Static Default");
    }

    #[test]
    fn linux_default_destination_becomes_cidr_zero() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![record(&[
            ("NETWORK", "default"),
            ("NEXT_HOP", "192.168.1.1"),
            ("INTERFACE", "eth0"),
            ("PROTOCOL", "static"),
        ])];

        let out = normalizer.routes(&records, "linux");
        assert_eq!(out[0].network, "0.0.0.0/0");
        assert_eq!(out[0].protocol, "Static");
    }

    #[test]
    fn multipath_next_hop_list_filters_connected_and_joins() {
        let normalizer = Normalizer::new(test_registry());
        let mut rec = ParsedRecord::new();
        rec.insert("PREFIX".into(), "10.10.0.0".into());
        rec.insert("PREFIX_LENGTH".into(), "16".into());
        rec.insert(
            "VIA".into(),
            vec!["10.0.0.1", "connected", "10.0.0.2", "10.0.0.1"].into(),
        );
        rec.insert("INTERFACE".into(), vec!["Ethernet1", "Ethernet2"].into());
        rec.insert("ROUTE_TYPE".into(), "B E".into());

        let out = normalizer.routes(&[rec], "arista_eos");
        assert_eq!(out[0].network, "10.10.0.0/16");
        assert_eq!(out[0].next_hop, "10.0.0.1 | 10.0.0.2");
        assert_eq!(out[0].interface, "Ethernet1 | Ethernet2");
    }

    #[test]
    fn ecmp_continuation_rows_fold_into_one_route() {
        let normalizer = Normalizer::new(test_registry());
        // Shape the template produces for a two-path route: the
        // continuation row repeats the filled-down prefix and protocol.
        let records = vec![
            record(&[
                ("PROTOCOL", "B E"),
                ("NETWORK", "10.20.0.0"),
                ("MASK", "16"),
                ("NEXT_HOP", "10.0.0.1"),
                ("INTERFACE", "Ethernet1"),
            ]),
            record(&[
                ("PROTOCOL", "B E"),
                ("NETWORK", "10.20.0.0"),
                ("MASK", "16"),
                ("NEXT_HOP", "10.0.0.2"),
                ("INTERFACE", "Ethernet2"),
            ]),
            record(&[
                ("PROTOCOL", "C"),
                ("NETWORK", "10.1.1.0"),
                ("MASK", "24"),
                ("INTERFACE", "Vlan10"),
                ("DIRECT", "directly"),
            ]),
        ];

        let out = normalizer.routes(&records, "arista_eos");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].network, "10.20.0.0/16");
        assert_eq!(out[0].next_hop, "10.0.0.1 | 10.0.0.2");
        assert_eq!(out[0].interface, "Ethernet1 | Ethernet2");
        assert_eq!(out[1].next_hop, "Directly Connected");
    }

    #[test]
    fn direct_flag_wins_only_without_concrete_next_hop() {
        let normalizer = Normalizer::new(test_registry());
        let direct = record(&[
            ("PREFIX", "10.1.1.0"),
            ("PREFIX_LENGTH", "24"),
            ("ROUTE_TYPE", "C"),
            ("INTERFACE", "Vlan10"),
            ("DIRECT", "directly"),
        ]);
        let routed = record(&[
            ("PREFIX", "10.2.2.0"),
            ("PREFIX_LENGTH", "24"),
            ("ROUTE_TYPE", "O"),
            ("VIA", "10.0.0.9"),
            ("DIRECT", "directly"),
        ]);

        let out = normalizer.routes(&[direct, routed], "arista_eos");
        assert_eq!(out[0].next_hop, "Directly Connected");
        assert_eq!(out[1].next_hop, "10.0.0.9");
    }

    #[test]
    fn next_hop_is_never_empty() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![
            // interface only, non-connected protocol
            record(&[("NETWORK", "10.3.0.0"), ("MASK", "16"), ("PROTOCOL", "O"), ("INTERFACE", "Gi0/2")]),
            // connected protocol with interface
            record(&[("NETWORK", "10.4.0.0"), ("MASK", "16"), ("PROTOCOL", "C"), ("INTERFACE", "Gi0/3")]),
            // nothing at all beyond the network
            record(&[("NETWORK", "10.5.0.0"), ("MASK", "16"), ("PROTOCOL", "S")]),
        ];

        let out = normalizer.routes(&records, "cisco_ios");
        assert_eq!(out[0].next_hop, "Interface Only");
        assert_eq!(out[1].next_hop, "Directly Connected");
        assert_eq!(out[2].next_hop, "Unspecified");
    }

    #[test]
    fn rows_without_network_are_dropped() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![
            record(&[("NEXT_HOP", "10.0.0.1"), ("PROTOCOL", "S")]),
            record(&[("NETWORK", "10.0.0.0"), ("MASK", "8"), ("PROTOCOL", "S")]),
        ];

        let out = normalizer.routes(&records, "cisco_ios");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].network, "10.0.0.0/8");
    }

    #[test]
    fn unknown_protocol_title_cases() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![record(&[("NETWORK", "10.0.0.0"), ("MASK", "8"), ("PROTOCOL", "XYZ")])];
        let out = normalizer.routes(&records, "cisco_ios");
        assert_eq!(out[0].protocol, "Xyz");
    }

    #[test]
    fn normalization_is_idempotent_across_calls() {
        let normalizer = Normalizer::new(test_registry());
        let records = vec![record(&[
            ("NETWORK", "172.16.0.0"),
            ("MASK", "12"),
            ("NEXT_HOP", "10.0.0.1"),
            ("PROTOCOL", "B"),
        ])];

        let first = normalizer.routes(&records, "cisco_ios");
        let second = normalizer.routes(&records, "cisco_ios");
        assert_eq!(first, second);
    }

    #[test]
    fn vrf_defaults_and_extracts() {
        let normalizer = Normalizer::new(test_registry());
        let plain = record(&[("NETWORK", "10.0.0.0"), ("MASK", "8"), ("PROTOCOL", "S")]);
        let tagged = record(&[("NETWORK", "10.0.0.0"), ("MASK", "8"), ("PROTOCOL", "S"), ("VRF", "CUST-A")]);

        let out = normalizer.routes(&[plain, tagged], "cisco_ios");
        assert_eq!(out[0].vrf, "default");
        assert_eq!(out[1].vrf, "CUST-A");
    }
}
