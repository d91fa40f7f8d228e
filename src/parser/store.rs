//! Template sources compiled into the library.
//!
//! Lookup is by file name, e.g. `cisco_ios_show_version.textfsm`. A
//! fallback directory on the parser can extend this set.

macro_rules! bundled {
    ($name:literal) => {
        ($name, include_str!(concat!("../../templates/textfsm/", $name)))
    };
}

pub(crate) const BUNDLED_TEMPLATES: &[(&str, &str)] = &[
    bundled!("cisco_ios_show_version.textfsm"),
    bundled!("cisco_ios_show_cdp_neighbors_detail.textfsm"),
    bundled!("cisco_ios_show_ip_arp.textfsm"),
    bundled!("cisco_ios_show_ip_route.textfsm"),
    bundled!("cisco_ios_show_vrf.textfsm"),
    bundled!("cisco_ios_show_processes_cpu.textfsm"),
    bundled!("cisco_ios_show_memory_statistics.textfsm"),
    bundled!("cisco_nxos_show_version.textfsm"),
    bundled!("cisco_nxos_show_cdp_neighbors_detail.textfsm"),
    bundled!("cisco_nxos_show_ip_arp.textfsm"),
    bundled!("cisco_nxos_show_ip_route.textfsm"),
    bundled!("cisco_nxos_show_vrf.textfsm"),
    bundled!("cisco_nxos_show_environment_temperature.textfsm"),
    bundled!("arista_eos_show_version.textfsm"),
    bundled!("arista_eos_show_lldp_neighbors_detail.textfsm"),
    bundled!("arista_eos_show_ip_arp.textfsm"),
    bundled!("arista_eos_show_ip_route.textfsm"),
    bundled!("arista_eos_show_vrf.textfsm"),
    bundled!("arista_eos_show_processes_top_once.textfsm"),
    bundled!("arista_eos_show_system_environment_temperature.textfsm"),
    bundled!("linux_uname.textfsm"),
    bundled!("linux_lldpctl.textfsm"),
    bundled!("linux_ip_neigh.textfsm"),
    bundled!("linux_ip_route.textfsm"),
    bundled!("linux_top.textfsm"),
    bundled!("linux_free.textfsm"),
];

pub(crate) fn bundled(name: &str) -> Option<&'static str> {
    BUNDLED_TEMPLATES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, source)| *source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_lookup_hits_known_template() {
        let source = bundled("cisco_ios_show_version.textfsm").unwrap();
        assert!(source.contains("Value VERSION"));
    }

    #[test]
    fn bundled_lookup_misses_unknown_template() {
        assert!(bundled("juniper_show_chassis.textfsm").is_none());
    }

    #[test]
    fn bundled_names_are_unique() {
        for (i, (name, _)) in BUNDLED_TEMPLATES.iter().enumerate() {
            assert!(
                !BUNDLED_TEMPLATES[i + 1..].iter().any(|(n, _)| n == name),
                "duplicate bundled template {name}"
            );
        }
    }
}
