//! Built-in minimal platform definition.
//!
//! Used when the platforms configuration document is missing or malformed,
//! so the registry always has at least one usable platform.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::definition::{
    Capabilities, CommandSpec, ConnectionDefaults, PlatformDefinition, TemplateConfig,
};

fn command(command: &str, template: &str, timeout_secs: u64) -> CommandSpec {
    CommandSpec {
        command: command.to_string(),
        template: template.to_string(),
        timeout_secs,
        description: String::new(),
        parameters: Vec::new(),
        fallback_commands: Vec::new(),
    }
}

/// Minimal generic-IOS-like definition.
pub fn cisco_ios() -> PlatformDefinition {
    let mut commands = IndexMap::new();
    commands.insert(
        "system_info".to_string(),
        command("show version", "cisco_ios_show_version.textfsm", 15),
    );
    commands.insert(
        "cdp_neighbors".to_string(),
        command(
            "show cdp neighbors detail",
            "cisco_ios_show_cdp_neighbors_detail.textfsm",
            30,
        ),
    );
    commands.insert(
        "arp_table".to_string(),
        command("show ip arp", "cisco_ios_show_ip_arp.textfsm", 20),
    );
    commands.insert(
        "route_table".to_string(),
        command("show ip route", "cisco_ios_show_ip_route.textfsm", 30),
    );
    commands.insert(
        "cpu_utilization".to_string(),
        command(
            "show processes cpu",
            "cisco_ios_show_processes_cpu.textfsm",
            15,
        ),
    );
    commands.insert(
        "memory_utilization".to_string(),
        command(
            "show memory statistics",
            "cisco_ios_show_memory_statistics.textfsm",
            15,
        ),
    );
    commands.insert(
        "logs".to_string(),
        command("show logging", "", 20),
    );

    let mut protocols = HashMap::new();
    for (code, name) in [
        ("S", "Static"),
        ("C", "Connected"),
        ("L", "Local"),
        ("O", "OSPF"),
        ("B", "BGP"),
        ("D", "EIGRP"),
        ("R", "RIP"),
    ] {
        protocols.insert(code.to_string(), name.to_string());
    }
    let mut field_mappings = HashMap::new();
    field_mappings.insert("protocols".to_string(), protocols);

    PlatformDefinition {
        name: "cisco_ios".to_string(),
        display_name: "Cisco IOS".to_string(),
        description: "Built-in fallback Cisco IOS configuration".to_string(),
        connection: ConnectionDefaults::default(),
        templates: TemplateConfig {
            namespace: "cisco_ios".to_string(),
            base_path: "templates/textfsm".to_string(),
        },
        commands,
        field_mappings,
        capabilities: Capabilities {
            supports_cdp: true,
            neighbor_protocol: "cdp".to_string(),
            ..Capabilities::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_platform_is_usable() {
        let def = cisco_ios();
        assert_eq!(def.name, "cisco_ios");
        assert!(def.command("system_info").is_some());
        assert!(def.command("route_table").is_some());
        assert!(def.capabilities.supports_cdp);
        assert_eq!(
            def.field_mappings["protocols"].get("S").map(String::as_str),
            Some("Static")
        );
    }
}
