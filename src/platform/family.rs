//! Platform family dispatch.
//!
//! Family-specific logic (route field tables, CPU/memory extraction, protocol
//! code tables) dispatches on this closed enum rather than on string-prefix
//! checks, so the generic fallback arm stays reachable and testable.

use std::fmt;

/// Device platform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    CiscoIos,
    CiscoNxos,
    AristaEos,
    Linux,
    /// Anything we have no family-specific handling for.
    Generic,
}

impl PlatformFamily {
    /// Classify a platform name. Names like "cisco_ios_xe" or "linux_ubuntu"
    /// fold into their base family.
    pub fn from_platform(name: &str) -> Self {
        if name.starts_with("cisco_nxos") {
            PlatformFamily::CiscoNxos
        } else if name.starts_with("cisco") {
            PlatformFamily::CiscoIos
        } else if name.starts_with("arista") {
            PlatformFamily::AristaEos
        } else if name.starts_with("linux") {
            PlatformFamily::Linux
        } else {
            PlatformFamily::Generic
        }
    }

    /// Both Cisco families.
    pub fn is_cisco(self) -> bool {
        matches!(self, PlatformFamily::CiscoIos | PlatformFamily::CiscoNxos)
    }

    /// Lightweight capability-probe command used to verify a fresh
    /// connection actually responds.
    pub fn probe_command(self) -> &'static str {
        match self {
            PlatformFamily::CiscoIos | PlatformFamily::CiscoNxos | PlatformFamily::AristaEos => {
                "show clock"
            }
            PlatformFamily::Linux => "date",
            PlatformFamily::Generic => "show version",
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlatformFamily::CiscoIos => "cisco_ios",
            PlatformFamily::CiscoNxos => "cisco_nxos",
            PlatformFamily::AristaEos => "arista_eos",
            PlatformFamily::Linux => "linux",
            PlatformFamily::Generic => "generic",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_classification() {
        assert_eq!(PlatformFamily::from_platform("cisco_ios"), PlatformFamily::CiscoIos);
        assert_eq!(PlatformFamily::from_platform("cisco_ios_xe"), PlatformFamily::CiscoIos);
        assert_eq!(PlatformFamily::from_platform("cisco_nxos"), PlatformFamily::CiscoNxos);
        assert_eq!(PlatformFamily::from_platform("arista_eos"), PlatformFamily::AristaEos);
        assert_eq!(PlatformFamily::from_platform("linux_ubuntu"), PlatformFamily::Linux);
        assert_eq!(PlatformFamily::from_platform("juniper_junos"), PlatformFamily::Generic);
    }

    #[test]
    fn test_probe_commands() {
        assert_eq!(PlatformFamily::CiscoIos.probe_command(), "show clock");
        assert_eq!(PlatformFamily::Linux.probe_command(), "date");
        assert_eq!(PlatformFamily::Generic.probe_command(), "show version");
    }
}
