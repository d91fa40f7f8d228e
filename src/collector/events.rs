//! Events emitted by a collector to its consumer.

use std::fmt;

use crate::model::{
    DeviceInfo, NormalizedArpEntry, NormalizedNeighbor, NormalizedRoute, NormalizedSystemMetrics,
    RawCommandOutput,
};

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Verifying,
    Connected,
    Collecting,
    Failed,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Verifying => "verifying",
            Self::Connected => "connected",
            Self::Collecting => "collecting",
            Self::Failed => "failed",
            Self::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

/// Discriminated reason for a failed connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    /// The platform is not in the registry; no connection was attempted.
    Precondition,
    Authentication,
    Timeout,
    Transport,
}

/// Everything a collector reports back over its event channel.
#[derive(Debug)]
pub enum TelemetryEvent {
    /// State transition with a human-readable message.
    Status {
        state: ConnectionState,
        message: String,
    },

    /// The connection attempt failed; terminal for this collector.
    ConnectFailed {
        reason: ConnectFailure,
        message: String,
    },

    /// Raw output for one executed capability, parse metadata included.
    Raw(RawCommandOutput),

    Neighbors(Vec<NormalizedNeighbor>),
    Arp(Vec<NormalizedArpEntry>),
    Routes(Vec<NormalizedRoute>),

    /// Routes collected for one named VRF.
    VrfRoutes {
        vrf: String,
        routes: Vec<NormalizedRoute>,
    },

    /// Names reported by the platform's VRF listing.
    VrfList(Vec<String>),

    /// Combined CPU/memory/temperature metrics, at most one per cycle.
    Metrics(NormalizedSystemMetrics),

    /// Device identity after the one-shot system-info gather.
    DeviceInfo(DeviceInfo),

    /// One capability failed mid-cycle; the cycle continues.
    CapabilityError {
        capability: String,
        message: String,
    },

    /// A full collection cycle finished.
    CycleComplete,
}
