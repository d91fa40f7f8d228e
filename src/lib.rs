//! netpulse: platform-aware telemetry collection for network devices.
//!
//! The crate connects to a device over SSH, figures out how to talk to its
//! platform from a declarative registry, parses CLI output through TextFSM
//! templates, and normalizes the parsed fields into canonical domain objects
//! (neighbors, ARP entries, routes, system metrics). Each device is driven by
//! a [`Collector`] task that reports over an event channel.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use netpulse::{
//!     Collector, ConnectionConfig, PlatformRegistry, SshConnector, TelemetryEvent,
//!     TemplateParser,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(PlatformRegistry::load(None));
//!     let parser = Arc::new(TemplateParser::new());
//!
//!     let config = ConnectionConfig::new(
//!         "edge-rtr1",
//!         "192.0.2.10",
//!         "cisco_ios",
//!         "admin",
//!         std::env::var("DEVICE_PASSWORD").unwrap_or_default(),
//!     );
//!
//!     let connector = Arc::new(SshConnector::default());
//!     let (handle, mut events) = Collector::spawn(config, registry, parser, connector);
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             TelemetryEvent::Routes(routes) => println!("{} routes", routes.len()),
//!             TelemetryEvent::CycleComplete => break,
//!             _ => {}
//!         }
//!     }
//!
//!     handle.shutdown().await;
//! }
//! ```

pub mod collector;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod platform;
pub mod transport;

pub use collector::{
    Collector, CollectorHandle, ConnectFailure, ConnectionState, TelemetryEvent,
};
pub use error::{CollectorError, CommandError, ConfigError, Error, Result, TransportError};
pub use model::{
    AlertLevel, ConnectionConfig, DeviceInfo, FieldValue, MemoryUsage, NormalizedArpEntry,
    NormalizedNeighbor, NormalizedRoute, NormalizedSystemInfo, NormalizedSystemMetrics,
    ParsedRecord, RawCommandOutput,
};
pub use normalize::Normalizer;
pub use parser::{TemplateParser, TemplateValidation};
pub use platform::{PlatformDefinition, PlatformFamily, PlatformRegistry};
pub use transport::{
    AuthMethod, Connector, HostKeyVerification, Session, SshConfig, SshConnector,
};
