//! Collection driver: owns one device session and runs the command cycle.
//!
//! A collector is spawned per device connection. It walks the lifecycle
//! (connect, verify, gather identity, collect) on its own task and reports
//! everything back over an unbounded event channel; the consumer drives it
//! through a [`CollectorHandle`]. The session itself is behind the
//! [`Connector`]/[`Session`] traits, so tests run the full lifecycle against
//! scripted sessions without a network.

mod events;

pub use events::{ConnectFailure, ConnectionState, TelemetryEvent};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{CollectorError, Error, Result, TransportError};
use crate::model::{
    ConnectionConfig, DeviceInfo, NormalizedSystemMetrics, ParsedRecord, RawCommandOutput,
};
use crate::normalize::Normalizer;
use crate::parser::TemplateParser;
use crate::platform::{PlatformFamily, PlatformRegistry};
use crate::transport::Connector;
use crate::transport::Session;

/// Pacing delay between consecutive commands in a cycle.
const INTER_COMMAND_DELAY: Duration = Duration::from_millis(200);

/// Default interval between automatic collection cycles. A new interval only
/// starts counting once the previous cycle has finished, so a slow device
/// never accumulates a backlog of cycles.
pub const DEFAULT_AUTO_COLLECT_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout for the post-connect verification probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long shutdown waits for the task (and the session close) before
/// aborting it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Candidate fields carrying a VRF name in `vrf_list` output.
const VRF_NAME_FIELDS: &[&str] = &["NAME", "VRF", "VRF_NAME", "name", "vrf"];

enum CollectorCommand {
    CollectNow,
    CollectVrfRoutes(String),
    SetAutoCollect(Option<Duration>),
    Shutdown,
}

/// Control handle for a spawned collector.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) leaves
/// the task running until its command channel closes, at which point it
/// disconnects on its own.
pub struct CollectorHandle {
    commands: mpsc::UnboundedSender<CollectorCommand>,
    task: JoinHandle<()>,
}

impl CollectorHandle {
    /// Request an immediate collection cycle.
    pub fn collect_now(&self) -> Result<()> {
        self.send(CollectorCommand::CollectNow)
    }

    /// Request a route collection for one named VRF.
    pub fn collect_vrf_routes(&self, vrf: impl Into<String>) -> Result<()> {
        self.send(CollectorCommand::CollectVrfRoutes(vrf.into()))
    }

    /// Enable the periodic collection timer with the given interval. See
    /// [`DEFAULT_AUTO_COLLECT_INTERVAL`] for the conventional value.
    pub fn set_auto_collect(&self, interval: Duration) -> Result<()> {
        self.send(CollectorCommand::SetAutoCollect(Some(interval)))
    }

    /// Disable the periodic collection timer.
    pub fn stop_auto_collect(&self) -> Result<()> {
        self.send(CollectorCommand::SetAutoCollect(None))
    }

    /// Stop the collector: finish any in-flight cycle, close the session,
    /// and join the task. Aborts the task if it does not wind down within
    /// the grace period.
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(CollectorCommand::Shutdown);
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task)
            .await
            .is_err()
        {
            warn!("collector did not stop within {:?}, aborting", SHUTDOWN_GRACE);
            self.task.abort();
        }
    }

    fn send(&self, command: CollectorCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| CollectorError::TaskGone)?;
        Ok(())
    }
}

/// Per-device collection driver.
pub struct Collector {
    config: ConnectionConfig,
    registry: Arc<PlatformRegistry>,
    parser: Arc<TemplateParser>,
    normalizer: Normalizer,
    events: mpsc::UnboundedSender<TelemetryEvent>,
    session: Option<Box<dyn Session>>,
    auto_interval: Option<Duration>,
}

impl Collector {
    /// Spawn a collector task for one device. Returns the control handle and
    /// the event stream; the task starts connecting immediately and runs an
    /// initial collection cycle once connected.
    pub fn spawn(
        config: ConnectionConfig,
        registry: Arc<PlatformRegistry>,
        parser: Arc<TemplateParser>,
        connector: Arc<dyn Connector>,
    ) -> (CollectorHandle, mpsc::UnboundedReceiver<TelemetryEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let normalizer = Normalizer::new(Arc::clone(&registry));
        let collector = Collector {
            config,
            registry,
            parser,
            normalizer,
            events: event_tx,
            session: None,
            auto_interval: None,
        };

        let task = tokio::spawn(collector.run(connector, command_rx));
        (
            CollectorHandle {
                commands: command_tx,
                task,
            },
            event_rx,
        )
    }

    async fn run(
        mut self,
        connector: Arc<dyn Connector>,
        mut commands: mpsc::UnboundedReceiver<CollectorCommand>,
    ) {
        if !self.connect(connector.as_ref()).await {
            return;
        }

        self.collect_cycle().await;

        while self.session.is_some() {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(CollectorCommand::CollectNow) => self.collect_cycle().await,
                    Some(CollectorCommand::CollectVrfRoutes(vrf)) => {
                        self.collect_vrf_routes(&vrf).await;
                    }
                    Some(CollectorCommand::SetAutoCollect(interval)) => {
                        match interval {
                            Some(interval) => debug!(
                                "{}: auto-collect every {interval:?}",
                                self.config.hostname
                            ),
                            None => debug!("{}: auto-collect disabled", self.config.hostname),
                        }
                        self.auto_interval = interval;
                    }
                    Some(CollectorCommand::Shutdown) | None => break,
                },
                _ = tokio::time::sleep(
                    self.auto_interval.unwrap_or(DEFAULT_AUTO_COLLECT_INTERVAL)
                ), if self.auto_interval.is_some() => {
                    self.collect_cycle().await;
                }
            }
        }

        self.close_session().await;
        self.status(ConnectionState::Disconnected, "session closed");
    }

    /// Connect, verify, and gather device identity. Returns false when the
    /// collector ends up in a terminal failed state.
    async fn connect(&mut self, connector: &dyn Connector) -> bool {
        let platform = self.config.platform.clone();

        if !self.registry.contains(&platform) {
            let message = format!("platform '{platform}' is not in the registry");
            self.status(ConnectionState::Failed, message.clone());
            self.emit(TelemetryEvent::ConnectFailed {
                reason: ConnectFailure::Precondition,
                message,
            });
            return false;
        }

        self.status(
            ConnectionState::Connecting,
            format!("connecting to {}:{}", self.config.host, self.config.port),
        );

        let defaults = self.registry.connection_defaults(&platform).cloned();
        match connector.connect(&self.config, defaults.as_ref()).await {
            Ok(session) => self.session = Some(session),
            Err(e) => {
                let message = e.to_string();
                self.status(ConnectionState::Failed, message.clone());
                self.emit(TelemetryEvent::ConnectFailed {
                    reason: classify_failure(&e),
                    message,
                });
                return false;
            }
        }

        self.status(ConnectionState::Verifying, "probing for a responsive prompt");
        let probe = PlatformFamily::from_platform(&platform).probe_command();
        let verified = matches!(
            self.execute(probe, PROBE_TIMEOUT).await,
            Ok(output) if !output.trim().is_empty()
        );
        if !verified {
            let message = format!("device did not answer verification probe '{probe}'");
            self.status(ConnectionState::Failed, message.clone());
            self.emit(TelemetryEvent::ConnectFailed {
                reason: ConnectFailure::Transport,
                message,
            });
            self.close_session().await;
            return false;
        }

        self.status(
            ConnectionState::Connected,
            format!("connected to {}", self.config.hostname),
        );
        self.gather_device_info().await;
        true
    }

    /// One-shot identity gather after verification. Best effort: failures
    /// are logged and the connection-time identity is reported as-is.
    async fn gather_device_info(&mut self) {
        let platform = self.config.platform.clone();
        let mut info = DeviceInfo {
            hostname: self.config.hostname.clone(),
            host: self.config.host.clone(),
            platform: platform.clone(),
            ..DeviceInfo::default()
        };

        match self.run_capability(&platform, "system_info").await {
            Ok(Some(records)) => {
                info.apply(&self.normalizer.system_info(&records, &platform));
            }
            Ok(None) => debug!("{}: no parsed system info", self.config.hostname),
            Err(e) => warn!("{}: system info gather failed: {e}", self.config.hostname),
        }

        self.emit(TelemetryEvent::DeviceInfo(info));
    }

    /// One full collection cycle over the platform's capabilities, in the
    /// declared order, with inter-command pacing. CPU, memory, and
    /// temperature readings accumulate into a single metrics object that
    /// goes out once at the end of the cycle. A lost session aborts the
    /// cycle; any other per-capability failure is reported and skipped.
    async fn collect_cycle(&mut self) {
        let platform = self.config.platform.clone();
        self.status(ConnectionState::Collecting, "collection cycle started");

        let mut cycle_metrics: Option<NormalizedSystemMetrics> = None;
        let mut first = true;
        for kind in capability_order(&self.registry, &platform) {
            if self.session.is_none() {
                break;
            }
            if !first {
                tokio::time::sleep(INTER_COMMAND_DELAY).await;
            }
            first = false;

            match self.run_capability(&platform, &kind).await {
                Ok(Some(records)) => {
                    self.dispatch(&platform, &kind, &records, &mut cycle_metrics);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("{}: {kind} failed: {e}", self.config.hostname);
                    self.emit(TelemetryEvent::CapabilityError {
                        capability: kind,
                        message: e.to_string(),
                    });
                }
            }
        }

        if self.session.is_some() {
            if let Some(metrics) = cycle_metrics {
                self.emit(TelemetryEvent::Metrics(metrics));
            }
            self.emit(TelemetryEvent::CycleComplete);
            self.status(ConnectionState::Connected, "collection cycle complete");
        }
    }

    /// Execute one capability and emit its raw output. Returns the parsed
    /// records when a template exists and matched, `Ok(None)` for raw-only
    /// capabilities, unparseable output, and kinds the platform does not
    /// define (those are skipped without an event).
    async fn run_capability(
        &mut self,
        platform: &str,
        kind: &str,
    ) -> Result<Option<Vec<ParsedRecord>>> {
        self.run_command(platform, kind, &HashMap::new()).await
    }

    async fn run_command(
        &mut self,
        platform: &str,
        kind: &str,
        params: &HashMap<&str, &str>,
    ) -> Result<Option<Vec<ParsedRecord>>> {
        let mut command = match self.registry.format_command(platform, kind, params) {
            Ok(command) => command,
            Err(e) => {
                debug!("{}: skipping {kind}: {e}", self.config.hostname);
                return Ok(None);
            }
        };

        let timeout = self.registry.command_timeout(platform, kind);
        let output = match self.execute(&command, timeout).await {
            Ok(output) => output,
            Err(primary_err) => {
                // Try the configured alternative forms before giving up,
                // unless the failure took the session with it
                let mut recovered = None;
                for fallback in self.registry.fallback_commands(platform, kind, params) {
                    if self.session.is_none() {
                        break;
                    }
                    debug!(
                        "{}: {kind}: '{command}' failed, trying '{fallback}'",
                        self.config.hostname
                    );
                    if let Ok(output) = self.execute(&fallback, timeout).await {
                        recovered = Some((fallback, output));
                        break;
                    }
                }
                match recovered {
                    Some((fallback, output)) => {
                        command = fallback;
                        output
                    }
                    None => return Err(primary_err),
                }
            }
        };

        let template = self
            .registry
            .template_ref(platform, kind)
            .map(|(_, template)| template);
        let records = template
            .as_deref()
            .and_then(|template| self.parser.parse(template, &output));

        self.emit(TelemetryEvent::Raw(RawCommandOutput {
            command,
            output,
            platform: platform.to_string(),
            timestamp: SystemTime::now(),
            template_used: template,
            parsed_successfully: records.is_some(),
        }));

        Ok(records)
    }

    /// Route normalized records to the right event for a capability kind.
    /// Metric-bearing kinds fold into `cycle_metrics` instead of emitting.
    fn dispatch(
        &mut self,
        platform: &str,
        kind: &str,
        records: &[ParsedRecord],
        cycle_metrics: &mut Option<NormalizedSystemMetrics>,
    ) {
        match kind {
            "cdp_neighbors" | "lldp_neighbors" => {
                self.emit(TelemetryEvent::Neighbors(
                    self.normalizer.neighbors(records, platform, kind),
                ));
            }
            "arp_table" => {
                self.emit(TelemetryEvent::Arp(self.normalizer.arp(records, platform)));
            }
            "route_table" => {
                self.emit(TelemetryEvent::Routes(
                    self.normalizer.routes(records, platform),
                ));
            }
            "cpu_utilization" => {
                if let Some(update) = self.normalizer.metrics_from_cpu(records, platform) {
                    fold_metrics(cycle_metrics, kind, update);
                }
            }
            "memory_utilization" => {
                if let Some(update) = self.normalizer.metrics_from_memory(records, platform) {
                    fold_metrics(cycle_metrics, kind, update);
                }
            }
            "temperature" => {
                if let Some(celsius) = self.normalizer.temperature(records) {
                    let mut update = NormalizedSystemMetrics::new(platform);
                    update.temperature_celsius = celsius;
                    fold_metrics(cycle_metrics, kind, update);
                }
            }
            "vrf_list" => {
                let names: Vec<String> = records
                    .iter()
                    .filter_map(|record| crate::normalize::pick_field(record, VRF_NAME_FIELDS))
                    .collect();
                self.emit(TelemetryEvent::VrfList(names));
            }
            // logs and anything future stay raw-only
            _ => {}
        }
    }

    /// Collect the route table for one named VRF and emit it separately from
    /// the global table.
    async fn collect_vrf_routes(&mut self, vrf: &str) {
        let platform = self.config.platform.clone();
        let mut params = HashMap::new();
        params.insert("vrf_name", vrf);

        match self.run_command(&platform, "route_table_vrf", &params).await {
            Ok(Some(records)) => {
                let mut routes = self.normalizer.routes(&records, &platform);
                for route in &mut routes {
                    if route.vrf == "default" {
                        route.vrf = vrf.to_string();
                    }
                }
                self.emit(TelemetryEvent::VrfRoutes {
                    vrf: vrf.to_string(),
                    routes,
                });
            }
            Ok(None) => {
                self.emit(TelemetryEvent::VrfRoutes {
                    vrf: vrf.to_string(),
                    routes: Vec::new(),
                });
            }
            Err(e) => {
                warn!("{}: vrf route collection for '{vrf}' failed: {e}", self.config.hostname);
                self.emit(TelemetryEvent::CapabilityError {
                    capability: "route_table_vrf".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// Execute one command on the session. A lost session drops the boxed
    /// session so the run loop winds down.
    async fn execute(&mut self, command: &str, timeout: Duration) -> Result<String> {
        let session = self.session.as_mut().ok_or(CollectorError::NotConnected)?;
        match session.execute(command, timeout).await {
            Ok(output) => Ok(output),
            Err(e) => {
                if matches!(e, Error::Transport(TransportError::Disconnected)) {
                    self.session = None;
                }
                Err(e)
            }
        }
    }

    async fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Ok(Err(e)) = tokio::time::timeout(SHUTDOWN_GRACE, session.close()).await {
                debug!("{}: close failed: {e}", self.config.hostname);
            }
        }
    }

    fn status(&self, state: ConnectionState, message: impl Into<String>) {
        let message = message.into();
        info!("{}: {state}: {message}", self.config.hostname);
        self.emit(TelemetryEvent::Status { state, message });
    }

    fn emit(&self, event: TelemetryEvent) {
        // The receiver going away just means nobody is listening anymore.
        let _ = self.events.send(event);
    }
}

/// Capability kinds for one cycle. Neighbor discovery picks whichever
/// protocol the platform defines a command for, CDP first; temperature
/// runs only where the platform advertises sensing.
fn capability_order(registry: &PlatformRegistry, platform: &str) -> Vec<String> {
    let Some(def) = registry.get(platform) else {
        return Vec::new();
    };

    let neighbors = if def.command("cdp_neighbors").is_some() {
        "cdp_neighbors"
    } else {
        "lldp_neighbors"
    };

    let mut kinds = vec![
        neighbors.to_string(),
        "arp_table".to_string(),
        "route_table".to_string(),
        "cpu_utilization".to_string(),
        "memory_utilization".to_string(),
    ];
    if def.capabilities.supports_temperature {
        kinds.push("temperature".to_string());
    }
    kinds.push("logs".to_string());
    if def.capabilities.supports_vrf {
        kinds.push("vrf_list".to_string());
    }
    kinds
}

/// Fold one capability's readings into the cycle-wide metrics object. CPU
/// readings overwrite the CPU columns, memory readings the memory block,
/// and a non-zero temperature always lands, whichever capability carried it.
fn fold_metrics(
    slot: &mut Option<NormalizedSystemMetrics>,
    kind: &str,
    update: NormalizedSystemMetrics,
) {
    let Some(base) = slot else {
        *slot = Some(update);
        return;
    };

    match kind {
        "cpu_utilization" => {
            base.cpu_percent = update.cpu_percent;
            base.cpu_1min = update.cpu_1min;
            base.cpu_5min = update.cpu_5min;
            if update.memory.total_mb > 0 {
                base.memory = update.memory;
            }
        }
        "memory_utilization" => base.memory = update.memory,
        _ => {}
    }
    if update.temperature_celsius > 0.0 {
        base.temperature_celsius = update.temperature_celsius;
    }
}

/// Map a connect-time error to its discriminated failure reason.
fn classify_failure(error: &Error) -> ConnectFailure {
    match error {
        Error::Transport(TransportError::AuthenticationFailed { .. }) => {
            ConnectFailure::Authentication
        }
        Error::Transport(TransportError::Timeout(_))
        | Error::Transport(TransportError::PromptTimeout(_)) => ConnectFailure::Timeout,
        _ => ConnectFailure::Transport,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use secrecy::ExposeSecret;

    use crate::platform::ConnectionDefaults;

    /// Session answering from an exact command → output table. Commands in
    /// `failing` error without dropping the session.
    struct ScriptedSession {
        responses: Vec<(String, String)>,
        failing: Vec<String>,
        executed: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Session for ScriptedSession {
        async fn execute(&mut self, command: &str, timeout: Duration) -> Result<String> {
            self.executed.lock().unwrap().push(command.to_string());
            if self.failing.iter().any(|c| c == command) {
                return Err(TransportError::PromptTimeout(timeout).into());
            }
            let output = self
                .responses
                .iter()
                .find(|(c, _)| c == command)
                .map(|(_, o)| o.clone())
                .unwrap_or_default();
            Ok(output)
        }

        async fn close(&mut self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ScriptedConnector {
        responses: Vec<(String, String)>,
        failing: Vec<String>,
        executed: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
        connect_attempts: Arc<AtomicBool>,
    }

    impl ScriptedConnector {
        fn new(responses: Vec<(&str, &str)>) -> Self {
            Self {
                responses: responses
                    .into_iter()
                    .map(|(c, o)| (c.to_string(), o.to_string()))
                    .collect(),
                failing: Vec::new(),
                executed: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(AtomicBool::new(false)),
                connect_attempts: Arc::new(AtomicBool::new(false)),
            }
        }

        fn failing(mut self, commands: &[&str]) -> Self {
            self.failing = commands.iter().map(|c| (*c).to_string()).collect();
            self
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(
            &self,
            _config: &ConnectionConfig,
            _defaults: Option<&ConnectionDefaults>,
        ) -> Result<Box<dyn Session>> {
            self.connect_attempts.store(true, Ordering::SeqCst);
            Ok(Box::new(ScriptedSession {
                responses: self.responses.clone(),
                failing: self.failing.clone(),
                executed: Arc::clone(&self.executed),
                closed: Arc::clone(&self.closed),
            }))
        }
    }

    enum FailMode {
        Auth,
        Timeout,
        Refused,
    }

    struct FailingConnector(FailMode);

    #[async_trait]
    impl Connector for FailingConnector {
        async fn connect(
            &self,
            config: &ConnectionConfig,
            _defaults: Option<&ConnectionDefaults>,
        ) -> Result<Box<dyn Session>> {
            let err = match self.0 {
                FailMode::Auth => TransportError::AuthenticationFailed {
                    user: config.username.clone(),
                },
                FailMode::Timeout => TransportError::Timeout(Duration::from_secs(30)),
                FailMode::Refused => TransportError::Disconnected,
            };
            Err(err.into())
        }
    }

    fn test_config(platform: &str) -> ConnectionConfig {
        ConnectionConfig::new("edge-rtr1", "192.0.2.10", platform, "admin", "pw")
    }

    fn spawn_with(
        platform: &str,
        connector: Arc<dyn Connector>,
    ) -> (CollectorHandle, mpsc::UnboundedReceiver<TelemetryEvent>) {
        Collector::spawn(
            test_config(platform),
            Arc::new(PlatformRegistry::load(None)),
            Arc::new(TemplateParser::new()),
            connector,
        )
    }

    /// Drain events until the predicate matches or the channel closes.
    async fn wait_for<F>(
        rx: &mut mpsc::UnboundedReceiver<TelemetryEvent>,
        seen: &mut Vec<TelemetryEvent>,
        mut pred: F,
    ) where
        F: FnMut(&TelemetryEvent) -> bool,
    {
        while let Some(event) = rx.recv().await {
            let done = pred(&event);
            seen.push(event);
            if done {
                return;
            }
        }
        panic!("event channel closed before expected event: {seen:?}");
    }

    fn cisco_device() -> Vec<(&'static str, &'static str)> {
        vec![
            ("show clock", "*14:02:11.123 UTC Fri Aug 29 2025"),
            (
                "show version",
                "Cisco IOS Software, C2900 Software (C2900-UNIVERSALK9-M), Version 15.7(3)M2, RELEASE SOFTWARE (fc2)\n\
                 edge-rtr1 uptime is 2 weeks, 3 days\n\
                 Processor board ID FTX1840ABCD\n\
                 Cisco CISCO2911/K9 (revision 1.0) processor\n\
                 Configuration register is 0x2102\n",
            ),
            (
                "show cdp neighbors detail",
                "Device ID: core-sw1.example.net\n\
                 Entry address(es):\n\
                 \x20 IP address: 10.0.0.2\n\
                 Platform: cisco WS-C3850-24T, Capabilities: Switch IGMP\n\
                 Interface: GigabitEthernet0/1, Port ID (outgoing port): GigabitEthernet1/0/7\n",
            ),
            (
                "show ip arp",
                "Protocol  Address          Age (min)  Hardware Addr   Type   Interface\n\
                 Internet  10.0.0.2          12   0011.2233.4455  ARPA   GigabitEthernet0/1\n\
                 Internet  10.0.0.3           -   0011.2233.4466  ARPA   GigabitEthernet0/2\n",
            ),
            (
                "show ip route",
                "S*    0.0.0.0/0 [1/0] via 10.0.0.1\n\
                 O     10.1.1.0/24 [110/2] via 10.0.0.2, 00:12:03, GigabitEthernet0/1\n\
                 C     10.0.0.0/24 is directly connected, GigabitEthernet0/1\n",
            ),
            (
                "show processes cpu",
                "CPU utilization for five seconds: 7%/1%; one minute: 9%; five minutes: 12%\n",
            ),
            (
                "show memory statistics",
                "                Head    Total(b)     Used(b)     Free(b)   Lowest(b)  Largest(b)\n\
                 Processor   67DF0F54   446485164    60920992   385564172   369418380   361107632\n",
            ),
            ("show logging", "Syslog logging: enabled (0 messages dropped)\n"),
            (
                "show vrf",
                "  Name                             Default RD            Protocols   Interfaces\n\
                 \x20 CUSTOMER_A                       65000:1               ipv4        Gi0/2\n",
            ),
            (
                "show ip route vrf CUSTOMER_A",
                "B     192.168.50.0/24 [20/0] via 172.16.0.1\n",
            ),
        ]
    }

    #[tokio::test]
    async fn full_cycle_emits_normalized_events() {
        let connector = Arc::new(ScriptedConnector::new(cisco_device()));
        let executed = Arc::clone(&connector.executed);
        let (handle, mut rx) = spawn_with("cisco_ios", connector);

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::CycleComplete)
        })
        .await;

        // Lifecycle states, in order
        let states: Vec<ConnectionState> = seen
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::Status { state, .. } => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                ConnectionState::Connecting,
                ConnectionState::Verifying,
                ConnectionState::Connected,
                ConnectionState::Collecting,
            ]
        );

        // Device identity folded in from the one-shot gather
        let info = seen
            .iter()
            .find_map(|e| match e {
                TelemetryEvent::DeviceInfo(info) => Some(info),
                _ => None,
            })
            .expect("device info event");
        assert_eq!(info.hostname, "edge-rtr1");
        assert_eq!(info.version, "15.7(3)M2");
        assert_eq!(info.serial, "FTX1840ABCD");
        assert_eq!(info.model, "CISCO2911/K9");

        let neighbors = seen
            .iter()
            .find_map(|e| match e {
                TelemetryEvent::Neighbors(n) => Some(n),
                _ => None,
            })
            .expect("neighbors event");
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].neighbor_device, "core-sw1.example.net");
        assert_eq!(neighbors[0].protocol_used, "CDP");

        let arp = seen
            .iter()
            .find_map(|e| match e {
                TelemetryEvent::Arp(a) => Some(a),
                _ => None,
            })
            .expect("arp event");
        assert_eq!(arp.len(), 2);
        assert_eq!(arp[0].ip_address, "10.0.0.2");
        assert_eq!(arp[0].entry_type, "ARPA");

        let routes = seen
            .iter()
            .find_map(|e| match e {
                TelemetryEvent::Routes(r) => Some(r),
                _ => None,
            })
            .expect("routes event");
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].network, "0.0.0.0/0");
        assert_eq!(routes[0].protocol, "Static Default");
        assert!(routes.iter().all(|r| !r.next_hop.is_empty()));

        // CPU and memory readings fold into one metrics event per cycle
        let metrics: Vec<_> = seen
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::Metrics(m) => Some(m),
                _ => None,
            })
            .collect();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].cpu_percent, 7.0);
        assert_eq!(metrics[0].cpu_1min, 9.0);
        assert_eq!(metrics[0].memory.total_mb, 425);

        let vrfs = seen
            .iter()
            .find_map(|e| match e {
                TelemetryEvent::VrfList(v) => Some(v),
                _ => None,
            })
            .expect("vrf list event");
        assert_eq!(vrfs, &vec!["CUSTOMER_A".to_string()]);

        // Logs stay raw-only: a Raw event exists, no normalized counterpart
        assert!(seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::Raw(raw) if raw.command == "show logging" && !raw.parsed_successfully
        )));

        // Every executed command went through the scripted session, probe first
        let log = executed.lock().unwrap().clone();
        assert_eq!(log[0], "show clock");
        assert_eq!(log[1], "show version");
        assert!(log.contains(&"show logging".to_string()));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn vrf_route_collection_tags_routes() {
        let connector = Arc::new(ScriptedConnector::new(cisco_device()));
        let (handle, mut rx) = spawn_with("cisco_ios", connector);

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::CycleComplete)
        })
        .await;

        handle.collect_vrf_routes("CUSTOMER_A").unwrap();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::VrfRoutes { .. })
        })
        .await;

        let (vrf, routes) = seen
            .iter()
            .find_map(|e| match e {
                TelemetryEvent::VrfRoutes { vrf, routes } => Some((vrf, routes)),
                _ => None,
            })
            .unwrap();
        assert_eq!(vrf, "CUSTOMER_A");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].network, "192.168.50.0/24");
        assert_eq!(routes[0].vrf, "CUSTOMER_A");
        assert_eq!(routes[0].protocol, "BGP");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn auto_collect_runs_periodic_cycles() {
        let connector = Arc::new(ScriptedConnector::new(cisco_device()));
        let (handle, mut rx) = spawn_with("cisco_ios", connector);

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::CycleComplete)
        })
        .await;

        // A second cycle arrives from the timer without any explicit request
        handle.set_auto_collect(Duration::from_millis(50)).unwrap();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::CycleComplete)
        })
        .await;

        handle.stop_auto_collect().unwrap();
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn failed_command_recovers_through_fallback_form() {
        let mut responses = cisco_device();
        responses.push((
            "show arp",
            "Protocol  Address          Age (min)  Hardware Addr   Type   Interface\n\
             Internet  10.0.0.2          12   0011.2233.4455  ARPA   GigabitEthernet0/1\n",
        ));
        let connector = Arc::new(ScriptedConnector::new(responses).failing(&["show ip arp"]));
        let executed = Arc::clone(&connector.executed);
        let (handle, mut rx) = spawn_with("cisco_ios", connector);

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::CycleComplete)
        })
        .await;

        // The primary form failed, but the configured alternative answered
        let arp = seen
            .iter()
            .find_map(|e| match e {
                TelemetryEvent::Arp(a) => Some(a),
                _ => None,
            })
            .expect("arp event");
        assert_eq!(arp[0].ip_address, "10.0.0.2");
        assert!(!seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::CapabilityError { capability, .. } if capability == "arp_table"
        )));
        assert!(seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::Raw(raw) if raw.command == "show arp"
        )));

        let log = executed.lock().unwrap().clone();
        let ip_arp = log.iter().position(|c| c == "show ip arp").unwrap();
        let plain_arp = log.iter().position(|c| c == "show arp").unwrap();
        assert!(ip_arp < plain_arp);

        handle.shutdown().await;
    }

    #[test]
    fn metrics_fold_combines_cpu_memory_and_temperature() {
        let mut slot = None;

        let mut cpu = NormalizedSystemMetrics::new("cisco_nxos");
        cpu.cpu_percent = 42.0;
        cpu.cpu_1min = 38.0;
        fold_metrics(&mut slot, "cpu_utilization", cpu);

        let mut mem = NormalizedSystemMetrics::new("cisco_nxos");
        mem.memory.total_mb = 2048;
        mem.memory.used_percent = 71.5;
        fold_metrics(&mut slot, "memory_utilization", mem);

        let mut temp = NormalizedSystemMetrics::new("cisco_nxos");
        temp.temperature_celsius = 36.0;
        fold_metrics(&mut slot, "temperature", temp);

        let combined = slot.expect("combined metrics");
        assert_eq!(combined.cpu_percent, 42.0);
        assert_eq!(combined.cpu_1min, 38.0);
        assert_eq!(combined.memory.total_mb, 2048);
        assert_eq!(combined.temperature_celsius, 36.0);
    }

    #[test]
    fn temperature_runs_only_where_supported() {
        let registry = PlatformRegistry::load(None);

        let nxos = capability_order(&registry, "cisco_nxos");
        let temp = nxos.iter().position(|k| k == "temperature").unwrap();
        let memory = nxos.iter().position(|k| k == "memory_utilization").unwrap();
        let logs = nxos.iter().position(|k| k == "logs").unwrap();
        assert!(memory < temp && temp < logs);

        let ios = capability_order(&registry, "cisco_ios");
        assert!(!ios.iter().any(|k| k == "temperature"));
    }

    #[tokio::test]
    async fn authentication_failure_is_discriminated() {
        let (handle, mut rx) =
            spawn_with("cisco_ios", Arc::new(FailingConnector(FailMode::Auth)));

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::ConnectFailed { .. })
        })
        .await;

        assert!(seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::ConnectFailed {
                reason: ConnectFailure::Authentication,
                ..
            }
        )));
        assert!(seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::Status {
                state: ConnectionState::Failed,
                ..
            }
        )));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn connect_timeout_is_discriminated() {
        let (handle, mut rx) =
            spawn_with("cisco_ios", Arc::new(FailingConnector(FailMode::Timeout)));

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::ConnectFailed { .. })
        })
        .await;
        assert!(seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::ConnectFailed {
                reason: ConnectFailure::Timeout,
                ..
            }
        )));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn other_transport_failures_are_generic() {
        let (handle, mut rx) =
            spawn_with("cisco_ios", Arc::new(FailingConnector(FailMode::Refused)));

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::ConnectFailed { .. })
        })
        .await;
        assert!(seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::ConnectFailed {
                reason: ConnectFailure::Transport,
                ..
            }
        )));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_platform_fails_without_connecting() {
        let connector = Arc::new(ScriptedConnector::new(Vec::new()));
        let attempts = Arc::clone(&connector.connect_attempts);
        let (handle, mut rx) = spawn_with("juniper_junos", connector);

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::ConnectFailed { .. })
        })
        .await;

        assert!(seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::ConnectFailed {
                reason: ConnectFailure::Precondition,
                ..
            }
        )));
        assert!(!attempts.load(Ordering::SeqCst));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn empty_probe_response_fails_verification() {
        // Session answers nothing at all, including the probe
        let connector = Arc::new(ScriptedConnector::new(Vec::new()));
        let closed = Arc::clone(&connector.closed);
        let (handle, mut rx) = spawn_with("cisco_ios", connector);

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::ConnectFailed { .. })
        })
        .await;

        assert!(seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::Status {
                state: ConnectionState::Verifying,
                ..
            }
        )));
        assert!(seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::ConnectFailed {
                reason: ConnectFailure::Transport,
                ..
            }
        )));

        handle.shutdown().await;
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn shutdown_closes_the_session() {
        let connector = Arc::new(ScriptedConnector::new(cisco_device()));
        let closed = Arc::clone(&connector.closed);
        let (handle, mut rx) = spawn_with("cisco_ios", connector);

        let mut seen = Vec::new();
        wait_for(&mut rx, &mut seen, |e| {
            matches!(e, TelemetryEvent::CycleComplete)
        })
        .await;

        handle.shutdown().await;
        assert!(closed.load(Ordering::SeqCst));

        // Terminal state reported before the channel closed
        while let Some(event) = rx.recv().await {
            seen.push(event);
        }
        assert!(seen.iter().any(|e| matches!(
            e,
            TelemetryEvent::Status {
                state: ConnectionState::Disconnected,
                ..
            }
        )));
    }

    #[test]
    fn credentials_are_not_readable_from_debug_output() {
        let config = test_config("cisco_ios");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("pw"));
        assert_eq!(config.password.expose_secret(), "pw");
    }
}
