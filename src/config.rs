//! TOML configuration of all three nodes.
//!
//! Every field carries a default, so an empty file (or no file at all) yields
//! a runnable local setup: orchestrator on port 8000, engine on 8001 and the
//! bot-control sink on 8002.

use crate::commentary::{CharacterConfig, CooldownPolicy, default_cast};
use crate::flight_control::GuardThresholds;
use crate::http_handler::EventType;
use crate::orchestrator::NodeDescriptor;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use strum_macros::{Display, EnumString};

/// Environment variable overriding the bind address of the node being run.
pub const BIND_ENV: &str = "SIMVIATOR_BIND";
/// Environment variable overriding the orchestrator URL.
pub const ORCHESTRATOR_URL_ENV: &str = "SIMVIATOR_ORCHESTRATOR_URL";
/// Shortest tick, health interval or timeout the runtime accepts.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("invalid TOML in {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The node a process runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum NodeRole {
    Engine,
    Orchestrator,
    BotControl,
}

/// Network identity of a service node.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeEndpoint {
    pub name: String,
    /// Socket address the node listens on.
    pub bind: String,
    /// URL under which other nodes reach this one.
    pub public_url: String,
    /// Event types the node subscribes to.
    #[serde(default)]
    pub capabilities: Vec<EventType>,
    /// Whether the overall health depends on this node.
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool { true }

impl NodeEndpoint {
    fn local(name: &str, port: u16, capabilities: Vec<EventType>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            bind: format!("127.0.0.1:{port}"),
            public_url: format!("http://127.0.0.1:{port}"),
            capabilities,
            required,
        }
    }

    /// Registration record announced to the orchestrator.
    pub fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor::new(&self.name, &self.public_url, self.capabilities.iter().copied())
            .with_required(self.required)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub node: NodeEndpoint,
    /// Selection ticks per second.
    pub tick_hz: f64,
    pub callsign: String,
    /// Pace of the simulated telemetry source, milliseconds.
    pub telemetry_interval_ms: u64,
    /// Simulated seconds per wall-clock second.
    pub simulation_speedup: f64,
    pub cruise_altitude: f64,
    /// Fixed RNG seed; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Capacity of the hand-off queue between the tick loop and delivery.
    pub event_buffer: usize,
    pub cooldown: CooldownPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node: NodeEndpoint::local("simviator", 8001, vec![EventType::EmergencyDeclared], true),
            tick_hz: 2.0,
            callsign: "EI123".to_string(),
            telemetry_interval_ms: 500,
            simulation_speedup: 4.0,
            cruise_altitude: 35_000.0,
            seed: None,
            event_buffer: 64,
            cooldown: CooldownPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration { Duration::from_secs_f64(1.0 / self.tick_hz) }
    pub fn telemetry_interval(&self) -> Duration { Duration::from_millis(self.telemetry_interval_ms) }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BotControlConfig {
    pub node: NodeEndpoint,
    /// Persona the sink starts with.
    pub default_personality: String,
}

impl Default for BotControlConfig {
    fn default() -> Self {
        Self {
            node: NodeEndpoint::local(
                "bot_control",
                8002,
                vec![
                    EventType::CommentaryGenerated,
                    EventType::PhaseChanged,
                    EventType::EmergencyDeclared,
                    EventType::PersonalityChanged,
                ],
                false,
            ),
            default_personality: "friendly_helper".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub name: String,
    pub bind: String,
    /// URL under which nodes reach the orchestrator.
    pub url: String,
    pub health_interval_secs: f64,
    pub probe_timeout_secs: f64,
    pub delivery_timeout_secs: f64,
    /// Consecutive matching probe results required for a health transition.
    pub consecutive_threshold: u32,
    /// Failed deliveries tolerated on a degraded node before it is marked
    /// unreachable.
    pub delivery_burst_limit: u32,
    pub max_concurrent_probes: usize,
    /// Unreachable nodes are dropped after this long; kept forever when absent.
    pub eviction_grace_secs: Option<f64>,
    pub history_limit: usize,
    /// Registration attempts of a starting node before it gives up.
    pub register_attempts: u32,
    /// Nodes known before they register themselves.
    pub nodes: Vec<NodeDescriptor>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            name: "orchestrator".to_string(),
            bind: "127.0.0.1:8000".to_string(),
            url: "http://127.0.0.1:8000".to_string(),
            health_interval_secs: 10.0,
            probe_timeout_secs: 2.0,
            delivery_timeout_secs: 2.0,
            consecutive_threshold: 3,
            delivery_burst_limit: 3,
            max_concurrent_probes: 8,
            eviction_grace_secs: None,
            history_limit: 100,
            register_attempts: 5,
            nodes: Vec::new(),
        }
    }
}

impl OrchestratorConfig {
    pub fn health_interval(&self) -> Duration { Duration::from_secs_f64(self.health_interval_secs) }
    pub fn probe_timeout(&self) -> Duration { Duration::from_secs_f64(self.probe_timeout_secs) }
    pub fn delivery_timeout(&self) -> Duration { Duration::from_secs_f64(self.delivery_timeout_secs) }

    /// Budget of a node publishing through the orchestrator. The orchestrator
    /// answers only after its own fan-out, which is bounded by the delivery
    /// timeout.
    pub fn publish_timeout(&self) -> Duration { self.delivery_timeout() * 2 + self.probe_timeout() }

    pub fn eviction_grace(&self) -> Option<chrono::TimeDelta> {
        self.eviction_grace_secs
            .and_then(|secs| chrono::TimeDelta::from_std(Duration::from_secs_f64(secs)).ok())
    }
}

/// Complete configuration document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub engine: EngineConfig,
    pub bot_control: BotControlConfig,
    pub orchestrator: OrchestratorConfig,
    pub phase: GuardThresholds,
    pub characters: Vec<CharacterConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            engine: EngineConfig::default(),
            bot_control: BotControlConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            phase: GuardThresholds::default(),
            characters: default_cast(),
        }
    }
}

impl AppConfig {
    /// Reads and validates `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: AppConfig = toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the fully defaulted document to `path`.
    pub fn save_default(path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(&AppConfig::default())?;
        std::fs::write(path, contents)
            .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    /// Applies environment overrides for a process running as `role`.
    pub fn apply_env(&mut self, role: NodeRole) {
        self.apply_overrides(role, |key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    pub fn apply_overrides<F>(&mut self, role: NodeRole, lookup: F)
    where F: Fn(&str) -> Option<String> {
        if let Some(bind) = lookup(BIND_ENV) {
            *self.bind_mut(role) = bind;
        }
        if let Some(url) = lookup(ORCHESTRATOR_URL_ENV) {
            self.orchestrator.url = url;
        }
    }

    pub fn bind_mut(&mut self, role: NodeRole) -> &mut String {
        match role {
            NodeRole::Engine => &mut self.engine.node.bind,
            NodeRole::Orchestrator => &mut self.orchestrator.bind,
            NodeRole::BotControl => &mut self.bot_control.node.bind,
        }
    }

    /// Rejects values no component can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let period = |secs: f64| {
            Duration::try_from_secs_f64(secs).is_ok_and(|period| period >= MIN_PERIOD)
        };

        if !positive(self.engine.tick_hz) {
            return invalid("engine.tick_hz must be positive");
        }
        if !period(1.0 / self.engine.tick_hz) {
            return invalid("engine.tick_hz must give a tick period of at least 1 ms");
        }
        if self.engine.telemetry_interval_ms == 0 {
            return invalid("engine.telemetry_interval_ms must be positive");
        }
        if !positive(self.engine.simulation_speedup) {
            return invalid("engine.simulation_speedup must be positive");
        }
        if self.engine.event_buffer == 0 {
            return invalid("engine.event_buffer must be positive");
        }
        let cooldown = &self.engine.cooldown;
        if cooldown.base_window_secs < 0.0
            || cooldown.per_level_factor < 0.0
            || cooldown.global_gap_secs < 0.0
        {
            return invalid("engine.cooldown values must not be negative");
        }
        if self.phase.confirm_samples == 0 {
            return invalid("phase.confirm_samples must be at least 1");
        }
        let orch = &self.orchestrator;
        if orch.consecutive_threshold == 0 {
            return invalid("orchestrator.consecutive_threshold must be at least 1");
        }
        if orch.delivery_burst_limit == 0 {
            return invalid("orchestrator.delivery_burst_limit must be at least 1");
        }
        if orch.max_concurrent_probes == 0 {
            return invalid("orchestrator.max_concurrent_probes must be at least 1");
        }
        if ![orch.health_interval_secs, orch.probe_timeout_secs, orch.delivery_timeout_secs]
            .into_iter()
            .all(positive)
        {
            return invalid("orchestrator intervals and timeouts must be positive");
        }
        if ![orch.health_interval_secs, orch.probe_timeout_secs, orch.delivery_timeout_secs]
            .into_iter()
            .all(period)
        {
            return invalid("orchestrator intervals and timeouts must be at least 1 ms");
        }
        if orch.eviction_grace_secs.is_some_and(|grace| !positive(grace)) {
            return invalid("orchestrator.eviction_grace_secs must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_document_is_default() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.characters.len(), 4);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            log_level = "debug"

            [engine]
            tick_hz = 4.0
            callsign = "RYR42"

            [engine.cooldown]
            base_window_secs = 10.0

            [orchestrator]
            consecutive_threshold = 5
            eviction_grace_secs = 120.0

            [[orchestrator.nodes]]
            node_id = "discord"
            base_url = "http://127.0.0.1:9000"
            capabilities = ["simviator.commentary.generated"]
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.engine.callsign, "RYR42");
        assert_eq!(config.engine.tick_interval(), Duration::from_millis(250));
        assert!((config.engine.cooldown.global_gap_secs - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.orchestrator.consecutive_threshold, 5);
        assert_eq!(config.orchestrator.probe_timeout(), Duration::from_secs(2));
        assert_eq!(config.orchestrator.eviction_grace(), Some(chrono::TimeDelta::seconds(120)));
        assert_eq!(config.orchestrator.nodes.len(), 1);
        assert_eq!(config.orchestrator.nodes[0].node_id(), "discord");
        assert!(config.orchestrator.nodes[0].accepts(EventType::CommentaryGenerated));
    }

    #[test]
    fn test_validation_rejects_nonsense() {
        let mut config = AppConfig::default();
        config.engine.tick_hz = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.orchestrator.consecutive_threshold = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.orchestrator.max_concurrent_probes = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validation_rejects_sub_millisecond_periods() {
        let mut config = AppConfig::default();
        config.engine.tick_hz = 1e10;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.engine.tick_hz = 500.0;
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.orchestrator.health_interval_secs = 1e-12;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.orchestrator.delivery_timeout_secs = 1e300;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_engine_subscribes_to_emergencies() {
        let config = AppConfig::default();
        let descriptor = config.engine.node.descriptor();
        assert!(descriptor.accepts(EventType::EmergencyDeclared));
        assert!(!descriptor.accepts(EventType::CommentaryGenerated));
    }

    #[test]
    fn test_publish_outlives_orchestrator_fan_out() {
        let mut config = AppConfig::default();
        assert!(config.orchestrator.publish_timeout() > config.orchestrator.delivery_timeout());
        config.orchestrator.probe_timeout_secs = 0.5;
        config.orchestrator.delivery_timeout_secs = 5.0;
        assert_eq!(config.orchestrator.publish_timeout(), Duration::from_millis(10_500));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simviator.toml");
        AppConfig::save_default(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[engine\ntick_hz = 2").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            AppConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_env_overrides_target_the_running_node() {
        let env: HashMap<&str, &str> =
            HashMap::from([(BIND_ENV, "0.0.0.0:9100"), (ORCHESTRATOR_URL_ENV, "http://orch:8000")]);
        let mut config = AppConfig::default();
        config.apply_overrides(NodeRole::BotControl, |k| env.get(k).map(ToString::to_string));
        assert_eq!(config.bot_control.node.bind, "0.0.0.0:9100");
        assert_eq!(config.engine.node.bind, "127.0.0.1:8001");
        assert_eq!(config.orchestrator.url, "http://orch:8000");
    }
}
