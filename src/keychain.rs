use crate::commentary::{CharacterRegistry, CommentarySelector, LikelihoodDraw, RegistryError, RngDraw};
use crate::config::AppConfig;
use crate::engine::{CommentaryEngine, EngineNode, EventPublisher};
use crate::flight_control::{PhaseClassifier, SimulatedFlight, SnapshotSlot, SnapshotWriter};
use crate::http_handler::Event;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The parts of a commentary engine process, wired together but not yet
/// running.
pub struct EngineKeychain {
    /// The tick loop.
    engine: CommentaryEngine,
    /// Health and status facade of the tick loop.
    node: EngineNode,
    /// Write side of the snapshot slot, fed by the telemetry source.
    writer: SnapshotWriter,
    /// Events queued by the tick loop, drained by the forwarder.
    events: mpsc::Receiver<Event>,
    /// Telemetry source used when no simulator is attached.
    telemetry: SimulatedFlight,
}

impl EngineKeychain {
    /// Builds every engine component from `config`. Fails when the configured
    /// cast does not load.
    pub fn assemble(config: &AppConfig, draw: Box<dyn LikelihoodDraw>) -> Result<Self, RegistryError> {
        let engine_config = &config.engine;
        let registry = Arc::new(CharacterRegistry::load(config.characters.clone())?);
        let selector = CommentarySelector::new(
            registry,
            engine_config.cooldown.clone(),
            &engine_config.callsign,
            draw,
        );
        let (writer, reader) = SnapshotSlot::channel();
        let (publisher, events) = EventPublisher::channel(engine_config.event_buffer);
        let engine = CommentaryEngine::new(
            &engine_config.node.name,
            reader,
            PhaseClassifier::new(config.phase.clone()),
            selector,
            publisher,
        );
        let node = engine.node();
        let telemetry = SimulatedFlight::new(engine_config.telemetry_interval(), engine_config.simulation_speedup)
            .with_cruise_altitude(engine_config.cruise_altitude);
        Ok(Self { engine, node, writer, events, telemetry })
    }

    /// Seeded draws when `seed` is set, OS entropy otherwise.
    pub fn draw_for(seed: Option<u64>) -> Box<dyn LikelihoodDraw> {
        match seed {
            Some(seed) => Box::new(RngDraw::seeded(seed)),
            None => Box::new(RngDraw::from_os_rng()),
        }
    }

    pub fn node(&self) -> EngineNode { self.node.clone() }

    pub fn into_parts(
        self,
    ) -> (CommentaryEngine, SnapshotWriter, mpsc::Receiver<Event>, SimulatedFlight) {
        (self.engine, self.writer, self.events, self.telemetry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commentary::CharacterConfig;
    use crate::flight_control::FlightPhase;
    use crate::http_handler::{NodeComponent, ProbeStatus};

    #[test]
    fn test_default_config_assembles_idle_engine() {
        let keychain = EngineKeychain::assemble(&AppConfig::default(), EngineKeychain::draw_for(Some(7))).unwrap();
        assert_eq!(keychain.node().name(), "simviator");
        assert_eq!(keychain.node().probe(), ProbeStatus::NotReady);
        let (engine, _writer, _events, _telemetry) = keychain.into_parts();
        assert_eq!(engine.phase(), FlightPhase::Preflight);
    }

    #[test]
    fn test_empty_cast_is_rejected() {
        let config = AppConfig { characters: Vec::<CharacterConfig>::new(), ..AppConfig::default() };
        let result = EngineKeychain::assemble(&config, EngineKeychain::draw_for(None));
        assert!(matches!(result, Err(RegistryError::Empty)));
    }
}
