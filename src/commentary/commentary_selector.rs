use super::template::{RenderContext, render};
use super::{Character, CharacterRegistry, Utterance};
use crate::flight_control::{FlightPhase, FlightSnapshot};
use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{cmp::Reverse, collections::HashMap, sync::Arc};
use tracing::debug;

/// Source of the per-character Bernoulli trials.
pub trait LikelihoodDraw: Send {
    /// Uniform sample from `[0, 1)`.
    fn draw(&mut self) -> f64;
}

/// Production draw backed by a seedable [`StdRng`].
#[derive(Debug)]
pub struct RngDraw(StdRng);

impl RngDraw {
    pub fn seeded(seed: u64) -> Self { Self(StdRng::seed_from_u64(seed)) }

    pub fn from_os_rng() -> Self { Self(StdRng::from_os_rng()) }
}

impl LikelihoodDraw for RngDraw {
    fn draw(&mut self) -> f64 { self.0.random::<f64>() }
}

/// Cooldown configuration shared by every character.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CooldownPolicy {
    /// Base window in seconds, scaled per professional level.
    pub base_window_secs: f64,
    /// Multiplier applied per professional level; senior characters wait
    /// longer between lines.
    pub per_level_factor: f64,
    /// Minimum gap between two utterances of any characters, seconds.
    pub global_gap_secs: f64,
}

impl Default for CooldownPolicy {
    fn default() -> Self { Self { base_window_secs: 30.0, per_level_factor: 1.0, global_gap_secs: 3.0 } }
}

impl CooldownPolicy {
    /// `base * level * factor`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn window_for(&self, professional_level: u8) -> TimeDelta {
        let secs = self.base_window_secs * f64::from(professional_level) * self.per_level_factor;
        TimeDelta::milliseconds((secs.max(0.0) * 1000.0) as i64)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn global_gap(&self) -> TimeDelta {
        TimeDelta::milliseconds((self.global_gap_secs.max(0.0) * 1000.0) as i64)
    }
}

#[derive(Debug, Clone, Copy)]
struct CooldownState {
    last_spoken_at: DateTime<Utc>,
    last_phase: FlightPhase,
}

/// Per-character view exposed on the engine status endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CharacterStatus {
    pub id: String,
    pub name: String,
    pub personality: String,
    pub background: String,
    pub expertise: Vec<String>,
    pub professional_level: u8,
    pub response_likelihood: f64,
    pub spoken: u64,
    pub last_spoken_at: Option<DateTime<Utc>>,
    pub last_phase: Option<FlightPhase>,
    pub cooldown_secs: f64,
}

/// Picks at most one character utterance per selection cycle.
///
/// The cooldown map, the template cursors and the session counters are owned
/// by the selector alone; the registry is shared read-only.
pub struct CommentarySelector {
    registry: Arc<CharacterRegistry>,
    policy: CooldownPolicy,
    callsign: String,
    draw: Box<dyn LikelihoodDraw>,
    cooldowns: HashMap<String, CooldownState>,
    cursors: HashMap<String, usize>,
    emergency_cursors: HashMap<String, usize>,
    spoken: HashMap<String, u64>,
    last_utterance_at: Option<DateTime<Utc>>,
}

impl CommentarySelector {
    pub fn new(
        registry: Arc<CharacterRegistry>,
        policy: CooldownPolicy,
        callsign: &str,
        draw: Box<dyn LikelihoodDraw>,
    ) -> Self {
        Self {
            registry,
            policy,
            callsign: callsign.to_string(),
            draw,
            cooldowns: HashMap::new(),
            cursors: HashMap::new(),
            emergency_cursors: HashMap::new(),
            spoken: HashMap::new(),
            last_utterance_at: None,
        }
    }

    pub fn registry(&self) -> &Arc<CharacterRegistry> { &self.registry }

    /// Runs one selection cycle. `None` is the common outcome: every
    /// candidate was cooling down or declined to speak.
    pub fn select(
        &mut self,
        phase: FlightPhase,
        snapshot: &FlightSnapshot,
        now: DateTime<Utc>,
    ) -> Option<Utterance> {
        if self.last_utterance_at.is_some_and(|last| now - last < self.policy.global_gap()) {
            return None;
        }
        let registry = Arc::clone(&self.registry);
        let mut eligible: Vec<&Character> = Vec::new();
        for character in registry.all_for_phase(phase) {
            if self.is_cooling_down(character, now) {
                continue;
            }
            if self.draw.draw() < character.response_likelihood() {
                eligible.push(character);
            }
        }

        let chosen = eligible
            .into_iter()
            .enumerate()
            .max_by_key(|(order, c)| (c.professional_level(), Reverse(*order)))
            .map(|(_, c)| c)?;

        let text = self.render_next(chosen, phase, snapshot)?;
        debug!("Selected {} for {phase}", chosen.id());
        Some(self.commit(chosen, text, phase, now))
    }

    /// Answers a declared emergency at once: the most senior character with
    /// emergency lines that is not cooling down speaks, without a likelihood
    /// draw and regardless of the global gap.
    pub fn respond_to_emergency(
        &mut self,
        phase: FlightPhase,
        snapshot: &FlightSnapshot,
        now: DateTime<Utc>,
    ) -> Option<Utterance> {
        let registry = Arc::clone(&self.registry);
        let chosen = registry
            .iter()
            .filter(|c| c.handles_emergencies() && !self.is_cooling_down(c, now))
            .enumerate()
            .max_by_key(|(order, c)| (c.professional_level(), Reverse(*order)))
            .map(|(_, c)| c)?;

        let templates = chosen.emergency_templates();
        let cursor = self.emergency_cursors.entry(chosen.id().to_string()).or_default();
        let template = templates[*cursor % templates.len()];
        *cursor = cursor.wrapping_add(1);
        let context = RenderContext { callsign: &self.callsign, phase, snapshot };
        let text = chosen.personality().flavour(render(template.text(), &context));
        debug!("{} answers the emergency", chosen.id());
        Some(self.commit(chosen, text, phase, now))
    }

    /// Books an utterance against the cooldowns and session counters.
    fn commit(&mut self, character: &Character, text: String, phase: FlightPhase, now: DateTime<Utc>) -> Utterance {
        self.cooldowns
            .insert(character.id().to_string(), CooldownState { last_spoken_at: now, last_phase: phase });
        *self.spoken.entry(character.id().to_string()).or_default() += 1;
        self.last_utterance_at = Some(now);
        Utterance::new(character.id(), character.name(), text, phase, now)
    }

    fn is_cooling_down(&self, character: &Character, now: DateTime<Utc>) -> bool {
        self.cooldowns.get(character.id()).is_some_and(|state| {
            now - state.last_spoken_at < self.policy.window_for(character.professional_level())
        })
    }

    /// Renders the character's next template for `phase`, cycling round-robin
    /// through the matching templates.
    fn render_next(
        &mut self,
        character: &Character,
        phase: FlightPhase,
        snapshot: &FlightSnapshot,
    ) -> Option<String> {
        let templates = character.templates_for(phase);
        if templates.is_empty() {
            return None;
        }
        let cursor = self.cursors.entry(character.id().to_string()).or_default();
        let template = templates[*cursor % templates.len()];
        *cursor = cursor.wrapping_add(1);

        let context = RenderContext { callsign: &self.callsign, phase, snapshot };
        Some(character.personality().flavour(render(template.text(), &context)))
    }

    /// Status of every registered character, in registration order.
    #[allow(clippy::cast_precision_loss)]
    pub fn character_status(&self) -> Vec<CharacterStatus> {
        self.registry
            .iter()
            .map(|c| {
                let state = self.cooldowns.get(c.id());
                CharacterStatus {
                    id: c.id().to_string(),
                    name: c.name().to_string(),
                    personality: c.personality().to_string(),
                    background: c.background().to_string(),
                    expertise: c.expertise().to_vec(),
                    professional_level: c.professional_level(),
                    response_likelihood: c.response_likelihood(),
                    spoken: self.spoken.get(c.id()).copied().unwrap_or_default(),
                    last_spoken_at: state.map(|s| s.last_spoken_at),
                    last_phase: state.map(|s| s.last_phase),
                    cooldown_secs: self.policy.window_for(c.professional_level()).num_milliseconds()
                        as f64
                        / 1000.0,
                }
            })
            .collect()
    }
}
