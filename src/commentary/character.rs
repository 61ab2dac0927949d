use crate::flight_control::FlightPhase;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use strum_macros::{Display, EnumString};

/// Closed set of character personalities. Behaviour differences are data
/// driven inside the selector, there is no per-personality type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// Seen it all, slightly weary but professional.
    BoredController,
    /// Busy frequency, clipped and efficient.
    HarriedController,
    /// Experienced passenger full of war stories.
    VeteranPilot,
    NervousStudent,
    EnthusiastSpotter,
    SafetyOfficer,
}

/// Filler words a harried controller has no time for.
static FILLER_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\b(please|really|very)\b").unwrap());

impl Personality {
    /// Applies the personality's deterministic text adjustments.
    pub fn flavour(self, text: String) -> String {
        match self {
            Personality::HarriedController => {
                FILLER_WORDS.replace_all(&text, "").trim().to_string()
            }
            _ => text,
        }
    }
}

/// Flight phase a speech template applies to; `*` matches every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PhaseTarget {
    Any,
    Phase(FlightPhase),
}

impl PhaseTarget {
    pub fn matches(self, phase: FlightPhase) -> bool {
        match self {
            PhaseTarget::Any => true,
            PhaseTarget::Phase(target) => target == phase,
        }
    }
}

impl TryFrom<String> for PhaseTarget {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "*" | "any" => Ok(PhaseTarget::Any),
            other => FlightPhase::from_str(other).map(PhaseTarget::Phase),
        }
    }
}

impl From<PhaseTarget> for String {
    fn from(value: PhaseTarget) -> Self {
        match value {
            PhaseTarget::Any => "*".to_string(),
            PhaseTarget::Phase(phase) => phase.to_string(),
        }
    }
}

/// Configuration record of a single speech pattern.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemplateConfig {
    pub text: String,
    pub phases: Vec<PhaseTarget>,
    #[serde(default)]
    pub expertise: Vec<String>,
}

impl TemplateConfig {
    pub fn new(text: &str, phases: &[PhaseTarget], expertise: &[&str]) -> Self {
        Self {
            text: text.to_string(),
            phases: phases.to_vec(),
            expertise: expertise.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Configuration record of a character, as found in the registry seed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CharacterConfig {
    pub id: String,
    pub name: String,
    pub personality: Personality,
    #[serde(default)]
    pub background: String,
    pub response_likelihood: f64,
    pub professional_level: u8,
    #[serde(default)]
    pub expertise: Vec<String>,
    pub templates: Vec<TemplateConfig>,
}

/// Expertise areas with this prefix mark a template as an emergency line.
const EMERGENCY_EXPERTISE: &str = "emergency";

/// A validated speech pattern owned by a [`Character`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechTemplate {
    text: String,
    phases: Vec<PhaseTarget>,
    expertise: Vec<String>,
}

impl SpeechTemplate {
    pub fn text(&self) -> &str { &self.text }

    /// Emergency lines are held back from routine selection.
    pub fn is_emergency(&self) -> bool {
        self.expertise.iter().any(|area| area.starts_with(EMERGENCY_EXPERTISE))
    }

    pub fn applies_to(&self, phase: FlightPhase) -> bool {
        !self.is_emergency() && self.phases.iter().any(|target| target.matches(phase))
    }
}

impl From<TemplateConfig> for SpeechTemplate {
    fn from(value: TemplateConfig) -> Self {
        Self { text: value.text, phases: value.phases, expertise: value.expertise }
    }
}

/// Immutable character definition. Only the
/// [`CharacterRegistry`](super::CharacterRegistry) constructs these, after
/// validating the configuration record.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    id: String,
    name: String,
    personality: Personality,
    background: String,
    response_likelihood: f64,
    professional_level: u8,
    expertise: Vec<String>,
    templates: Vec<SpeechTemplate>,
}

impl Character {
    pub(super) fn from_config(config: CharacterConfig) -> Self {
        Self {
            id: config.id,
            name: config.name,
            personality: config.personality,
            background: config.background,
            response_likelihood: config.response_likelihood,
            professional_level: config.professional_level,
            expertise: config.expertise,
            templates: config.templates.into_iter().map(SpeechTemplate::from).collect(),
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn personality(&self) -> Personality { self.personality }
    pub fn background(&self) -> &str { &self.background }
    pub fn response_likelihood(&self) -> f64 { self.response_likelihood }
    pub fn professional_level(&self) -> u8 { self.professional_level }
    pub fn expertise(&self) -> &[String] { &self.expertise }
    pub fn templates(&self) -> &[SpeechTemplate] { &self.templates }

    /// Whether any routine template targets `phase` (or every phase).
    pub fn speaks_in(&self, phase: FlightPhase) -> bool {
        self.templates.iter().any(|t| t.applies_to(phase))
    }

    /// Routine templates valid in `phase`, in configuration order.
    pub fn templates_for(&self, phase: FlightPhase) -> Vec<&SpeechTemplate> {
        self.templates.iter().filter(|t| t.applies_to(phase)).collect()
    }

    /// Templates tagged with an emergency expertise area, in any phase.
    pub fn emergency_templates(&self) -> Vec<&SpeechTemplate> {
        self.templates.iter().filter(|t| t.is_emergency()).collect()
    }

    pub fn handles_emergencies(&self) -> bool { self.templates.iter().any(SpeechTemplate::is_emergency) }
}
