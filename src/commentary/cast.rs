use super::character::{CharacterConfig, Personality, PhaseTarget, TemplateConfig};
use crate::flight_control::FlightPhase::{
    self, Approach, Climb, Cruise, Descent, Landing, Preflight, Rollout, Takeoff, Taxi,
};

fn at(phase: FlightPhase) -> PhaseTarget { PhaseTarget::Phase(phase) }

/// The stock cast used when the configuration does not provide one.
pub fn default_cast() -> Vec<CharacterConfig> {
    vec![
        CharacterConfig {
            id: "dublin_control".into(),
            name: "Dublin Control".into(),
            personality: Personality::BoredController,
            background: "20-year veteran controller at Dublin, seen everything twice".into(),
            response_likelihood: 0.8,
            professional_level: 9,
            expertise: vec![
                "traffic_management".into(),
                "conflict_resolution".into(),
                "airspace_procedures".into(),
            ],
            templates: vec![
                TemplateConfig::new(
                    "Right then, {callsign}, taxi as cleared, nothing new under the sun.",
                    &[at(Preflight), at(Taxi)],
                    &["airspace_procedures"],
                ),
                TemplateConfig::new(
                    "{callsign}, been watching the traffic, no immediate concerns.",
                    &[at(Cruise), at(Descent)],
                    &["traffic_management"],
                ),
                TemplateConfig::new(
                    "Copy {callsign}, maintain {altitude_spoken}, standard procedures apply.",
                    &[at(Climb), at(Cruise)],
                    &["airspace_procedures"],
                ),
                TemplateConfig::new(
                    "*sigh* {callsign}, vacate when able, another day another dollar.",
                    &[at(Rollout)],
                    &["traffic_management"],
                ),
                TemplateConfig::new(
                    "{callsign}, understand emergency. State intentions, assistance available.",
                    &[PhaseTarget::Any],
                    &["emergency_handling"],
                ),
            ],
        },
        CharacterConfig {
            id: "approach_control".into(),
            name: "Approach Control".into(),
            personality: Personality::HarriedController,
            background: "Busy approach controller, multiple aircraft, efficient communication".into(),
            response_likelihood: 0.6,
            professional_level: 8,
            expertise: vec![
                "approach_procedures".into(),
                "sequencing".into(),
                "emergency_handling".into(),
            ],
            templates: vec![
                TemplateConfig::new(
                    "{callsign}, expedite climb if able, really busy airspace today.",
                    &[at(Takeoff), at(Climb)],
                    &["sequencing"],
                ),
                TemplateConfig::new(
                    "Quick one {callsign}, descend and maintain {altitude_spoken}.",
                    &[at(Descent)],
                    &["sequencing"],
                ),
                TemplateConfig::new(
                    "{callsign}, turn heading {heading_spoken}, please reduce {speed_spoken}.",
                    &[at(Approach)],
                    &["approach_procedures"],
                ),
                TemplateConfig::new(
                    "Keep it moving {callsign}, vacate next left.",
                    &[at(Landing), at(Rollout)],
                    &["sequencing"],
                ),
                TemplateConfig::new(
                    "{callsign}, emergency acknowledged. Immediate vectors available, runway is yours.",
                    &[PhaseTarget::Any],
                    &["emergency_handling"],
                ),
            ],
        },
        CharacterConfig {
            id: "captain_murphy".into(),
            name: "Captain Murphy".into(),
            personality: Personality::VeteranPilot,
            background: "Retired airline captain, 35 years commercial aviation".into(),
            response_likelihood: 0.4,
            professional_level: 10,
            expertise: vec![
                "commercial_procedures".into(),
                "weather_flying".into(),
                "emergency_procedures".into(),
            ],
            templates: vec![
                TemplateConfig::new(
                    "Old pilot trick, {callsign}: check those flight controls twice before you roll.",
                    &[at(Preflight), at(Taxi)],
                    &["commercial_procedures"],
                ),
                TemplateConfig::new(
                    "Reminds me of a flight back in '87, {callsign}. Positive rate, gear up, stay alert.",
                    &[at(Takeoff)],
                    &["commercial_procedures"],
                ),
                TemplateConfig::new(
                    "Pro tip {callsign}, {altitude_spoken} works well for this route.",
                    &[at(Cruise)],
                    &["weather_flying"],
                ),
                TemplateConfig::new(
                    "Stabilised by a thousand feet, {callsign}, or go around. No shame in it.",
                    &[at(Approach), at(Landing)],
                    &["commercial_procedures"],
                ),
                TemplateConfig::new(
                    "{callsign}, stay calm. Run your emergency checklist first.",
                    &[PhaseTarget::Any],
                    &["emergency_procedures"],
                ),
                TemplateConfig::new(
                    "{callsign}, been through this before. Follow procedures, you'll be fine.",
                    &[PhaseTarget::Any],
                    &["emergency_procedures"],
                ),
            ],
        },
        CharacterConfig {
            id: "sarah_spotter".into(),
            name: "Sarah (Aviation Enthusiast)".into(),
            personality: Personality::EnthusiastSpotter,
            background: "Aircraft spotter and aviation video creator".into(),
            response_likelihood: 0.3,
            professional_level: 6,
            expertise: vec![
                "aircraft_recognition".into(),
                "aviation_trivia".into(),
                "spotting_locations".into(),
            ],
            templates: vec![
                TemplateConfig::new(
                    "Oh wow {callsign}, look at that ramp, my subscribers would love this!",
                    &[at(Taxi)],
                    &["spotting_locations"],
                ),
                TemplateConfig::new(
                    "Fun fact {callsign}, {ground_speed} over the ground up here!",
                    &[at(Cruise)],
                    &["aviation_trivia"],
                ),
                TemplateConfig::new(
                    "Look at that {callsign}, textbook flying!",
                    &[PhaseTarget::Any],
                    &["aircraft_recognition"],
                ),
            ],
        },
    ]
}
