use super::pronunciation::{phonetic, spoken_altitude, spoken_heading, spoken_speed};
use crate::flight_control::{FlightPhase, FlightSnapshot};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Matches `{placeholder}` tokens inside a speech template.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

const UNKNOWN: &str = "unknown";

/// Values available to a template when it is rendered.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub callsign: &'a str,
    pub phase: FlightPhase,
    pub snapshot: &'a FlightSnapshot,
}

impl RenderContext<'_> {
    fn value(&self, key: &str) -> Option<String> {
        let s = self.snapshot;
        let rendered = match key {
            "callsign" => self.callsign.to_string(),
            "callsign_phonetic" => phonetic(self.callsign),
            "phase" => self.phase.to_string(),
            "altitude" => s.altitude().map_or_else(|| UNKNOWN.into(), |a| format!("{a:.0} feet")),
            "altitude_spoken" => s.altitude().map_or_else(|| UNKNOWN.into(), spoken_altitude),
            "heading" => s.heading().map_or_else(|| UNKNOWN.into(), |h| format!("{h:03.0}")),
            "heading_spoken" => s.heading().map_or_else(|| UNKNOWN.into(), spoken_heading),
            "speed" => s.airspeed().map_or_else(|| UNKNOWN.into(), |v| format!("{v:.0} knots")),
            "speed_spoken" => s.airspeed().map_or_else(|| UNKNOWN.into(), spoken_speed),
            "ground_speed" => {
                s.ground_speed().map_or_else(|| UNKNOWN.into(), |v| format!("{v:.0} knots"))
            }
            "vertical_speed" => {
                s.vertical_speed().map_or_else(|| UNKNOWN.into(), |v| format!("{v:.0} feet per minute"))
            }
            _ => return None,
        };
        Some(rendered)
    }
}

/// Substitutes every known placeholder in `text`; unknown placeholders are
/// left verbatim.
pub fn render(text: &str, context: &RenderContext<'_>) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            context.value(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
