use crate::flight_control::FlightPhase;
use chrono::{DateTime, Utc};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, serde::Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Alertness {
    #[default]
    Normal,
    High,
}

/// What the sink knows about the flight, gathered from routed events.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct FlightContext {
    pub phase: Option<FlightPhase>,
    pub altitude: Option<f64>,
    pub alertness: Alertness,
    pub technical_focus: bool,
    pub emergency: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl FlightContext {
    /// Takes in a new phase. Takeoff and landing sharpen attention, cruise
    /// relaxes it; other phases keep whatever was set before.
    pub fn enter_phase(&mut self, phase: FlightPhase, altitude: Option<f64>, at: DateTime<Utc>) {
        self.phase = Some(phase);
        if altitude.is_some() {
            self.altitude = altitude;
        }
        self.last_updated = Some(at);
        if phase.is_critical() {
            self.alertness = Alertness::High;
            self.technical_focus = true;
        } else if phase == FlightPhase::Cruise && !self.emergency {
            self.alertness = Alertness::Normal;
            self.technical_focus = false;
        }
    }

    pub fn declare_emergency(&mut self, at: DateTime<Utc>) {
        self.emergency = true;
        self.alertness = Alertness::High;
        self.technical_focus = true;
        self.last_updated = Some(at);
    }
}
