use chrono::{DateTime, Utc};
use tokio::sync::watch;

/// Canonical, simulator independent flight state sample.
///
/// Every telemetry field is optional: adapters leave a field empty when their
/// source did not report it, and the classifier treats a missing field as
/// "guard does not hold".
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlightSnapshot {
    /// Indicated airspeed in knots.
    airspeed: Option<f64>,
    /// Ground speed in knots.
    ground_speed: Option<f64>,
    /// Vertical speed in feet per minute, positive when climbing.
    vertical_speed: Option<f64>,
    /// Altitude in feet.
    altitude: Option<f64>,
    /// Magnetic heading in degrees.
    heading: Option<f64>,
    /// Landing gear extension, `0.0` retracted to `1.0` down and locked.
    gear_position: Option<f64>,
    /// Flap extension, `0.0` clean to `1.0` full.
    flap_position: Option<f64>,
    on_ground: Option<bool>,
    timestamp: DateTime<Utc>,
}

impl FlightSnapshot {
    /// Creates an empty snapshot taken at `timestamp`.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            airspeed: None,
            ground_speed: None,
            vertical_speed: None,
            altitude: None,
            heading: None,
            gear_position: None,
            flap_position: None,
            on_ground: None,
            timestamp,
        }
    }

    #[must_use]
    pub fn with_airspeed(mut self, knots: f64) -> Self {
        self.airspeed = Some(knots);
        self
    }

    #[must_use]
    pub fn with_ground_speed(mut self, knots: f64) -> Self {
        self.ground_speed = Some(knots);
        self
    }

    #[must_use]
    pub fn with_vertical_speed(mut self, fpm: f64) -> Self {
        self.vertical_speed = Some(fpm);
        self
    }

    #[must_use]
    pub fn with_altitude(mut self, feet: f64) -> Self {
        self.altitude = Some(feet);
        self
    }

    #[must_use]
    pub fn with_heading(mut self, degrees: f64) -> Self {
        self.heading = Some(degrees.rem_euclid(360.0));
        self
    }

    /// Gear and flap positions are clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_gear_position(mut self, position: f64) -> Self {
        self.gear_position = Some(position.clamp(0.0, 1.0));
        self
    }

    #[must_use]
    pub fn with_flap_position(mut self, position: f64) -> Self {
        self.flap_position = Some(position.clamp(0.0, 1.0));
        self
    }

    #[must_use]
    pub fn with_on_ground(mut self, on_ground: bool) -> Self {
        self.on_ground = Some(on_ground);
        self
    }

    pub fn airspeed(&self) -> Option<f64> { self.airspeed }
    pub fn ground_speed(&self) -> Option<f64> { self.ground_speed }
    pub fn vertical_speed(&self) -> Option<f64> { self.vertical_speed }
    pub fn altitude(&self) -> Option<f64> { self.altitude }
    pub fn heading(&self) -> Option<f64> { self.heading }
    pub fn gear_position(&self) -> Option<f64> { self.gear_position }
    pub fn flap_position(&self) -> Option<f64> { self.flap_position }
    pub fn on_ground(&self) -> Option<bool> { self.on_ground }
    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }
}

/// Single-slot, overwrite-on-write holder for the latest [`FlightSnapshot`].
///
/// Readers always observe the most recent value; there is no queue and no
/// backpressure, stale values are simply reused until replaced.
pub struct SnapshotSlot;

impl SnapshotSlot {
    /// Creates a connected writer/reader pair with an empty slot.
    pub fn channel() -> (SnapshotWriter, SnapshotReader) {
        let (tx, rx) = watch::channel(None);
        (SnapshotWriter { tx }, SnapshotReader { rx })
    }
}

/// Owned exclusively by the telemetry ingestion task.
#[derive(Debug)]
pub struct SnapshotWriter {
    tx: watch::Sender<Option<FlightSnapshot>>,
}

impl SnapshotWriter {
    /// Replaces the held snapshot. Never blocks, even without readers.
    pub fn publish(&self, snapshot: FlightSnapshot) { self.tx.send_replace(Some(snapshot)); }

    pub fn reader(&self) -> SnapshotReader { SnapshotReader { rx: self.tx.subscribe() } }
}

#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Option<FlightSnapshot>>,
}

impl SnapshotReader {
    /// Returns a copy of the latest snapshot, `None` before the first write.
    pub fn latest(&self) -> Option<FlightSnapshot> { *self.rx.borrow() }
}
