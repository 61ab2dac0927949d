use super::{FlightSnapshot, SnapshotWriter};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Failure of a telemetry source. Never fatal for the classifier: the
/// ingestion loop logs it and carries on with the previous snapshot.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("malformed telemetry packet: {0}")]
    Malformed(String),
    #[error("telemetry source disconnected")]
    Disconnected,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Boundary to a simulator specific data source (UDP, SimConnect, replay).
///
/// Implementations pace themselves; `Ok(None)` means "no new snapshot this
/// interval".
#[async_trait]
pub trait TelemetryAdapter: Send {
    async fn next_snapshot(&mut self) -> Result<Option<FlightSnapshot>, TelemetryError>;
}

/// Delay before polling a failed adapter again.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Pumps `adapter` into the single-slot holder until `cancel` fires.
pub async fn run_ingest<A>(mut adapter: A, writer: SnapshotWriter, cancel: CancellationToken)
where
    A: TelemetryAdapter,
{
    info!("Telemetry ingestion started");
    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => break,
            next = adapter.next_snapshot() => next,
        };
        match next {
            Ok(Some(snapshot)) => writer.publish(snapshot),
            Ok(None) => debug!("No new telemetry this interval"),
            Err(e) => {
                warn!("Telemetry unavailable: {e}");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }
    }
    info!("Telemetry ingestion stopped");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Parked,
    TaxiOut,
    TakeoffRoll,
    Climb,
    Cruise,
    Descend,
    Approach,
    Rollout,
    TaxiIn,
}

/// Deterministic replay of a complete circuit, used when no simulator is
/// attached. Simulated time advances `interval * speedup` per sample.
#[derive(Debug, Clone)]
pub struct SimulatedFlight {
    interval: Duration,
    speedup: f64,
    cruise_altitude: f64,
    leg: Leg,
    leg_elapsed: f64,
    altitude: f64,
    ground_speed: f64,
    vertical_speed: f64,
    heading: f64,
    gear: f64,
    flaps: f64,
    on_ground: bool,
}

impl SimulatedFlight {
    const TAXI_SPEED: f64 = 12.0;
    const ROTATE_SPEED: f64 = 140.0;
    const CLIMB_RATE: f64 = 2200.0;
    const DESCENT_RATE: f64 = -1800.0;
    const APPROACH_RATE: f64 = -700.0;
    const APPROACH_GATE: f64 = 3000.0;

    pub fn new(interval: Duration, speedup: f64) -> Self {
        Self {
            interval,
            speedup: speedup.max(0.0),
            cruise_altitude: 35_000.0,
            leg: Leg::Parked,
            leg_elapsed: 0.0,
            altitude: 0.0,
            ground_speed: 0.0,
            vertical_speed: 0.0,
            heading: 90.0,
            gear: 1.0,
            flaps: 0.0,
            on_ground: true,
        }
    }

    #[must_use]
    pub fn with_cruise_altitude(mut self, feet: f64) -> Self {
        self.cruise_altitude = feet.max(Self::APPROACH_GATE);
        self
    }

    /// Advances the profile by `dt` simulated seconds and samples it.
    pub fn advance(&mut self, dt: f64) -> FlightSnapshot {
        self.leg_elapsed += dt;
        let done = match self.leg {
            Leg::Parked => {
                self.ground_speed = 0.0;
                self.leg_elapsed >= 20.0
            }
            Leg::TaxiOut | Leg::TaxiIn => {
                self.ground_speed = Self::TAXI_SPEED;
                self.leg_elapsed >= 60.0
            }
            Leg::TakeoffRoll => {
                self.ground_speed = (self.ground_speed + 6.0 * dt).min(Self::ROTATE_SPEED);
                self.ground_speed >= Self::ROTATE_SPEED
            }
            Leg::Climb => {
                self.on_ground = false;
                self.vertical_speed = Self::CLIMB_RATE;
                self.altitude = (self.altitude + Self::CLIMB_RATE / 60.0 * dt).min(self.cruise_altitude);
                self.ground_speed = (self.ground_speed + 2.0 * dt).min(450.0);
                if self.altitude > 400.0 {
                    self.gear = 0.0;
                }
                if self.altitude > 1500.0 {
                    self.flaps = 0.0;
                }
                self.altitude >= self.cruise_altitude
            }
            Leg::Cruise => {
                self.vertical_speed = 0.0;
                self.leg_elapsed >= 300.0
            }
            Leg::Descend => {
                self.vertical_speed = Self::DESCENT_RATE;
                self.altitude = (self.altitude + Self::DESCENT_RATE / 60.0 * dt).max(Self::APPROACH_GATE);
                self.ground_speed = (self.ground_speed - 1.0 * dt).max(250.0);
                self.altitude <= Self::APPROACH_GATE
            }
            Leg::Approach => {
                self.vertical_speed = Self::APPROACH_RATE;
                self.gear = 1.0;
                self.flaps = 0.5;
                self.altitude = (self.altitude + Self::APPROACH_RATE / 60.0 * dt).max(0.0);
                self.ground_speed = (self.ground_speed - 2.0 * dt).max(130.0);
                self.altitude <= 0.0
            }
            Leg::Rollout => {
                self.on_ground = true;
                self.vertical_speed = 0.0;
                self.ground_speed = (self.ground_speed - 5.0 * dt).max(Self::TAXI_SPEED);
                self.ground_speed <= Self::TAXI_SPEED
            }
        };
        if done {
            self.enter_next_leg();
        }
        self.sample()
    }

    fn enter_next_leg(&mut self) {
        self.leg_elapsed = 0.0;
        self.leg = match self.leg {
            Leg::Parked => Leg::TaxiOut,
            Leg::TaxiOut => Leg::TakeoffRoll,
            Leg::TakeoffRoll => {
                self.flaps = 0.2;
                Leg::Climb
            }
            Leg::Climb => Leg::Cruise,
            Leg::Cruise => Leg::Descend,
            Leg::Descend => Leg::Approach,
            Leg::Approach => Leg::Rollout,
            Leg::Rollout => Leg::TaxiIn,
            Leg::TaxiIn => {
                info!("Simulated flight completed, restarting profile");
                self.flaps = 0.0;
                Leg::Parked
            }
        };
    }

    fn sample(&self) -> FlightSnapshot {
        FlightSnapshot::at(Utc::now())
            .with_airspeed(if self.on_ground { self.ground_speed } else { self.ground_speed * 0.85 })
            .with_ground_speed(self.ground_speed)
            .with_vertical_speed(self.vertical_speed)
            .with_altitude(self.altitude)
            .with_heading(self.heading)
            .with_gear_position(self.gear)
            .with_flap_position(self.flaps)
            .with_on_ground(self.on_ground)
    }
}

#[async_trait]
impl TelemetryAdapter for SimulatedFlight {
    async fn next_snapshot(&mut self) -> Result<Option<FlightSnapshot>, TelemetryError> {
        tokio::time::sleep(self.interval).await;
        let dt = self.interval.as_secs_f64() * self.speedup;
        Ok(Some(self.advance(dt)))
    }
}
