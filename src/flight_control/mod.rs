//! Flight state ingestion and phase classification.

mod flight_phase;
mod flight_snapshot;
mod phase_classifier;
mod telemetry;

#[cfg(test)]
mod tests;

pub use flight_phase::FlightPhase;
pub use flight_snapshot::{FlightSnapshot, SnapshotReader, SnapshotSlot, SnapshotWriter};
pub use phase_classifier::{GuardThresholds, PhaseClassifier};
pub use telemetry::{SimulatedFlight, TelemetryAdapter, TelemetryError, run_ingest};
