use super::*;
use chrono::{DateTime, TimeDelta, Utc};
use std::str::FromStr;
use std::time::Duration;
use strum::IntoEnumIterator;

fn t0() -> DateTime<Utc> { DateTime::from_timestamp(1_700_000_000, 0).unwrap() }

fn taxiing(i: i64) -> FlightSnapshot {
    FlightSnapshot::at(t0() + TimeDelta::seconds(i))
        .with_on_ground(true)
        .with_ground_speed(5.0 + (i % 10) as f64)
        .with_vertical_speed(0.0)
        .with_altitude(200.0)
        .with_gear_position(1.0)
}

fn climbing(i: i64, altitude: f64) -> FlightSnapshot {
    FlightSnapshot::at(t0() + TimeDelta::seconds(i))
        .with_on_ground(false)
        .with_ground_speed(150.0)
        .with_vertical_speed(1800.0)
        .with_altitude(altitude)
        .with_gear_position(1.0)
}

fn level(i: i64) -> FlightSnapshot {
    FlightSnapshot::at(t0() + TimeDelta::seconds(i))
        .with_on_ground(false)
        .with_ground_speed(420.0)
        .with_vertical_speed(20.0)
        .with_altitude(35_000.0)
        .with_gear_position(0.0)
}

#[test]
fn test_phase_graph_has_single_successor() {
    assert_eq!(FlightPhase::Preflight.successor(), FlightPhase::Taxi);
    assert_eq!(FlightPhase::Landing.successor(), FlightPhase::Rollout);
    assert_eq!(FlightPhase::Rollout.successor(), FlightPhase::Taxi);
    for phase in FlightPhase::iter() {
        assert!(phase.can_reach_in_one_step(phase));
        assert!(phase.can_reach_in_one_step(phase.successor()));
    }
    assert!(!FlightPhase::Preflight.can_reach_in_one_step(FlightPhase::Cruise));
}

#[test]
fn test_phase_names_round_trip_through_strings() {
    assert_eq!(FlightPhase::from_str("cruise").unwrap(), FlightPhase::Cruise);
    assert_eq!(FlightPhase::from_str("ROLLOUT").unwrap(), FlightPhase::Rollout);
    assert_eq!(FlightPhase::Takeoff.to_string(), "takeoff");
    assert!(FlightPhase::from_str("hover").is_err());
}

#[test]
fn test_transition_requires_consecutive_samples() {
    let mut classifier = PhaseClassifier::default();
    let mut phase = FlightPhase::Preflight;
    phase = classifier.classify(phase, &taxiing(0));
    phase = classifier.classify(phase, &taxiing(1));
    assert_eq!(phase, FlightPhase::Preflight);
    phase = classifier.classify(phase, &taxiing(2));
    assert_eq!(phase, FlightPhase::Taxi);
}

#[test]
fn test_noise_resets_debounce() {
    let mut classifier = PhaseClassifier::default();
    let mut phase = FlightPhase::Preflight;
    let parked = FlightSnapshot::at(t0()).with_on_ground(true).with_ground_speed(0.0);
    phase = classifier.classify(phase, &taxiing(0));
    phase = classifier.classify(phase, &taxiing(1));
    phase = classifier.classify(phase, &parked);
    phase = classifier.classify(phase, &taxiing(3));
    phase = classifier.classify(phase, &taxiing(4));
    assert_eq!(phase, FlightPhase::Preflight);
    phase = classifier.classify(phase, &taxiing(5));
    assert_eq!(phase, FlightPhase::Taxi);
}

#[test]
fn test_missing_fields_never_transition() {
    let mut classifier = PhaseClassifier::default();
    let blank = FlightSnapshot::at(t0());
    for _ in 0..10 {
        assert_eq!(classifier.classify(FlightPhase::Taxi, &blank), FlightPhase::Taxi);
        assert_eq!(classifier.classify(FlightPhase::Descent, &blank), FlightPhase::Descent);
    }
}

#[test]
fn test_classifier_never_skips_a_step() {
    let mut classifier = PhaseClassifier::default();
    // Cruise-like data while still in preflight must not jump ahead.
    for i in 0..20 {
        let phase = classifier.classify(FlightPhase::Preflight, &level(i));
        assert!(FlightPhase::Preflight.can_reach_in_one_step(phase));
    }

    let mut sim = SimulatedFlight::new(Duration::from_secs(1), 1.0).with_cruise_altitude(8_000.0);
    let mut phase = FlightPhase::Preflight;
    let mut visited = vec![phase];
    for _ in 0..4_000 {
        let next = classifier.classify(phase, &sim.advance(1.0));
        assert!(phase.can_reach_in_one_step(next), "{phase} -> {next}");
        if next != phase {
            visited.push(next);
        }
        phase = next;
    }
    assert_eq!(
        &visited[..10],
        &[
            FlightPhase::Preflight,
            FlightPhase::Taxi,
            FlightPhase::Takeoff,
            FlightPhase::Climb,
            FlightPhase::Cruise,
            FlightPhase::Descent,
            FlightPhase::Approach,
            FlightPhase::Landing,
            FlightPhase::Rollout,
            FlightPhase::Taxi,
        ]
    );
}

#[test]
fn test_taxi_takeoff_climb_cruise_sequence() {
    let mut classifier = PhaseClassifier::default();
    let mut phase = FlightPhase::Preflight;
    let mut seen = vec![phase];
    let mut record = |phase: FlightPhase, seen: &mut Vec<FlightPhase>| {
        if seen.last() != Some(&phase) {
            seen.push(phase);
        }
    };
    for i in 0..10 {
        phase = classifier.classify(phase, &taxiing(i));
        record(phase, &mut seen);
    }
    for i in 10..30 {
        phase = classifier.classify(phase, &climbing(i, 300.0 * (i - 9) as f64));
        record(phase, &mut seen);
    }
    for i in 30..40 {
        phase = classifier.classify(phase, &level(i));
        record(phase, &mut seen);
    }
    assert_eq!(
        seen,
        vec![
            FlightPhase::Preflight,
            FlightPhase::Taxi,
            FlightPhase::Takeoff,
            FlightPhase::Climb,
            FlightPhase::Cruise
        ]
    );
}

#[test]
fn test_rollout_requires_deceleration() {
    let mut classifier = PhaseClassifier::default();
    let rolling = |gs: f64| FlightSnapshot::at(t0()).with_on_ground(true).with_ground_speed(gs);
    let mut phase = FlightPhase::Landing;
    for _ in 0..5 {
        phase = classifier.classify(phase, &rolling(120.0));
    }
    assert_eq!(phase, FlightPhase::Landing);
    for gs in [115.0, 110.0, 104.0] {
        phase = classifier.classify(phase, &rolling(gs));
    }
    assert_eq!(phase, FlightPhase::Rollout);
}

#[test]
fn test_approach_needs_gear_or_flaps() {
    let mut classifier = PhaseClassifier::default();
    let clean = FlightSnapshot::at(t0())
        .with_on_ground(false)
        .with_vertical_speed(-800.0)
        .with_gear_position(0.0)
        .with_flap_position(0.0);
    for _ in 0..5 {
        assert_eq!(classifier.classify(FlightPhase::Descent, &clean), FlightPhase::Descent);
    }
    let dirty = clean.with_flap_position(0.3);
    let mut phase = FlightPhase::Descent;
    for _ in 0..3 {
        phase = classifier.classify(phase, &dirty);
    }
    assert_eq!(phase, FlightPhase::Approach);
}

#[test]
fn test_snapshot_slot_keeps_only_latest() {
    let (writer, reader) = SnapshotSlot::channel();
    assert!(reader.latest().is_none());
    writer.publish(taxiing(1));
    writer.publish(taxiing(2));
    let latest = reader.latest().unwrap();
    assert_eq!(latest.timestamp(), t0() + TimeDelta::seconds(2));
    // Reading does not consume.
    assert_eq!(reader.latest(), Some(latest));
    assert_eq!(writer.reader().latest(), Some(latest));
}

#[test]
fn test_snapshot_clamps_positions() {
    let snap = FlightSnapshot::at(t0())
        .with_gear_position(1.7)
        .with_flap_position(-0.2)
        .with_heading(-90.0);
    assert_eq!(snap.gear_position(), Some(1.0));
    assert_eq!(snap.flap_position(), Some(0.0));
    assert_eq!(snap.heading(), Some(270.0));
}

struct FlakyAdapter {
    calls: usize,
}

#[async_trait::async_trait]
impl TelemetryAdapter for FlakyAdapter {
    async fn next_snapshot(&mut self) -> Result<Option<FlightSnapshot>, TelemetryError> {
        self.calls += 1;
        tokio::time::sleep(Duration::from_millis(100)).await;
        match self.calls {
            1 => Err(TelemetryError::Malformed("short packet".into())),
            2 => Ok(None),
            n => Ok(Some(taxiing(i64::try_from(n).unwrap()))),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_ingest_survives_adapter_errors() {
    let (writer, reader) = SnapshotSlot::channel();
    let cancel = tokio_util::sync::CancellationToken::new();
    let task = tokio::spawn(run_ingest(FlakyAdapter { calls: 0 }, writer, cancel.clone()));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(reader.latest().is_some());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
}
