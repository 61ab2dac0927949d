use strum_macros::Display;

/// Result of a liveness or readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// The process answers; nothing else is claimed.
    Alive,
    /// Internal dependencies are satisfied.
    Ready,
    NotReady,
}

impl ProbeStatus {
    pub fn is_ready(self) -> bool { self == ProbeStatus::Ready }
}
