use super::response_common::SerdeJSONBodyHTTPResponseType;

/// Outcome of routing one event to its subscribers.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Nodes that acknowledged the event.
    pub delivered: Vec<String>,
    /// Subscribers skipped because they are unreachable.
    pub skipped: Vec<String>,
    /// Subscribers that were attempted but failed.
    pub failed: Vec<String>,
}

impl DeliveryReport {
    pub fn delivered_count(&self) -> usize { self.delivered.len() }
}

impl SerdeJSONBodyHTTPResponseType for DeliveryReport {}
