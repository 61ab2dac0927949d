pub mod delivery_report;
pub mod event_ack;
pub mod probe_report;
pub mod registration_ack;
pub mod response_common;
