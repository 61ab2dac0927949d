#![allow(clippy::module_name_repetitions)]
//! Character-voiced flight commentary and the service mesh carrying it.

pub mod bot_control;
pub mod commentary;
pub mod config;
pub mod engine;
pub mod flight_control;
pub mod http_handler;
pub mod keychain;
pub mod logger;
pub mod orchestrator;
