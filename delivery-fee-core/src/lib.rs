//! Core library for the `delivery-fee` calculator.
//!
//! This crate defines:
//! - The fee rules (regional base fee plus weather surcharges and prohibitions)
//! - A time-indexed store of weather observations per station
//! - The fee query service combining the two
//! - The weather feed importer and its periodic task
//! - Configuration and the JSON request/response payloads
//!
//! It is used by `delivery-fee-cli`, but can also be embedded in other services.

pub mod api;
pub mod config;
pub mod feed;
pub mod importer;
pub mod model;
pub mod rules;
pub mod schedule;
pub mod service;
pub mod station;
pub mod store;

pub use api::{FeeRequest, FeeResponse};
pub use config::{Config, ImportConfig};
pub use feed::{FeedError, FeedSnapshot, IlmateenistusFeed, ObservationFeed};
pub use importer::{ImportReport, Importer};
pub use model::{City, FeeQuery, Observation, StationId, Vehicle};
pub use rules::{FeeDecision, compute_fee};
pub use schedule::{ImportSchedule, ImportTask};
pub use service::{FeeError, FeeService};
pub use store::{InMemoryStore, ObservationStore};
