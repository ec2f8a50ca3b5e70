//! Synthetic rocket-engine telemetry, fault injection, and a health
//! index derived from a multi-class regime classifier.

pub mod classifier;
pub mod config;
pub mod error;
pub mod fault;
pub mod features;
pub mod health;
pub mod metrics;
pub mod persist;
pub mod pipeline;
pub mod plot;
pub mod rng;
pub mod run;
pub mod split;
pub mod store;
pub mod table;
pub mod types;
pub mod waveform;
