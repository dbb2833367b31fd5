//! Signal labelling.
//!
//! This crate maps indicator snapshots to labels:
//! - Action labels (strong buy through strong sell), used for ranking
//! - Advisory labels, informational guidance shown alongside

mod engine;

pub use engine::{SignalConfig, SignalEngine};
