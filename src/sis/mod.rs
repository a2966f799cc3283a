//! Temporal Gillespie simulation of SIS epidemics on snapshot sequences.
//!
//! This module provides:
//! - TemporalNetwork: snapshot sequence with wraparound traversal
//! - EpidemicState: O(1) infected/susceptible bookkeeping
//! - TemporalGillespie: per-tick stepping engine
//! - simulate: ensemble driver with parallel realizations
//! - SimulationObserver: hook points for diagnostics

pub mod error;
pub mod sampling;
pub mod network;
pub mod state;
pub mod trace;
pub mod observer;
pub mod gillespie;
pub mod ensemble;

pub use error::ConfigError;
pub use sampling::choose_random_unique;
pub use network::{Contact, NodeId, Snapshot, SnapshotCursor, TemporalNetwork};
pub use state::EpidemicState;
pub use trace::{FullResolutionTrace, SampledSeries};
pub use observer::{NoopObserver, SimulationObserver, TickContext, TracingObserver};
pub use gillespie::{
    Rates,
    Realization,
    TemporalGillespie,
    TickOutcome,
    TransitionEvent,
    TransitionKind,
};
pub use ensemble::{simulate, simulate_with_observer, EnsembleResult, SimulationConfig};
