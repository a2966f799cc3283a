//! Hook points for diagnostics.
//!
//! The stepping engine calls an observer at the start of each tick, after each
//! transition event and at the end of each tick; the ensemble driver adds
//! realization start/end. The engine itself never logs.

use tracing::{debug, trace};

use super::gillespie::{TickOutcome, TransitionEvent};
use super::network::NodeId;
use super::state::EpidemicState;

/// Where in a run a hook fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickContext {
    pub realization: usize,
    pub tick: usize,
    /// Index of the snapshot being applied.
    pub snapshot: usize,
    pub continuous_time: f64,
}

/// Receives simulation progress. All hooks default to no-ops.
///
/// Observers are shared between realizations running on different threads,
/// hence `Sync` and `&self` receivers.
pub trait SimulationObserver: Sync {
    fn on_realization_start(&self, _realization: usize, _state: &EpidemicState) {}

    /// A snapshot was loaded and the SI exposures computed.
    fn on_tick_start(&self, _ctx: &TickContext, _state: &EpidemicState, _exposures: &[NodeId]) {}

    /// `exposures` is the multiset the event was drawn from, before the event.
    fn on_event(&self, _ctx: &TickContext, _event: &TransitionEvent, _exposures: &[NodeId]) {}

    fn on_tick_end(&self, _ctx: &TickContext, _outcome: &TickOutcome) {}

    fn on_realization_end(&self, _realization: usize, _ticks: usize, _final_infected: usize) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl SimulationObserver for NoopObserver {}

/// Narrates the run through `tracing`.
///
/// Realization boundaries go to `debug`, ticks and events to `trace`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl SimulationObserver for TracingObserver {
    fn on_realization_start(&self, realization: usize, state: &EpidemicState) {
        debug!(
            realization,
            infected = ?state.infected(),
            "realization started"
        );
    }

    fn on_tick_start(&self, ctx: &TickContext, state: &EpidemicState, exposures: &[NodeId]) {
        trace!(
            realization = ctx.realization,
            tick = ctx.tick,
            snapshot = ctx.snapshot,
            time = ctx.continuous_time,
            infected = state.infected_count(),
            si = exposures.len(),
            "loaded snapshot"
        );
    }

    fn on_event(&self, ctx: &TickContext, event: &TransitionEvent, exposures: &[NodeId]) {
        trace!(
            realization = ctx.realization,
            tick = ctx.tick,
            time = ctx.continuous_time,
            kind = ?event.kind,
            node = event.node,
            infected = event.infected_after,
            si_before = exposures.len(),
            "gillespie event"
        );
    }

    fn on_tick_end(&self, ctx: &TickContext, outcome: &TickOutcome) {
        if outcome.events == 0 {
            trace!(
                realization = ctx.realization,
                tick = ctx.tick,
                "no gillespie event in this tick"
            );
        }
    }

    fn on_realization_end(&self, realization: usize, ticks: usize, final_infected: usize) {
        debug!(realization, ticks, final_infected, "realization finished");
    }
}
