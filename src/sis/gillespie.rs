//! Temporal Gillespie stepping for SIS on a snapshot sequence.
//!
//! Rates are constant within a tick and change between snapshots, so the
//! waiting time is drawn in rate-weighted units: `tau ~ Exp(1)` is consumed by
//! `Lambda` per full tick. A tick with `tau >= Lambda` has no event. Otherwise
//! events are applied one at a time, each followed by a rate recomputation on
//! the same snapshot and a fresh `tau`, until the remaining fraction `xi` of
//! the tick can no longer fit another event.
//!
//! Reference: Vestergaard & Génois, "Temporal Gillespie algorithm", PLoS
//! Comput. Biol. 11(10), 2015.

use rand::Rng;
use rand_distr::{Distribution, Exp1};

use super::network::{NodeId, Snapshot};
use super::observer::{SimulationObserver, TickContext};
use super::state::EpidemicState;
use super::trace::FullResolutionTrace;

/// Kind of state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// S -> I along one SI contact.
    Infection,
    /// I -> S.
    Recovery,
}

/// One applied transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionEvent {
    pub kind: TransitionKind,
    pub node: NodeId,
    pub infected_before: usize,
    pub infected_after: usize,
}

/// Aggregate rates for the current snapshot and state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rates {
    /// `Beta = SI * infection_rate`.
    pub infection: f64,
    /// `Mu = I * recovery_rate`.
    pub recovery: f64,
}

impl Rates {
    /// `Lambda = Beta + Mu`.
    #[inline]
    pub fn total(&self) -> f64 {
        self.infection + self.recovery
    }
}

/// State after one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickOutcome {
    pub infected: usize,
    pub exposed_edges: usize,
    /// Number of transition events applied during the tick.
    pub events: usize,
    /// `I` reached zero.
    pub extinct: bool,
}

/// Mutable per-realization bookkeeping driven by [`TemporalGillespie::step`].
#[derive(Clone, Debug)]
pub struct Realization {
    index: usize,
    state: EpidemicState,
    /// Remaining rate-weighted waiting time until the next event.
    tau: f64,
    continuous_time: f64,
    tick: usize,
    exposures: Vec<NodeId>,
    trace: FullResolutionTrace,
}

impl Realization {
    /// Start from an explicit state and waiting time.
    pub fn new(index: usize, state: EpidemicState, tau: f64) -> Self {
        Self {
            index,
            state,
            tau,
            continuous_time: 0.0,
            tick: 0,
            exposures: Vec::new(),
            trace: FullResolutionTrace::new(),
        }
    }

    /// Seed `initial_infected` random nodes and draw the first waiting time.
    pub fn seeded<R: Rng + ?Sized>(
        index: usize,
        population: usize,
        initial_infected: usize,
        rng: &mut R,
    ) -> Self {
        let mut state = EpidemicState::new(population);
        state.seed(initial_infected, rng);
        let tau = Exp1.sample(rng);
        Self::new(index, state, tau)
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn state(&self) -> &EpidemicState {
        &self.state
    }

    #[inline]
    pub fn tau(&self) -> f64 {
        self.tau
    }

    #[inline]
    pub fn continuous_time(&self) -> f64 {
        self.continuous_time
    }

    /// Discrete tick counter.
    #[inline]
    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    #[inline]
    pub fn trace(&self) -> &FullResolutionTrace {
        &self.trace
    }

    pub fn into_trace(self) -> FullResolutionTrace {
        self.trace
    }

    fn context(&self, snapshot: usize) -> TickContext {
        TickContext {
            realization: self.index,
            tick: self.tick,
            snapshot,
            continuous_time: self.continuous_time,
        }
    }

    fn record(&mut self) {
        self.trace.record(
            self.continuous_time,
            self.state.infected_count(),
            self.exposures.len(),
        );
    }

    fn advance(&mut self, consumed: f64) {
        self.tau -= consumed;
        self.continuous_time += consumed;
    }
}

/// Homogeneous, Poissonian SIS stepping engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemporalGillespie {
    infection_rate: f64,
    recovery_rate: f64,
}

impl TemporalGillespie {
    /// Rates are per tick: `infection_rate` per SI contact, `recovery_rate`
    /// per infected node.
    pub fn new(infection_rate: f64, recovery_rate: f64) -> Self {
        Self {
            infection_rate,
            recovery_rate,
        }
    }

    #[inline]
    pub fn rates(&self, exposed_edges: usize, infected: usize) -> Rates {
        Rates {
            infection: exposed_edges as f64 * self.infection_rate,
            recovery: infected as f64 * self.recovery_rate,
        }
    }

    /// Advance `run` through one snapshot.
    ///
    /// Appends a trace entry on arrival and one after every event. Does not
    /// move the tick counter; the caller does that after sampling.
    pub fn step<R: Rng + ?Sized>(
        &self,
        snapshot: &Snapshot,
        snapshot_index: usize,
        run: &mut Realization,
        rng: &mut R,
        observer: &dyn SimulationObserver,
    ) -> TickOutcome {
        let mut rates = self.load_snapshot(snapshot, run);
        run.record();
        observer.on_tick_start(&run.context(snapshot_index), &run.state, &run.exposures);

        let mut events = 0;
        let lambda = rates.total();

        if lambda <= 0.0 {
            // Nothing can happen; tau carries over untouched.
        } else if run.tau >= lambda {
            run.advance(lambda);
        } else {
            // Fraction of the tick still available.
            let mut xi = 1.0;
            while run.tau < xi * rates.total() {
                let lambda = rates.total();
                let fraction = run.tau / lambda;
                // Rounding in `xi * Lambda` can let `fraction` exceed `xi`.
                xi = (xi - fraction).max(0.0);
                run.continuous_time += fraction;

                let event = self.apply_event(&rates, run, rng);
                events += 1;
                observer.on_event(&run.context(snapshot_index), &event, &run.exposures);

                rates = self.load_snapshot(snapshot, run);
                run.tau = Exp1.sample(rng);
                run.record();
            }
            run.advance(xi * rates.total());
        }

        let infected = run.state.infected_count();
        let outcome = TickOutcome {
            infected,
            exposed_edges: run.exposures.len(),
            events,
            extinct: infected == 0,
        };
        observer.on_tick_end(&run.context(snapshot_index), &outcome);
        outcome
    }

    /// Recompute the SI exposures of `snapshot` and the resulting rates.
    fn load_snapshot(&self, snapshot: &Snapshot, run: &mut Realization) -> Rates {
        let si = run.state.collect_si_exposures(snapshot, &mut run.exposures);
        self.rates(si, run.state.infected_count())
    }

    /// Draw infection vs. recovery by rate, then a uniform target.
    fn apply_event<R: Rng + ?Sized>(
        &self,
        rates: &Rates,
        run: &mut Realization,
        rng: &mut R,
    ) -> TransitionEvent {
        let infected_before = run.state.infected_count();
        let r = rates.total() * rng.gen::<f64>();

        // With no recovery rate every event is an infection, even if the
        // product above rounds up to Beta.
        let (kind, node) = if r < rates.infection || rates.recovery <= 0.0 {
            let node = run.exposures[rng.gen_range(0..run.exposures.len())];
            run.state.mark_infected(node);
            (TransitionKind::Infection, node)
        } else {
            let index = rng.gen_range(0..infected_before);
            (TransitionKind::Recovery, run.state.recover_at(index))
        };

        TransitionEvent {
            kind,
            node,
            infected_before,
            infected_after: run.state.infected_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sis::observer::NoopObserver;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    /// Keeps every event together with the exposures it was drawn from.
    #[derive(Default)]
    struct EventLog {
        events: Mutex<Vec<(TransitionEvent, Vec<NodeId>)>>,
    }

    impl SimulationObserver for EventLog {
        fn on_event(&self, _ctx: &TickContext, event: &TransitionEvent, exposures: &[NodeId]) {
            self.events
                .lock()
                .unwrap()
                .push((*event, exposures.to_vec()));
        }
    }

    fn infected(population: usize, nodes: &[NodeId]) -> EpidemicState {
        let mut state = EpidemicState::new(population);
        for &node in nodes {
            state.mark_infected(node);
        }
        state
    }

    fn count_si_contacts(state: &EpidemicState, snapshot: &Snapshot) -> usize {
        snapshot
            .iter()
            .filter(|&&(i, j)| state.is_infected(i) != state.is_infected(j))
            .count()
    }

    #[test]
    fn test_zero_rates_consume_nothing() {
        let engine = TemporalGillespie::new(0.0, 0.0);
        let mut run = Realization::new(0, infected(3, &[0]), 0.7);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = engine.step(&vec![(0, 1)], 0, &mut run, &mut rng, &NoopObserver);

        assert_eq!(outcome.events, 0);
        assert_eq!(outcome.infected, 1);
        assert_eq!(outcome.exposed_edges, 1);
        assert_eq!(run.tau(), 0.7);
        assert_eq!(run.continuous_time(), 0.0);
    }

    #[test]
    fn test_no_event_when_tau_exceeds_lambda() {
        let engine = TemporalGillespie::new(0.5, 0.0);
        let mut run = Realization::new(0, infected(3, &[0]), 2.0);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = engine.step(&vec![(0, 1)], 0, &mut run, &mut rng, &NoopObserver);

        assert_eq!(outcome.events, 0);
        assert!((run.tau() - 1.5).abs() < 1e-12);
        assert!((run.continuous_time() - 0.5).abs() < 1e-12);
        assert_eq!(run.trace().len(), 1);
    }

    #[test]
    fn test_tau_equal_to_lambda_is_no_event() {
        let engine = TemporalGillespie::new(0.5, 0.0);
        let mut run = Realization::new(0, infected(3, &[0]), 0.5);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = engine.step(&vec![(0, 1)], 0, &mut run, &mut rng, &NoopObserver);

        assert_eq!(outcome.events, 0);
        assert_eq!(outcome.infected, 1);
        assert_eq!(run.tau(), 0.0);
    }

    #[test]
    fn test_single_forced_infection() {
        // One SI contact, no recovery: the only possible event infects node 1,
        // after which no rate is left in this snapshot.
        let engine = TemporalGillespie::new(1.0, 0.0);
        let mut run = Realization::new(0, infected(3, &[0]), 0.25);
        let mut rng = StdRng::seed_from_u64(5);

        let outcome = engine.step(&vec![(0, 1)], 0, &mut run, &mut rng, &NoopObserver);

        assert_eq!(outcome.events, 1);
        assert_eq!(outcome.infected, 2);
        assert_eq!(outcome.exposed_edges, 0);
        assert!(run.state().is_infected(1));
        assert!(!run.state().is_infected(2));

        let trace = run.trace();
        assert_eq!(trace.infected, vec![1, 2]);
        assert_eq!(trace.exposed_edges, vec![1, 0]);
        assert!((trace.time[1] - 0.25).abs() < 1e-12);
        assert!((run.continuous_time() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_recovery_to_extinction() {
        let engine = TemporalGillespie::new(0.0, 1.0);
        let mut run = Realization::new(0, infected(2, &[1]), 0.1);
        let mut rng = StdRng::seed_from_u64(5);

        let outcome = engine.step(&vec![], 0, &mut run, &mut rng, &NoopObserver);

        assert_eq!(outcome.events, 1);
        assert!(outcome.extinct);
        assert_eq!(run.state().infected_count(), 0);
    }

    #[test]
    fn test_events_conserve_counts() {
        let engine = TemporalGillespie::new(2.0, 0.8);
        let snapshots: Vec<Snapshot> = vec![
            vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)],
            vec![(0, 2), (1, 3), (2, 4)],
            vec![(0, 3), (1, 4), (0, 1), (2, 3)],
        ];
        let log = EventLog::default();
        let mut rng = StdRng::seed_from_u64(17);
        let mut run = Realization::seeded(0, 5, 2, &mut rng);

        for tick in 0..300 {
            let index = tick % snapshots.len();
            let outcome = engine.step(&snapshots[index], index, &mut run, &mut rng, &log);
            if outcome.extinct {
                break;
            }
            run.advance_tick();
        }

        let events = log.events.into_inner().unwrap();
        assert!(!events.is_empty());
        for (event, exposures) in events {
            match event.kind {
                TransitionKind::Infection => {
                    assert_eq!(event.infected_after, event.infected_before + 1);
                    assert!(exposures.contains(&event.node));
                }
                TransitionKind::Recovery => {
                    assert_eq!(event.infected_after + 1, event.infected_before);
                }
            }
        }
    }

    #[test]
    fn test_invariants_hold_every_tick() {
        let engine = TemporalGillespie::new(1.5, 0.5);
        let snapshots: Vec<Snapshot> = vec![
            vec![(0, 1), (2, 3), (4, 5), (1, 2)],
            vec![(5, 0), (3, 1)],
            vec![],
            vec![(0, 2), (2, 4), (4, 0), (1, 3), (3, 5), (5, 1)],
        ];
        let mut rng = StdRng::seed_from_u64(23);
        let mut run = Realization::seeded(0, 6, 1, &mut rng);
        let mut last_time = run.continuous_time();

        for tick in 0..500 {
            let index = tick % snapshots.len();
            let snapshot = &snapshots[index];
            let outcome = engine.step(snapshot, index, &mut run, &mut rng, &NoopObserver);

            assert!(run.state().is_consistent());
            assert_eq!(outcome.infected, run.state().infected_count());
            assert_eq!(outcome.exposed_edges, count_si_contacts(run.state(), snapshot));
            assert!(run.tau() >= 0.0);
            assert!(run.continuous_time() >= last_time);
            last_time = run.continuous_time();

            if outcome.extinct {
                break;
            }
            run.advance_tick();
        }

        assert!(run.trace().time.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_many_events_per_tick_keep_time_monotone() {
        // Rates far above one event per tick, so each tick runs the inner
        // loop many times and `xi` is driven close to zero repeatedly.
        let engine = TemporalGillespie::new(40.0, 25.0);
        let snapshot: Snapshot = (0..12)
            .flat_map(|i| ((i + 1)..12).map(move |j| (i, j)))
            .collect();
        let mut rng = StdRng::seed_from_u64(4242);

        for realization in 0..20 {
            let mut run = Realization::seeded(realization, 12, 6, &mut rng);
            let mut last_time = run.continuous_time();

            for _ in 0..50 {
                let outcome = engine.step(&snapshot, 0, &mut run, &mut rng, &NoopObserver);
                assert!(run.continuous_time() >= last_time);
                assert!(run.tau() >= 0.0);
                last_time = run.continuous_time();
                if outcome.extinct {
                    break;
                }
                run.advance_tick();
            }

            assert!(run.trace().time.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
