//! Ensemble driver and result aggregation.
//!
//! Runs independent realizations of the temporal Gillespie SIS process, each
//! until extinction or the horizon, and gathers their trajectories.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info};

use super::error::ConfigError;
use super::gillespie::{Realization, TemporalGillespie};
use super::network::TemporalNetwork;
use super::observer::{NoopObserver, SimulationObserver, TracingObserver};
use super::trace::{FullResolutionTrace, SampledSeries};

/// Parameters of an ensemble run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Number of nodes `N`.
    pub population_size: usize,
    /// Infection rate per SI contact per tick.
    pub infection_rate: f64,
    /// Recovery rate per infected node per tick.
    pub recovery_rate: f64,
    /// Maximum number of ticks per realization.
    pub horizon: usize,
    /// Sample `(I, SI)` every this many ticks.
    pub output_resolution: usize,
    /// Number of independent realizations, at least 1.
    pub realizations: usize,
    pub initial_infected: usize,
    /// Ensemble seed. Zero means "derive from the wall clock".
    pub seed: u64,
    /// Snapshot index at which the first pass over the network starts.
    pub start_offset: usize,
    /// Narrate the run through `tracing`.
    pub verbose: bool,
    /// Spread realizations over the rayon thread pool.
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population_size: 1,
            infection_rate: 0.0,
            recovery_rate: 0.0,
            horizon: 0,
            output_resolution: 1,
            realizations: 1,
            initial_infected: 1,
            seed: 0,
            start_offset: 0,
            verbose: false,
            parallel: true,
        }
    }
}

impl SimulationConfig {
    /// Check the configuration against `network`.
    pub fn validate(&self, network: &TemporalNetwork) -> Result<(), ConfigError> {
        if network.is_empty() {
            return Err(ConfigError::EmptyNetwork);
        }
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.realizations == 0 {
            return Err(ConfigError::NoRealizations);
        }
        if self.initial_infected == 0 {
            return Err(ConfigError::NoInitialInfected);
        }
        if self.initial_infected > self.population_size {
            return Err(ConfigError::InitialInfectedExceedsPopulation {
                initial: self.initial_infected,
                population: self.population_size,
            });
        }
        check_rate("infection_rate", self.infection_rate)?;
        check_rate("recovery_rate", self.recovery_rate)?;
        if self.output_resolution == 0 {
            return Err(ConfigError::InvalidOutputResolution);
        }
        if self.start_offset >= network.len() {
            return Err(ConfigError::StartOffsetOutOfRange {
                offset: self.start_offset,
                len: network.len(),
            });
        }
        network.validate_nodes(self.population_size)
    }

    /// Length of each tick-resolution series.
    pub fn sample_count(&self) -> usize {
        self.horizon / self.output_resolution.max(1)
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { name, value })
    }
}

/// Outcome of an ensemble run.
#[derive(Clone, Debug, PartialEq)]
pub struct EnsembleResult {
    /// Every snapshot visit and event of every realization, in realization order.
    pub full_resolution: FullResolutionTrace,
    /// `[realization][sample]` infected counts.
    pub sampled_infected: Vec<Vec<usize>>,
    /// `[realization][sample]` SI exposure counts.
    pub sampled_exposed_edges: Vec<Vec<usize>>,
    /// `I` at the stopping tick of each realization.
    pub terminal_infected_histogram: Vec<usize>,
    /// Realizations that reached `I = 0` before the horizon.
    pub extinct_realizations: usize,
    /// Seed actually used (after replacing zero).
    pub seed: u64,
}

impl EnsembleResult {
    pub fn realizations(&self) -> usize {
        self.terminal_infected_histogram.len()
    }

    /// Sampled infected counts as a `(realizations, samples)` matrix.
    pub fn sampled_infected_matrix(&self) -> Array2<usize> {
        to_matrix(&self.sampled_infected)
    }

    pub fn sampled_exposed_edges_matrix(&self) -> Array2<usize> {
        to_matrix(&self.sampled_exposed_edges)
    }

    /// Ensemble mean of `I` at each sample point.
    pub fn mean_sampled_infected(&self) -> Array1<f64> {
        column_mean(&self.sampled_infected_matrix())
    }

    /// Ensemble mean of `SI` at each sample point.
    pub fn mean_sampled_exposed_edges(&self) -> Array1<f64> {
        column_mean(&self.sampled_exposed_edges_matrix())
    }

    /// Standard error of the mean of `I`: `std / sqrt(n - 1)`.
    pub fn stderr_sampled_infected(&self) -> Array1<f64> {
        column_stderr(&self.sampled_infected_matrix())
    }

    /// Standard error of the mean of `SI`: `std / sqrt(n - 1)`.
    pub fn stderr_sampled_exposed_edges(&self) -> Array1<f64> {
        column_stderr(&self.sampled_exposed_edges_matrix())
    }
}

fn to_matrix(rows: &[Vec<usize>]) -> Array2<usize> {
    let cols = rows.first().map_or(0, Vec::len);
    Array2::from_shape_fn((rows.len(), cols), |(r, c)| rows[r][c])
}

fn column_mean(matrix: &Array2<usize>) -> Array1<f64> {
    matrix
        .mapv(|x| x as f64)
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(matrix.ncols()))
}

/// Population standard deviation over realizations, scaled by `1 / sqrt(n - 1)`.
/// Zero when fewer than two realizations exist.
fn column_stderr(matrix: &Array2<usize>) -> Array1<f64> {
    let n = matrix.nrows();
    if n <= 1 {
        return Array1::zeros(matrix.ncols());
    }
    matrix.mapv(|x| x as f64).std_axis(Axis(0), 0.0) / ((n - 1) as f64).sqrt()
}

/// What one realization contributes to the ensemble.
struct RealizationOutput {
    trace: FullResolutionTrace,
    samples: SampledSeries,
    final_infected: usize,
    extinct: bool,
}

/// Run the ensemble, narrating through `tracing` if `config.verbose`.
pub fn simulate(
    network: &TemporalNetwork,
    config: &SimulationConfig,
) -> Result<EnsembleResult, ConfigError> {
    if config.verbose {
        simulate_with_observer(network, config, &TracingObserver)
    } else {
        simulate_with_observer(network, config, &NoopObserver)
    }
}

/// Run the ensemble, reporting progress to `observer`.
///
/// Realization `r` draws from its own `StdRng` seeded with `seed + r`, so
/// results do not depend on `config.parallel`.
pub fn simulate_with_observer(
    network: &TemporalNetwork,
    config: &SimulationConfig,
    observer: &dyn SimulationObserver,
) -> Result<EnsembleResult, ConfigError> {
    config.validate(network)?;

    let seed = if config.seed == 0 {
        wall_clock_seed()
    } else {
        config.seed
    };
    let engine = TemporalGillespie::new(config.infection_rate, config.recovery_rate);

    debug!(
        realizations = config.realizations,
        seed,
        parallel = config.parallel,
        "starting ensemble"
    );
    let start = Instant::now();

    let run = |index: usize| run_realization(&engine, network, config, seed, index, observer);
    let outputs: Vec<RealizationOutput> = if config.parallel {
        (0..config.realizations).into_par_iter().map(run).collect()
    } else {
        (0..config.realizations).map(run).collect()
    };

    let extinct_realizations = outputs.iter().filter(|o| o.extinct).count();
    let elapsed = start.elapsed();

    let mut traces = Vec::with_capacity(outputs.len());
    let mut sampled_infected = Vec::with_capacity(outputs.len());
    let mut sampled_exposed_edges = Vec::with_capacity(outputs.len());
    let mut terminal_infected_histogram = Vec::with_capacity(outputs.len());
    for output in outputs {
        traces.push(output.trace);
        sampled_infected.push(output.samples.infected);
        sampled_exposed_edges.push(output.samples.exposed_edges);
        terminal_infected_histogram.push(output.final_infected);
    }

    if config.verbose {
        info!(
            n = config.population_size,
            beta = config.infection_rate,
            mu = config.recovery_rate,
            resolution = config.output_resolution,
            elapsed_secs = elapsed.as_secs_f64(),
            "temporal gillespie, homogeneous poissonian SIS: stopped {}/{}",
            extinct_realizations,
            config.realizations
        );
    }

    Ok(EnsembleResult {
        full_resolution: FullResolutionTrace::concat(traces),
        sampled_infected,
        sampled_exposed_edges,
        terminal_infected_histogram,
        extinct_realizations,
        seed,
    })
}

fn run_realization(
    engine: &TemporalGillespie,
    network: &TemporalNetwork,
    config: &SimulationConfig,
    seed: u64,
    index: usize,
    observer: &dyn SimulationObserver,
) -> RealizationOutput {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
    let mut run = Realization::seeded(
        index,
        config.population_size,
        config.initial_infected,
        &mut rng,
    );
    let mut samples = SampledSeries::new(config.sample_count());
    observer.on_realization_start(index, run.state());

    let mut cursor = network.cursor(config.start_offset);
    let mut extinct = false;
    while run.tick() < config.horizon {
        let snapshot_index = cursor.position();
        let Some(snapshot) = cursor.next() else {
            break;
        };

        let outcome = engine.step(snapshot, snapshot_index, &mut run, &mut rng, observer);
        if outcome.extinct {
            extinct = true;
            break;
        }

        let tick = run.tick();
        if tick % config.output_resolution == 0 {
            samples.record(
                tick / config.output_resolution,
                outcome.infected,
                outcome.exposed_edges,
            );
        }
        run.advance_tick();
    }

    let final_infected = run.state().infected_count();
    observer.on_realization_end(index, run.tick(), final_infected);

    RealizationOutput {
        trace: run.into_trace(),
        samples,
        final_infected,
        extinct,
    }
}

fn wall_clock_seed() -> u64 {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1);
    seed.max(1)
}
