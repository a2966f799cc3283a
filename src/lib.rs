//! Temporal Gillespie simulation of SIS epidemics on time-varying contact networks.
//!
//! The Rust API lives in [`sis`]. With the `python` feature the crate also
//! builds the `dyngillepi` extension module, whose `SIS_Poisson_homogeneous`
//! function wraps [`sis::simulate`].

pub mod sis;

pub use sis::{
    simulate, simulate_with_observer, ConfigError, EnsembleResult, SimulationConfig,
    SimulationObserver, TemporalNetwork,
};

#[cfg(feature = "python")]
mod python {
    use numpy::{PyArray1, PyArray2};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;
    use pyo3::types::PyDict;
    use pyo3::wrap_pyfunction;

    use crate::sis::{self, NodeId, SimulationConfig, TemporalNetwork};

    /// Simulate an SIS process on a time-dependent contact list.
    ///
    /// # Arguments
    /// * `N` - Number of nodes
    /// * `list_of_contact_lists` - One list of `(i, j)` contacts per time step
    /// * `infection_rate_per_dt` - Infection rate per SI contact per time step
    /// * `recovery_rate_per_dt` - Recovery rate per infected node per time step
    /// * `T_simulation` - Number of time steps per realization
    /// * `output_time_resolution_in_dt` - Sampling interval of `I` and `SI`
    /// * `number_of_simulations` - Ensemble size
    /// * `initial_number_of_infected` - Randomly seeded infections per realization
    /// * `seed` - RNG seed, 0 for a wall-clock seed
    /// * `t_infection_start` - Snapshot at which the first pass starts
    /// * `verbose` - Narrate the run through `tracing`
    ///
    /// # Returns
    /// * Dict with keys `true_t`, `true_I`, `true_SI`, `realization_offsets`,
    ///   `I`, `SI` (2-d arrays, realization x sample), `hist`, `stopped`, `seed`
    ///
    /// The result is a dict, not an `SI_result` object: scripts that read
    /// `result.I` or `result.hist` need `result["I"]` and `result["hist"]`.
    #[pyfunction]
    #[pyo3(name = "SIS_Poisson_homogeneous")]
    #[pyo3(signature = (N, list_of_contact_lists, infection_rate_per_dt, recovery_rate_per_dt, T_simulation=0, output_time_resolution_in_dt=1, number_of_simulations=1, initial_number_of_infected=1, seed=0, t_infection_start=0, verbose=false))]
    #[allow(non_snake_case, clippy::too_many_arguments)]
    fn sis_poisson_homogeneous(
        py: Python<'_>,
        N: usize,
        list_of_contact_lists: Vec<Vec<(NodeId, NodeId)>>,
        infection_rate_per_dt: f64,
        recovery_rate_per_dt: f64,
        T_simulation: usize,
        output_time_resolution_in_dt: usize,
        number_of_simulations: usize,
        initial_number_of_infected: usize,
        seed: u64,
        t_infection_start: usize,
        verbose: bool,
    ) -> PyResult<PyObject> {
        let to_py_err = |e: sis::ConfigError| PyErr::new::<PyValueError, _>(e.to_string());

        let network = TemporalNetwork::new(list_of_contact_lists).map_err(to_py_err)?;
        let config = SimulationConfig {
            population_size: N,
            infection_rate: infection_rate_per_dt,
            recovery_rate: recovery_rate_per_dt,
            horizon: T_simulation,
            output_resolution: output_time_resolution_in_dt,
            realizations: number_of_simulations,
            initial_infected: initial_number_of_infected,
            seed,
            start_offset: t_infection_start,
            verbose,
            parallel: true,
        };

        let result = py
            .allow_threads(|| sis::simulate(&network, &config))
            .map_err(to_py_err)?;

        let dict = PyDict::new(py);
        let trace = &result.full_resolution;
        dict.set_item("true_t", PyArray1::from_slice(py, &trace.time))?;
        dict.set_item("true_I", trace.infected.clone())?;
        dict.set_item("true_SI", trace.exposed_edges.clone())?;
        dict.set_item("realization_offsets", trace.realization_offsets.clone())?;
        dict.set_item(
            "I",
            PyArray2::from_owned_array(py, result.sampled_infected_matrix().mapv(|x| x as u64)),
        )?;
        dict.set_item(
            "SI",
            PyArray2::from_owned_array(
                py,
                result.sampled_exposed_edges_matrix().mapv(|x| x as u64),
            ),
        )?;
        dict.set_item("hist", result.terminal_infected_histogram.clone())?;
        dict.set_item("stopped", result.extinct_realizations)?;
        dict.set_item("seed", result.seed)?;

        Ok(dict.into())
    }

    /// Python module definition
    #[pymodule]
    fn dyngillepi(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(sis_poisson_homogeneous, m)?)?;
        Ok(())
    }
}
