//! Trajectory records.
//!
//! Two series are kept per realization:
//! - a full-resolution trace with one `(time, I, SI)` entry per snapshot visit
//!   and per transition event;
//! - a tick-resolution series sampled every `output_resolution` ticks.

/// Full-resolution `(continuous time, I, SI)` series.
///
/// Ensemble traces are the per-realization traces concatenated in
/// realization order; `realization_offsets[r]` is where realization `r` starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FullResolutionTrace {
    pub time: Vec<f64>,
    pub infected: Vec<usize>,
    pub exposed_edges: Vec<usize>,
    pub realization_offsets: Vec<usize>,
}

impl FullResolutionTrace {
    /// Empty trace for a single realization.
    pub fn new() -> Self {
        Self {
            realization_offsets: vec![0],
            ..Self::default()
        }
    }

    /// Append one entry.
    #[inline]
    pub fn record(&mut self, time: f64, infected: usize, exposed_edges: usize) {
        self.time.push(time);
        self.infected.push(infected);
        self.exposed_edges.push(exposed_edges);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Number of realizations this trace covers.
    pub fn realization_count(&self) -> usize {
        self.realization_offsets.len()
    }

    /// Append another trace's realizations after this one's.
    pub fn append(&mut self, mut other: FullResolutionTrace) {
        let base = self.len();
        self.realization_offsets
            .extend(other.realization_offsets.iter().map(|&offset| offset + base));
        self.time.append(&mut other.time);
        self.infected.append(&mut other.infected);
        self.exposed_edges.append(&mut other.exposed_edges);
    }

    /// Concatenate realization traces in order.
    pub fn concat<I>(traces: I) -> Self
    where
        I: IntoIterator<Item = FullResolutionTrace>,
    {
        let mut merged = Self::default();
        for trace in traces {
            merged.append(trace);
        }
        merged
    }

    /// Index range of realization `r`'s entries.
    pub fn realization_range(&self, r: usize) -> Option<std::ops::Range<usize>> {
        let start = *self.realization_offsets.get(r)?;
        let end = self
            .realization_offsets
            .get(r + 1)
            .copied()
            .unwrap_or_else(|| self.len());
        Some(start..end)
    }
}

/// Tick-resolution `(I, SI)` samples of one realization.
///
/// Unvisited sample slots stay zero, which is the correct value after
/// extinction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampledSeries {
    pub infected: Vec<usize>,
    pub exposed_edges: Vec<usize>,
}

impl SampledSeries {
    pub fn new(samples: usize) -> Self {
        Self {
            infected: vec![0; samples],
            exposed_edges: vec![0; samples],
        }
    }

    /// Store a sample. Returns false if `index` is past the end.
    pub fn record(&mut self, index: usize, infected: usize, exposed_edges: usize) -> bool {
        match (self.infected.get_mut(index), self.exposed_edges.get_mut(index)) {
            (Some(i), Some(si)) => {
                *i = infected;
                *si = exposed_edges;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.infected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infected.is_empty()
    }
}
