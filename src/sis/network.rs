//! Temporal contact network.
//!
//! A network is an ordered sequence of snapshots, one per tick. Each snapshot
//! lists the unordered node pairs in contact during that tick. When a run is
//! longer than the sequence, the sequence is replayed from the beginning.

use std::collections::BTreeMap;

use super::error::ConfigError;

/// Node identifier in `[0, population_size)`.
pub type NodeId = usize;

/// Unordered pair of distinct nodes in contact during one tick.
pub type Contact = (NodeId, NodeId);

/// All contacts of one tick.
pub type Snapshot = Vec<Contact>;

/// Read-only, non-empty sequence of snapshots.
#[derive(Clone, Debug)]
pub struct TemporalNetwork {
    snapshots: Vec<Snapshot>,
}

impl TemporalNetwork {
    /// Wrap a snapshot sequence. Fails if the sequence is empty.
    pub fn new(snapshots: Vec<Snapshot>) -> Result<Self, ConfigError> {
        if snapshots.is_empty() {
            return Err(ConfigError::EmptyNetwork);
        }
        Ok(Self { snapshots })
    }

    /// Build from `(t, i, j)` contact triples.
    ///
    /// The sequence spans ticks `0..=max_t`; ticks with no triple become
    /// empty snapshots. Within a tick, contacts keep their input order.
    pub fn from_triples<I>(triples: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (usize, NodeId, NodeId)>,
    {
        let mut by_tick: BTreeMap<usize, Snapshot> = BTreeMap::new();
        for (t, i, j) in triples {
            by_tick.entry(t).or_default().push((i, j));
        }

        let len = match by_tick.keys().next_back() {
            Some(&max_t) => max_t + 1,
            None => return Err(ConfigError::EmptyNetwork),
        };

        let mut snapshots = vec![Snapshot::new(); len];
        for (t, contacts) in by_tick {
            snapshots[t] = contacts;
        }

        Self::new(snapshots)
    }

    /// Number of snapshots in one pass.
    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[inline]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    #[inline]
    pub fn snapshot(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Total number of contacts over all snapshots.
    pub fn contact_count(&self) -> usize {
        self.snapshots.iter().map(Vec::len).sum()
    }

    /// Check every contact against a population of `population` nodes.
    pub fn validate_nodes(&self, population: usize) -> Result<(), ConfigError> {
        for (tick, snapshot) in self.snapshots.iter().enumerate() {
            for &(i, j) in snapshot {
                if i == j {
                    return Err(ConfigError::SelfContact { tick, node: i });
                }
                if let Some(node) = [i, j].into_iter().find(|&n| n >= population) {
                    return Err(ConfigError::NodeOutOfRange {
                        tick,
                        node,
                        population,
                    });
                }
            }
        }
        Ok(())
    }

    /// Endless snapshot iterator whose first pass starts at `start_offset`.
    ///
    /// After the last snapshot the cursor wraps to index 0, and every later
    /// pass covers the whole sequence. `start_offset` must be below `len()`.
    pub fn cursor(&self, start_offset: usize) -> SnapshotCursor<'_> {
        debug_assert!(start_offset < self.len());
        SnapshotCursor {
            network: self,
            position: start_offset,
            pass: 0,
        }
    }
}

/// Iterator over snapshots with wraparound. Never returns `None`.
#[derive(Clone, Debug)]
pub struct SnapshotCursor<'a> {
    network: &'a TemporalNetwork,
    position: usize,
    pass: usize,
}

impl<'a> SnapshotCursor<'a> {
    /// Index of the snapshot the next call to `next` yields.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of completed wraparounds.
    #[inline]
    pub fn pass(&self) -> usize {
        self.pass
    }
}

impl<'a> Iterator for SnapshotCursor<'a> {
    type Item = &'a Snapshot;

    fn next(&mut self) -> Option<Self::Item> {
        let snapshot = self.network.snapshots.get(self.position)?;
        self.position += 1;
        if self.position == self.network.len() {
            self.position = 0;
            self.pass += 1;
        }
        Some(snapshot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
