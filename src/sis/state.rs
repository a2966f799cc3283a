//! Infection state of one realization.
//!
//! Pairs a per-node slot table with an unordered list of infected nodes.
//! A node is infected exactly when its slot holds its index in the list, so
//! membership tests, infection and recovery are all O(1).

use rand::Rng;

use super::network::{NodeId, Snapshot};
use super::sampling::choose_random_unique;

/// Infected/susceptible membership over a fixed population.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpidemicState {
    /// `slot[node]` is the node's position in `infected`, if infected.
    slot: Vec<Option<usize>>,
    infected: Vec<NodeId>,
}

impl EpidemicState {
    /// All-susceptible state over `population` nodes.
    pub fn new(population: usize) -> Self {
        Self {
            slot: vec![None; population],
            infected: Vec::new(),
        }
    }

    /// Reset and infect `initial_infected` nodes chosen uniformly at random.
    ///
    /// # Panics
    /// Panics if `initial_infected` exceeds the population; the ensemble
    /// driver rejects that configuration before seeding.
    pub fn seed<R: Rng + ?Sized>(&mut self, initial_infected: usize, rng: &mut R) {
        self.clear();
        let mut candidates: Vec<NodeId> = (0..self.population()).collect();
        for &node in choose_random_unique(&mut candidates, initial_infected, rng) {
            self.mark_infected(node);
        }
    }

    /// Make every node susceptible.
    pub fn clear(&mut self) {
        for &node in &self.infected {
            self.slot[node] = None;
        }
        self.infected.clear();
    }

    #[inline]
    pub fn population(&self) -> usize {
        self.slot.len()
    }

    /// `I`, the number of infected nodes.
    #[inline]
    pub fn infected_count(&self) -> usize {
        self.infected.len()
    }

    /// Infected nodes in no particular order.
    #[inline]
    pub fn infected(&self) -> &[NodeId] {
        &self.infected
    }

    #[inline]
    pub fn is_infected(&self, node: NodeId) -> bool {
        self.slot[node].is_some()
    }

    /// Infect `node`. Returns false if it was already infected.
    pub fn mark_infected(&mut self, node: NodeId) -> bool {
        if self.slot[node].is_some() {
            return false;
        }
        self.slot[node] = Some(self.infected.len());
        self.infected.push(node);
        true
    }

    /// Recover `node`. Returns false if it was already susceptible.
    pub fn mark_susceptible(&mut self, node: NodeId) -> bool {
        match self.slot[node] {
            Some(index) => {
                self.recover_at(index);
                true
            }
            None => false,
        }
    }

    /// Recover the node at `index` of [`infected`](Self::infected).
    ///
    /// The last infected node takes its place (swap-remove).
    pub fn recover_at(&mut self, index: usize) -> NodeId {
        let node = self.infected.swap_remove(index);
        self.slot[node] = None;
        if let Some(&moved) = self.infected.get(index) {
            self.slot[moved] = Some(index);
        }
        node
    }

    /// Collect the SI exposure multiset of `snapshot` into `exposures`.
    ///
    /// One entry per contact with exactly one infected endpoint, holding the
    /// susceptible endpoint. A susceptible node with several infected
    /// contacts appears once per contact. Returns `SI`.
    pub fn collect_si_exposures(&self, snapshot: &Snapshot, exposures: &mut Vec<NodeId>) -> usize {
        exposures.clear();
        for &(i, j) in snapshot {
            match (self.is_infected(i), self.is_infected(j)) {
                (true, false) => exposures.push(j),
                (false, true) => exposures.push(i),
                _ => {}
            }
        }
        exposures.len()
    }

    /// Allocating variant of [`collect_si_exposures`](Self::collect_si_exposures).
    pub fn si_exposures(&self, snapshot: &Snapshot) -> Vec<NodeId> {
        let mut exposures = Vec::new();
        self.collect_si_exposures(snapshot, &mut exposures);
        exposures
    }

    /// True when slot table and infected list agree.
    pub fn is_consistent(&self) -> bool {
        let listed_ok = self
            .infected
            .iter()
            .enumerate()
            .all(|(index, &node)| self.slot[node] == Some(index));
        let marked = self.slot.iter().filter(|s| s.is_some()).count();
        listed_ok && marked == self.infected.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mark_and_recover() {
        let mut state = EpidemicState::new(5);
        assert!(state.mark_infected(1));
        assert!(state.mark_infected(3));
        assert!(state.mark_infected(4));
        assert!(!state.mark_infected(3));
        assert_eq!(state.infected_count(), 3);

        assert!(state.mark_susceptible(1));
        assert!(!state.mark_susceptible(1));
        assert_eq!(state.infected_count(), 2);
        assert!(!state.is_infected(1));
        assert!(state.is_infected(3));
        assert!(state.is_infected(4));
        assert!(state.is_consistent());
    }

    #[test]
    fn test_recover_at_moves_last() {
        let mut state = EpidemicState::new(4);
        for node in [0, 1, 2] {
            state.mark_infected(node);
        }

        assert_eq!(state.recover_at(0), 0);
        assert_eq!(state.infected(), &[2, 1]);
        assert!(state.is_consistent());

        assert_eq!(state.recover_at(1), 1);
        assert_eq!(state.infected(), &[2]);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_seed_infects_requested_count() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = EpidemicState::new(10);
        state.mark_infected(9);

        state.seed(4, &mut rng);
        assert_eq!(state.infected_count(), 4);
        assert!(state.is_consistent());

        state.seed(10, &mut rng);
        assert_eq!(state.infected_count(), 10);
        assert!((0..10).all(|n| state.is_infected(n)));
    }

    #[test]
    fn test_si_exposures_count_contacts_not_nodes() {
        let mut state = EpidemicState::new(5);
        state.mark_infected(0);
        state.mark_infected(2);

        // 1 touches both infected nodes; 2-0 is II; 3-4 is SS.
        let snapshot = vec![(0, 1), (1, 2), (2, 0), (3, 4), (4, 0)];
        let mut exposures = state.si_exposures(&snapshot);
        exposures.sort_unstable();

        assert_eq!(exposures, vec![1, 1, 4]);
    }

    #[test]
    fn test_si_exposures_reuses_buffer() {
        let mut state = EpidemicState::new(3);
        state.mark_infected(1);
        let mut buffer = vec![99, 98];

        let si = state.collect_si_exposures(&vec![(0, 1)], &mut buffer);
        assert_eq!(si, 1);
        assert_eq!(buffer, vec![0]);
    }

    #[test]
    fn test_random_mutations_stay_consistent() {
        use rand::Rng;

        let mut rng = StdRng::seed_from_u64(99);
        let mut state = EpidemicState::new(30);
        for _ in 0..2_000 {
            let node = rng.gen_range(0..30);
            if rng.gen::<bool>() {
                state.mark_infected(node);
            } else {
                state.mark_susceptible(node);
            }
            assert!(state.is_consistent());
        }
    }
}
