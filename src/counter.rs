//! Merge-commutative counting across partitions.
//!
//! Counting runs in two phases, the same shape the statistics pass takes on
//! any data-parallel runtime: each partition folds its records into a fresh
//! local [`TallySet`], and the driver merges all partition sets once the
//! partitioned map has returned. The merge point is the barrier - there is
//! no way to observe counts while the pass is still running.
//!
//! Re-execution safety: a partition's contribution is the whole `TallySet`
//! it returns. A re-run partition recomputes that set from scratch and the
//! merge still sees exactly one set per partition, so transient retries can
//! never double-count.
//!
//! # Example
//!
//! ```
//! use reclink::{CounterRegistry, Executor};
//!
//! # fn main() -> Result<(), reclink::CacheError> {
//! let mut registry = CounterRegistry::new();
//! let words = registry.register("words")?;
//!
//! let parts: Vec<Vec<String>> = vec![
//!     vec!["a".into(), "b".into()],
//!     vec!["a".into()],
//! ];
//! let counts = registry.run(&Executor::sequential(), &parts, |word, tallies| {
//!     tallies.add(words, word, 1);
//! });
//! assert_eq!(counts.value(words).get("a"), 2);
//! # Ok(())
//! # }
//! ```

use crate::error::CacheError;
use crate::exec::Executor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A key→count accumulator whose merge is associative and commutative.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    counts: HashMap<String, u64>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `amount` against `key`.
    pub fn add(&mut self, key: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        *self.counts.entry(key.to_string()).or_insert(0) += amount;
    }

    /// Fold another tally into this one.
    pub fn merge(&mut self, other: Tally) {
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    /// Count recorded for `key` (zero if never added).
    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Sum over all keys.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct keys observed.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &HashMap<String, u64> {
        &self.counts
    }

    pub fn into_counts(self) -> HashMap<String, u64> {
        self.counts
    }
}

/// Handle for one registered counter. Cheap to copy into partition closures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterId(usize);

/// Named counters for one statistics pass.
///
/// All registration happens up front, on the driver, before any partitioned
/// work is dispatched; a duplicate name is surfaced immediately as
/// [`CacheError::CounterConflict`].
#[derive(Debug, Default)]
pub struct CounterRegistry {
    names: Vec<String>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a counter under a unique name.
    pub fn register(&mut self, name: &str) -> Result<CounterId, CacheError> {
        if self.names.iter().any(|n| n == name) {
            return Err(CacheError::CounterConflict {
                name: name.to_string(),
            });
        }
        self.names.push(name.to_string());
        Ok(CounterId(self.names.len() - 1))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Run one counting pass: fold every record of every partition through
    /// `f`, then merge the per-partition tallies.
    ///
    /// Each partition gets a fresh [`TallySet`], so a re-executed partition
    /// fully recomputes its contribution. The returned [`GlobalCounts`] is
    /// only constructed after the partitioned map has completed.
    pub fn run<T, F>(&self, exec: &Executor, parts: &[Vec<T>], f: F) -> GlobalCounts
    where
        T: Sync,
        F: Fn(&T, &mut TallySet) + Sync,
    {
        let locals: Vec<TallySet> = exec.map_partitions(parts, |_idx, chunk| {
            let mut tallies = TallySet::new(self.names.len());
            for item in chunk {
                f(item, &mut tallies);
            }
            tallies
        });

        debug!(
            partitions = locals.len(),
            counters = self.names.len(),
            "merging partition tallies"
        );

        let mut merged = TallySet::new(self.names.len());
        for local in locals {
            merged.merge(local);
        }
        GlobalCounts {
            names: self.names.clone(),
            tallies: merged.tallies,
        }
    }
}

/// Per-partition scratch: one [`Tally`] per registered counter.
#[derive(Clone, Debug)]
pub struct TallySet {
    tallies: Vec<Tally>,
}

impl TallySet {
    fn new(counters: usize) -> Self {
        Self {
            tallies: vec![Tally::new(); counters],
        }
    }

    /// Accumulate `amount` against `key` on the counter `id`.
    pub fn add(&mut self, id: CounterId, key: &str, amount: u64) {
        self.tallies[id.0].add(key, amount);
    }

    fn merge(&mut self, other: TallySet) {
        debug_assert_eq!(self.tallies.len(), other.tallies.len());
        for (acc, local) in self.tallies.iter_mut().zip(other.tallies) {
            acc.merge(local);
        }
    }
}

/// Final counts, readable only after the pass barrier.
#[derive(Clone, Debug)]
pub struct GlobalCounts {
    names: Vec<String>,
    tallies: Vec<Tally>,
}

impl GlobalCounts {
    /// Final tally for a registered counter.
    pub fn value(&self, id: CounterId) -> &Tally {
        &self.tallies[id.0]
    }

    /// Look a counter up by name.
    pub fn by_name(&self, name: &str) -> Option<&Tally> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.tallies[i])
    }
}
