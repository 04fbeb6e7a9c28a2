//! Per-attribute value index: dense value↔id bijection plus a
//! frequency-weighted sampler.
//!
//! An [`AttributeIndex`] is built once, on the driver, from the final global
//! counts of the statistics pass, and never mutated afterwards. Ids are
//! assigned deterministically - descending observed count, ties broken by
//! ascending value - so repeated builds over the same input produce the
//! same mapping regardless of the order partial counts arrived in.
//!
//! Sampling draws a value with probability proportional to its observed
//! frequency, which the inference engine uses as a proposal prior over
//! attribute-value distortions. Because proposals are drawn many times per
//! iteration, the index precomputes one alias table per expected cluster
//! size up to a configured maximum; a `sample` call with a hint in that
//! range is O(1) with no setup cost. The random generator is always passed
//! in by the caller and is worker-local state - nothing in the index is
//! mutated by sampling.

use crate::error::CacheError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dense integer identifier for one attribute value, in `[0, domain_size)`.
///
/// Opaque handle; only the index maps it back to a raw value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ValueId(u32);

impl ValueId {
    pub(crate) fn new(v: u32) -> Self {
        Self(v)
    }

    /// Reconstruct an id from its numeric value, e.g. one read back from
    /// columnar output. [`AttributeIndex::value_of`] still range-checks it.
    pub fn from_raw(v: u32) -> Self {
        Self(v)
    }

    /// Return the underlying numeric value.
    ///
    /// Useful mainly for debugging or columnar output.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Walker/Vose alias table: O(n) construction, O(1) weighted draws.
///
/// Construction is deterministic given the weight slice. Weights must be
/// non-empty with a positive sum; the index upholds this before building.
#[derive(Clone, Debug)]
pub struct AliasTable {
    prob: Vec<f64>,
    alias: Vec<u32>,
}

impl AliasTable {
    pub fn new(weights: &[f64]) -> Self {
        debug_assert!(!weights.is_empty());
        let n = weights.len();
        let total: f64 = weights.iter().sum();
        debug_assert!(total > 0.0);

        #[allow(clippy::cast_precision_loss)]
        let mut scaled: Vec<f64> = weights.iter().map(|w| w * n as f64 / total).collect();
        let mut prob = vec![1.0f64; n];
        let mut alias: Vec<u32> = (0..n as u32).collect();

        let mut small: Vec<usize> = Vec::new();
        let mut large: Vec<usize> = Vec::new();
        for (i, &p) in scaled.iter().enumerate() {
            if p < 1.0 {
                small.push(i);
            } else {
                large.push(i);
            }
        }

        while let (Some(s), Some(l)) = (small.pop(), large.pop()) {
            prob[s] = scaled[s];
            alias[s] = l as u32;
            scaled[l] = (scaled[l] + scaled[s]) - 1.0;
            if scaled[l] < 1.0 {
                small.push(l);
            } else {
                large.push(l);
            }
        }
        // Entries left on either worklist keep prob 1.0 and alias to themselves.

        Self { prob, alias }
    }

    pub fn len(&self) -> usize {
        self.prob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    /// Draw one slot index with probability proportional to its weight.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let i = rng.random_range(0..self.prob.len());
        if rng.random::<f64>() < self.prob[i] {
            i
        } else {
            self.alias[i] as usize
        }
    }
}

/// Immutable bidirectional index over one attribute's observed values.
#[derive(Clone, Debug)]
pub struct AttributeIndex {
    attribute: String,
    values: Vec<String>,
    ids: HashMap<String, ValueId>,
    counts: Vec<u64>,
    total: u64,
    aids: Vec<AliasTable>,
}

impl AttributeIndex {
    /// Build the index from the final global counts of one attribute.
    ///
    /// `expected_max_cluster_size` bounds how many per-size sampling aids
    /// are precomputed; hints beyond it fall back to on-the-fly setup.
    pub fn from_counts(
        attribute: &str,
        counts: &HashMap<String, u64>,
        expected_max_cluster_size: usize,
    ) -> Result<Self, CacheError> {
        let mut pairs: Vec<(&String, u64)> = counts
            .iter()
            .filter(|(_, c)| **c > 0)
            .map(|(v, &c)| (v, c))
            .collect();
        if pairs.is_empty() {
            return Err(CacheError::EmptyDomain {
                attribute: attribute.to_string(),
            });
        }

        // Deterministic id order: most frequent first, then lexicographic.
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let values: Vec<String> = pairs.iter().map(|(v, _)| (*v).clone()).collect();
        let counts: Vec<u64> = pairs.iter().map(|(_, c)| *c).collect();
        let total: u64 = counts.iter().sum();
        let ids: HashMap<String, ValueId> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), ValueId::new(i as u32)))
            .collect();

        let mut index = Self {
            attribute: attribute.to_string(),
            values,
            ids,
            counts,
            total,
            aids: Vec::new(),
        };
        index.aids = (1..=expected_max_cluster_size)
            .map(|size| AliasTable::new(&index.proposal_weights(size)))
            .collect();
        Ok(index)
    }

    /// Name of the attribute this index was built for.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Number of distinct observed values.
    pub fn domain_size(&self) -> usize {
        self.values.len()
    }

    /// Total number of observations across all values.
    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Number of precomputed per-cluster-size sampling aids.
    pub fn cached_sizes(&self) -> usize {
        self.aids.len()
    }

    /// Resolve a raw value to its dense id.
    pub fn id_of(&self, value: &str) -> Result<ValueId, CacheError> {
        self.ids
            .get(value)
            .copied()
            .ok_or_else(|| CacheError::UnseenValue {
                attribute: self.attribute.clone(),
                value: value.to_string(),
            })
    }

    /// Resolve a dense id back to its raw value.
    pub fn value_of(&self, id: ValueId) -> Result<&str, CacheError> {
        self.values
            .get(id.raw() as usize)
            .map(String::as_str)
            .ok_or_else(|| self.out_of_range(id))
    }

    /// Observed count for a value id.
    pub fn count_of(&self, id: ValueId) -> Result<u64, CacheError> {
        self.counts
            .get(id.raw() as usize)
            .copied()
            .ok_or_else(|| self.out_of_range(id))
    }

    /// Empirical probability of a value id among all observations.
    #[allow(clippy::cast_precision_loss)]
    pub fn prob_of(&self, id: ValueId) -> Result<f64, CacheError> {
        Ok(self.count_of(id)? as f64 / self.total as f64)
    }

    /// Draw a value id with probability proportional to its observed
    /// frequency.
    ///
    /// `cluster_size_hint` selects a precomputed sampling aid when it lies
    /// in `1..=expected_max_cluster_size`; other hints pay the O(domain)
    /// setup cost for a one-off table. The generator is worker-local and
    /// supplied by the caller; sampling never mutates the index.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, cluster_size_hint: usize) -> ValueId {
        match cluster_size_hint
            .checked_sub(1)
            .and_then(|i| self.aids.get(i))
        {
            Some(table) => ValueId::new(table.sample(rng) as u32),
            None => {
                let table = AliasTable::new(&self.proposal_weights(cluster_size_hint));
                ValueId::new(table.sample(rng) as u32)
            }
        }
    }

    /// Proposal weights for a cluster of the given expected size.
    ///
    /// The current proposal family is size-independent: every size maps to
    /// the raw observed counts.
    #[allow(clippy::cast_precision_loss)]
    fn proposal_weights(&self, _cluster_size: usize) -> Vec<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }

    fn out_of_range(&self, id: ValueId) -> CacheError {
        CacheError::IdOutOfRange {
            attribute: self.attribute.clone(),
            id: id.raw(),
            domain_size: self.domain_size(),
        }
    }
}
