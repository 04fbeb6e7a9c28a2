//! The records cache: one statistics pass, one index per attribute, one
//! immutable snapshot.
//!
//! [`RecordsCache::build`] orchestrates the whole statistics stage. It
//! validates record arity up front, registers one counter for file sizes
//! and one per attribute, makes exactly one pass over the partitioned
//! collection, and - once the pass barrier has been crossed - builds an
//! [`AttributeIndex`] per attribute from the final global counts. The
//! resulting snapshot is immutable; replicate it to workers with
//! [`broadcast`](crate::exec::broadcast) and it stays valid for the whole
//! inference run. Record and attribute totals are derived from the
//! snapshot, never gathered separately.
//!
//! # Example
//!
//! ```ignore
//! use reclink::*;
//!
//! let exec = Executor::default();
//! let parts: Vec<Vec<Record<String>>> = load_partitions();
//! let specs = vec![AttributeSpec::new(
//!     "name",
//!     SimilarityRef::Levenshtein,
//!     DistortionPrior::new(1.0, 99.0),
//! )];
//!
//! let cache = RecordsCache::build(&exec, &parts, specs, 10)?;
//! let coded = cache.transform_records(&exec, &parts)?;
//! let shared = broadcast(cache); // hand a clone of the handle to each worker
//! ```

use crate::counter::CounterRegistry;
use crate::error::CacheError;
use crate::exec::{Broadcast, Executor, broadcast};
use crate::index::{AttributeIndex, ValueId};
use crate::record::{AttributeSpec, Record, check_arity};
use crate::transform;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::info;

/// An attribute's configuration paired with its built index.
#[derive(Clone, Debug)]
pub struct IndexedAttribute {
    pub spec: AttributeSpec,
    pub index: AttributeIndex,
}

/// Immutable snapshot of the statistics pass: per-attribute indices plus
/// observed file sizes.
#[derive(Clone, Debug)]
pub struct RecordsCache {
    attributes: Vec<IndexedAttribute>,
    file_sizes: HashMap<String, u64>,
    num_records: u64,
}

impl RecordsCache {
    /// Build the cache from a partitioned record collection.
    ///
    /// Duplicate attribute names surface as
    /// [`CacheError::CounterConflict`] at registration, before anything is
    /// dispatched; every record must carry exactly `specs.len()` values,
    /// checked over the whole collection before the counting pass runs. An
    /// attribute with no observed values fails indexing with
    /// [`CacheError::EmptyDomain`]. On any error the build aborts whole -
    /// no partial cache is ever returned.
    ///
    /// `expected_max_cluster_size` bounds the per-attribute sampling-aid
    /// cache (see [`AttributeIndex::sample`]).
    pub fn build(
        exec: &Executor,
        parts: &[Vec<Record<String>>],
        specs: Vec<AttributeSpec>,
        expected_max_cluster_size: usize,
    ) -> Result<Self, CacheError> {
        // Name conflicts and malformed records both fail before the
        // counting pass is dispatched.
        let mut registry = CounterRegistry::new();
        let file_counter = registry.register("file-sizes")?;
        let mut attr_counters = Vec::with_capacity(specs.len());
        for spec in &specs {
            attr_counters.push(registry.register(&format!("values/{}", spec.name))?);
        }

        let expected = specs.len();
        exec.try_map_partitions(parts, |_idx, chunk| -> Result<(), CacheError> {
            for record in chunk {
                check_arity(record, expected)?;
            }
            Ok(())
        })?;

        info!(
            partitions = parts.len(),
            attributes = specs.len(),
            "gathering record statistics"
        );

        let counts = registry.run(exec, parts, |record, tallies| {
            tallies.add(file_counter, &record.file_id, 1);
            for (counter, value) in attr_counters.iter().zip(&record.values) {
                tallies.add(*counter, value, 1);
            }
        });

        let file_sizes = counts.value(file_counter).clone().into_counts();
        let num_records: u64 = file_sizes.values().sum();
        info!(
            records = num_records,
            files = file_sizes.len(),
            "record statistics gathered"
        );

        let mut attributes = Vec::with_capacity(specs.len());
        for (spec, counter) in specs.into_iter().zip(attr_counters) {
            let index = AttributeIndex::from_counts(
                &spec.name,
                counts.value(counter).counts(),
                expected_max_cluster_size,
            )?;
            info!(
                attribute = %spec.name,
                domain_size = index.domain_size(),
                "attribute indexed"
            );
            attributes.push(IndexedAttribute { spec, index });
        }

        info!(attributes = attributes.len(), "records cache assembled");
        Ok(Self {
            attributes,
            file_sizes,
            num_records,
        })
    }

    /// Convenience wrapper over [`build`](Self::build) that partitions a
    /// flat collection per the executor's mode first.
    pub fn build_from_records(
        exec: &Executor,
        records: Vec<Record<String>>,
        specs: Vec<AttributeSpec>,
        expected_max_cluster_size: usize,
    ) -> Result<Self, CacheError> {
        let parts = exec.split(records);
        Self::build(exec, &parts, specs, expected_max_cluster_size)
    }

    /// Total record count, derived from the file-size tallies.
    pub fn num_records(&self) -> u64 {
        self.num_records
    }

    /// Number of indexed attributes.
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Observed record count per source file.
    pub fn file_sizes(&self) -> &HashMap<String, u64> {
        &self.file_sizes
    }

    /// Indexed attributes, in spec order.
    pub fn attributes(&self) -> &[IndexedAttribute] {
        &self.attributes
    }

    /// Look an attribute up by name.
    pub fn attribute_named(&self, name: &str) -> Option<&IndexedAttribute> {
        self.attributes.iter().find(|a| a.spec.name == name)
    }

    /// Rewrite raw records into integer-coded records, partition by
    /// partition.
    ///
    /// The cache is only read; the output collection mirrors the input
    /// partitioning. Any record with a value absent from its attribute's
    /// index fails the whole transformation with
    /// [`CacheError::UnseenValue`].
    pub fn transform_records(
        &self,
        exec: &Executor,
        parts: &[Vec<Record<String>>],
    ) -> Result<Vec<Vec<Record<ValueId>>>, CacheError> {
        transform::transform_partitions(exec, &self.attributes, parts)
    }

    /// Wrap the finished cache in a [`Broadcast`] handle for replication.
    pub fn into_broadcast(self) -> Broadcast<RecordsCache> {
        broadcast(self)
    }

    /// JSON status snapshot for operator-facing reporting.
    pub fn summary(&self) -> Value {
        json!({
            "num_records": self.num_records,
            "num_files": self.file_sizes.len(),
            "num_attributes": self.attributes.len(),
            "attributes": self.attributes.iter().map(|a| json!({
                "name": a.spec.name,
                "domain_size": a.index.domain_size(),
                "total_count": a.index.total_count(),
                "cached_sizes": a.index.cached_sizes(),
            })).collect::<Vec<_>>(),
        })
    }
}
