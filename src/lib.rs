//! # Reclink
//!
//! **Statistics gathering and attribute-value indexing** for distributed
//! Bayesian record linkage. Reclink takes a partitioned collection of raw
//! records, gathers global value frequencies in a single pass, and builds a
//! compact per-attribute index - a dense value↔id bijection plus a
//! frequency-weighted sampler - that an inference engine consumes to
//! propose plausible attribute-value distortions.
//!
//! ## Key Features
//!
//! - **Single-pass statistics** - file sizes and per-attribute value counts
//!   gathered together over one partitioned scan
//! - **Merge-commutative counters** - per-partition tallies merged at a
//!   barrier, safe under partition re-execution
//! - **Dense bidirectional indices** - deterministic id assignment,
//!   `id_of`/`value_of` round-trips for every observed value
//! - **Frequency-weighted sampling** - O(1) alias-method draws with
//!   precomputed aids per expected cluster size
//! - **Immutable, broadcastable snapshot** - build once on the driver,
//!   replicate to every worker
//! - **Sequential and parallel execution** - choose the right mode for your
//!   workload
//!
//! ## Quick Start
//!
//! ```ignore
//! use reclink::*;
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//!
//! # fn main() -> Result<(), CacheError> {
//! let exec = Executor::default();
//!
//! let records = vec![
//!     Record::new("r1", "f1", vec!["ann".to_string()]),
//!     Record::new("r2", "f1", vec!["bob".to_string()]),
//!     Record::new("r3", "f2", vec!["ann".to_string()]),
//! ];
//! let specs = vec![AttributeSpec::new(
//!     "name",
//!     SimilarityRef::Levenshtein,
//!     DistortionPrior::new(1.0, 99.0),
//! )];
//!
//! // One pass gathers counts; the cache holds one index per attribute.
//! let cache = RecordsCache::build_from_records(&exec, records.clone(), specs, 10)?;
//! assert_eq!(cache.num_records(), 3);
//!
//! // Rewrite raw values into dense integer ids.
//! let parts = exec.split(records);
//! let coded = cache.transform_records(&exec, &parts)?;
//!
//! // Frequency-weighted proposal draws with a worker-local generator.
//! let mut rng = SmallRng::seed_from_u64(7);
//! let index = &cache.attributes()[0].index;
//! let proposal = index.sample(&mut rng, 3);
//! println!("proposed {}", index.value_of(proposal)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Execution substrate
//!
//! The core asks three things of its runtime: a partitioned map, a barrier
//! between "pass complete" and "counts readable", and replication of an
//! immutable value to every worker. [`Executor`] provides the first two
//! locally (rayon-backed or sequential); [`broadcast`] provides the third.
//! A distributed runtime can satisfy the same contracts instead.
//!
//! ### Counting pass
//!
//! [`CounterRegistry`] names the counters of one pass up front - duplicate
//! names fail before any work is dispatched - and
//! [`CounterRegistry::run`] folds every partition into fresh local tallies
//! before merging them. Counting is commutative, so no ordering among
//! records or partitions is required, and a re-executed partition
//! recomputes its contribution instead of appending to it.
//!
//! ### Attribute index
//!
//! [`AttributeIndex`] assigns each distinct observed value a dense id in
//! `[0, domain_size)` - most frequent value first, ties broken
//! lexicographically - and samples values proportional to frequency via
//! Walker/Vose alias tables. Aids for cluster sizes up to a configured
//! maximum are precomputed; sampling takes the caller's worker-local
//! generator and never mutates shared state.
//!
//! ### Records cache
//!
//! [`RecordsCache`] is the assembled snapshot: indexed attributes in spec
//! order, per-file record counts, and derived totals. It is immutable after
//! [`RecordsCache::build`] and is read-only to
//! [`RecordsCache::transform_records`], which rewrites raw records into
//! `Record<ValueId>` deterministically and independently per partition.
//!
//! ## Errors
//!
//! All failure modes are typed in [`CacheError`]: schema mismatches and
//! unseen values are distinct variants, an empty value domain fails index
//! construction, and counter-name conflicts fail before the pass starts.
//! Construction errors abort the whole build; unseen values are never
//! silently mapped to a default id.
//!
//! ## Logging
//!
//! Progress events (counts gathered, per-attribute indexing, assembly) are
//! emitted through [`tracing`]; install a subscriber to collect them. They
//! are informational only - correctness never depends on them.
//!
//! ## Module Overview
//!
//! - [`record`] - record shape and attribute descriptors
//! - [`counter`] - merge-commutative counting across partitions
//! - [`index`] - per-attribute value index and sampler
//! - [`cache`] - statistics pass orchestration and the cache snapshot
//! - [`transform`] - stateless record rewrite
//! - [`exec`] - local execution substrate (partitioned map, broadcast)
//! - [`error`] - the failure taxonomy

pub mod cache;
pub mod counter;
pub mod error;
pub mod exec;
pub mod index;
pub mod record;
pub mod transform;

pub use cache::{IndexedAttribute, RecordsCache};
pub use counter::{CounterId, CounterRegistry, GlobalCounts, Tally, TallySet};
pub use error::CacheError;
pub use exec::{Broadcast, ExecMode, Executor, broadcast, split_vec};
pub use index::{AliasTable, AttributeIndex, ValueId};
pub use record::{AttributeSpec, DistortionPrior, Record, SimilarityRef};
pub use transform::encode_record;
