//! Error taxonomy for cache construction and record transformation.
//!
//! Every failure mode is a distinct variant so callers can tell a stale
//! index ([`CacheError::UnseenValue`]) apart from malformed input
//! ([`CacheError::SchemaMismatch`]). Construction-time errors abort the
//! whole build; none of them are retried automatically.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A record's value count does not match the attribute count.
    #[error("record {record_id:?}: expected {expected} attribute values, found {found}")]
    SchemaMismatch {
        record_id: String,
        expected: usize,
        found: usize,
    },

    /// A value was presented that was never observed during the counting pass.
    #[error("value {value:?} was never observed for attribute {attribute:?}")]
    UnseenValue { attribute: String, value: String },

    /// An attribute has no observed values at all.
    #[error("attribute {attribute:?} has an empty value domain")]
    EmptyDomain { attribute: String },

    /// Two counters were registered under the same name.
    #[error("counter {name:?} is already registered")]
    CounterConflict { name: String },

    /// A value id outside `[0, domain_size)` was used for an inverse lookup.
    #[error("value id {id} out of range for attribute {attribute:?} (domain size {domain_size})")]
    IdOutOfRange {
        attribute: String,
        id: u32,
        domain_size: usize,
    },
}
