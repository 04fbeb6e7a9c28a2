//! Record and attribute descriptors shared across the pipeline.
//!
//! A [`Record<V>`] is generic over its value type so the same shape carries
//! raw strings before indexing and dense [`ValueId`](crate::index::ValueId)s
//! after. [`AttributeSpec`] describes one attribute as supplied by upstream
//! configuration: its name, which similarity function the inference engine
//! should apply, and the beta-prior hyperparameters for its distortion
//! probability.

use crate::error::CacheError;
use serde::{Deserialize, Serialize};

/// One row of the input collection.
///
/// `values` is ordered to match the attribute-spec order; every record in a
/// collection must carry exactly one value per attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<V> {
    /// Identifier assigned by the upstream loader, unique within a run.
    pub id: String,
    /// Identifier of the source file this record was loaded from.
    pub file_id: String,
    /// Attribute values, one per attribute, in spec order.
    pub values: Vec<V>,
}

impl<V> Record<V> {
    pub fn new(id: impl Into<String>, file_id: impl Into<String>, values: Vec<V>) -> Self {
        Self {
            id: id.into(),
            file_id: file_id.into(),
            values,
        }
    }
}

/// Reference to a similarity function implemented by the inference engine.
///
/// Implementations live outside this crate; the cache only carries the tag
/// through to the engine alongside the built index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimilarityRef {
    /// All value pairs are equally (dis)similar; comparison is exact-match.
    Constant,
    /// Edit-distance based similarity.
    Levenshtein,
}

/// Beta-prior hyperparameters for an attribute's distortion probability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistortionPrior {
    pub alpha: f64,
    pub beta: f64,
}

impl DistortionPrior {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }
}

/// Configuration-supplied description of one attribute.
///
/// The order of a spec list must match the order of `values` in every record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    pub similarity: SimilarityRef,
    pub distortion_prior: DistortionPrior,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, similarity: SimilarityRef, prior: DistortionPrior) -> Self {
        Self {
            name: name.into(),
            similarity,
            distortion_prior: prior,
        }
    }
}

/// Check that a record carries exactly `expected` attribute values.
pub(crate) fn check_arity<V>(record: &Record<V>, expected: usize) -> Result<(), CacheError> {
    if record.values.len() != expected {
        return Err(CacheError::SchemaMismatch {
            record_id: record.id.clone(),
            expected,
            found: record.values.len(),
        });
    }
    Ok(())
}
