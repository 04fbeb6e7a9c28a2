//! Stateless rewrite of raw records into integer-coded records.

use crate::cache::IndexedAttribute;
use crate::error::CacheError;
use crate::exec::Executor;
use crate::index::ValueId;
use crate::record::{Record, check_arity};
use tracing::info;

/// Encode one record against the built indices.
///
/// Pure function of its inputs: the same record and attributes always
/// produce the same output, regardless of partitioning or schedule. A value
/// missing from its attribute's index is an error, never a sentinel id.
pub fn encode_record(
    attributes: &[IndexedAttribute],
    record: &Record<String>,
) -> Result<Record<ValueId>, CacheError> {
    check_arity(record, attributes.len())?;
    let mut values = Vec::with_capacity(record.values.len());
    for (attr, raw) in attributes.iter().zip(&record.values) {
        values.push(attr.index.id_of(raw)?);
    }
    Ok(Record {
        id: record.id.clone(),
        file_id: record.file_id.clone(),
        values,
    })
}

/// Rewrite every partition independently, preserving the partition shape.
///
/// The first failing record aborts the whole transformation.
pub(crate) fn transform_partitions(
    exec: &Executor,
    attributes: &[IndexedAttribute],
    parts: &[Vec<Record<String>>],
) -> Result<Vec<Vec<Record<ValueId>>>, CacheError> {
    let out = exec.try_map_partitions(parts, |_idx, chunk| {
        chunk
            .iter()
            .map(|record| encode_record(attributes, record))
            .collect::<Result<Vec<_>, _>>()
    })?;
    info!(
        partitions = out.len(),
        records = out.iter().map(Vec::len).sum::<usize>(),
        "records transformed to value ids"
    );
    Ok(out)
}
