//! Local execution substrate: partitioned map, barrier, broadcast.
//!
//! The core only asks three things of its runtime: run a function over every
//! partition of a collection, don't hand back results until all partitions
//! have finished (the barrier), and replicate an immutable value to every
//! worker. [`Executor`] satisfies the first two with rayon; [`Broadcast`]
//! satisfies the third with an `Arc`. A distributed runtime can stand in for
//! either without touching the rest of the crate.

use rayon::prelude::*;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
pub enum ExecMode {
    Sequential,
    Parallel {
        threads: Option<usize>,
        partitions: Option<usize>,
    },
}

pub struct Executor {
    pub mode: ExecMode,
    pub default_partitions: usize,
}

impl Default for Executor {
    fn default() -> Self {
        Self {
            mode: ExecMode::Parallel {
                threads: None,
                partitions: None,
            },
            default_partitions: 2 * num_cpus::get().max(2),
        }
    }
}

impl Executor {
    pub fn sequential() -> Self {
        Self {
            mode: ExecMode::Sequential,
            ..Default::default()
        }
    }

    pub fn parallel(threads: Option<usize>, partitions: Option<usize>) -> Self {
        Self {
            mode: ExecMode::Parallel { threads, partitions },
            ..Default::default()
        }
    }

    /// Number of partitions to split a collection of `len` elements into.
    pub fn partitions_for(&self, len: usize) -> usize {
        let requested = match self.mode {
            ExecMode::Sequential => 1,
            ExecMode::Parallel { partitions, .. } => partitions.unwrap_or(self.default_partitions),
        };
        requested.max(1).min(len.max(1))
    }

    /// Split a flat collection into contiguous partitions per the exec mode.
    pub fn split<T>(&self, v: Vec<T>) -> Vec<Vec<T>> {
        let parts = self.partitions_for(v.len());
        split_vec(v, parts)
    }

    /// Run `f` once per partition and return one result per partition.
    ///
    /// Returning from this call is the barrier: every partition's work is
    /// fully materialized before any result is observable.
    pub fn map_partitions<T, U, F>(&self, parts: &[Vec<T>], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(usize, &[T]) -> U + Sync,
    {
        match self.mode {
            ExecMode::Sequential => parts
                .iter()
                .enumerate()
                .map(|(i, chunk)| f(i, chunk))
                .collect(),
            ExecMode::Parallel { threads, .. } => {
                if let Some(t) = threads {
                    // ok() to ignore "already built" on repeated calls in tests
                    rayon::ThreadPoolBuilder::new()
                        .num_threads(t)
                        .build_global()
                        .ok();
                }
                parts
                    .par_iter()
                    .enumerate()
                    .map(|(i, chunk)| f(i, chunk))
                    .collect()
            }
        }
    }

    /// Fallible variant of [`map_partitions`](Self::map_partitions); the
    /// first error aborts the whole map.
    pub fn try_map_partitions<T, U, E, F>(&self, parts: &[Vec<T>], f: F) -> Result<Vec<U>, E>
    where
        T: Sync,
        U: Send,
        E: Send,
        F: Fn(usize, &[T]) -> Result<U, E> + Sync,
    {
        match self.mode {
            ExecMode::Sequential => parts
                .iter()
                .enumerate()
                .map(|(i, chunk)| f(i, chunk))
                .collect(),
            ExecMode::Parallel { threads, .. } => {
                if let Some(t) = threads {
                    rayon::ThreadPoolBuilder::new()
                        .num_threads(t)
                        .build_global()
                        .ok();
                }
                parts
                    .par_iter()
                    .enumerate()
                    .map(|(i, chunk)| f(i, chunk))
                    .collect()
            }
        }
    }
}

/// Split a vec into at most `n` contiguous chunks.
pub fn split_vec<T>(v: Vec<T>, n: usize) -> Vec<Vec<T>> {
    let len = v.len();
    if n <= 1 || len <= 1 {
        return vec![v];
    }
    let chunk = len.div_ceil(n);
    let mut out = Vec::with_capacity(n);
    let mut v = v;
    while v.len() > chunk {
        let rest = v.split_off(chunk);
        out.push(v);
        v = rest;
    }
    out.push(v);
    out
}

/// Immutable value replicated to every worker.
///
/// Workers read through the handle locally; nothing is transferred per use.
/// Cloning the handle never clones the payload.
#[derive(Clone, Debug)]
pub struct Broadcast<T>(Arc<T>);

impl<T> Deref for Broadcast<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

pub fn broadcast<T>(value: T) -> Broadcast<T> {
    Broadcast(Arc::new(value))
}
