//! # Cluster Statistics
//!
//! Mean matrix value for every (row-label, col-label) pair. Each worker
//! accumulates sums and counts over the rows it owns; one global sum
//! reduction per array combines them.

/*
 * File: /src/aggregate.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Local accumulation plus a single all-reduce per statistic
 */

use std::ops::Range;

use log::debug;
use ndarray::{s, Array2, ArrayView2};

use crate::comm::Communicator;
use crate::error::{KernelError, Result};
use crate::kernels::Kernels;
use crate::partitioner::Partition;
use crate::Label;

/// Number of row and column clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterDims {
    pub num_row_labels: usize,
    pub num_col_labels: usize,
}

impl ClusterDims {
    pub fn new(num_row_labels: usize, num_col_labels: usize) -> Self {
        Self {
            num_row_labels,
            num_col_labels,
        }
    }

    pub fn num_clusters(&self) -> usize {
        self.num_row_labels * self.num_col_labels
    }
}

/// Sums (in f64) and entry counts per cluster over the rows in `rows`
pub fn local_cluster_stats(
    kernels: &dyn Kernels,
    matrix: ArrayView2<f32>,
    row_labels: &[Label],
    col_labels: &[Label],
    rows: Range<usize>,
    dims: ClusterDims,
) -> Result<(Vec<f64>, Vec<u64>)> {
    let num_clusters = dims.num_clusters();
    let mut sums = vec![0.0f64; num_clusters];
    let mut counts = vec![0u64; num_clusters];

    let ids = kernels.cluster_ids(row_labels, col_labels, dims.num_col_labels, rows.clone())?;
    let slice = matrix.slice(s![rows, ..]);
    if ids.len() != slice.len() {
        return Err(KernelError::ShapeMismatch(format!(
            "{} cluster ids for {} entries",
            ids.len(),
            slice.len()
        ))
        .into());
    }

    for (&item, &c) in slice.iter().zip(&ids) {
        if c >= num_clusters {
            return Err(KernelError::LabelOutOfRange {
                label: (c / dims.num_col_labels.max(1)) as Label,
                bound: dims.num_row_labels,
            }
            .into());
        }
        sums[c] += item as f64;
        counts[c] += 1;
    }
    Ok((sums, counts))
}

/// Compute the cluster-average table, identical on every rank.
///
/// Collective: every rank must call this in the same round.
pub fn aggregate(
    comm: &dyn Communicator,
    kernels: &dyn Kernels,
    matrix: ArrayView2<f32>,
    row_labels: &[Label],
    col_labels: &[Label],
    row_partition: &Partition,
    dims: ClusterDims,
) -> Result<Array2<f32>> {
    let rows = row_partition.range(comm.rank());
    debug!("rank {} aggregating rows {:?}", comm.rank(), rows);

    let (local_sums, local_counts) =
        local_cluster_stats(kernels, matrix, row_labels, col_labels, rows, dims)?;

    let sums = comm.all_reduce_sum_f64(&local_sums)?;
    let counts = comm.all_reduce_sum_u64(&local_counts)?;

    let averages =
        kernels.finalize_averages(&sums, &counts, dims.num_row_labels, dims.num_col_labels)?;
    Ok(averages)
}
