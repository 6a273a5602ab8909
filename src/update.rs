//! # Label Update Coordination
//!
//! One relabeling phase for one axis: scatter the axis labels by
//! ownership, run the update kernel on the owned slice, gather the slices
//! back into the full array on every rank and sum the per-rank counts and
//! distortion. Rows are updated before columns, with a barrier in between,
//! because the column kernel reads the freshly gathered row labels.

/*
 * File: /src/update.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Scatter / recompute / all-gather protocol for both axes
 */

use log::debug;
use ndarray::{Array2, ArrayView2};

use crate::comm::Communicator;
use crate::error::Result;
use crate::kernels::{Kernels, LabelAxis, LabelUpdate};
use crate::partitioner::Partition;
use crate::Label;

/// Rank that holds the labels to scatter
pub const ROOT: usize = 0;

/// Global totals of one row phase and one column phase
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseUpdates {
    pub rows: LabelUpdate,
    pub cols: LabelUpdate,
}

impl PhaseUpdates {
    pub fn changed(&self) -> u64 {
        self.rows.changed + self.cols.changed
    }
}

/// Relabel one axis across the group.
///
/// On return `labels` is complete and identical on every rank, and the
/// returned counts are global sums. Collective.
#[allow(clippy::too_many_arguments)]
pub fn update_axis(
    comm: &dyn Communicator,
    kernels: &dyn Kernels,
    axis: LabelAxis,
    matrix: ArrayView2<f32>,
    labels: &mut [Label],
    other_labels: &[Label],
    averages: &Array2<f32>,
    partition: &Partition,
) -> Result<LabelUpdate> {
    let rank = comm.rank();
    let owned = partition.range(rank);

    let mut local = comm.scatter_labels(labels, partition, ROOT)?;
    let local_update =
        kernels.update_labels(axis, matrix, other_labels, averages, owned.clone(), &mut local)?;
    debug!(
        "rank {} updated {} {:?}: {} changed",
        rank, axis, owned, local_update.changed
    );

    comm.all_gather_labels(&local, partition, labels)?;
    let changed = comm.all_reduce_scalar_u64(local_update.changed)?;
    let distortion = comm.all_reduce_scalar_f64(local_update.distortion)?;

    Ok(LabelUpdate {
        changed,
        distortion,
    })
}

/// Row phase, barrier, column phase
#[allow(clippy::too_many_arguments)]
pub fn update_rows_then_cols(
    comm: &dyn Communicator,
    kernels: &dyn Kernels,
    matrix: ArrayView2<f32>,
    row_labels: &mut [Label],
    col_labels: &mut [Label],
    averages: &Array2<f32>,
    row_partition: &Partition,
    col_partition: &Partition,
) -> Result<PhaseUpdates> {
    let rows = update_axis(
        comm,
        kernels,
        LabelAxis::Rows,
        matrix,
        row_labels,
        col_labels,
        averages,
        row_partition,
    )?;

    comm.barrier()?;

    let cols = update_axis(
        comm,
        kernels,
        LabelAxis::Cols,
        matrix,
        col_labels,
        row_labels,
        averages,
        col_partition,
    )?;

    Ok(PhaseUpdates { rows, cols })
}
