/*
 * File: /src/kernels/parallel.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Rayon kernels, bit-identical to the serial reference
 */

use std::ops::Range;

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use super::{assign_lane, check_labels, oriented_table, Kernels, LabelAxis, LabelUpdate};
use crate::error::KernelError;
use crate::Label;

/// Multi-threaded kernels on the rayon pool.
///
/// Lanes are scored in parallel but distortion is summed in index order,
/// so results match [`super::CpuKernels`] exactly.
#[derive(Debug, Clone, Copy)]
pub struct ParallelKernels {
    /// Below this many owned lanes the work stays on the calling thread
    pub min_lanes_for_parallel: usize,
}

impl Default for ParallelKernels {
    fn default() -> Self {
        Self {
            min_lanes_for_parallel: 64,
        }
    }
}

impl Kernels for ParallelKernels {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn cluster_ids(
        &self,
        row_labels: &[Label],
        col_labels: &[Label],
        num_col_labels: usize,
        rows: Range<usize>,
    ) -> Result<Vec<usize>, KernelError> {
        if rows.end > row_labels.len() {
            return Err(KernelError::ShapeMismatch(format!(
                "row range {:?} beyond {} rows",
                rows,
                row_labels.len()
            )));
        }
        check_labels(col_labels, num_col_labels)?;

        let ids = row_labels[rows]
            .par_iter()
            .flat_map_iter(|&r| {
                let base = r as usize * num_col_labels;
                col_labels.iter().map(move |&c| base + c as usize)
            })
            .collect();
        Ok(ids)
    }

    fn update_labels(
        &self,
        axis: LabelAxis,
        matrix: ArrayView2<f32>,
        other_labels: &[Label],
        averages: &Array2<f32>,
        owned: Range<usize>,
        labels: &mut [Label],
    ) -> Result<LabelUpdate, KernelError> {
        let table = oriented_table(axis, &matrix, other_labels, averages, &owned, labels)?;
        let lanes = axis.ndarray_axis();
        let start = owned.start;

        let assign = |(offset, label): (usize, &mut Label)| -> (bool, f64) {
            let lane = matrix.index_axis(lanes, start + offset);
            let (best, dist) = assign_lane(lane, other_labels, &table, *label);
            let changed = best != *label;
            *label = best;
            (changed, dist)
        };

        let per_lane: Vec<(bool, f64)> = if labels.len() < self.min_lanes_for_parallel {
            labels.iter_mut().enumerate().map(assign).collect()
        } else {
            labels.par_iter_mut().enumerate().map(assign).collect()
        };

        let mut update = LabelUpdate::default();
        for (changed, dist) in per_lane {
            update.changed += changed as u64;
            update.distortion += dist;
        }
        Ok(update)
    }
}
