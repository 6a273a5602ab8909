/*
 * File: /src/kernels/cpu.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Serial reference kernels
 */

use std::ops::Range;

use ndarray::{Array2, ArrayView2};

use super::{assign_lane, check_labels, oriented_table, Kernels, LabelAxis, LabelUpdate};
use crate::error::KernelError;
use crate::Label;

/// Serial reference implementation of the compute kernels
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuKernels;

impl Kernels for CpuKernels {
    fn name(&self) -> &'static str {
        "cpu"
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

        let mut ids = Vec::with_capacity(rows.len() * col_labels.len());
        for &r in &row_labels[rows] {
            let base = r as usize * num_col_labels;
            ids.extend(col_labels.iter().map(|&c| base + c as usize));
        }
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

        let mut update = LabelUpdate::default();
        for (index, label) in owned.zip(labels.iter_mut()) {
            let lane = matrix.index_axis(lanes, index);
            let (best, dist) = assign_lane(lane, other_labels, &table, *label);
            if best != *label {
                *label = best;
                update.changed += 1;
            }
            update.distortion += dist;
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{four_by_four_blocks, BLOCK_HIGH, BLOCK_LOW};
    use ndarray::array;

    #[test]
    fn test_cluster_ids_for_row_slice() {
        let ids = CpuKernels
            .cluster_ids(&[0, 1, 1], &[1, 0], 2, 1..3)
            .unwrap();
        // rows 1 and 2 carry label 1: ids 1*2+1, 1*2+0
        assert_eq!(ids, vec![3, 2, 3, 2]);
    }

    #[test]
    fn test_cluster_ids_rejects_bad_col_label() {
        let err = CpuKernels.cluster_ids(&[0], &[0, 2], 2, 0..1).unwrap_err();
        assert_eq!(err, KernelError::LabelOutOfRange { label: 2, bound: 2 });
    }

    #[test]
    fn test_update_rows_moves_to_nearest_block() {
        let matrix = four_by_four_blocks();
        let averages = array![[BLOCK_LOW, 5.0], [5.0, BLOCK_HIGH]];
        let mut labels = vec![1, 0];

        let update = CpuKernels
            .update_labels(
                LabelAxis::Rows,
                matrix.view(),
                &[0, 0, 1, 1],
                &averages,
                1..3,
                &mut labels,
            )
            .unwrap();

        assert_eq!(labels, vec![0, 1]);
        assert_eq!(update.changed, 2);
        assert_eq!(update.distortion, 0.0);
    }

    #[test]
    fn test_update_cols_uses_transposed_table() {
        let matrix = four_by_four_blocks();
        let averages = array![[BLOCK_LOW, 5.0], [5.0, BLOCK_HIGH]];
        let mut labels = vec![1, 1, 0, 0];

        let update = CpuKernels
            .update_labels(
                LabelAxis::Cols,
                matrix.view(),
                &[0, 0, 1, 1],
                &averages,
                0..4,
                &mut labels,
            )
            .unwrap();

        assert_eq!(labels, vec![0, 0, 1, 1]);
        assert_eq!(update.changed, 4);
    }

    #[test]
    fn test_second_update_changes_nothing() {
        let matrix = four_by_four_blocks();
        let averages = array![[3.0f32, 6.0], [6.0, 9.0]];
        let mut labels = vec![1, 0, 1, 0];
        let col_labels = [0, 0, 0, 1];

        CpuKernels
            .update_labels(LabelAxis::Rows, matrix.view(), &col_labels, &averages, 0..4, &mut labels)
            .unwrap();
        let again = CpuKernels
            .update_labels(LabelAxis::Rows, matrix.view(), &col_labels, &averages, 0..4, &mut labels)
            .unwrap();

        assert_eq!(again.changed, 0);
    }

    #[test]
    fn test_update_rejects_mismatched_lengths() {
        let matrix = four_by_four_blocks();
        let averages = Array2::<f32>::zeros((2, 2));
        let mut labels = vec![0; 3];
        let err = CpuKernels
            .update_labels(LabelAxis::Rows, matrix.view(), &[0; 4], &averages, 0..2, &mut labels)
            .unwrap_err();
        assert!(matches!(err, KernelError::ShapeMismatch(_)));
    }
}
