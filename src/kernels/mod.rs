//! # Compute Kernels
//!
//! The per-element work of one co-clustering iteration, behind a single
//! capability trait so the engine does not care where it runs:
//! 1. map every entry of a row slice to its (row-label, col-label) cluster id
//! 2. turn global cluster sums and counts into the cluster-average table
//! 3. move each owned row (or column) to the label whose averages fit it best

/*
 * File: /src/kernels/mod.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Kernels trait, shared lane assignment and average helpers
 */

pub mod cpu;
pub mod parallel;

pub use cpu::CpuKernels;
pub use parallel::ParallelKernels;

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::error::KernelError;
use crate::Label;

/// Which axis of the matrix is being relabeled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAxis {
    Rows,
    Cols,
}

impl LabelAxis {
    pub fn ndarray_axis(self) -> Axis {
        match self {
            LabelAxis::Rows => Axis(0),
            LabelAxis::Cols => Axis(1),
        }
    }
}

impl fmt::Display for LabelAxis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LabelAxis::Rows => write!(f, "rows"),
            LabelAxis::Cols => write!(f, "cols"),
        }
    }
}

/// Outcome of relabeling one owned slice
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabelUpdate {
    /// Indices whose label changed
    pub changed: u64,
    /// Sum of squared deviations from the chosen labels' averages
    pub distortion: f64,
}

/// Pluggable compute provider for the co-clustering loop
pub trait Kernels: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cluster id `row_label * num_col_labels + col_label` for every entry of
    /// the rows in `rows`, row-major over the slice
    fn cluster_ids(
        &self,
        row_labels: &[Label],
        col_labels: &[Label],
        num_col_labels: usize,
        rows: Range<usize>,
    ) -> Result<Vec<usize>, KernelError>;

    /// Cluster-average table from global sums and counts
    fn finalize_averages(
        &self,
        sums: &[f64],
        counts: &[u64],
        num_row_labels: usize,
        num_col_labels: usize,
    ) -> Result<Array2<f32>, KernelError> {
        average_table(sums, counts, num_row_labels, num_col_labels)
    }

    /// Relabel the indices in `owned` along `axis`.
    ///
    /// `labels` holds the current labels of the owned indices and is updated
    /// in place. `other_labels` are the full, globally consistent labels of
    /// the other axis.
    fn update_labels(
        &self,
        axis: LabelAxis,
        matrix: ArrayView2<f32>,
        other_labels: &[Label],
        averages: &Array2<f32>,
        owned: Range<usize>,
        labels: &mut [Label],
    ) -> Result<LabelUpdate, KernelError>;
}

/// Kernel provider selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelChoice {
    Cpu,
    Parallel,
}

impl KernelChoice {
    pub fn build(self) -> Box<dyn Kernels> {
        match self {
            KernelChoice::Cpu => Box::new(CpuKernels),
            KernelChoice::Parallel => Box::new(ParallelKernels::default()),
        }
    }
}

impl FromStr for KernelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(KernelChoice::Cpu),
            "parallel" => Ok(KernelChoice::Parallel),
            other => Err(format!("unknown kernel provider '{}', expected cpu or parallel", other)),
        }
    }
}

/// `sum / count` per cell; empty cells are 0.0
pub(crate) fn average_table(
    sums: &[f64],
    counts: &[u64],
    num_row_labels: usize,
    num_col_labels: usize,
) -> Result<Array2<f32>, KernelError> {
    let num_clusters = num_row_labels * num_col_labels;
    if sums.len() != num_clusters || counts.len() != num_clusters {
        return Err(KernelError::ShapeMismatch(format!(
            "expected {} cluster sums and counts, got {} and {}",
            num_clusters,
            sums.len(),
            counts.len()
        )));
    }
    let averages: Vec<f32> = sums
        .iter()
        .zip(counts)
        .map(|(&sum, &count)| {
            if count == 0 {
                0.0
            } else {
                (sum / count as f64) as f32
            }
        })
        .collect();
    Array2::from_shape_vec((num_row_labels, num_col_labels), averages)
        .map_err(|e| KernelError::ShapeMismatch(e.to_string()))
}

pub(crate) fn check_labels(labels: &[Label], bound: usize) -> Result<(), KernelError> {
    match labels.iter().find(|&&l| l as usize >= bound) {
        Some(&label) => Err(KernelError::LabelOutOfRange { label, bound }),
        None => Ok(()),
    }
}

/// Validate the inputs of `update_labels` and return the average table
/// oriented so that rows are the candidate labels of `axis`
pub(crate) fn oriented_table<'a>(
    axis: LabelAxis,
    matrix: &ArrayView2<f32>,
    other_labels: &[Label],
    averages: &'a Array2<f32>,
    owned: &Range<usize>,
    labels: &[Label],
) -> Result<ArrayView2<'a, f32>, KernelError> {
    let table = match axis {
        LabelAxis::Rows => averages.view(),
        LabelAxis::Cols => averages.t(),
    };
    let axis_len = matrix.len_of(axis.ndarray_axis());
    let lane_len = match axis {
        LabelAxis::Rows => matrix.ncols(),
        LabelAxis::Cols => matrix.nrows(),
    };
    if owned.end > axis_len || owned.len() != labels.len() {
        return Err(KernelError::ShapeMismatch(format!(
            "owned {} range {:?} with {} labels on an axis of {}",
            axis,
            owned,
            labels.len(),
            axis_len
        )));
    }
    if other_labels.len() != lane_len {
        return Err(KernelError::ShapeMismatch(format!(
            "{} other-axis labels for lanes of length {}",
            other_labels.len(),
            lane_len
        )));
    }
    check_labels(labels, table.nrows())?;
    check_labels(other_labels, table.ncols())?;
    Ok(table)
}

/// Best label for one row or column.
///
/// Scores every candidate by squared distance to its averages; a candidate
/// has to be strictly better than the current label to replace it.
pub(crate) fn assign_lane(
    lane: ArrayView1<f32>,
    other_labels: &[Label],
    table: &ArrayView2<f32>,
    current: Label,
) -> (Label, f64) {
    let distance = |candidate: usize| -> f64 {
        let centers = table.row(candidate);
        lane.iter()
            .zip(other_labels)
            .map(|(&x, &o)| {
                let d = x as f64 - centers[o as usize] as f64;
                d * d
            })
            .sum()
    };

    let mut best = current;
    let mut best_dist = distance(current as usize);
    for candidate in 0..table.nrows() {
        if candidate == current as usize {
            continue;
        }
        let dist = distance(candidate);
        if dist < best_dist {
            best = candidate as Label;
            best_dist = dist;
        }
    }
    (best, best_dist)
}
