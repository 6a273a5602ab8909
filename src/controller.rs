//! # Iteration Controller
//!
//! Drives the SPMD refinement loop on one rank:
//! `AGGREGATE -> UPDATE_ROWS -> BARRIER -> UPDATE_COLUMNS -> CHECK`
//! until no label changes (converged) or the iteration cap is reached.
//! Every rank runs the same loop; rank 0 reports progress.

/*
 * File: /src/controller.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Convergence loop, progress reporting and timing
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use ndarray::ArrayView2;

use crate::aggregate::{aggregate, ClusterDims};
use crate::comm::Communicator;
use crate::error::{CoclusterError, Result};
use crate::kernels::{Kernels, ParallelKernels};
use crate::partitioner::Partition;
use crate::update::{update_rows_then_cols, PhaseUpdates, ROOT};
use crate::util::timestamp;
use crate::Label;

/// Parameters of one co-clustering run
#[derive(Debug, Clone)]
pub struct ClusterParams {
    pub num_row_labels: usize,
    pub num_col_labels: usize,
    pub max_iterations: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            num_row_labels: 2,
            num_col_labels: 2,
            max_iterations: 25,
        }
    }
}

/// Progress of one iteration, identical on every rank
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// 1-based
    pub iteration: usize,
    pub rows_changed: u64,
    pub cols_changed: u64,
    /// Squared deviation of every entry from its cluster average, after the column phase
    pub distortion: f64,
    /// `distortion / (rows * cols)`
    pub average_distortion: f64,
}

impl IterationReport {
    fn new(iteration: usize, updates: &PhaseUpdates, num_entries: usize) -> Self {
        let distortion = updates.cols.distortion;
        let average_distortion = if num_entries == 0 {
            0.0
        } else {
            distortion / num_entries as f64
        };
        Self {
            iteration,
            rows_changed: updates.rows.changed,
            cols_changed: updates.cols.changed,
            distortion,
            average_distortion,
        }
    }

    pub fn changed(&self) -> u64 {
        self.rows_changed + self.cols_changed
    }
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub iterations: usize,
    pub converged: bool,
    pub history: Vec<IterationReport>,
    pub total_time: Duration,
}

impl RunSummary {
    pub fn time_per_iteration(&self) -> Duration {
        if self.iterations == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.iterations as u32
        }
    }

    /// Average distortion of the last iteration, if any ran
    pub fn final_average_distortion(&self) -> Option<f64> {
        self.history.last().map(|r| r.average_distortion)
    }
}

/// Receives progress on the coordinating rank only
pub trait ProgressReporter: Send + Sync {
    fn iteration(&self, report: &IterationReport);
    fn finished(&self, summary: &RunSummary);
}

/// Progress through the `log` facade
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn iteration(&self, report: &IterationReport) {
        info!(
            "[distco] [{}] iteration {}: {} labels were updated, average error is {}",
            timestamp(),
            report.iteration,
            report.changed(),
            report.average_distortion
        );
    }

    fn finished(&self, summary: &RunSummary) {
        info!(
            "[distco] [{}] clustering time total: {:.6} seconds",
            timestamp(),
            summary.total_time.as_secs_f64()
        );
        info!(
            "[distco] [{}] clustering time per iteration: {:.6} seconds",
            timestamp(),
            summary.time_per_iteration().as_secs_f64()
        );
    }
}

/// Discards progress
#[derive(Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn iteration(&self, _report: &IterationReport) {}
    fn finished(&self, _summary: &RunSummary) {}
}

/// Block-average co-clusterer, shared by every rank of a group
#[derive(Clone)]
pub struct Coclusterer {
    params: ClusterParams,
    kernels: Arc<dyn Kernels>,
    reporter: Arc<dyn ProgressReporter>,
}

impl Coclusterer {
    /// Co-clusterer with the parallel kernels and log reporting
    pub fn new(params: ClusterParams) -> Self {
        Self {
            params,
            kernels: Arc::new(ParallelKernels::default()),
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_kernels(mut self, kernels: Arc<dyn Kernels>) -> Self {
        self.kernels = kernels;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    pub fn dims(&self) -> ClusterDims {
        ClusterDims::new(self.params.num_row_labels, self.params.num_col_labels)
    }

    /// Check inputs before any collective, so a bad run fails on every
    /// rank without communicating
    pub fn validate(
        &self,
        matrix: ArrayView2<f32>,
        row_labels: &[Label],
        col_labels: &[Label],
    ) -> Result<()> {
        let (rows, cols) = matrix.dim();
        if self.params.num_row_labels == 0 || self.params.num_col_labels == 0 {
            return Err(CoclusterError::InvalidConfiguration(
                "number of row and column clusters must be greater than 0".to_string(),
            ));
        }
        if row_labels.len() != rows || col_labels.len() != cols {
            return Err(CoclusterError::InvalidConfiguration(format!(
                "matrix is {}x{} but got {} row labels and {} column labels",
                rows,
                cols,
                row_labels.len(),
                col_labels.len()
            )));
        }
        check_range("row", row_labels, self.params.num_row_labels)?;
        check_range("column", col_labels, self.params.num_col_labels)?;
        Ok(())
    }

    /// Run the refinement loop on this rank.
    ///
    /// `row_labels` and `col_labels` must be identical on every rank on
    /// entry; they are updated in place and are identical again on return.
    /// Collective.
    pub fn run(
        &self,
        comm: &dyn Communicator,
        matrix: ArrayView2<f32>,
        row_labels: &mut [Label],
        col_labels: &mut [Label],
    ) -> Result<RunSummary> {
        self.validate(matrix, row_labels, col_labels)?;

        let start = Instant::now();
        let is_root = comm.rank() == ROOT;
        let (rows, cols) = matrix.dim();
        let dims = self.dims();
        let row_partition = Partition::plan(rows, comm.size())?;
        let col_partition = Partition::plan(cols, comm.size())?;

        if is_root {
            info!(
                "[distco] [{}] co-clustering {}x{} into {}x{} clusters on {} workers ({} kernels)",
                timestamp(),
                rows,
                cols,
                dims.num_row_labels,
                dims.num_col_labels,
                comm.size(),
                self.kernels.name()
            );
        }

        let mut history = Vec::new();
        let mut converged = false;
        while history.len() < self.params.max_iterations {
            let averages = aggregate(
                comm,
                self.kernels.as_ref(),
                matrix,
                row_labels,
                col_labels,
                &row_partition,
                dims,
            )?;

            let updates = update_rows_then_cols(
                comm,
                self.kernels.as_ref(),
                matrix,
                row_labels,
                col_labels,
                &averages,
                &row_partition,
                &col_partition,
            )?;

            let report = IterationReport::new(history.len() + 1, &updates, rows * cols);
            if is_root {
                self.reporter.iteration(&report);
            }
            history.push(report);

            if updates.changed() == 0 {
                converged = true;
                break;
            }
        }

        let summary = RunSummary {
            iterations: history.len(),
            converged,
            history,
            total_time: start.elapsed(),
        };
        if is_root {
            if !converged {
                warn!(
                    "stopped after {} iterations without converging",
                    summary.iterations
                );
            }
            self.reporter.finished(&summary);
        }
        Ok(summary)
    }
}

fn check_range(axis: &str, labels: &[Label], bound: usize) -> Result<()> {
    match labels.iter().position(|&l| l as usize >= bound) {
        Some(i) => Err(CoclusterError::InvalidConfiguration(format!(
            "{} label {} at index {} is outside [0, {})",
            axis, labels[i], i, bound
        ))),
        None => Ok(()),
    }
}
