//! # In-process Launcher
//!
//! Runs one [`Coclusterer`] per rank on its own thread, wired together by a
//! [`LocalComm`] group. A failing rank aborts the group so its peers return
//! instead of waiting in a collective forever.
//!
//! ```
//! use distco::launcher::run_local_group;
//! use distco::{ClusterParams, Coclusterer};
//! use distco::controller::NullReporter;
//! use ndarray::array;
//! use std::sync::Arc;
//!
//! let matrix = array![[1.0f32, 1.0, 5.0], [1.0, 1.0, 5.0], [5.0, 5.0, 9.0]];
//! let clusterer = Coclusterer::new(ClusterParams {
//!     num_row_labels: 2,
//!     num_col_labels: 2,
//!     max_iterations: 10,
//! })
//! .with_reporter(Arc::new(NullReporter));
//!
//! let outcome = run_local_group(2, &clusterer, matrix.view(), vec![0, 1, 1], vec![0, 0, 1]).unwrap();
//! assert!(outcome.summary.converged);
//! assert_eq!(outcome.labels.rows.len(), 3);
//! ```

/*
 * File: /src/launcher.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Thread-per-rank launcher with group abort
 */

use std::panic::{self, AssertUnwindSafe};
use std::thread;

use log::{debug, error, info};
use ndarray::ArrayView2;

use crate::comm::{Communicator, LocalComm};
use crate::config::{load_matrix, Config};
use crate::controller::{Coclusterer, RunSummary};
use crate::error::{CoclusterError, CommError, Result};
use crate::labels::{write_labels, LabelSet};
use crate::util::{count_distinct, timestamp};
use crate::Label;

/// Final labels and the root's run summary
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    pub labels: LabelSet,
    pub summary: RunSummary,
}

type RankResult = Result<(LabelSet, RunSummary)>;

/// Run `clusterer` on `workers` threads and return rank 0's result.
///
/// Every rank starts from its own copy of the initial labels. The first
/// error that is not a consequence of another rank aborting is returned.
pub fn run_local_group(
    workers: usize,
    clusterer: &Coclusterer,
    matrix: ArrayView2<f32>,
    row_labels: Vec<Label>,
    col_labels: Vec<Label>,
) -> Result<ClusterOutcome> {
    if workers == 0 {
        return Err(CoclusterError::InvalidConfiguration(
            "number of workers must be greater than 0".to_string(),
        ));
    }
    clusterer.validate(matrix, &row_labels, &col_labels)?;

    let group = LocalComm::group(workers);
    let results: Vec<RankResult> = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for comm in &group {
            let rows = row_labels.clone();
            let cols = col_labels.clone();
            let spawned = thread::Builder::new()
                .name(format!("distco-rank-{}", comm.rank()))
                .spawn_scoped(scope, move || run_rank(clusterer, comm, matrix, rows, cols));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    comm.abort();
                    return Err(CoclusterError::Worker(format!(
                        "failed to spawn rank {}: {}",
                        comm.rank(),
                        e
                    )));
                }
            }
        }

        Ok(handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle.join().unwrap_or_else(|_| {
                    Err(CoclusterError::Worker(format!("rank {} panicked", rank)))
                })
            })
            .collect())
    })?;

    collect_outcome(results)
}

/// Load the inputs named by `config`, run them on `config.workers` threads
/// and write the final labels to `config.output`
pub fn launch(config: &Config) -> Result<ClusterOutcome> {
    config.validate()?;
    let matrix = load_matrix(&config.matrix)?;
    let (row_labels, col_labels) = config.initial_labels(matrix.nrows(), matrix.ncols())?;

    let outcome = run_local_group(
        config.workers,
        &config.clusterer(),
        matrix.view(),
        row_labels,
        col_labels,
    )?;

    write_labels(&config.output, &outcome.labels)?;
    info!(
        "[distco] [{}] {} row clusters and {} column clusters in use, labels written to {}",
        timestamp(),
        count_distinct(&outcome.labels.rows),
        count_distinct(&outcome.labels.cols),
        config.output.display()
    );
    Ok(outcome)
}

/// Run `body` as this rank's share of a collective computation.
///
/// On failure the error is logged and `comm` is aborted, so peers waiting
/// in a collective stop too. Errors caused by another rank's abort are
/// passed through quietly.
pub fn run_or_abort<T>(
    comm: &dyn Communicator,
    body: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let result = body();
    if let Err(e) = &result {
        if is_abort(e) {
            debug!("rank {} stopped: group aborted", comm.rank());
        } else {
            error!("rank {} failed: {}", comm.rank(), e);
        }
        comm.abort();
    }
    result
}

fn run_rank(
    clusterer: &Coclusterer,
    comm: &LocalComm,
    matrix: ArrayView2<f32>,
    mut rows: Vec<Label>,
    mut cols: Vec<Label>,
) -> RankResult {
    let summary = run_or_abort(comm, || {
        panic::catch_unwind(AssertUnwindSafe(|| {
            clusterer.run(comm, matrix, &mut rows, &mut cols)
        }))
        .unwrap_or_else(|_| {
            Err(CoclusterError::Worker(format!(
                "rank {} panicked",
                comm.rank()
            )))
        })
    })?;
    Ok((LabelSet::new(rows, cols), summary))
}

fn is_abort(e: &CoclusterError) -> bool {
    matches!(e, CoclusterError::Comm(CommError::Aborted))
}

/// Pick the root's outcome, or the error that caused the group to fail
fn collect_outcome(results: Vec<RankResult>) -> Result<ClusterOutcome> {
    let mut first_abort = None;
    let mut outcomes = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) if is_abort(&e) => {
                first_abort.get_or_insert(e);
            }
            Err(e) => return Err(e),
        }
    }
    if let Some(e) = first_abort {
        return Err(e);
    }

    let mut outcomes = outcomes.into_iter();
    let (labels, summary) = outcomes
        .next()
        .ok_or_else(|| CoclusterError::Worker("no rank produced a result".to_string()))?;
    for (rank, (other, _)) in outcomes.enumerate() {
        if other != labels {
            return Err(CoclusterError::Worker(format!(
                "rank {} finished with labels different from rank 0",
                rank + 1
            )));
        }
    }

    Ok(ClusterOutcome { labels, summary })
}
