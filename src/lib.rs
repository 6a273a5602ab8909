/*
 * File: /src/lib.rs
 * Created Date: Monday, January 22nd 2024
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Distributed block-average co-clustering
 */

//! # distco
//!
//! Distributed block-average co-clustering of a dense `f32` matrix.
//!
//! Every rank of a process group holds the full matrix and the full row and
//! column labels. Each iteration:
//!
//! 1. every rank accumulates cluster sums and counts over the rows it owns,
//!    and one all-reduce per statistic yields the global averages;
//! 2. row labels are scattered by ownership, recomputed against the
//!    averages and gathered back into the full array on every rank;
//! 3. after a barrier, the column labels go through the same protocol.
//!
//! The loop stops when no label changed or after `max_iterations`.
//!
//! The process group is a [`comm::Communicator`]: [`comm::SerialComm`] for a
//! single process, [`comm::LocalComm`] for a group of threads, and
//! `comm::MpiComm` with the `mpi` feature.

pub mod aggregate;
pub mod comm;
pub mod config;
pub mod controller;
pub mod error;
pub mod kernels;
pub mod labels;
pub mod launcher;
pub mod partitioner;
pub mod update;
pub mod util;

#[cfg(test)]
pub(crate) mod test_utils;

/// Cluster label of one row or column
pub type Label = u32;

pub use comm::{Communicator, LocalComm, SerialComm};
pub use controller::{ClusterParams, Coclusterer, IterationReport, RunSummary};
pub use error::{CoclusterError, Result};
pub use kernels::{CpuKernels, KernelChoice, Kernels, ParallelKernels};
pub use labels::LabelSet;
pub use launcher::{run_local_group, ClusterOutcome};
pub use partitioner::Partition;
