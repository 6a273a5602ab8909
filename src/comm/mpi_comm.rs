//! MPI-backed process group.
//!
//! Wraps the world communicator of an initialized MPI universe. Collective
//! failures follow MPI's default error handler and abort the whole job,
//! so every method here reports success once the call returns.
//!
//! # Example
//! ```no_run
//! use distco::comm::{Communicator, MpiComm};
//! let universe = mpi::initialize().unwrap();
//! let comm = MpiComm::new(universe.world());
//! println!("Rank: {} / {}", comm.rank(), comm.size());
//! ```

/*
 * File: /src/comm/mpi_comm.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Scatterv/allgatherv/allreduce over the MPI world communicator
 */

use mpi::collective::SystemOperation;
use mpi::datatype::{Partition as MpiPartition, PartitionMut};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Count;

use super::{check_partition, check_root};
use crate::error::CommError;
use crate::partitioner::Partition;
use crate::Label;

/// MPI communicator wrapper for one rank of the job
pub struct MpiComm {
    world: SimpleCommunicator,
    rank: usize,
    size: usize,
}

impl MpiComm {
    pub fn new(world: SimpleCommunicator) -> Self {
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        MpiComm { world, rank, size }
    }
}

/// Convert a partition into MPI count/displacement arrays
fn to_counts(partition: &Partition) -> (Vec<Count>, Vec<Count>) {
    let counts = partition.counts.iter().map(|&c| c as Count).collect();
    let displs = partition.displacements.iter().map(|&d| d as Count).collect();
    (counts, displs)
}

impl super::Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    /// `MPI_Abort` on the world: terminates every rank of the job
    fn abort(&self) {
        self.world.abort(1)
    }

    fn barrier(&self) -> Result<(), CommError> {
        self.world.barrier();
        Ok(())
    }

    fn scatter_labels(
        &self,
        global: &[Label],
        partition: &Partition,
        root: usize,
    ) -> Result<Vec<Label>, CommError> {
        check_root(root, self.size)?;
        check_partition(partition, global.len(), self.size)?;
        let mut local: Vec<Label> = vec![0; partition.counts[self.rank]];
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank == root {
            let (counts, displs) = to_counts(partition);
            let send = MpiPartition::new(global, counts, displs);
            root_process.scatter_varcount_into_root(&send, &mut local[..]);
        } else {
            root_process.scatter_varcount_into(&mut local[..]);
        }
        Ok(local)
    }

    fn all_gather_labels(
        &self,
        local: &[Label],
        partition: &Partition,
        global: &mut [Label],
    ) -> Result<(), CommError> {
        check_partition(partition, global.len(), self.size)?;
        let (counts, displs) = to_counts(partition);
        let mut recv = PartitionMut::new(global, counts, displs);
        self.world.all_gather_varcount_into(local, &mut recv);
        Ok(())
    }

    fn all_reduce_sum_f64(&self, local: &[f64]) -> Result<Vec<f64>, CommError> {
        let mut global = vec![0.0; local.len()];
        self.world
            .all_reduce_into(local, &mut global[..], SystemOperation::sum());
        Ok(global)
    }

    fn all_reduce_sum_u64(&self, local: &[u64]) -> Result<Vec<u64>, CommError> {
        let mut global = vec![0; local.len()];
        self.world
            .all_reduce_into(local, &mut global[..], SystemOperation::sum());
        Ok(global)
    }
}
