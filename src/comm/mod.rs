//! # Process Group Abstraction
//!
//! Collective operations used by the SPMD co-clustering loop. Each call
//! blocks until every rank in the group has entered it, and every rank
//! leaves with the same result.
//!
//! Backends:
//! - [`SerialComm`]: a group of one, every collective is the identity
//! - [`LocalComm`]: a group of threads in one process
//! - `MpiComm`: the MPI world communicator (feature `mpi`)

/*
 * File: /src/comm/mod.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Communicator trait with serial, thread and MPI backends
 */

pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi_comm;

pub use local::LocalComm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;

use crate::error::CommError;
use crate::partitioner::Partition;
use crate::Label;

/// Collective operations over a fixed group of workers
pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Block until every rank has reached the barrier
    fn barrier(&self) -> Result<(), CommError>;

    /// Scatterv: every rank receives `global[partition.range(rank)]` as held by `root`
    fn scatter_labels(
        &self,
        global: &[Label],
        partition: &Partition,
        root: usize,
    ) -> Result<Vec<Label>, CommError>;

    /// Allgatherv: every rank's `local` slice lands in `global[partition.range(rank)]` on all ranks
    fn all_gather_labels(
        &self,
        local: &[Label],
        partition: &Partition,
        global: &mut [Label],
    ) -> Result<(), CommError>;

    /// Element-wise sum across ranks into a fresh buffer
    fn all_reduce_sum_f64(&self, local: &[f64]) -> Result<Vec<f64>, CommError>;

    fn all_reduce_sum_u64(&self, local: &[u64]) -> Result<Vec<u64>, CommError>;

    /// Convenience for reducing a single scalar
    fn all_reduce_scalar_f64(&self, local: f64) -> Result<f64, CommError> {
        Ok(self.all_reduce_sum_f64(&[local])?[0])
    }

    fn all_reduce_scalar_u64(&self, local: u64) -> Result<u64, CommError> {
        Ok(self.all_reduce_sum_u64(&[local])?[0])
    }

    /// Tear the group down after a local failure. Peers blocked in a
    /// collective stop instead of waiting forever; may not return.
    fn abort(&self);
}

/// Check that a partition and buffers agree with a group before a collective
pub(crate) fn check_partition(
    partition: &Partition,
    global_len: usize,
    size: usize,
) -> Result<(), CommError> {
    if partition.len() != size {
        return Err(CommError::SizeMismatch {
            expected: size,
            actual: partition.len(),
        });
    }
    if partition.total() != global_len {
        return Err(CommError::SizeMismatch {
            expected: partition.total(),
            actual: global_len,
        });
    }
    Ok(())
}

pub(crate) fn check_root(root: usize, size: usize) -> Result<(), CommError> {
    if root >= size {
        return Err(CommError::RankOutOfRange { rank: root, size });
    }
    Ok(())
}

/// Group of one. Every collective returns its own input.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn abort(&self) {}

    fn barrier(&self) -> Result<(), CommError> {
        Ok(())
    }

    fn scatter_labels(
        &self,
        global: &[Label],
        partition: &Partition,
        root: usize,
    ) -> Result<Vec<Label>, CommError> {
        check_root(root, 1)?;
        check_partition(partition, global.len(), 1)?;
        Ok(global.to_vec())
    }

    fn all_gather_labels(
        &self,
        local: &[Label],
        partition: &Partition,
        global: &mut [Label],
    ) -> Result<(), CommError> {
        check_partition(partition, global.len(), 1)?;
        if local.len() != global.len() {
            return Err(CommError::SizeMismatch {
                expected: global.len(),
                actual: local.len(),
            });
        }
        global.copy_from_slice(local);
        Ok(())
    }

    fn all_reduce_sum_f64(&self, local: &[f64]) -> Result<Vec<f64>, CommError> {
        Ok(local.to_vec())
    }

    fn all_reduce_sum_u64(&self, local: &[u64]) -> Result<Vec<u64>, CommError> {
        Ok(local.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_comm_is_identity() {
        let comm = SerialComm;
        let partition = Partition::plan(3, 1).unwrap();
        let labels = vec![2, 0, 1];

        let local = comm.scatter_labels(&labels, &partition, 0).unwrap();
        assert_eq!(local, labels);

        let mut global = vec![0; 3];
        comm.all_gather_labels(&local, &partition, &mut global).unwrap();
        assert_eq!(global, labels);

        assert_eq!(comm.all_reduce_sum_f64(&[1.5, 2.0]).unwrap(), vec![1.5, 2.0]);
        assert_eq!(comm.all_reduce_scalar_u64(7).unwrap(), 7);
        assert!(comm.barrier().is_ok());
    }

    #[test]
    fn test_serial_comm_rejects_foreign_partition() {
        let comm = SerialComm;
        let partition = Partition::plan(4, 2).unwrap();
        assert_eq!(
            comm.scatter_labels(&[0, 0, 0, 0], &partition, 0),
            Err(CommError::SizeMismatch {
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(
            comm.scatter_labels(&[0, 0, 0, 0], &Partition::plan(4, 1).unwrap(), 1),
            Err(CommError::RankOutOfRange { rank: 1, size: 1 })
        );
    }
}
