//! In-process thread group.
//!
//! All ranks share one rendezvous guarded by a mutex. A collective is one
//! round: every rank deposits its contribution, the last rank to arrive
//! publishes the whole round as an immutable snapshot, and every rank reads
//! its result from that snapshot.

/*
 * File: /src/comm/local.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Mutex/condvar rendezvous for thread-backed collectives
 */

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use log::debug;

use super::{check_partition, check_root, Communicator};
use crate::error::CommError;
use crate::partitioner::Partition;
use crate::Label;

/// One rank's contribution to a round
#[derive(Debug)]
enum Payload {
    Empty,
    Labels(Vec<Label>),
    F64(Vec<f64>),
    U64(Vec<u64>),
}

struct Rendezvous {
    slots: Vec<Option<Payload>>,
    arrived: usize,
    generation: u64,
    published: Arc<Vec<Payload>>,
    aborted: bool,
}

struct Shared {
    state: Mutex<Rendezvous>,
    round_done: Condvar,
}

/// Communicator for one rank of a thread group
pub struct LocalComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl LocalComm {
    /// Create a group of `size` communicators, one per worker thread
    pub fn group(size: usize) -> Vec<LocalComm> {
        let shared = Arc::new(Shared {
            state: Mutex::new(Rendezvous {
                slots: (0..size).map(|_| None).collect(),
                arrived: 0,
                generation: 0,
                published: Arc::new(Vec::new()),
                aborted: false,
            }),
            round_done: Condvar::new(),
        });
        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// Tear the group down. Every rank blocked in or later entering a
    /// collective gets `CommError::Aborted`.
    pub fn abort(&self) {
        let mut state = match self.shared.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !state.aborted {
            debug!("rank {} aborting process group", self.rank);
        }
        state.aborted = true;
        self.shared.round_done.notify_all();
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rendezvous>, CommError> {
        self.shared.state.lock().map_err(|_| CommError::Poisoned)
    }

    /// Run one round and return every rank's contribution, indexed by rank
    fn exchange(&self, payload: Payload) -> Result<Arc<Vec<Payload>>, CommError> {
        let mut state = self.lock()?;
        if state.aborted {
            return Err(CommError::Aborted);
        }
        let generation = state.generation;
        state.slots[self.rank] = Some(payload);
        state.arrived += 1;

        if state.arrived == self.size {
            let round = state
                .slots
                .iter_mut()
                .map(|slot| slot.take())
                .collect::<Option<Vec<Payload>>>()
                .ok_or(CommError::CollectiveMismatch)?;
            state.published = Arc::new(round);
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.shared.round_done.notify_all();
            return Ok(Arc::clone(&state.published));
        }

        while state.generation == generation {
            if state.aborted {
                return Err(CommError::Aborted);
            }
            state = self
                .shared
                .round_done
                .wait(state)
                .map_err(|_| CommError::Poisoned)?;
        }
        // The next round cannot publish before this rank joins it, so the
        // snapshot is still the one for `generation`.
        Ok(Arc::clone(&state.published))
    }
}

fn sum_rounds<T, F>(round: &[Payload], len: usize, extract: F) -> Result<Vec<T>, CommError>
where
    T: Copy + Default + std::ops::AddAssign,
    F: Fn(&Payload) -> Option<&Vec<T>>,
{
    let mut total = vec![T::default(); len];
    for payload in round {
        let values = extract(payload).ok_or(CommError::CollectiveMismatch)?;
        if values.len() != len {
            return Err(CommError::SizeMismatch {
                expected: len,
                actual: values.len(),
            });
        }
        for (acc, &v) in total.iter_mut().zip(values) {
            *acc += v;
        }
    }
    Ok(total)
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn abort(&self) {
        LocalComm::abort(self)
    }

    fn barrier(&self) -> Result<(), CommError> {
        let round = self.exchange(Payload::Empty)?;
        if round.iter().all(|p| matches!(p, Payload::Empty)) {
            Ok(())
        } else {
            Err(CommError::CollectiveMismatch)
        }
    }

    fn scatter_labels(
        &self,
        global: &[Label],
        partition: &Partition,
        root: usize,
    ) -> Result<Vec<Label>, CommError> {
        check_root(root, self.size)?;
        if partition.len() != self.size {
            return Err(CommError::SizeMismatch {
                expected: self.size,
                actual: partition.len(),
            });
        }
        // Only the root's buffer matters; its length is checked by every
        // rank after the round so that all ranks fail together.
        let payload = if self.rank == root {
            Payload::Labels(global.to_vec())
        } else {
            Payload::Empty
        };
        let round = self.exchange(payload)?;
        match &round[root] {
            Payload::Labels(all) => {
                check_partition(partition, all.len(), self.size)?;
                Ok(all[partition.range(self.rank)].to_vec())
            }
            _ => Err(CommError::CollectiveMismatch),
        }
    }

    fn all_gather_labels(
        &self,
        local: &[Label],
        partition: &Partition,
        global: &mut [Label],
    ) -> Result<(), CommError> {
        check_partition(partition, global.len(), self.size)?;
        if local.len() != partition.counts[self.rank] {
            return Err(CommError::SizeMismatch {
                expected: partition.counts[self.rank],
                actual: local.len(),
            });
        }
        let round = self.exchange(Payload::Labels(local.to_vec()))?;
        for (rank, payload) in round.iter().enumerate() {
            match payload {
                Payload::Labels(part) if part.len() == partition.counts[rank] => {
                    global[partition.range(rank)].copy_from_slice(part);
                }
                Payload::Labels(part) => {
                    return Err(CommError::SizeMismatch {
                        expected: partition.counts[rank],
                        actual: part.len(),
                    })
                }
                _ => return Err(CommError::CollectiveMismatch),
            }
        }
        Ok(())
    }

    fn all_reduce_sum_f64(&self, local: &[f64]) -> Result<Vec<f64>, CommError> {
        let round = self.exchange(Payload::F64(local.to_vec()))?;
        // Summing in rank order keeps the result bit-identical on every rank.
        sum_rounds(&round, local.len(), |p| match p {
            Payload::F64(v) => Some(v),
            _ => None,
        })
    }

    fn all_reduce_sum_u64(&self, local: &[u64]) -> Result<Vec<u64>, CommError> {
        let round = self.exchange(Payload::U64(local.to_vec()))?;
        sum_rounds(&round, local.len(), |p| match p {
            Payload::U64(v) => Some(v),
            _ => None,
        })
    }
}
