//! Shared fixtures for unit tests
use std::sync::{Arc, Mutex};
use std::thread;

use ndarray::Array2;
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::comm::{Communicator, LocalComm, SerialComm};
use crate::error::CommError;
use crate::partitioner::Partition;
use crate::Label;

pub const BLOCK_LOW: f32 = 1.0;
pub const BLOCK_HIGH: f32 = 9.0;

/// 4x4 matrix with a top-left block of 1.0, a bottom-right block of 9.0
/// and 5.0 everywhere else.
/// Rows 0-1 and cols 0-1 form cluster 0, rows 2-3 and cols 2-3 cluster 1.
pub fn four_by_four_blocks() -> Array2<f32> {
    let mut x = Array2::from_elem((4, 4), 5.0);
    for i in 0..2 {
        for j in 0..2 {
            x[[i, j]] = BLOCK_LOW;
            x[[i + 2, j + 2]] = BLOCK_HIGH;
        }
    }
    x
}

/// `k x k` grid of blocks with level `3 * (row_block + col_block)` plus
/// uniform noise in [0, 1)
pub fn noisy_blocks(rows: usize, cols: usize, k: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Array2::random_using((rows, cols), Uniform::new(0.0f32, 1.0), &mut rng);
    for ((i, j), v) in x.indexed_iter_mut() {
        let level = (i * k / rows + j * k / cols) as f32;
        *v += 3.0 * level;
    }
    x
}

/// Run `f` on every rank of a fresh thread group, results ordered by rank
pub fn run_group<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(LocalComm) -> T + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let handles: Vec<_> = LocalComm::group(size)
        .into_iter()
        .map(|comm| {
            let f = Arc::clone(&f);
            thread::spawn(move || f(comm))
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

/// One collective call, with the length of reduced buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collective {
    Barrier,
    Scatter,
    Gather,
    ReduceF64(usize),
    ReduceU64(usize),
}

/// Group of one that logs every collective in call order
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<Collective>>,
}

impl CallLog {
    pub fn calls(&self) -> Vec<Collective> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: Collective) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Communicator for CallLog {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn abort(&self) {}

    fn barrier(&self) -> Result<(), CommError> {
        self.push(Collective::Barrier);
        SerialComm.barrier()
    }

    fn scatter_labels(
        &self,
        global: &[Label],
        partition: &Partition,
        root: usize,
    ) -> Result<Vec<Label>, CommError> {
        self.push(Collective::Scatter);
        SerialComm.scatter_labels(global, partition, root)
    }

    fn all_gather_labels(
        &self,
        local: &[Label],
        partition: &Partition,
        global: &mut [Label],
    ) -> Result<(), CommError> {
        self.push(Collective::Gather);
        SerialComm.all_gather_labels(local, partition, global)
    }

    fn all_reduce_sum_f64(&self, local: &[f64]) -> Result<Vec<f64>, CommError> {
        self.push(Collective::ReduceF64(local.len()));
        SerialComm.all_reduce_sum_f64(local)
    }

    fn all_reduce_sum_u64(&self, local: &[u64]) -> Result<Vec<u64>, CommError> {
        self.push(Collective::ReduceU64(local.len()));
        SerialComm.all_reduce_sum_u64(local)
    }
}
