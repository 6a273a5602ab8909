/*
 * File: /src/partitioner.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Balanced contiguous split of one axis across workers
 */

use std::ops::Range;

use crate::error::{CoclusterError, Result};

/// Contiguous ownership of one axis across a group of workers.
///
/// Worker `i` owns `counts[i]` items starting at `displacements[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub counts: Vec<usize>,
    pub displacements: Vec<usize>,
}

impl Partition {
    /// Split `n` items across `size` workers.
    ///
    /// The first `n % size` workers get one extra item, so the split is
    /// balanced to within one item and deterministic.
    ///
    /// # Example
    /// ```
    /// use distco::partitioner::Partition;
    /// let p = Partition::plan(10, 3).unwrap();
    /// assert_eq!(p.counts, vec![4, 3, 3]);
    /// assert_eq!(p.displacements, vec![0, 4, 7]);
    /// ```
    pub fn plan(n: usize, size: usize) -> Result<Partition> {
        if size == 0 {
            return Err(CoclusterError::InvalidConfiguration(
                "cannot partition across zero workers".to_string(),
            ));
        }
        let base = n / size;
        let remainder = n % size;

        let mut counts = vec![base; size];
        let mut displacements = vec![0; size];
        for i in 0..size {
            if i < remainder {
                counts[i] += 1;
                displacements[i] = i * (base + 1);
            } else {
                displacements[i] = i * base + remainder;
            }
        }

        Ok(Partition {
            counts,
            displacements,
        })
    }

    /// Number of workers
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of items on the axis
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Global index range owned by `rank`
    pub fn range(&self, rank: usize) -> Range<usize> {
        let start = self.displacements[rank];
        start..start + self.counts[rank]
    }
}
