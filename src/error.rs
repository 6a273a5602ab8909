//! # Error Types
//!
//! Every failure in a run is fatal: a worker that hits any of these errors
//! stops, and in a thread group the remaining workers are aborted.

/*
 * File: /src/error.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Split error taxonomy into config, comm, kernel and label errors
 */

use std::error::Error;
use std::fmt;

/// Errors raised by a collective operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommError {
    /// Another worker failed and the group was torn down
    Aborted,
    /// The shared rendezvous state was poisoned by a panicking worker
    Poisoned,
    /// A buffer length does not match what the collective expects
    SizeMismatch { expected: usize, actual: usize },
    /// A root or partition refers to a rank outside the group
    RankOutOfRange { rank: usize, size: usize },
    /// Ranks entered different collectives in the same round
    CollectiveMismatch,
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CommError::Aborted => write!(f, "process group aborted by a failed worker"),
            CommError::Poisoned => write!(f, "process group state poisoned"),
            CommError::SizeMismatch { expected, actual } => {
                write!(f, "buffer size mismatch: expected {}, got {}", expected, actual)
            }
            CommError::RankOutOfRange { rank, size } => {
                write!(f, "rank {} out of range for group of size {}", rank, size)
            }
            CommError::CollectiveMismatch => {
                write!(f, "ranks entered different collectives in the same round")
            }
        }
    }
}

impl Error for CommError {}

/// Errors raised by a compute kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A label is not a valid index into the cluster-average table
    LabelOutOfRange { label: u32, bound: usize },
    /// Inputs disagree on their dimensions
    ShapeMismatch(String),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KernelError::LabelOutOfRange { label, bound } => {
                write!(f, "label {} out of range [0, {})", label, bound)
            }
            KernelError::ShapeMismatch(msg) => write!(f, "kernel shape mismatch: {}", msg),
        }
    }
}

impl Error for KernelError {}

/// Errors raised while reading or writing label files
#[derive(Debug)]
pub enum LabelError {
    Io(std::io::Error),
    /// Malformed content, with the 1-based line number
    Parse { line: usize, msg: String },
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LabelError::Io(e) => write!(f, "label file I/O error: {}", e),
            LabelError::Parse { line, msg } => {
                write!(f, "label file parse error at line {}: {}", line, msg)
            }
        }
    }
}

impl Error for LabelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LabelError::Io(e) => Some(e),
            LabelError::Parse { .. } => None,
        }
    }
}

impl From<std::io::Error> for LabelError {
    fn from(e: std::io::Error) -> Self {
        LabelError::Io(e)
    }
}

/// Errors from a co-clustering run
#[derive(Debug)]
pub enum CoclusterError {
    /// Bad arguments or inconsistent inputs, detected before any collective
    InvalidConfiguration(String),
    Comm(CommError),
    Kernel(KernelError),
    Labels(LabelError),
    /// The input matrix could not be loaded
    Matrix(String),
    /// A worker thread could not be started, panicked, or disagreed with its peers
    Worker(String),
}

impl fmt::Display for CoclusterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoclusterError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            CoclusterError::Comm(e) => write!(f, "Collective communication failed: {}", e),
            CoclusterError::Kernel(e) => write!(f, "Compute kernel failed: {}", e),
            CoclusterError::Labels(e) => write!(f, "Label error: {}", e),
            CoclusterError::Matrix(msg) => write!(f, "Matrix error: {}", msg),
            CoclusterError::Worker(msg) => write!(f, "Worker error: {}", msg),
        }
    }
}

impl Error for CoclusterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CoclusterError::Comm(e) => Some(e),
            CoclusterError::Kernel(e) => Some(e),
            CoclusterError::Labels(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CommError> for CoclusterError {
    fn from(e: CommError) -> Self {
        CoclusterError::Comm(e)
    }
}

impl From<KernelError> for CoclusterError {
    fn from(e: KernelError) -> Self {
        CoclusterError::Kernel(e)
    }
}

impl From<LabelError> for CoclusterError {
    fn from(e: LabelError) -> Self {
        CoclusterError::Labels(e)
    }
}

pub type Result<T> = std::result::Result<T, CoclusterError>;
