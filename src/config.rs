/*
 * File: /src/config.rs
 * Created Date: Friday, January 26th 2024
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Command line for distributed runs, label initialization
 */
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use log::{info, LevelFilter};
use ndarray::Array2;
use ndarray_npy::ReadNpyExt;

use crate::controller::{ClusterParams, Coclusterer};
use crate::error::{CoclusterError, Result};
use crate::kernels::KernelChoice;
use crate::labels::{random_labels, read_label_list};
use crate::util::timestamp;
use crate::Label;

/// Distributed block-average co-clustering
///
/// # Examples
/// ```bash
/// $ cargo run --release -- --matrix data/matrix.npy --row-clusters 4 --col-clusters 5 \
///       --output labels.txt --workers 8
/// ```
#[derive(Parser, Debug, Clone)]
#[command(name = "distco", author, version, about, long_about = None)]
pub struct Config {
    /// Dense f32 matrix in .npy format
    #[arg(long)]
    pub matrix: PathBuf,

    /// Number of row clusters
    #[arg(long)]
    pub row_clusters: usize,

    /// Number of column clusters
    #[arg(long)]
    pub col_clusters: usize,

    /// Initial row labels, whitespace separated; random when omitted
    #[arg(long)]
    pub row_labels: Option<PathBuf>,

    /// Initial column labels, whitespace separated; random when omitted
    #[arg(long)]
    pub col_labels: Option<PathBuf>,

    /// Where rank 0 writes the final labels
    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long, default_value_t = 25)]
    pub max_iterations: usize,

    /// Worker threads in the in-process group
    #[arg(short, long, default_value_t = 1)]
    pub workers: usize,

    /// Seed for random initial labels
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Kernel provider: cpu or parallel
    #[arg(long, default_value = "parallel")]
    pub kernels: KernelChoice,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Join the MPI world instead of spawning worker threads
    #[arg(long)]
    pub mpi: bool,
}

impl Config {
    /// Parse `args`, the first item being the program name
    pub fn new(args: impl IntoIterator<Item = String>) -> Result<Config> {
        let config = Config::try_parse_from(args)
            .map_err(|e| CoclusterError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.row_clusters == 0 || self.col_clusters == 0 {
            return Err(CoclusterError::InvalidConfiguration(
                "number of row and column clusters must be greater than 0".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(CoclusterError::InvalidConfiguration(
                "number of workers must be greater than 0".to_string(),
            ));
        }
        if self.mpi && !cfg!(feature = "mpi") {
            return Err(CoclusterError::InvalidConfiguration(
                "--mpi requires building with the `mpi` feature".to_string(),
            ));
        }
        Ok(())
    }

    pub fn params(&self) -> ClusterParams {
        ClusterParams {
            num_row_labels: self.row_clusters,
            num_col_labels: self.col_clusters,
            max_iterations: self.max_iterations,
        }
    }

    pub fn clusterer(&self) -> Coclusterer {
        Coclusterer::new(self.params()).with_kernels(Arc::from(self.kernels.build()))
    }

    /// Initial labels for a `rows x cols` matrix.
    ///
    /// Columns draw from `seed + 1` so that square problems do not start
    /// with identical row and column labels.
    pub fn initial_labels(&self, rows: usize, cols: usize) -> Result<(Vec<Label>, Vec<Label>)> {
        let row_labels = match &self.row_labels {
            Some(path) => read_label_list(path)?,
            None => random_labels(rows, self.row_clusters, self.seed)?,
        };
        let col_labels = match &self.col_labels {
            Some(path) => read_label_list(path)?,
            None => random_labels(cols, self.col_clusters, self.seed.wrapping_add(1))?,
        };
        Ok((row_labels, col_labels))
    }
}

/// Read a dense f32 matrix from a .npy file
pub fn load_matrix<P: AsRef<Path>>(path: P) -> Result<Array2<f32>> {
    let path = path.as_ref();
    let reader = File::open(path)
        .map_err(|e| CoclusterError::Matrix(format!("{}: {}", path.display(), e)))?;
    let matrix = Array2::<f32>::read_npy(reader)
        .map_err(|e| CoclusterError::Matrix(format!("{}: {}", path.display(), e)))?;
    info!(
        "[distco] [{}] loaded {}x{} matrix from {}",
        timestamp(),
        matrix.nrows(),
        matrix.ncols(),
        path.display()
    );
    Ok(matrix)
}
