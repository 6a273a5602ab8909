/*
 * File: /main.rs
 * Created Date: Tuesday November 21st 2023
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Command line entry for thread and MPI groups
 */

use std::process;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use distco::config::Config;
use distco::launcher::launch;
use distco::util::timestamp;

fn main() {
    let config = Config::parse();
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(config.log_level)
        .init()
    {
        eprintln!("failed to initialize logger: {}", e);
    }

    let start = Instant::now();
    let result = if config.mpi {
        run_mpi(&config)
    } else {
        launch(&config).map(|_| true)
    };

    match result {
        Ok(is_root) => {
            if is_root {
                info!(
                    "[distco] [{}] total execution time: {:.3}s",
                    timestamp(),
                    start.elapsed().as_secs_f64()
                );
            }
        }
        Err(e) => {
            error!("[distco] [{}] {}", timestamp(), e);
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

/// Run this process as one rank of the MPI world; returns whether it is
/// the root. Any failure after MPI is up aborts the whole job.
#[cfg(feature = "mpi")]
fn run_mpi(config: &Config) -> distco::Result<bool> {
    use distco::comm::{Communicator, MpiComm};
    use distco::config::load_matrix;
    use distco::labels::{write_labels, LabelSet};
    use distco::launcher::run_or_abort;
    use distco::update::ROOT;
    use distco::CoclusterError;

    config.validate()?;
    let universe = mpi::initialize()
        .ok_or_else(|| CoclusterError::InvalidConfiguration("MPI already initialized".to_string()))?;
    let comm = MpiComm::new(universe.world());

    run_or_abort(&comm, || {
        let matrix = load_matrix(&config.matrix)?;
        let (mut row_labels, mut col_labels) =
            config.initial_labels(matrix.nrows(), matrix.ncols())?;
        config
            .clusterer()
            .run(&comm, matrix.view(), &mut row_labels, &mut col_labels)?;

        let is_root = comm.rank() == ROOT;
        if is_root {
            write_labels(&config.output, &LabelSet::new(row_labels, col_labels))?;
            info!(
                "[distco] [{}] labels written to {}",
                timestamp(),
                config.output.display()
            );
        }
        Ok(is_root)
    })
}

#[cfg(not(feature = "mpi"))]
fn run_mpi(_config: &Config) -> distco::Result<bool> {
    Err(distco::CoclusterError::InvalidConfiguration(
        "--mpi requires building with the `mpi` feature".to_string(),
    ))
}
