//! End-to-end tests for distributed co-clustering
//!
//! Planted block matrices are clustered by thread groups of several sizes,
//! with both kernel providers, and through the file-based launcher.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use approx::assert_relative_eq;
use distco::config::Config;
use distco::controller::NullReporter;
use distco::labels::read_labels;
use distco::launcher::launch;
use distco::util::are_equivalent_classifications;
use distco::{
    run_local_group, ClusterParams, CoclusterError, Coclusterer, CpuKernels, Label,
    ParallelKernels,
};
use ndarray::Array2;
use ndarray_npy::WriteNpyExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const K: usize = 3;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Matrix whose cell level is `10 * (row_cluster + col_cluster)` plus
/// noise in [0, 0.5), with shuffled cluster membership
struct Planted {
    matrix: Array2<f32>,
    rows: Vec<Label>,
    cols: Vec<Label>,
}

fn planted(n_rows: usize, n_cols: usize, seed: u64) -> Planted {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut rows: Vec<Label> = (0..n_rows).map(|i| (i % K) as Label).collect();
    let mut cols: Vec<Label> = (0..n_cols).map(|j| (j % K) as Label).collect();
    rows.shuffle(&mut rng);
    cols.shuffle(&mut rng);

    let mut matrix = Array2::zeros((n_rows, n_cols));
    for ((i, j), v) in matrix.indexed_iter_mut() {
        let level = 10.0 * (rows[i] + cols[j]) as f32;
        *v = level + rng.random::<f32>() * 0.5;
    }

    Planted { matrix, rows, cols }
}

/// True labels with every 18th row moved to the next cluster
fn perturbed_rows(truth: &[Label]) -> Vec<Label> {
    truth
        .iter()
        .enumerate()
        .map(|(i, &l)| if i % 18 == 5 { (l + 1) % K as Label } else { l })
        .collect()
}

fn params() -> ClusterParams {
    ClusterParams {
        num_row_labels: K,
        num_col_labels: K,
        max_iterations: 25,
    }
}

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("distco-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn write_label_list(path: &PathBuf, labels: &[Label]) {
    let text: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
    fs::write(path, text.join(" ")).unwrap();
}

fn args(extra: &[&str]) -> Vec<String> {
    let mut all = vec!["distco".to_string()];
    all.extend(extra.iter().map(|s| s.to_string()));
    all
}

#[test]
fn test_planted_blocks_recovered_for_every_worker_count() {
    init();
    let data = planted(90, 45, 1);
    let clusterer = Coclusterer::new(params()).with_reporter(Arc::new(NullReporter));

    for workers in [1, 2, 3, 4, 8] {
        let outcome = run_local_group(
            workers,
            &clusterer,
            data.matrix.view(),
            perturbed_rows(&data.rows),
            data.cols.clone(),
        )
        .unwrap();

        assert_eq!(outcome.labels.rows, data.rows, "workers = {}", workers);
        assert_eq!(outcome.labels.cols, data.cols, "workers = {}", workers);
        assert!(outcome.summary.converged);
        assert_eq!(outcome.summary.iterations, 2);

        let first = &outcome.summary.history[0];
        assert_eq!(first.rows_changed, 5);
        assert_eq!(first.cols_changed, 0);
        assert!(outcome.summary.final_average_distortion().unwrap() < 0.25);
    }
}

#[test]
fn test_kernel_providers_agree() {
    init();
    let data = planted(120, 64, 2);
    let rows = perturbed_rows(&data.rows);

    let cpu = Coclusterer::new(params())
        .with_kernels(Arc::new(CpuKernels))
        .with_reporter(Arc::new(NullReporter));
    let parallel = Coclusterer::new(params())
        .with_kernels(Arc::new(ParallelKernels {
            min_lanes_for_parallel: 1,
        }))
        .with_reporter(Arc::new(NullReporter));

    let a = run_local_group(3, &cpu, data.matrix.view(), rows.clone(), data.cols.clone()).unwrap();
    let b = run_local_group(3, &parallel, data.matrix.view(), rows, data.cols.clone()).unwrap();

    assert_eq!(a.labels, b.labels);
    assert_eq!(a.summary.iterations, b.summary.iterations);
    for (x, y) in a.summary.history.iter().zip(&b.summary.history) {
        assert_eq!(x.changed(), y.changed());
        assert_relative_eq!(x.distortion, y.distortion, max_relative = 1e-12);
    }
}

#[test]
fn test_distortion_never_increases_from_random_start() {
    init();
    let data = planted(75, 50, 3);
    let rows = distco::labels::random_labels(75, K, 9).unwrap();
    let cols = distco::labels::random_labels(50, K, 10).unwrap();
    let clusterer = Coclusterer::new(params()).with_reporter(Arc::new(NullReporter));

    let outcome = run_local_group(4, &clusterer, data.matrix.view(), rows, cols).unwrap();

    let history = &outcome.summary.history;
    assert!(!history.is_empty());
    for pair in history.windows(2) {
        assert!(pair[1].distortion <= pair[0].distortion * (1.0 + 1e-6) + 1e-6);
    }
    if outcome.summary.converged {
        assert_eq!(history.last().unwrap().changed(), 0);
    } else {
        assert_eq!(outcome.summary.iterations, 25);
    }
}

#[test]
fn test_launch_writes_label_file() {
    init();
    let data = planted(36, 24, 4);
    let matrix_path = temp_path("launch_matrix.npy");
    let rows_path = temp_path("launch_rows.txt");
    let cols_path = temp_path("launch_cols.txt");
    let output = temp_path("launch_labels.txt");

    data.matrix
        .write_npy(File::create(&matrix_path).unwrap())
        .unwrap();
    write_label_list(&rows_path, &perturbed_rows(&data.rows));
    write_label_list(&cols_path, &data.cols);

    let config = Config::new(args(&[
        "--matrix",
        matrix_path.to_str().unwrap(),
        "--row-clusters",
        "3",
        "--col-clusters",
        "3",
        "--row-labels",
        rows_path.to_str().unwrap(),
        "--col-labels",
        cols_path.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--workers",
        "3",
        "--kernels",
        "cpu",
    ]))
    .unwrap();

    let outcome = launch(&config).unwrap();
    let written = read_labels(&output).unwrap();

    assert_eq!(written, outcome.labels);
    assert_eq!(written.rows, data.rows);
    assert_eq!(written.cols, data.cols);
}

#[test]
fn test_launch_with_random_initial_labels() {
    init();
    let data = planted(30, 20, 5);
    let matrix_path = temp_path("random_matrix.npy");
    let output = temp_path("random_labels.txt");
    data.matrix
        .write_npy(File::create(&matrix_path).unwrap())
        .unwrap();

    let config = Config::new(args(&[
        "--matrix",
        matrix_path.to_str().unwrap(),
        "--row-clusters",
        "3",
        "--col-clusters",
        "2",
        "--output",
        output.to_str().unwrap(),
        "--workers",
        "2",
        "--max-iterations",
        "4",
    ]))
    .unwrap();

    let outcome = launch(&config).unwrap();
    let written = read_labels(&output).unwrap();
    assert_eq!(written.rows.len(), 30);
    assert_eq!(written.cols.len(), 20);
    assert!(written.rows.iter().all(|&l| l < 3));
    assert!(written.cols.iter().all(|&l| l < 2));
    assert!(outcome.summary.iterations <= 4);

    // same seed, same result
    let again = launch(&config).unwrap();
    assert_eq!(again.labels, outcome.labels);
}

#[test]
fn test_launch_rejects_bad_inputs() {
    init();
    let output = temp_path("bad_labels.txt");

    let missing = Config::new(args(&[
        "--matrix",
        "/nonexistent/distco/matrix.npy",
        "--row-clusters",
        "2",
        "--col-clusters",
        "2",
        "--output",
        output.to_str().unwrap(),
    ]))
    .unwrap();
    assert!(matches!(launch(&missing), Err(CoclusterError::Matrix(_))));

    let data = planted(12, 9, 6);
    let matrix_path = temp_path("bad_matrix.npy");
    let short_rows = temp_path("bad_rows.txt");
    data.matrix
        .write_npy(File::create(&matrix_path).unwrap())
        .unwrap();
    write_label_list(&short_rows, &data.rows[..10]);

    let mismatched = Config::new(args(&[
        "--matrix",
        matrix_path.to_str().unwrap(),
        "--row-clusters",
        "3",
        "--col-clusters",
        "3",
        "--row-labels",
        short_rows.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]))
    .unwrap();
    assert!(matches!(
        launch(&mismatched),
        Err(CoclusterError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_recovery_is_independent_of_label_names() {
    init();
    let data = planted(90, 45, 7);
    // perturbed start with every row label renamed l -> l + 2 (mod 3)
    let renamed: Vec<Label> = perturbed_rows(&data.rows)
        .iter()
        .map(|&l| (l + 2) % K as Label)
        .collect();
    let clusterer = Coclusterer::new(params()).with_reporter(Arc::new(NullReporter));

    let outcome =
        run_local_group(3, &clusterer, data.matrix.view(), renamed, data.cols.clone()).unwrap();

    assert!(outcome.summary.converged);
    assert_ne!(outcome.labels.rows, data.rows);
    assert!(are_equivalent_classifications(
        &outcome.labels.rows,
        &data.rows
    ));
    assert_eq!(outcome.labels.cols, data.cols);
}

/// 1.0 top-left block, 9.0 bottom-right block, 5.0 elsewhere
fn two_blocks() -> Array2<f32> {
    let mut x = Array2::from_elem((4, 4), 5.0f32);
    for i in 0..2 {
        for j in 0..2 {
            x[[i, j]] = 1.0;
            x[[i + 2, j + 2]] = 9.0;
        }
    }
    x
}

#[test]
fn test_two_blocks_from_default_seed_stop_at_tied_fixed_point() {
    init();
    let config = Config::new(args(&[
        "--matrix",
        "unused.npy",
        "--row-clusters",
        "2",
        "--col-clusters",
        "2",
        "--output",
        "unused.txt",
    ]))
    .unwrap();
    let (rows, cols) = config.initial_labels(4, 4).unwrap();
    assert_eq!(rows, vec![0, 1, 0, 1]);
    assert_eq!(cols, vec![1, 1, 0, 0]);

    let clusterer = Coclusterer::new(config.params()).with_reporter(Arc::new(NullReporter));
    let outcome = run_local_group(2, &clusterer, two_blocks().view(), rows, cols).unwrap();

    // both row clusters see the same averages, so ties keep every row
    // where it is and the blocks stay mixed
    assert!(outcome.summary.converged);
    assert_eq!(outcome.summary.iterations, 1);
    assert_eq!(outcome.labels.rows, vec![0, 1, 0, 1]);
    assert_eq!(outcome.labels.cols, vec![1, 1, 0, 0]);
    assert_eq!(outcome.summary.final_average_distortion(), Some(4.0));

    // a start with one misplaced row separates the blocks exactly
    let separated =
        run_local_group(2, &clusterer, two_blocks().view(), vec![0, 0, 0, 1], vec![0, 0, 0, 1])
            .unwrap();
    assert_eq!(separated.labels.rows, vec![0, 0, 1, 1]);
    assert_eq!(separated.labels.cols, vec![0, 0, 1, 1]);
    assert_eq!(separated.summary.final_average_distortion(), Some(0.0));
}
