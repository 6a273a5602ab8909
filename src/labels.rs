//! # Label Files
//!
//! Output format, one integer per line:
//! ```text
//! <num_rows> <num_cols>
//! <row label 0>
//! ...
//! <col label 0>
//! ...
//! ```
//! Writing then reading a file reproduces the same labels.

/*
 * File: /src/labels.rs
 * Created Date: Sunday, October 18th 2026
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Label file I/O and seeded initialization
 */

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use ndarray::Array1;
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::error::{CoclusterError, LabelError, Result};
use crate::Label;

/// Final row and column labels of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    pub rows: Vec<Label>,
    pub cols: Vec<Label>,
}

impl LabelSet {
    pub fn new(rows: Vec<Label>, cols: Vec<Label>) -> Self {
        Self { rows, cols }
    }

    pub fn write_to<W: Write>(&self, writer: W) -> std::result::Result<(), LabelError> {
        let mut out = BufWriter::new(writer);
        writeln!(out, "{} {}", self.rows.len(), self.cols.len())?;
        for label in self.rows.iter().chain(&self.cols) {
            writeln!(out, "{}", label)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> std::result::Result<LabelSet, LabelError> {
        let mut lines = BufReader::new(reader).lines().enumerate();

        let (num_rows, num_cols) = match lines.next() {
            Some((_, header)) => parse_header(&header?)?,
            None => {
                return Err(LabelError::Parse {
                    line: 1,
                    msg: "missing header".to_string(),
                })
            }
        };

        let mut labels = Vec::with_capacity(num_rows + num_cols);
        for (idx, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            labels.push(parse_label(line.trim(), idx + 1)?);
        }
        if labels.len() != num_rows + num_cols {
            return Err(LabelError::Parse {
                line: 1,
                msg: format!(
                    "header announces {} labels, found {}",
                    num_rows + num_cols,
                    labels.len()
                ),
            });
        }

        let cols = labels.split_off(num_rows);
        Ok(LabelSet { rows: labels, cols })
    }
}

fn parse_header(header: &str) -> std::result::Result<(usize, usize), LabelError> {
    let fields: Vec<&str> = header.split_whitespace().collect();
    let bad = |msg: String| LabelError::Parse { line: 1, msg };
    if fields.len() != 2 {
        return Err(bad(format!("expected '<rows> <cols>', got '{}'", header)));
    }
    let rows = fields[0]
        .parse::<usize>()
        .map_err(|e| bad(format!("row count '{}': {}", fields[0], e)))?;
    let cols = fields[1]
        .parse::<usize>()
        .map_err(|e| bad(format!("column count '{}': {}", fields[1], e)))?;
    Ok((rows, cols))
}

fn parse_label(token: &str, line: usize) -> std::result::Result<Label, LabelError> {
    token.parse::<Label>().map_err(|e| LabelError::Parse {
        line,
        msg: format!("label '{}': {}", token, e),
    })
}

/// Write the label file
pub fn write_labels<P: AsRef<Path>>(path: P, labels: &LabelSet) -> Result<()> {
    let file = File::create(path.as_ref()).map_err(LabelError::from)?;
    labels.write_to(file)?;
    Ok(())
}

/// Read a label file written by [`write_labels`]
pub fn read_labels<P: AsRef<Path>>(path: P) -> Result<LabelSet> {
    let file = File::open(path.as_ref()).map_err(LabelError::from)?;
    Ok(LabelSet::read_from(file)?)
}

/// Read initial labels for one axis: whitespace separated integers
pub fn read_label_list<P: AsRef<Path>>(path: P) -> Result<Vec<Label>> {
    let file = File::open(path.as_ref()).map_err(LabelError::from)?;
    let mut labels = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(LabelError::from)?;
        for token in line.split_whitespace() {
            labels.push(parse_label(token, idx + 1)?);
        }
    }
    Ok(labels)
}

/// Seeded uniform labels in `[0, k)`
pub fn random_labels(n: usize, k: usize, seed: u64) -> Result<Vec<Label>> {
    if k == 0 {
        return Err(CoclusterError::InvalidConfiguration(
            "cannot draw labels from zero clusters".to_string(),
        ));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let labels = Array1::random_using(n, Uniform::new(0, k as Label), &mut rng);
    Ok(labels.to_vec())
}
