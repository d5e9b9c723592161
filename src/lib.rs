//! Benchmarking strategies for applying a fixed sparse remapping operator
//! (e.g. precomputed area-weighted regridding coefficients) to batches of
//! dense vectors.
//!
//! The operator is stored in coordinate (COO) form as three parallel arrays
//! of (source column, destination row, weight) triples and is built once,
//! validated once, and never mutated afterward. Applying it to a batch of
//! shape `(batch_size, input_width)` yields `(batch_size, output_width)`
//! by accumulation:
//!
//! ```text
//! out[j, row[i]] += batch[j, col[i]] * weight[i]
//! ```
//!
//! Batch rows are independent samples, so the outer loop is embarrassingly
//! parallel. The crate provides a serial reference kernel ([`apply::apply`]),
//! a row-parallel variant, a chunked variant that partitions the batch along
//! the row axis, and a CSR-converted variant. All but the CSR path keep the
//! reference per-cell accumulation order and produce bit-identical results;
//! see [`parallel_ops::apply_csr`] for why that one is only tolerance-equal.

use ndarray::{Array1, Array2};
use sprs::{CsMatBase, TriMatBase};

#[macro_use]
extern crate log;
extern crate approx;

pub mod apply;
pub mod chunked;
pub mod error;
pub mod io;
pub mod operator;
pub mod parallel_ops;
pub mod utils;

pub use error::{Error, Result};
pub use operator::RemapOperator;

pub type CsrMatrix = CsMatBase<f64, usize, Vec<usize>, Vec<usize>, Vec<f64>, usize>;
pub type CooMatrix = TriMatBase<Vec<usize>, Vec<f64>>;
pub type Vector = Array1<f64>;
pub type Batch = Array2<f64>;
pub type Output = Array2<f64>;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use lazy_static::lazy_static;

// Lazily-initialised output directory for benchmark results.
lazy_static! {
    static ref OUTPUT_DIR: PathBuf = {
        let base = Path::new("./output");
        fs::create_dir_all(base).expect("Failed to create base output directory");
        let ts = Local::now().format("%Y-%m-%d_%H:%M:%S").to_string();
        for suffix in 0u32.. {
            let candidate = if suffix == 0 {
                base.join(&ts)
            } else {
                base.join(format!("{}_{}", ts, suffix))
            };

            if !candidate.exists() {
                fs::create_dir_all(&candidate)
                    .expect("Failed to create unique output directory");
                return candidate;
            }
        }
        unreachable!("u32 exhausted while searching for unique directory name")
    };
    static ref N_CPUS: usize = num_cpus::get();
}

/// Helper to build paths inside the output directory.
///
/// ```no_run
/// use std::{fs, io::Write};
///
/// let path = remap_bench::output_path("example.txt");
/// let mut f = fs::File::create(&path).unwrap();
/// writeln!(f, "Hello, world!").unwrap();
///
/// println!("Wrote to {}", path.display());
/// ```
pub fn output_path<S: AsRef<Path>>(file: S) -> PathBuf {
    OUTPUT_DIR.join(file)
}

/// Number of logical CPUs, as reported in benchmark logs.
pub fn n_cpus() -> usize {
    *N_CPUS
}
