//! Parallel implementations of the remapping kernel. Batch rows are
//! independent samples, so the row loop splits across the rayon pool with
//! no synchronization; each worker owns its output row outright and the
//! operator is shared read-only.

use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::apply::{accumulate_row, check_shape};
use crate::error::{Error, Result};
use crate::operator::RemapOperator;
use crate::{CsrMatrix, Output, Vector};

/// Row-parallel apply. Each sample accumulates into a private buffer in the
/// reference ascending index order, so the result is bit-identical to
/// [`crate::apply::apply`] regardless of worker count.
pub fn apply_parallel(op: &RemapOperator, batch: ArrayView2<f64>) -> Result<Output> {
    check_shape(op, &batch)?;

    let rows: Vec<Vec<f64>> = batch
        .outer_iter()
        .into_par_iter()
        .map(|sample| accumulate_row(op, sample))
        .collect();

    Ok(collect_rows(rows, op.output_width()))
}

/// Sparse matrix-vector product for one sample against the CSR form of the
/// operator, parallel over destination rows.
pub fn spmv(a: &CsrMatrix, b: ArrayView1<f64>) -> Vector {
    assert!(a.is_csr());
    assert_eq!(a.cols(), b.len());
    let c: Vec<f64> = (0..a.rows())
        .into_par_iter()
        .map(|i| {
            let row = a.outer_view(i).unwrap();
            row.iter().map(|(j, val)| b[j] * val).sum::<f64>()
        })
        .collect();
    Vector::from(c)
}

/// Applies the CSR form of the operator, one spmv per sample with the
/// sample loop run serially and each spmv parallel over destination rows.
///
/// The CSR conversion sums duplicate triplets and sorts nonzeros by source
/// column within each destination row, so per-cell accumulation order
/// differs from the COO reference. Results agree only within floating
/// point rounding, never assume bit-identity with the other strategies.
pub fn apply_csr(csr: &CsrMatrix, batch: ArrayView2<f64>) -> Result<Output> {
    if batch.ncols() != csr.cols() {
        return Err(Error::ShapeMismatch {
            expected: csr.cols(),
            got: batch.ncols(),
        });
    }

    let rows: Vec<Vec<f64>> = batch
        .outer_iter()
        .map(|sample| spmv(csr, sample).to_vec())
        .collect();

    Ok(collect_rows(rows, csr.rows()))
}

fn collect_rows(rows: Vec<Vec<f64>>, width: usize) -> Output {
    let nrows = rows.len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Output::from_shape_vec((nrows, width), flat)
        .expect("every accumulated row has the operator's output width")
}
