//! Serial reference kernel for applying a COO operator to a dense batch.

use ndarray::ArrayView2;

use crate::error::{Error, Result};
use crate::operator::RemapOperator;
use crate::Output;

/// Applies `op` to every row of `batch`, accumulating nonzeros in ascending
/// index order. This ordering is the reference all other strategies are
/// compared against, since per-cell accumulation order determines the
/// floating point rounding residue.
///
/// Fails with [`Error::ShapeMismatch`] before any allocation or write when
/// the batch width does not match the operator's input width.
pub fn apply(op: &RemapOperator, batch: ArrayView2<f64>) -> Result<Output> {
    check_shape(op, &batch)?;

    let mut out = Output::zeros((batch.nrows(), op.output_width()));
    for (j, sample) in batch.outer_iter().enumerate() {
        let mut out_row = out.row_mut(j);
        for (c, r, w) in op.iter() {
            out_row[r] += sample[c] * w;
        }
    }
    Ok(out)
}

pub(crate) fn check_shape(op: &RemapOperator, batch: &ArrayView2<f64>) -> Result<()> {
    if batch.ncols() != op.input_width() {
        return Err(Error::ShapeMismatch {
            expected: op.input_width(),
            got: batch.ncols(),
        });
    }
    Ok(())
}

/// Accumulates one sample into a zeroed output row. Shared by the parallel
/// and chunked strategies so every COO path keeps the exact reference
/// ordering.
pub(crate) fn accumulate_row(op: &RemapOperator, sample: ndarray::ArrayView1<f64>) -> Vec<f64> {
    let mut out_row = vec![0.0; op.output_width()];
    for (c, r, w) in op.iter() {
        out_row[r] += sample[c] * w;
    }
    out_row
}
