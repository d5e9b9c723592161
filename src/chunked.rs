//! Chunked execution: partition the batch along its row axis into
//! contiguous pieces, apply the reference kernel to each piece
//! independently, and reassemble by concatenating the piece outputs in
//! their original order. Pieces share nothing but the read-only operator,
//! so this is the same shared-nothing decomposition a distributed runner
//! would use, with rayon standing in for the scheduler.

use ndarray::{concatenate, ArrayView2, Axis};
use rayon::prelude::*;

use crate::apply::{apply, check_shape};
use crate::error::Result;
use crate::operator::RemapOperator;
use crate::Output;

/// Applies `op` to `batch` in contiguous row chunks of at most
/// `chunk_rows` rows each. Chunks run on the rayon pool; the in-order
/// collect and concatenation guarantee output row order matches the input
/// batch no matter how the pool interleaves them.
///
/// Every chunk uses the reference kernel, so the result is bit-identical
/// to a whole-batch [`apply`].
pub fn apply_chunked(
    op: &RemapOperator,
    batch: ArrayView2<f64>,
    chunk_rows: usize,
) -> Result<Output> {
    check_shape(op, &batch)?;
    let chunk_rows = chunk_rows.max(1);
    if batch.nrows() == 0 {
        return Ok(Output::zeros((0, op.output_width())));
    }

    let chunks: Vec<ArrayView2<f64>> = batch.axis_chunks_iter(Axis(0), chunk_rows).collect();
    trace!(
        "applying {} nonzeros over {} chunks of <= {} rows",
        op.nnz(),
        chunks.len(),
        chunk_rows
    );

    let outputs: Vec<Output> = chunks
        .into_par_iter()
        .map(|chunk| apply(op, chunk))
        .collect::<Result<_>>()?;

    let views: Vec<ArrayView2<f64>> = outputs.iter().map(|o| o.view()).collect();
    Ok(concatenate(Axis(0), &views).expect("chunk outputs share the operator's output width"))
}

#[cfg(test)]
mod tests {
    use super::apply_chunked;
    use crate::apply::apply;
    use crate::error::Error;
    use crate::operator::RemapOperator;
    use crate::utils::{random_batch, random_operator};
    use ndarray::array;

    #[test]
    fn chunking_is_invariant_bitwise() {
        let op = random_operator(600, 30, 45);
        let batch = random_batch(37, 30);
        let reference = apply(&op, batch.view()).unwrap();

        // 37 rows exercises uneven tails, single-row chunks, and a chunk
        // larger than the whole batch.
        for chunk_rows in [1, 2, 5, 16, 37, 100] {
            let chunked = apply_chunked(&op, batch.view(), chunk_rows).unwrap();
            assert_eq!(reference, chunked, "chunk_rows = {}", chunk_rows);
        }
    }

    #[test]
    fn row_order_is_preserved() {
        let op = RemapOperator::identity(2);
        let batch = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0], [5.0, 5.0]];
        let out = apply_chunked(&op, batch.view(), 2).unwrap();
        assert_eq!(out, batch);
    }

    #[test]
    fn zero_chunk_rows_is_clamped() {
        let op = RemapOperator::identity(3);
        let batch = random_batch(4, 3);
        let out = apply_chunked(&op, batch.view(), 0).unwrap();
        assert_eq!(out, apply(&op, batch.view()).unwrap());
    }

    #[test]
    fn chunked_rejects_shape_mismatch() {
        let op = RemapOperator::identity(3);
        let batch = random_batch(4, 2);
        assert!(matches!(
            apply_chunked(&op, batch.view(), 2),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
