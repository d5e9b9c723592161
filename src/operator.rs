//! The sparse remapping operator in coordinate (COO) form.

use crate::error::{Error, Result};
use crate::{CooMatrix, CsrMatrix};

/// A fixed sparse linear operator mapping dense vectors of width
/// `input_width` to dense vectors of width `output_width`, stored as
/// parallel arrays of (source column, destination row, weight) triples.
///
/// Built once from static weight data, validated once, never mutated.
/// Multiple worker threads share it by reference with no locking.
#[derive(Debug, Clone)]
pub struct RemapOperator {
    col: Vec<u32>,
    row: Vec<u32>,
    weight: Vec<f64>,
    input_width: usize,
    output_width: usize,
}

impl RemapOperator {
    /// Builds an operator from triplet arrays, validating the data once so
    /// the apply kernels can index without bounds checks on every nonzero.
    pub fn from_triplets(
        col: Vec<u32>,
        row: Vec<u32>,
        weight: Vec<f64>,
        input_width: usize,
        output_width: usize,
    ) -> Result<Self> {
        if col.len() != row.len() || col.len() != weight.len() {
            return Err(Error::InvalidOperator(format!(
                "triplet arrays have mismatched lengths: col {} row {} weight {}",
                col.len(),
                row.len(),
                weight.len()
            )));
        }
        if let Some(&c) = col.iter().max() {
            if c as usize >= input_width {
                return Err(Error::InvalidOperator(format!(
                    "column index {} out of bounds for input width {}",
                    c, input_width
                )));
            }
        }
        if let Some(&r) = row.iter().max() {
            if r as usize >= output_width {
                return Err(Error::InvalidOperator(format!(
                    "row index {} out of bounds for output width {}",
                    r, output_width
                )));
            }
        }

        Ok(Self {
            col,
            row,
            weight,
            input_width,
            output_width,
        })
    }

    /// Identity-like permutation operator, mostly useful for sanity checks:
    /// every input column passes through to the same output row unscaled.
    pub fn identity(width: usize) -> Self {
        Self {
            col: (0..width as u32).collect(),
            row: (0..width as u32).collect(),
            weight: vec![1.0; width],
            input_width: width,
            output_width: width,
        }
    }

    pub fn nnz(&self) -> usize {
        self.weight.len()
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn output_width(&self) -> usize {
        self.output_width
    }

    pub fn col(&self) -> &[u32] {
        &self.col
    }

    pub fn row(&self) -> &[u32] {
        &self.row
    }

    pub fn weight(&self) -> &[f64] {
        &self.weight
    }

    /// Iterate the triplets in reference (ascending index) order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.col
            .iter()
            .zip(self.row.iter())
            .zip(self.weight.iter())
            .map(|((&c, &r), &w)| (c as usize, r as usize, w))
    }

    /// Converts to a CSR matrix of shape `(output_width, input_width)`.
    /// Duplicate triplets targeting the same cell are summed by the
    /// conversion, and nonzeros end up sorted by source column within each
    /// destination row, which changes per-cell accumulation order relative
    /// to the COO kernels.
    pub fn to_csr(&self) -> CsrMatrix {
        let mut coo = CooMatrix::with_capacity((self.output_width, self.input_width), self.nnz());
        for (c, r, w) in self.iter() {
            coo.add_triplet(r, c, w);
        }
        coo.to_csr::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::RemapOperator;
    use crate::error::Error;

    #[test]
    fn rejects_mismatched_lengths() {
        let result = RemapOperator::from_triplets(vec![0, 1], vec![0], vec![1.0, 2.0], 2, 2);
        assert!(matches!(result, Err(Error::InvalidOperator(_))));
    }

    #[test]
    fn rejects_out_of_bounds_column() {
        let result = RemapOperator::from_triplets(vec![2], vec![0], vec![1.0], 2, 2);
        assert!(matches!(result, Err(Error::InvalidOperator(_))));
    }

    #[test]
    fn rejects_out_of_bounds_row() {
        let result = RemapOperator::from_triplets(vec![0], vec![5], vec![1.0], 2, 3);
        assert!(matches!(result, Err(Error::InvalidOperator(_))));
    }

    #[test]
    fn empty_operator_is_valid() {
        let op = RemapOperator::from_triplets(vec![], vec![], vec![], 4, 3).unwrap();
        assert_eq!(op.nnz(), 0);
        assert_eq!(op.input_width(), 4);
        assert_eq!(op.output_width(), 3);
    }

    #[test]
    fn csr_conversion_sums_duplicates() {
        let op =
            RemapOperator::from_triplets(vec![1, 1], vec![0, 0], vec![2.0, 3.0], 2, 2).unwrap();
        let csr = op.to_csr();
        assert_eq!(csr.rows(), 2);
        assert_eq!(csr.cols(), 2);
        assert_eq!(csr.nnz(), 1);
        assert_eq!(*csr.get(0, 1).unwrap(), 5.0);
    }
}
