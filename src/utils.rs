//! Synthetic data helpers and small odds and ends for the bench drivers.

use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use std::time::Duration;

use crate::operator::RemapOperator;
use crate::{Batch, Vector};

pub fn random_vec(size: usize) -> Vector {
    Vector::random(size, Uniform::new(-2.0_f64, 2.0))
}

/// A batch of independent random samples, one per row.
pub fn random_batch(batch_size: usize, width: usize) -> Batch {
    Batch::random((batch_size, width), Uniform::new(-2.0_f64, 2.0))
}

/// A random operator with `nnz` triplets drawn uniformly over the given
/// widths. Duplicate (row, col) pairs are allowed, matching real regrid
/// weight files where several source cells overlap one destination cell.
pub fn random_operator(nnz: usize, input_width: usize, output_width: usize) -> RemapOperator {
    let mut rng = rand::thread_rng();
    let col = (0..nnz).map(|_| rng.gen_range(0..input_width as u32)).collect();
    let row = (0..nnz)
        .map(|_| rng.gen_range(0..output_width as u32))
        .collect();
    let weight = (0..nnz).map(|_| rng.gen_range(-2.0..2.0)).collect();
    RemapOperator::from_triplets(col, row, weight, input_width, output_width)
        .expect("generated indices are in bounds by construction")
}

pub fn format_duration(duration: &Duration) -> String {
    let seconds = duration.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let minutes = minutes % 60;
    let seconds = seconds % 60;

    format!("{} hours, {} minutes, {} seconds", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::{random_batch, random_operator, random_vec};

    #[test]
    fn random_batch_has_requested_shape() {
        let batch = random_batch(8, 12);
        assert_eq!(batch.dim(), (8, 12));
        assert!(batch.iter().all(|x| (-2.0..2.0).contains(x)));
    }

    #[test]
    fn random_vec_has_requested_len() {
        assert_eq!(random_vec(9).len(), 9);
    }

    #[test]
    fn random_operator_is_valid_by_construction() {
        let op = random_operator(100, 10, 20);
        assert_eq!(op.nnz(), 100);
        assert!(op.col().iter().all(|&c| (c as usize) < 10));
        assert!(op.row().iter().all(|&r| (r as usize) < 20));
    }
}
