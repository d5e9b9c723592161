//! Loading and saving remap operators as npy arrays.
//!
//! An operator lives under a common path prefix as three equal-length
//! arrays plus an optional two-element dimensions array:
//!
//! ```text
//! <prefix>.col.npy     i64, source column per nonzero
//! <prefix>.row.npy     i64, destination row per nonzero
//! <prefix>.weight.npy  f64, coefficient per nonzero
//! <prefix>.dims.npy    i64, [input_width, output_width] (optional)
//! ```
//!
//! Regridding weight files in the wild index grid cells from 1, so the
//! loader takes the index base explicitly and normalizes to 0-based before
//! the operator is validated. When the dims file is missing, widths are
//! inferred as one past the largest index seen.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::operator::RemapOperator;

/// Index convention of the external triplet arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBase {
    Zero,
    One,
}

pub fn load_operator<P: AsRef<Path>>(prefix: P, base: IndexBase) -> Result<RemapOperator> {
    let prefix = prefix.as_ref();
    let col = read_npy_vec::<i64>(&mut open(prefix, "col")?)?;
    let row = read_npy_vec::<i64>(&mut open(prefix, "row")?)?;
    let weight = read_npy_vec::<f64>(&mut open(prefix, "weight")?)?;

    let dims_path = suffixed(prefix, "dims");
    let dims = if dims_path.exists() {
        let dims = read_npy_vec::<i64>(&mut BufReader::new(File::open(&dims_path)?))?;
        if dims.len() != 2 {
            return Err(Error::InvalidOperator(format!(
                "dims array has {} entries, expected [input_width, output_width]",
                dims.len()
            )));
        }
        Some((dims[0] as usize, dims[1] as usize))
    } else {
        None
    };

    info!(
        "loaded operator from {}: {} nonzeros, dims {:?}",
        prefix.display(),
        weight.len(),
        dims
    );
    build_operator(col, row, weight, dims, base)
}

/// Writes an operator back out in the load layout, 0-based, dims included.
pub fn save_operator<P: AsRef<Path>>(op: &RemapOperator, prefix: P) -> Result<()> {
    let prefix = prefix.as_ref();
    let col: Vec<i64> = op.col().iter().map(|&c| c as i64).collect();
    let row: Vec<i64> = op.row().iter().map(|&r| r as i64).collect();
    let dims = [op.input_width() as i64, op.output_width() as i64];

    write_npy_vec(&mut create(prefix, "col")?, &col)?;
    write_npy_vec(&mut create(prefix, "row")?, &row)?;
    write_npy_vec(&mut create(prefix, "weight")?, op.weight())?;
    write_npy_vec(&mut create(prefix, "dims")?, &dims)?;
    trace!("saved operator to {}", prefix.display());
    Ok(())
}

/// Normalizes raw triplet arrays into a validated operator. Split from the
/// file plumbing so fixture-free tests can exercise it directly.
pub fn build_operator(
    col: Vec<i64>,
    row: Vec<i64>,
    weight: Vec<f64>,
    dims: Option<(usize, usize)>,
    base: IndexBase,
) -> Result<RemapOperator> {
    let col = normalize_indices(col, base, "col")?;
    let row = normalize_indices(row, base, "row")?;

    let (input_width, output_width) = match dims {
        Some(dims) => dims,
        None => (
            col.iter().max().map_or(0, |&c| c as usize + 1),
            row.iter().max().map_or(0, |&r| r as usize + 1),
        ),
    };

    RemapOperator::from_triplets(col, row, weight, input_width, output_width)
}

fn normalize_indices(raw: Vec<i64>, base: IndexBase, name: &str) -> Result<Vec<u32>> {
    let offset = match base {
        IndexBase::Zero => 0,
        IndexBase::One => 1,
    };
    raw.into_iter()
        .map(|idx| {
            if idx < offset || idx - offset > u32::MAX as i64 {
                return Err(Error::InvalidOperator(format!(
                    "{} index {} outside the declared index base",
                    name, idx
                )));
            }
            Ok((idx - offset) as u32)
        })
        .collect()
}

fn read_npy_vec<T: npyz::Deserialize>(reader: &mut impl Read) -> io::Result<Vec<T>> {
    let npy = npyz::NpyFile::new(reader)?;
    npy.into_vec::<T>()
}

fn write_npy_vec<T: npyz::AutoSerialize + Copy>(
    out_buf: &mut impl Write,
    data: &[T],
) -> io::Result<()> {
    use npyz::WriterBuilder;
    let mut writer = npyz::WriteOptions::new()
        .default_dtype()
        .shape(&[data.len() as u64])
        .writer(out_buf)
        .begin_nd()?;

    writer.extend(data.iter().copied())?;
    writer.finish()?;
    Ok(())
}

fn open(prefix: &Path, part: &str) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(suffixed(prefix, part))?))
}

fn create(prefix: &Path, part: &str) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(suffixed(prefix, part))?))
}

fn suffixed(prefix: &Path, part: &str) -> std::path::PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!(".{}.npy", part));
    std::path::PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::{build_operator, load_operator, read_npy_vec, save_operator, write_npy_vec, IndexBase};
    use crate::error::Error;
    use crate::utils::random_operator;
    use std::io::Cursor;

    #[test]
    fn operator_file_round_trip() {
        let op = random_operator(50, 10, 8);
        let prefix =
            std::env::temp_dir().join(format!("remap_bench_roundtrip_{}", std::process::id()));
        save_operator(&op, &prefix).unwrap();
        let back = load_operator(&prefix, IndexBase::Zero).unwrap();
        assert_eq!(op.col(), back.col());
        assert_eq!(op.row(), back.row());
        assert_eq!(op.weight(), back.weight());
        assert_eq!(op.input_width(), back.input_width());
        assert_eq!(op.output_width(), back.output_width());
    }

    #[test]
    fn npy_bytes_round_trip() {
        let values = vec![0.25_f64, -1.5, 3.0];
        let mut bytes = Vec::new();
        write_npy_vec(&mut bytes, &values).unwrap();
        let back = read_npy_vec::<f64>(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(values, back);
    }

    #[test]
    fn one_based_indices_are_normalized() {
        let op = build_operator(
            vec![1, 2, 2],
            vec![1, 1, 2],
            vec![1.0, 2.0, 3.0],
            Some((2, 2)),
            IndexBase::One,
        )
        .unwrap();
        assert_eq!(op.col(), &[0, 1, 1]);
        assert_eq!(op.row(), &[0, 0, 1]);
    }

    #[test]
    fn zero_index_under_one_based_is_rejected() {
        let result = build_operator(
            vec![0, 1],
            vec![1, 1],
            vec![1.0, 1.0],
            Some((2, 2)),
            IndexBase::One,
        );
        assert!(matches!(result, Err(Error::InvalidOperator(_))));
    }

    #[test]
    fn widths_inferred_from_indices_when_dims_absent() {
        let op = build_operator(
            vec![0, 4],
            vec![2, 7],
            vec![1.0, 1.0],
            None,
            IndexBase::Zero,
        )
        .unwrap();
        assert_eq!(op.input_width(), 5);
        assert_eq!(op.output_width(), 8);
    }

    #[test]
    fn empty_operator_without_dims_has_zero_widths() {
        let op = build_operator(vec![], vec![], vec![], None, IndexBase::Zero).unwrap();
        assert_eq!(op.input_width(), 0);
        assert_eq!(op.output_width(), 0);
        assert_eq!(op.nnz(), 0);
    }
}
