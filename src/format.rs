//! Binary formats shared with the inference engine.
//!
//! Two writers exist in the surrounding system and both are native-endian
//! with no padding or length fields:
//! - shape-prefixed raw: one i32 per dimension, then the f32 data flattened;
//! - packed quantized: the packed nibble bytes verbatim, with the scale
//!   persisted as a single f32 in a companion file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::error::ExportError;
use crate::quantization::QuantizedTensor;
use crate::tensors::Tensor;

pub fn write_shape_prefixed(path: &Path, tensor: &Tensor) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    for &dim in &tensor.shape {
        out.write_i32::<NativeEndian>(dim as i32)?;
    }
    for &v in &tensor.data {
        out.write_f32::<NativeEndian>(v)?;
    }
    out.flush()?;
    Ok(())
}

/// Read a shape-prefixed raw tensor. The format carries no rank field, so
/// the caller supplies it (weight matrices in this system are always 2-D).
pub fn read_shape_prefixed(path: &Path, rank: usize) -> Result<Tensor, ExportError> {
    let malformed = |reason: String| ExportError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut input = BufReader::new(file);

    let mut shape = Vec::with_capacity(rank);
    for _ in 0..rank {
        let dim = input.read_i32::<NativeEndian>()?;
        if dim < 0 {
            return Err(malformed(format!("negative dimension {dim}")));
        }
        shape.push(dim as usize);
    }

    // The dims come from the file; validate the element count against the
    // file's actual length before allocating anything sized by it. A
    // compatible writer emits exactly rank i32 dims plus count f32 values.
    let count = shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| malformed(format!("dimension product overflows: {shape:?}")))?;
    let expected_len = (count as u64)
        .checked_mul(4)
        .and_then(|data| data.checked_add(rank as u64 * 4));
    if expected_len != Some(file_len) {
        return Err(malformed(format!(
            "file length {file_len} does not match shape {shape:?}"
        )));
    }

    let mut data = Vec::with_capacity(count);
    for _ in 0..count {
        data.push(input.read_f32::<NativeEndian>()?);
    }

    Ok(Tensor::new(data, shape))
}

pub fn write_packed(path: &Path, quantized: &QuantizedTensor) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&quantized.packed)?;
    out.flush()?;
    Ok(())
}

pub fn write_scale(path: &Path, scale: f32) -> Result<(), ExportError> {
    let mut out = File::create(path)?;
    out.write_f32::<NativeEndian>(scale)?;
    Ok(())
}

pub fn read_scale(path: &Path) -> Result<f32, ExportError> {
    let mut input = File::open(path)?;
    Ok(input.read_f32::<NativeEndian>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn shape_prefixed_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w.bin");

        let tensor = Tensor::new(vec![1.0, -2.5, 3.25, 0.0, 7.5, -0.125], vec![2, 3]);
        write_shape_prefixed(&path, &tensor).unwrap();

        // 2 dims * 4 bytes + 6 floats * 4 bytes
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 8 + 24);
        assert_eq!(read_shape_prefixed(&path, 2).unwrap(), tensor);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w.bin");

        let tensor = Tensor::new(vec![1.0, 2.0], vec![2]);
        write_shape_prefixed(&path, &tensor).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.push(0xFF);
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            read_shape_prefixed(&path, 1),
            Err(ExportError::Malformed { .. })
        ));
    }

    #[test]
    fn absurd_dims_are_rejected_before_allocating() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w.bin");

        // Header claims i32::MAX * i32::MAX elements but carries no data;
        // the reader must refuse without sizing a buffer from the claim.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&i32::MAX.to_ne_bytes());
        bytes.extend_from_slice(&i32::MAX.to_ne_bytes());
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            read_shape_prefixed(&path, 2),
            Err(ExportError::Malformed { .. })
        ));
    }

    #[test]
    fn zero_dim_reads_back_as_empty_tensor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w.bin");

        let tensor = Tensor::new(vec![], vec![0, 3]);
        write_shape_prefixed(&path, &tensor).unwrap();

        assert_eq!(read_shape_prefixed(&path, 2).unwrap(), tensor);
    }

    #[test]
    fn truncated_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w.bin");

        let tensor = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![4]);
        write_shape_prefixed(&path, &tensor).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();

        assert!(read_shape_prefixed(&path, 1).is_err());
    }

    #[test]
    fn packed_bytes_and_scale_round_trip() {
        let dir = tempdir().unwrap();
        let packed_path = dir.path().join("w.int4");
        let scale_path = dir.path().join("w.scale");

        let quantized = QuantizedTensor {
            packed: vec![0x4C, 0x79],
            scale: 0.25,
        };
        write_packed(&packed_path, &quantized).unwrap();
        write_scale(&scale_path, quantized.scale).unwrap();

        assert_eq!(std::fs::read(&packed_path).unwrap(), vec![0x4C, 0x79]);
        assert_eq!(read_scale(&scale_path).unwrap(), 0.25);
    }
}
