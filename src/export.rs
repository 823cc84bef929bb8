use std::fmt;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::ExportError;
use crate::format;
use crate::provider::TensorProvider;
use crate::quantization::{estimate_scale, quantize_and_pack, QuantizedTensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Packed 4-bit output plus a scale companion file.
    Quantized,
    /// Shape-prefixed raw f32 output, no quantization.
    Raw,
}

/// What happened to one tensor. Sizes are informational, not part of the
/// binary contract; megabytes are decimal (bytes / 1,000,000).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub name: String,
    pub shape: Vec<usize>,
    pub original_bytes: usize,
    pub compressed_bytes: usize,
}

impl ExportReport {
    pub fn original_mb(&self) -> f64 {
        self.original_bytes as f64 / 1e6
    }

    pub fn compressed_mb(&self) -> f64 {
        self.compressed_bytes as f64 / 1e6
    }

    /// Original / compressed, or `None` for a degenerate (empty) tensor.
    pub fn ratio(&self) -> Option<f64> {
        (self.compressed_bytes > 0)
            .then(|| self.original_bytes as f64 / self.compressed_bytes as f64)
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?}: {:.2} MB -> {:.2} MB",
            self.name,
            self.shape,
            self.original_mb(),
            self.compressed_mb()
        )?;
        if let Some(ratio) = self.ratio() {
            write!(f, " ({ratio:.1}x)")?;
        }
        Ok(())
    }
}

/// Fetch one tensor, quantize it, and write `<name>.int4` plus
/// `<name>.scale` under `out_dir`.
///
/// An empty tensor is degenerate, not an error: the scale estimator yields
/// 0.0, quantization is skipped, and an empty `.int4` with a zero scale is
/// written so the output set stays complete.
pub fn export_tensor(
    provider: &dyn TensorProvider,
    name: &str,
    out_dir: &Path,
) -> Result<ExportReport, ExportError> {
    let tensor = provider.get(name)?;
    debug!(name, shape = ?tensor.shape, "loaded tensor");

    let scale = estimate_scale(&tensor.data);
    let quantized = if tensor.is_empty() || scale == 0.0 {
        QuantizedTensor {
            packed: Vec::new(),
            scale: 0.0,
        }
    } else {
        quantize_and_pack(&tensor.data, scale)?
    };

    format::write_packed(&out_dir.join(format!("{name}.int4")), &quantized)?;
    format::write_scale(&out_dir.join(format!("{name}.scale")), quantized.scale)?;

    let report = ExportReport {
        name: name.to_string(),
        shape: tensor.shape,
        original_bytes: tensor.data.len() * std::mem::size_of::<f32>(),
        compressed_bytes: quantized.byte_size(),
    };
    info!(name, scale = quantized.scale, bytes = report.compressed_bytes, "exported");
    Ok(report)
}

/// Fetch one tensor and write it back out in the shape-prefixed raw format,
/// the system's unquantized writer variant.
pub fn export_raw(
    provider: &dyn TensorProvider,
    name: &str,
    out_dir: &Path,
) -> Result<ExportReport, ExportError> {
    let tensor = provider.get(name)?;
    format::write_shape_prefixed(&out_dir.join(format!("{name}.bin")), &tensor)?;

    let bytes = tensor.byte_size();
    Ok(ExportReport {
        name: name.to_string(),
        shape: tensor.shape,
        original_bytes: bytes,
        compressed_bytes: bytes,
    })
}

/// Export a batch of tensors, one worker per tensor. Tensors are immutable
/// inputs with disjoint outputs, so no coordination is needed. Failures are
/// isolated: each name gets its own result and one bad tensor never aborts
/// the rest.
pub fn export_all(
    provider: &dyn TensorProvider,
    names: &[String],
    out_dir: &Path,
    mode: ExportMode,
) -> Vec<(String, Result<ExportReport, ExportError>)> {
    names
        .par_iter()
        .map(|name| {
            let result = match mode {
                ExportMode::Quantized => export_tensor(provider, name, out_dir),
                ExportMode::Raw => export_raw(provider, name, out_dir),
            };
            (name.clone(), result)
        })
        .collect()
}
