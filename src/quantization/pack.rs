use tracing::warn;

use crate::error::ExportError;

/// Packed 4-bit tensor plus the scale a reader needs to dequantize it.
/// The scale is the estimator's value, reported back unchanged.
#[derive(PartialEq, Debug, Clone)]
pub struct QuantizedTensor {
    pub packed: Vec<u8>,
    pub scale: f32,
}

impl QuantizedTensor {
    pub fn byte_size(&self) -> usize {
        self.packed.len()
    }
}

/// Quantize to signed 4-bit and pack two values per byte, in order.
///
/// Each element maps to `round(x / scale)` clipped to [-7, 7]. Rounding is
/// half-away-from-zero (`f32::round`), so the output is bit-exact across
/// platforms. Consecutive pairs form one byte each, even index in the high
/// nibble. An odd trailing element is dropped (and logged); output length is
/// always `floor(N / 2)` bytes.
///
/// Fails with `InvalidScale` on a zero, negative, or NaN scale rather than
/// dividing by it.
pub fn quantize_and_pack(values: &[f32], scale: f32) -> Result<QuantizedTensor, ExportError> {
    if !(scale > 0.0) {
        return Err(ExportError::InvalidScale(scale));
    }

    if values.len() % 2 != 0 {
        warn!(
            elements = values.len(),
            "odd element count, dropping trailing element"
        );
    }

    let mut packed = Vec::with_capacity(values.len() / 2);
    for pair in values.chunks_exact(2) {
        let q0 = quantize(pair[0], scale);
        let q1 = quantize(pair[1], scale);
        packed.push(pack_pair(q0, q1));
    }

    Ok(QuantizedTensor { packed, scale })
}

fn quantize(real_val: f32, scale: f32) -> i8 {
    ((real_val / scale).round() as i32).clamp(-7, 7) as i8
}

/// One byte from two quantized values: `q0` in the high nibble, `q1` in the
/// low nibble, each truncated to its 4 low two's-complement bits.
pub fn pack_pair(q0: i8, q1: i8) -> u8 {
    ((q0 as u8 & 0x0F) << 4) | (q1 as u8 & 0x0F)
}

/// Inverse of [`pack_pair`]: sign-extends each nibble back to i8.
pub fn unpack_byte(byte: u8) -> (i8, i8) {
    (sign_extend(byte >> 4), sign_extend(byte & 0x0F))
}

fn sign_extend(nibble: u8) -> i8 {
    ((nibble << 4) as i8) >> 4
}
