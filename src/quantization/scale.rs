/// Symmetric per-tensor scale: `max(|x|) / 7.0`.
///
/// 7 is the top of the signed 4-bit range we use; -8 is deliberately left
/// unused so the representation is symmetric around zero. The returned scale
/// is tight: no element rounds past magnitude 7 before clipping, except
/// through rounding at the boundary itself.
///
/// An empty or all-zero tensor yields 0.0. Callers must treat that as a
/// degenerate case and skip quantization; the packer rejects a zero scale.
pub fn estimate_scale(values: &[f32]) -> f32 {
    let max_abs = values.iter().fold(0.0f32, |m, &v| m.max(v.abs()));
    max_abs / 7.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_max_abs_over_seven() {
        assert_eq!(estimate_scale(&[3.5, -7.0, 1.0]), 1.0);
        assert_eq!(estimate_scale(&[0.0, -14.0]), 2.0);
    }

    #[test]
    fn nonzero_tensor_gives_positive_scale() {
        assert!(estimate_scale(&[0.0, 0.0, 1e-20]) > 0.0);
        assert!(estimate_scale(&[-1e-20]) > 0.0);
    }

    #[test]
    fn empty_tensor_gives_zero_scale() {
        assert_eq!(estimate_scale(&[]), 0.0);
    }

    #[test]
    fn all_zero_tensor_gives_zero_scale() {
        assert_eq!(estimate_scale(&[0.0, 0.0, -0.0]), 0.0);
    }

    #[test]
    fn scale_is_tight() {
        let values = [0.3, -2.4, 1.7, -0.9, 2.4];
        let scale = estimate_scale(&values);
        for v in values {
            assert!((v / scale).round().abs() <= 7.0);
        }
    }
}
