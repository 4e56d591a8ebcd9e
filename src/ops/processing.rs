//! Signal processing operations over raw sample buffers.
//!
//! Transforming operations allocate and return a new buffer; the input is
//! never modified. The multiply and add paths saturate out-of-range results
//! ([`crate::sample::clip`]); the bias and width-conversion paths wrap them
//! ([`crate::sample::wrap_overflow`]).

use crate::error::{AudioSegmentError, AudioSegmentResult};
use crate::sample::{check_parameters, check_width, clip, samples, wrap_overflow, write_sample};

/// Multiplies every sample by `factor`, clipping the result to the width's
/// representable range.
pub fn scale(buffer: &[u8], width: usize, factor: f64) -> AudioSegmentResult<Vec<u8>> {
    check_parameters(buffer.len(), width)?;

    let mut out = vec![0u8; buffer.len()];
    for (i, sample) in samples(buffer, width).enumerate() {
        let scaled = clip((sample as f64 * factor) as i64, width);
        write_sample(&mut out, width, i, scaled)?;
    }
    Ok(out)
}

/// Adds `amount` to every sample, wrapping the result into the width's
/// representable range (two's-complement overflow).
pub fn bias(buffer: &[u8], width: usize, amount: i32) -> AudioSegmentResult<Vec<u8>> {
    check_parameters(buffer.len(), width)?;

    let mut out = vec![0u8; buffer.len()];
    for (i, sample) in samples(buffer, width).enumerate() {
        let biased = wrap_overflow(sample as i64 + amount as i64, width);
        write_sample(&mut out, width, i, biased)?;
    }
    Ok(out)
}

/// Reverses the sample order. The byte layout within each sample is preserved.
pub fn reverse_samples(buffer: &[u8], width: usize) -> AudioSegmentResult<Vec<u8>> {
    check_parameters(buffer.len(), width)?;

    let mut out = Vec::with_capacity(buffer.len());
    for chunk in buffer.chunks_exact(width).rev() {
        out.extend_from_slice(chunk);
    }
    Ok(out)
}

/// Adds two equal-length buffers sample by sample, clipping each result.
pub fn add(left: &[u8], right: &[u8], width: usize) -> AudioSegmentResult<Vec<u8>> {
    check_parameters(left.len(), width)?;
    if left.len() != right.len() {
        return Err(AudioSegmentError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let mut out = vec![0u8; left.len()];
    for (i, (a, b)) in samples(left, width).zip(samples(right, width)).enumerate() {
        let sum = clip(a as i64 + b as i64, width);
        write_sample(&mut out, width, i, sum)?;
    }
    Ok(out)
}

/// Rescales every sample from `from_width` to `to_width`.
///
/// Samples are shifted by `4 * to_width / from_width` bits when growing and
/// `4 * from_width / to_width` bits when shrinking, then wrapped into the
/// destination range. For the 1-to-2, 2-to-4 and 1-to-4 pairs the upscale is
/// exactly invertible; shrinking discards low-order bits by design. The shift
/// amounts are intentionally proportional rather than the full `8 * Δwidth`
/// bits, and downstream level math is calibrated against them.
pub fn convert_width(
    buffer: &[u8],
    from_width: usize,
    to_width: usize,
) -> AudioSegmentResult<Vec<u8>> {
    check_parameters(buffer.len(), from_width)?;
    check_width(to_width)?;

    if from_width == to_width {
        return Ok(buffer.to_vec());
    }

    let count = buffer.len() / from_width;
    let mut out = vec![0u8; count * to_width];
    for (i, sample) in samples(buffer, from_width).enumerate() {
        let rescaled = if from_width < to_width {
            (sample as i64) << (4 * to_width / from_width)
        } else {
            (sample as i64) >> (4 * from_width / to_width)
        };
        write_sample(&mut out, to_width, i, wrap_overflow(rescaled, to_width))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::read_sample;

    fn buffer(values: &[i32], width: usize) -> Vec<u8> {
        let mut out = vec![0u8; values.len() * width];
        for (i, &value) in values.iter().enumerate() {
            write_sample(&mut out, width, i, value).unwrap();
        }
        out
    }

    #[test]
    fn test_scale_identity_factor_is_noop() {
        let input = buffer(&[0, 1500, -1500, 32767, -32768], 2);
        assert_eq!(scale(&input, 2, 1.0).unwrap(), input);
    }

    #[test]
    fn test_scale_clips_at_bounds() {
        let input = buffer(&[30_000, -30_000], 2);
        let scaled = scale(&input, 2, 2.0).unwrap();
        assert_eq!(read_sample(&scaled, 2, 0).unwrap(), 32767);
        assert_eq!(read_sample(&scaled, 2, 1).unwrap(), -32768);
    }

    #[test]
    fn test_scale_by_zero_silences() {
        let input = buffer(&[123, -456], 2);
        assert_eq!(scale(&input, 2, 0.0).unwrap(), vec![0u8; 4]);
    }

    #[test]
    fn test_bias_wraps_instead_of_clipping() {
        let input = buffer(&[32767, -32768, 0], 2);
        let biased = bias(&input, 2, 1).unwrap();
        assert_eq!(read_sample(&biased, 2, 0).unwrap(), -32768);
        assert_eq!(read_sample(&biased, 2, 1).unwrap(), -32767);
        assert_eq!(read_sample(&biased, 2, 2).unwrap(), 1);
    }

    #[test]
    fn test_reverse_is_an_involution() {
        let input = buffer(&[1, 2, 3, 4, 5], 2);
        let reversed = reverse_samples(&input, 2).unwrap();
        assert_eq!(read_sample(&reversed, 2, 0).unwrap(), 5);
        assert_eq!(reverse_samples(&reversed, 2).unwrap(), input);
    }

    #[test]
    fn test_add_zero_buffer_is_identity() {
        let input = buffer(&[100, -200, 300], 2);
        let zeros = vec![0u8; input.len()];
        assert_eq!(add(&input, &zeros, 2).unwrap(), input);
    }

    #[test]
    fn test_add_clips_sum() {
        let a = buffer(&[30_000], 2);
        let b = buffer(&[30_000], 2);
        let sum = add(&a, &b, 2).unwrap();
        assert_eq!(read_sample(&sum, 2, 0).unwrap(), 32767);
    }

    #[test]
    fn test_add_rejects_unequal_lengths() {
        let a = buffer(&[1, 2], 2);
        let b = buffer(&[1], 2);
        assert!(matches!(
            add(&a, &b, 2),
            Err(AudioSegmentError::LengthMismatch { left: 4, right: 2 })
        ));
    }

    #[test]
    fn test_convert_width_identity() {
        let input = buffer(&[7, -7], 2);
        assert_eq!(convert_width(&input, 2, 2).unwrap(), input);
    }

    #[test]
    fn test_convert_width_upscale_then_downscale_is_exact() {
        for &(narrow, wide) in &[(1usize, 2usize), (1, 4), (2, 4)] {
            let input = buffer(&[5, -5, 100, -100], narrow);
            let up = convert_width(&input, narrow, wide).unwrap();
            let down = convert_width(&up, wide, narrow).unwrap();
            assert_eq!(down, input, "{narrow} -> {wide} -> {narrow}");
        }
    }

    #[test]
    fn test_convert_width_shift_amounts() {
        let input = buffer(&[100], 1);
        let widened = convert_width(&input, 1, 2).unwrap();
        assert_eq!(read_sample(&widened, 2, 0).unwrap(), 100 << 8);

        let widened = convert_width(&input, 1, 4).unwrap();
        assert_eq!(read_sample(&widened, 4, 0).unwrap(), 100 << 16);
    }

    #[test]
    fn test_convert_width_downscale_wraps() {
        // The 4 -> 2 shift is 8 bits, so a full-scale 32-bit sample still
        // exceeds the 16-bit range and wraps to -1.
        let input = buffer(&[i32::MAX], 4);
        let narrowed = convert_width(&input, 4, 2).unwrap();
        assert_eq!(read_sample(&narrowed, 2, 0).unwrap(), -1);
    }
}
