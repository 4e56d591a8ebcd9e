//! Incremental linear-interpolation sample-rate conversion.
//!
//! The converter walks the input one frame at a time while a fractional
//! accumulator tracks the position of the output grid relative to the input
//! grid: consuming an input frame advances it by the (GCD-reduced) output
//! rate, producing an output frame retreats it by the input rate. Whenever the
//! accumulator is non-negative an output frame is emitted by linearly
//! interpolating between the previous and current input frame, per channel.
//!
//! An optional one-pole smoothing tap blends each incoming sample with the
//! previous smoothed value; the default weights `(1, 0)` disable it.

use crate::error::{AudioSegmentError, AudioSegmentResult};
use crate::sample::{check_parameters, samples, wrap_overflow, write_sample};

/// Residual interpolation state after a conversion run.
///
/// Carries enough information for a caller streaming chunks to resume where
/// the previous buffer left off. The segment layer always converts whole
/// buffers, so continuation across calls is supported but not load-bearing
/// there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResampleState {
    /// Fractional accumulator position between the input and output frame
    /// grids, in units of the reduced rates. Always negative on return.
    pub d: i64,
    /// Previous and current smoothed input sample, per channel.
    pub taps: Vec<ChannelTap>,
}

/// Interpolation endpoints for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTap {
    /// Smoothed sample for the frame before the current one.
    pub prev: i32,
    /// Smoothed sample for the current frame.
    pub cur: i32,
}

/// Converts `buffer` from `in_rate` to `out_rate` frames per second by linear
/// interpolation, returning the converted buffer and the residual
/// interpolation state.
///
/// `weight_a` and `weight_b` form the optional smoothing tap
/// `cur = (weight_a * sample + weight_b * prev) / (weight_a + weight_b)`;
/// pass `(1, 0)` for plain interpolation. Output samples wrap rather than
/// clip, matching the bias path. The output holds exactly the frames actually
/// produced.
pub fn convert_sample_rate(
    buffer: &[u8],
    width: usize,
    channels: usize,
    in_rate: u32,
    out_rate: u32,
    weight_a: i32,
    weight_b: i32,
) -> AudioSegmentResult<(Vec<u8>, ResampleState)> {
    check_parameters(buffer.len(), width)?;

    if channels < 1 {
        return Err(AudioSegmentError::InvalidParameters(
            "channel count should be at least 1".to_string(),
        ));
    }
    if weight_a < 1 || weight_b < 0 {
        return Err(AudioSegmentError::InvalidParameters(format!(
            "smoothing weights should satisfy weight_a >= 1 and weight_b >= 0, got ({weight_a}, {weight_b})"
        )));
    }
    if in_rate == 0 || out_rate == 0 {
        return Err(AudioSegmentError::InvalidParameters(
            "sampling rates should be positive".to_string(),
        ));
    }

    let bytes_per_frame = width * channels;
    if buffer.len() % bytes_per_frame != 0 {
        return Err(AudioSegmentError::InvalidParameters(format!(
            "buffer length {} is not a whole number of {bytes_per_frame} byte frames",
            buffer.len()
        )));
    }

    let divisor = gcd(in_rate, out_rate);
    let in_rate = (in_rate / divisor) as i64;
    let out_rate = (out_rate / divisor) as i64;

    let mut frames_remaining = buffer.len() / bytes_per_frame;
    let capacity_frames = (frames_remaining / in_rate as usize + 1) * out_rate as usize;

    let mut prev = vec![0i32; channels];
    let mut cur = vec![0i32; channels];
    let mut d = -out_rate;

    let weight_a = weight_a as i64;
    let weight_b = weight_b as i64;

    let mut input = samples(buffer, width);
    let mut out: Vec<u8> = Vec::with_capacity(capacity_frames * bytes_per_frame);
    let mut frame = vec![0u8; width];

    loop {
        while d < 0 {
            if frames_remaining == 0 {
                let taps = prev
                    .iter()
                    .zip(&cur)
                    .map(|(&prev, &cur)| ChannelTap { prev, cur })
                    .collect();
                return Ok((out, ResampleState { d, taps }));
            }

            for channel in 0..channels {
                prev[channel] = cur[channel];
                let sample = input.next().unwrap_or(0) as i64;
                cur[channel] =
                    ((weight_a * sample + weight_b * prev[channel] as i64) / (weight_a + weight_b))
                        as i32;
            }
            frames_remaining -= 1;
            d += out_rate;
        }

        while d >= 0 {
            for channel in 0..channels {
                let interpolated =
                    (prev[channel] as i64 * d + cur[channel] as i64 * (out_rate - d)) / out_rate;
                write_sample(&mut frame, width, 0, wrap_overflow(interpolated, width))?;
                out.extend_from_slice(&frame);
            }
            d -= in_rate;
        }
    }
}

const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{read_sample, write_sample};

    fn buffer_16(values: &[i32]) -> Vec<u8> {
        let mut out = vec![0u8; values.len() * 2];
        for (i, &value) in values.iter().enumerate() {
            write_sample(&mut out, 2, i, value).unwrap();
        }
        out
    }

    fn samples_16(buffer: &[u8]) -> Vec<i32> {
        (0..buffer.len() / 2)
            .map(|i| read_sample(buffer, 2, i).unwrap())
            .collect()
    }

    #[test]
    fn test_identity_rate_is_a_noop() {
        let input = buffer_16(&[10, -20, 30, -40]);
        let (output, state) = convert_sample_rate(&input, 2, 1, 44100, 44100, 1, 0).unwrap();
        assert_eq!(output, input);
        assert_eq!(state.d, -1);
    }

    #[test]
    fn test_downsample_by_two_keeps_alternate_frames() {
        let input = buffer_16(&[10, 20, 30, 40]);
        let (output, _) = convert_sample_rate(&input, 2, 1, 88200, 44100, 1, 0).unwrap();
        assert_eq!(samples_16(&output), vec![10, 30]);
    }

    #[test]
    fn test_upsample_by_two_interpolates_midpoints() {
        let input = buffer_16(&[0, 100]);
        let (output, _) = convert_sample_rate(&input, 2, 1, 22050, 44100, 1, 0).unwrap();
        assert_eq!(samples_16(&output), vec![0, 50, 100]);
    }

    #[test]
    fn test_stereo_channels_convert_independently() {
        // Interleaved frames (10, 1000), (30, 3000).
        let input = buffer_16(&[10, 1000, 30, 3000]);
        let (output, _) = convert_sample_rate(&input, 2, 2, 1, 2, 1, 0).unwrap();
        assert_eq!(samples_16(&output), vec![10, 1000, 20, 2000, 30, 3000]);
    }

    #[test]
    fn test_smoothing_tap_blends_with_previous() {
        let input = buffer_16(&[100, 100]);
        let (output, _) = convert_sample_rate(&input, 2, 1, 8000, 8000, 1, 1).unwrap();
        assert_eq!(samples_16(&output), vec![50, 75]);
    }

    #[test]
    fn test_empty_input_returns_residual_state() {
        let (output, state) = convert_sample_rate(&[], 2, 2, 8000, 44100, 1, 0).unwrap();
        assert!(output.is_empty());
        // 8000/44100 reduces to 80/441.
        assert_eq!(state.d, -441);
        assert_eq!(state.taps.len(), 2);
    }

    #[test]
    fn test_invalid_parameters() {
        let input = buffer_16(&[1, 2]);
        assert!(convert_sample_rate(&input, 2, 0, 8000, 8000, 1, 0).is_err());
        assert!(convert_sample_rate(&input, 2, 1, 0, 8000, 1, 0).is_err());
        assert!(convert_sample_rate(&input, 2, 1, 8000, 8000, 0, 0).is_err());
        // Two 16-bit samples are one stereo frame, three bytes are not.
        assert!(convert_sample_rate(&input[..2], 2, 2, 8000, 8000, 1, 0).is_err());
    }
}
