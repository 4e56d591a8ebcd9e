//! Stereo/mono folding and expansion over raw sample buffers.
//!
//! Stereo buffers are interleaved, left sample first. Both directions apply a
//! per-side gain and clip the result, so a fold with gains summing to one
//! cannot overflow and an expansion with unity gains duplicates the source.

use crate::error::{AudioSegmentError, AudioSegmentResult};
use crate::sample::{check_parameters, clip, sample_count, samples, write_sample};

/// Folds an interleaved stereo buffer down to mono.
///
/// Each output sample is `clip(left * left_gain + right * right_gain)`. The
/// buffer must contain a whole number of stereo frames.
pub fn fold_to_mono(
    buffer: &[u8],
    width: usize,
    left_gain: f64,
    right_gain: f64,
) -> AudioSegmentResult<Vec<u8>> {
    check_parameters(buffer.len(), width)?;
    if sample_count(buffer, width) % 2 != 0 {
        return Err(AudioSegmentError::InvalidParameters(format!(
            "stereo buffer of {} bytes does not hold a whole number of frames",
            buffer.len()
        )));
    }

    let mut out = vec![0u8; buffer.len() / 2];
    let mut left = None;
    for (i, sample) in samples(buffer, width).enumerate() {
        match left.take() {
            None => left = Some(sample),
            Some(left_sample) => {
                let mixed = left_sample as f64 * left_gain + sample as f64 * right_gain;
                write_sample(&mut out, width, i / 2, clip(mixed as i64, width))?;
            }
        }
    }
    Ok(out)
}

/// Expands a mono buffer to interleaved stereo.
///
/// Each input sample becomes the pair `(clip(sample * left_gain),
/// clip(sample * right_gain))`.
pub fn expand_to_stereo(
    buffer: &[u8],
    width: usize,
    left_gain: f64,
    right_gain: f64,
) -> AudioSegmentResult<Vec<u8>> {
    check_parameters(buffer.len(), width)?;

    let mut out = vec![0u8; buffer.len() * 2];
    for (i, sample) in samples(buffer, width).enumerate() {
        let left = clip((sample as f64 * left_gain) as i64, width);
        let right = clip((sample as f64 * right_gain) as i64, width);
        write_sample(&mut out, width, i * 2, left)?;
        write_sample(&mut out, width, i * 2 + 1, right)?;
    }
    Ok(out)
}
