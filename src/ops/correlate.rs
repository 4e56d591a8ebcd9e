//! Cross-correlation searches over 16-bit sample buffers.
//!
//! These searches operate on a fixed 2-byte sample width, matching the
//! resolution the alignment heuristics were calibrated for. The windowed sum
//! of squares is maintained incrementally as the window slides one sample at
//! a time: subtract the square of the sample leaving the window, add the
//! square of the sample entering it.

use crate::error::{AudioSegmentError, AudioSegmentResult};
use crate::sample::samples;

/// Sample width all correlation searches operate at.
const WIDTH: usize = 2;

fn samples_16(buffer: &[u8], name: &str) -> AudioSegmentResult<Vec<i64>> {
    if buffer.len() % WIDTH != 0 {
        return Err(AudioSegmentError::InvalidParameters(format!(
            "{name} does not hold a whole number of 16-bit samples ({} bytes)",
            buffer.len()
        )));
    }
    Ok(samples(buffer, WIDTH).map(i64::from).collect())
}

fn dot(a: &[i64], b: &[i64]) -> i64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Normalized residual error of matching a needle against a reference window
/// with the given energy and cross product. An all-zero window yields an
/// infinite residual so it is never selected over a real match.
fn residual(needle_energy: i64, window_energy: i64, cross: i64) -> f64 {
    if window_energy == 0 {
        return f64::INFINITY;
    }
    let window_energy = window_energy as f64;
    (needle_energy as f64 * window_energy - (cross as f64) * (cross as f64)) / window_energy
}

/// Finds the alignment of `needle` within `reference` minimizing the
/// normalized residual error, returning the best sample offset and the
/// least-squares scale factor at that offset.
///
/// Fails with `InvalidParameters` when either buffer is not a whole number of
/// 16-bit samples, when `reference` is shorter than `needle`, or when the
/// needle carries no energy (all zero) and no factor is defined.
pub fn find_fit(reference: &[u8], needle: &[u8]) -> AudioSegmentResult<(usize, f64)> {
    let reference = samples_16(reference, "reference")?;
    let needle = samples_16(needle, "needle")?;

    if reference.len() < needle.len() {
        return Err(AudioSegmentError::InvalidParameters(format!(
            "reference ({} samples) is shorter than the needle ({} samples)",
            reference.len(),
            needle.len()
        )));
    }

    let needle_energy = dot(&needle, &needle);
    if needle_energy == 0 {
        return Err(AudioSegmentError::InvalidParameters(
            "needle carries no energy, every alignment fits equally".to_string(),
        ));
    }

    let needle_len = needle.len();
    let mut window_energy = dot(&reference[..needle_len], &reference[..needle_len]);
    let mut best_result = residual(needle_energy, window_energy, dot(&reference[..needle_len], &needle));
    let mut best_offset = 0usize;

    for offset in 1..=(reference.len() - needle_len) {
        let leaving = reference[offset - 1];
        let entering = reference[offset + needle_len - 1];
        window_energy += entering * entering - leaving * leaving;

        let cross = dot(&reference[offset..offset + needle_len], &needle);
        let result = residual(needle_energy, window_energy, cross);
        if result < best_result {
            best_result = result;
            best_offset = offset;
        }
    }

    let factor = dot(&reference[best_offset..best_offset + needle_len], &needle) as f64
        / needle_energy as f64;
    Ok((best_offset, factor))
}

/// Returns the least-squares factor scaling `target` to best match
/// `reference` over two equal-length buffers.
pub fn find_factor(reference: &[u8], target: &[u8]) -> AudioSegmentResult<f64> {
    let reference_samples = samples_16(reference, "reference")?;
    let target_samples = samples_16(target, "target")?;

    if reference.len() != target.len() {
        return Err(AudioSegmentError::LengthMismatch {
            left: reference.len(),
            right: target.len(),
        });
    }

    let target_energy = dot(&target_samples, &target_samples);
    if target_energy == 0 {
        return Err(AudioSegmentError::InvalidParameters(
            "target carries no energy, no scale factor is defined".to_string(),
        ));
    }

    Ok(dot(&reference_samples, &target_samples) as f64 / target_energy as f64)
}

/// Finds the offset of the loudest window of `window_samples` samples,
/// maximizing the windowed sum of squares.
pub fn find_best_window(buffer: &[u8], window_samples: usize) -> AudioSegmentResult<usize> {
    let all = samples_16(buffer, "buffer")?;

    if window_samples > all.len() {
        return Err(AudioSegmentError::InvalidParameters(format!(
            "window of {window_samples} samples exceeds the buffer ({} samples)",
            all.len()
        )));
    }
    if all.is_empty() || window_samples == 0 {
        return Ok(0);
    }

    let mut energy = dot(&all[..window_samples], &all[..window_samples]);
    let mut best_energy = energy;
    let mut best_offset = 0usize;

    for offset in 1..=(all.len() - window_samples) {
        let leaving = all[offset - 1];
        let entering = all[offset + window_samples - 1];
        energy += entering * entering - leaving * leaving;
        if energy > best_energy {
            best_energy = energy;
            best_offset = offset;
        }
    }

    Ok(best_offset)
}
