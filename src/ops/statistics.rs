//! Statistical analysis operations over raw sample buffers.
//!
//! All functions validate that the buffer holds a whole number of samples of a
//! supported width before scanning. Empty buffers yield zero for every
//! statistic rather than an error.

use crate::error::AudioSegmentResult;
use crate::sample::{check_parameters, sample_count, samples};

/// Returns the `(max, min)` sample values in the buffer.
///
/// Both extremes are seeded at zero, so an empty buffer reports `(0, 0)`, an
/// all-positive buffer reports a minimum of zero and an all-negative buffer a
/// maximum of zero.
pub fn extremes(buffer: &[u8], width: usize) -> AudioSegmentResult<(i32, i32)> {
    check_parameters(buffer.len(), width)?;

    let mut max_sample = 0i32;
    let mut min_sample = 0i32;
    for sample in samples(buffer, width) {
        max_sample = max_sample.max(sample);
        min_sample = min_sample.min(sample);
    }
    Ok((max_sample, min_sample))
}

/// Returns the largest absolute sample value in the buffer.
///
/// The magnitude of the most negative 32-bit sample does not fit in `i32` and
/// is reported as `i32::MAX`.
pub fn max_abs(buffer: &[u8], width: usize) -> AudioSegmentResult<i32> {
    check_parameters(buffer.len(), width)?;

    let mut max_magnitude = 0u32;
    for sample in samples(buffer, width) {
        max_magnitude = max_magnitude.max(sample.unsigned_abs());
    }
    Ok(max_magnitude.min(i32::MAX as u32) as i32)
}

/// Returns the arithmetic mean of the samples, truncated toward zero.
///
/// The sum is accumulated in `i64`, which bounds correct results to roughly
/// 2^32 full-scale 32-bit samples; beyond that the mean is not meaningful.
pub fn mean(buffer: &[u8], width: usize) -> AudioSegmentResult<i32> {
    check_parameters(buffer.len(), width)?;

    let count = sample_count(buffer, width);
    if count == 0 {
        return Ok(0);
    }

    let sum: i64 = samples(buffer, width).map(i64::from).sum();
    Ok((sum / count as i64) as i32)
}

/// Returns the root mean square of the samples.
///
/// Computed as `sqrt(sum(sample^2) / count)` with the sum of squares held in a
/// wide accumulator, so full-length 32-bit buffers do not overflow it.
pub fn rms(buffer: &[u8], width: usize) -> AudioSegmentResult<i32> {
    check_parameters(buffer.len(), width)?;

    let count = sample_count(buffer, width);
    if count == 0 {
        return Ok(0);
    }

    let sum_squares: i128 = samples(buffer, width)
        .map(|sample| {
            let sample = sample as i128;
            sample * sample
        })
        .sum();

    Ok(((sum_squares / count as i128) as f64).sqrt() as i32)
}

/// Counts zero crossings in the signal.
///
/// A crossing is counted when the current sample and the immediately preceding
/// sample straddle zero: `(sample <= 0 && sample < previous) || (sample >= 0
/// && 0 < previous)`. The reference starts at zero, so a leading positive
/// sample does not count as a crossing.
pub fn zero_crossings(buffer: &[u8], width: usize) -> AudioSegmentResult<usize> {
    check_parameters(buffer.len(), width)?;

    let mut crossings = 0usize;
    let mut last_sample = 0i32;
    for sample in samples(buffer, width) {
        if (sample <= 0 && sample < last_sample) || (sample >= 0 && 0 < last_sample) {
            crossings += 1;
        }
        last_sample = sample;
    }
    Ok(crossings)
}

/// Returns the average distance between successive local extremes.
///
/// Local extremes are detected where the sample-to-sample difference changes
/// sign; flat runs do not reset the tracked direction. Buffers with fewer than
/// two samples, or with no pair of extremes, yield zero.
pub fn avg_peak_to_peak(buffer: &[u8], width: usize) -> AudioSegmentResult<i32> {
    check_parameters(buffer.len(), width)?;
    let (total, extreme_pairs) = fold_extremes(buffer, width, |acc, distance| acc + distance);
    if extreme_pairs == 0 {
        return Ok(0);
    }
    Ok((total / extreme_pairs) as i32)
}

/// Returns the largest distance between successive local extremes.
///
/// Uses the same extreme detection rule as [`avg_peak_to_peak`].
pub fn max_peak_to_peak(buffer: &[u8], width: usize) -> AudioSegmentResult<i32> {
    check_parameters(buffer.len(), width)?;
    let (max, _) = fold_extremes(buffer, width, |acc, distance| acc.max(distance));
    Ok(max as i32)
}

/// Walks the signal detecting direction changes and folds the distance between
/// each pair of successive extremes into an accumulator. Returns the folded
/// value and the number of distances seen.
fn fold_extremes(buffer: &[u8], width: usize, fold: impl Fn(i64, i64) -> i64) -> (i64, i64) {
    let all: Vec<i64> = samples(buffer, width).map(i64::from).collect();
    if all.len() < 2 {
        return (0, 0);
    }

    let mut prev_val = all[0];
    let mut prev_diff = all[1] - all[0];
    let mut prev_extreme: Option<i64> = None;
    let mut acc = 0i64;
    let mut distances = 0i64;

    for &val in &all[1..] {
        let diff = val - prev_val;
        if diff.signum() * prev_diff.signum() == -1 {
            if let Some(extreme) = prev_extreme {
                acc = fold(acc, (prev_val - extreme).abs());
                distances += 1;
            }
            prev_extreme = Some(prev_val);
        }

        prev_val = val;
        if diff != 0 {
            prev_diff = diff;
        }
    }

    (acc, distances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::write_sample;

    fn buffer_16(values: &[i32]) -> Vec<u8> {
        let mut buffer = vec![0u8; values.len() * 2];
        for (i, &value) in values.iter().enumerate() {
            write_sample(&mut buffer, 2, i, value).unwrap();
        }
        buffer
    }

    #[test]
    fn test_extremes_seeded_at_zero() {
        let buffer = buffer_16(&[10, 300, 25]);
        assert_eq!(extremes(&buffer, 2).unwrap(), (300, 0));

        let buffer = buffer_16(&[-10, -300, -25]);
        assert_eq!(extremes(&buffer, 2).unwrap(), (0, -300));

        assert_eq!(extremes(&[], 2).unwrap(), (0, 0));
    }

    #[test]
    fn test_max_abs() {
        let buffer = buffer_16(&[10, -300, 25]);
        assert_eq!(max_abs(&buffer, 2).unwrap(), 300);
        assert_eq!(max_abs(&[], 4).unwrap(), 0);
    }

    #[test]
    fn test_max_abs_clamps_most_negative_32_bit() {
        let mut buffer = vec![0u8; 4];
        write_sample(&mut buffer, 4, 0, i32::MIN).unwrap();
        assert_eq!(max_abs(&buffer, 4).unwrap(), i32::MAX);
    }

    #[test]
    fn test_mean_truncates_toward_zero() {
        let buffer = buffer_16(&[1, 2, 4]);
        assert_eq!(mean(&buffer, 2).unwrap(), 2);
        assert_eq!(mean(&[], 2).unwrap(), 0);
    }

    #[test]
    fn test_rms_constant_signal() {
        let buffer = buffer_16(&[100, -100, 100, -100]);
        assert_eq!(rms(&buffer, 2).unwrap(), 100);
        assert_eq!(rms(&buffer_16(&[0, 0, 0]), 2).unwrap(), 0);
    }

    #[test]
    fn test_zero_crossings_rule() {
        // Only 100 -> -100 transitions satisfy the rule here: a rise out of a
        // negative previous sample never does, because `0 < previous` fails.
        let buffer = buffer_16(&[0, 100, -100, 100, -100]);
        assert_eq!(zero_crossings(&buffer, 2).unwrap(), 2);

        // A positive run keeps satisfying `sample >= 0 && 0 < previous`.
        let positive_run = buffer_16(&[5, 5, 5]);
        assert_eq!(zero_crossings(&positive_run, 2).unwrap(), 2);

        let silent = buffer_16(&[0, 0, 0, 0]);
        assert_eq!(zero_crossings(&silent, 2).unwrap(), 0);
    }

    #[test]
    fn test_peak_to_peak_on_alternating_signal() {
        let buffer = buffer_16(&[0, 100, 0, -100, 0, 100, 0, -100, 0]);
        assert_eq!(avg_peak_to_peak(&buffer, 2).unwrap(), 200);
        assert_eq!(max_peak_to_peak(&buffer, 2).unwrap(), 200);
    }

    #[test]
    fn test_peak_to_peak_short_buffers() {
        assert_eq!(avg_peak_to_peak(&buffer_16(&[5]), 2).unwrap(), 0);
        assert_eq!(max_peak_to_peak(&[], 2).unwrap(), 0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(mean(&[0u8; 3], 2).is_err());
        assert!(rms(&[0u8; 4], 3).is_err());
    }
}
