//! Logarithmic volume quantities in decibels relative to full scale.
//!
//! A [`Volume`] is constructed from a linear ratio in either the amplitude
//! domain (`20 * log10(ratio)`) or the power domain (`10 * log10(ratio)`) and
//! converted back with the inverse exponential. A ratio of zero has no finite
//! dB representation and maps to the [`Volume::SILENCE`] sentinel rather than
//! an error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A volume in dBFS. 0 dBFS is the maximum representable amplitude.
///
/// The default value is 0 dBFS, i.e. a unity gain.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Volume(f64);

impl Volume {
    /// Sentinel for a zero linear ratio: silence expressed in dB.
    ///
    /// Positive infinity follows the convention of the ratio constructors;
    /// it is a reporting sentinel, not a gain to apply.
    pub const SILENCE: Volume = Volume(f64::INFINITY);

    /// Creates a volume directly from a dB value.
    pub const fn from_db(db: f64) -> Self {
        Volume(db)
    }

    /// Creates a volume from a linear ratio.
    ///
    /// The ratio is divided by `denominator` first when the denominator is
    /// nonzero. A resulting ratio of zero yields [`Volume::SILENCE`].
    /// `use_amplitude` selects the amplitude-domain conversion
    /// (`20 * log10`) over the power-domain one (`10 * log10`).
    pub fn from_ratio(ratio: f64, denominator: f64, use_amplitude: bool) -> Self {
        let ratio = if denominator != 0.0 { ratio / denominator } else { ratio };

        if ratio == 0.0 {
            return Self::SILENCE;
        }

        if use_amplitude {
            Volume(20.0 * ratio.log10())
        } else {
            Volume(10.0 * ratio.log10())
        }
    }

    /// Converts the volume back to a linear ratio, in the amplitude domain
    /// when `use_amplitude` is set and the power domain otherwise.
    pub fn to_ratio(self, use_amplitude: bool) -> f64 {
        if use_amplitude {
            10f64.powf(self.0 / 20.0)
        } else {
            10f64.powf(self.0 / 10.0)
        }
    }

    /// The raw dB value.
    pub const fn db(self) -> f64 {
        self.0
    }

    /// Whether this volume is the silence sentinel.
    pub fn is_silence(self) -> bool {
        self.0 == f64::INFINITY
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}dBFS", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_unity_ratio_is_zero_db() {
        assert_eq!(Volume::from_ratio(1.0, 0.0, true).db(), 0.0);
        assert_eq!(Volume::from_ratio(1.0, 0.0, false).db(), 0.0);
    }

    #[test]
    fn test_amplitude_and_power_domains() {
        assert_approx_eq!(Volume::from_ratio(10.0, 0.0, true).db(), 20.0, 1e-9);
        assert_approx_eq!(Volume::from_ratio(10.0, 0.0, false).db(), 10.0, 1e-9);
        assert_approx_eq!(Volume::from_ratio(0.5, 0.0, true).db(), -6.0206, 1e-4);
    }

    #[test]
    fn test_denominator_divides_first() {
        let direct = Volume::from_ratio(0.5, 0.0, true);
        let divided = Volume::from_ratio(5.0, 10.0, true);
        assert_approx_eq!(direct.db(), divided.db(), 1e-12);
    }

    #[test]
    fn test_zero_ratio_is_silence() {
        let silence = Volume::from_ratio(0.0, 0.0, true);
        assert!(silence.is_silence());
        assert_eq!(silence, Volume::SILENCE);
        assert!(!Volume::from_db(-120.0).is_silence());
    }

    #[test]
    fn test_to_ratio_inverts_from_ratio() {
        for &ratio in &[0.25, 0.5, 1.0, 2.0] {
            let volume = Volume::from_ratio(ratio, 0.0, true);
            assert_approx_eq!(volume.to_ratio(true), ratio, 1e-12);

            let volume = Volume::from_ratio(ratio, 0.0, false);
            assert_approx_eq!(volume.to_ratio(false), ratio, 1e-12);
        }
    }

    #[test]
    fn test_display_formats_three_decimals() {
        assert_eq!(Volume::from_db(0.0).to_string(), "0.000dBFS");
        assert_eq!(Volume::from_db(-6.0206).to_string(), "-6.021dBFS");
    }
}
