//! Abstract uncompressed-PCM interchange with external container codecs.
//!
//! [`RawPcm`] mirrors the descriptor of a linear-PCM container: an external
//! decoder produces one, the segment engine consumes it, and the reverse path
//! feeds an external encoder or transcoder. Container parsing, file I/O and
//! codec invocation stay outside this crate.

use serde::{Deserialize, Serialize};

use crate::error::{AudioSegmentError, AudioSegmentResult};
use crate::segment::{AudioSegment, SegmentFormat};

/// Format tag of uncompressed linear PCM.
pub const PCM_FORMAT_TAG: u16 = 1;

/// A decoded linear-PCM buffer and its container-level descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPcm {
    /// Container format tag; only [`PCM_FORMAT_TAG`] is accepted.
    pub format_tag: u16,
    /// Channel count.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate_hz: u32,
    /// Bits per sample per channel; must be a multiple of 8.
    pub bits_per_sample: u16,
    /// The interleaved sample bytes.
    pub data: Vec<u8>,
}

impl AudioSegment {
    /// Builds a segment from a decoded PCM buffer.
    ///
    /// 24-bit input is normalized to 32-bit by [`AudioSegment::new`].
    pub fn from_raw_pcm(pcm: RawPcm) -> AudioSegmentResult<AudioSegment> {
        if pcm.format_tag != PCM_FORMAT_TAG {
            return Err(AudioSegmentError::Construction(format!(
                "format tag {} is not uncompressed PCM",
                pcm.format_tag
            )));
        }
        if pcm.bits_per_sample == 0 || pcm.bits_per_sample % 8 != 0 {
            return Err(AudioSegmentError::Construction(format!(
                "bits per sample {} is not a whole number of bytes",
                pcm.bits_per_sample
            )));
        }

        let sample_width = pcm.bits_per_sample / 8;
        AudioSegment::new(
            pcm.data,
            SegmentFormat {
                sample_width,
                frame_rate: pcm.sample_rate_hz,
                frame_width: sample_width as u32 * pcm.channels as u32,
                channels: pcm.channels,
            },
        )
    }

    /// Exports the segment as a decoded PCM buffer for an external encoder.
    pub fn to_raw_pcm(&self) -> RawPcm {
        RawPcm {
            format_tag: PCM_FORMAT_TAG,
            channels: self.channels(),
            sample_rate_hz: self.frame_rate(),
            bits_per_sample: self.sample_width() * 8,
            data: self.raw_data().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_raw_pcm() {
        let pcm = RawPcm {
            format_tag: PCM_FORMAT_TAG,
            channels: 2,
            sample_rate_hz: 44100,
            bits_per_sample: 16,
            data: vec![1, 0, 2, 0, 3, 0, 4, 0],
        };

        let segment = AudioSegment::from_raw_pcm(pcm.clone()).unwrap();
        assert_eq!(segment.channels(), 2);
        assert_eq!(segment.frame_rate(), 44100);
        assert_eq!(segment.sample_width(), 2);
        assert_eq!(segment.frame_width(), 4);
        assert_eq!(segment.frame_count(), 2);

        assert_eq!(segment.to_raw_pcm(), pcm);
    }

    #[test]
    fn test_rejects_non_pcm_format_tag() {
        let pcm = RawPcm {
            format_tag: 85, // mp3
            channels: 1,
            sample_rate_hz: 44100,
            bits_per_sample: 16,
            data: Vec::new(),
        };
        assert!(matches!(
            AudioSegment::from_raw_pcm(pcm),
            Err(AudioSegmentError::Construction(_))
        ));
    }

    #[test]
    fn test_rejects_fractional_byte_widths() {
        let pcm = RawPcm {
            format_tag: PCM_FORMAT_TAG,
            channels: 1,
            sample_rate_hz: 44100,
            bits_per_sample: 12,
            data: Vec::new(),
        };
        assert!(AudioSegment::from_raw_pcm(pcm).is_err());
    }

    #[test]
    fn test_24_bit_pcm_normalizes_to_32() {
        let pcm = RawPcm {
            format_tag: PCM_FORMAT_TAG,
            channels: 1,
            sample_rate_hz: 48000,
            bits_per_sample: 24,
            data: vec![0x00, 0x00, 0x01],
        };

        let segment = AudioSegment::from_raw_pcm(pcm).unwrap();
        assert_eq!(segment.sample_width(), 4);
        // The export reflects the normalized width, not the 24-bit input.
        assert_eq!(segment.to_raw_pcm().bits_per_sample, 32);
    }
}
