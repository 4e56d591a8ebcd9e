//! The immutable audio segment and its composition operations.
//!
//! An [`AudioSegment`] pairs a raw PCM byte buffer with its format descriptor
//! (sample width, channel count, frame rate). Every operation is a pure
//! function from the receiver and its arguments to a *new* segment; no
//! in-place mutation ever occurs, so segments can be shared freely across
//! threads. No-op conversions return a clone backed by the same buffer.
//!
//! Operations that combine segments of differing formats synchronize all
//! operands first: each is converted up to the maximum channel count, frame
//! rate and sample width across the inputs, in that order, before the
//! combination runs.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{AudioSegmentError, AudioSegmentResult};
use crate::ops;
use crate::volume::Volume;

/// Channel counts a segment may carry.
pub const VALID_CHANNELS: [u16; 2] = [1, 2];

/// Format descriptor for a segment's raw PCM buffer.
///
/// `frame_width` is redundant with `sample_width * channels` and is validated
/// against them at construction; it is kept explicit because the external
/// PCM interchange format carries it explicitly too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentFormat {
    /// Bytes per sample per channel: 1, 2 or 4, or 3 for 24-bit input that is
    /// normalized to 4 at construction.
    pub sample_width: u16,
    /// Frames (samples per channel) per second.
    pub frame_rate: u32,
    /// Bytes per frame, `sample_width * channels`.
    pub frame_width: u32,
    /// Channel count, 1 or 2.
    pub channels: u16,
}

impl Default for SegmentFormat {
    /// The format of the empty segment: mono, 8-bit, 1 Hz.
    fn default() -> Self {
        SegmentFormat {
            sample_width: 1,
            frame_rate: 1,
            frame_width: 1,
            channels: 1,
        }
    }
}

/// Configuration for [`AudioSegment::overlay`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayConfig {
    /// Position in the receiver at which overlaying starts.
    pub position: Duration,
    /// Keep looping the overlaid segment until the receiver's end is reached.
    /// When set, `loop_count` is ignored.
    pub loop_to_end: bool,
    /// Number of times to apply the overlaid segment. Defaults to 1; zero is
    /// treated as 1; -1 loops until the receiver's end.
    pub loop_count: i32,
    /// Gain applied to the receiver's samples inside each overlaid window,
    /// when nonzero.
    pub gain_during_overlay: Volume,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            position: Duration::ZERO,
            loop_to_end: false,
            loop_count: 1,
            gain_during_overlay: Volume::default(),
        }
    }
}

/// An immutable segment of PCM audio.
///
/// The backing buffer is shared, never mutated, and always a whole number of
/// frames long. Derived segments allocate their own buffer; only no-op
/// conversions share the receiver's.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    format: SegmentFormat,
    data: Arc<[u8]>,
    /// Memoized by the first `rms` call; safe because the segment never
    /// changes afterwards.
    rms: OnceLock<f64>,
}

impl AudioSegment {
    /// Creates a segment from raw PCM bytes and a format descriptor.
    ///
    /// 24-bit data (`sample_width == 3`) is expanded to 32-bit here, exactly
    /// once: each 3-byte little-endian sample is sign-extended with a high
    /// padding byte of `0xFF` or `0x00`.
    pub fn new(data: impl Into<Vec<u8>>, format: SegmentFormat) -> AudioSegmentResult<Self> {
        let mut data = data.into();
        let mut format = format;

        if !VALID_CHANNELS.contains(&format.channels) {
            return Err(AudioSegmentError::Construction(format!(
                "unsupported channel count {}",
                format.channels
            )));
        }
        if !(1..=4).contains(&format.sample_width) {
            return Err(AudioSegmentError::Construction(format!(
                "unsupported sample width {}",
                format.sample_width
            )));
        }
        let expected_frame_width = format.sample_width as u32 * format.channels as u32;
        if format.frame_width != expected_frame_width {
            return Err(AudioSegmentError::Construction(format!(
                "frame width {} does not match {} byte samples x {} channels",
                format.frame_width, format.sample_width, format.channels
            )));
        }
        if data.len() % format.frame_width as usize != 0 {
            return Err(AudioSegmentError::Construction(format!(
                "data length {} is not a whole number of {} byte frames",
                data.len(),
                format.frame_width
            )));
        }

        if format.sample_width == 3 {
            data = expand_24_bit(&data);
            format.sample_width = 4;
            format.frame_width = 4 * format.channels as u32;
        }

        Ok(AudioSegment {
            format,
            data: data.into(),
            rms: OnceLock::new(),
        })
    }

    /// The zero-length segment: mono, 8-bit, 1 Hz.
    pub fn empty() -> Self {
        AudioSegment {
            format: SegmentFormat::default(),
            data: Arc::from(Vec::new()),
            rms: OnceLock::new(),
        }
    }

    /// A mono 16-bit segment of silence covering `duration` at `frame_rate`.
    pub fn silent(duration: Duration, frame_rate: u32) -> Self {
        let frames = (frame_rate as f64 * (duration.as_millis() as f64 / 1000.0)) as usize;
        AudioSegment {
            format: SegmentFormat {
                sample_width: 2,
                frame_rate,
                frame_width: 2,
                channels: 1,
            },
            data: Arc::from(vec![0u8; frames * 2]),
            rms: OnceLock::new(),
        }
    }

    /// Bytes per sample per channel.
    pub const fn sample_width(&self) -> u16 {
        self.format.sample_width
    }

    /// Frames per second.
    pub const fn frame_rate(&self) -> u32 {
        self.format.frame_rate
    }

    /// Bytes per frame.
    pub const fn frame_width(&self) -> u32 {
        self.format.frame_width
    }

    /// Channel count.
    pub const fn channels(&self) -> u16 {
        self.format.channels
    }

    /// The format descriptor.
    pub const fn format(&self) -> SegmentFormat {
        self.format
    }

    /// The raw PCM bytes.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Number of whole frames in the segment.
    pub fn frame_count(&self) -> usize {
        self.data.len() / self.format.frame_width as usize
    }

    /// Fractional number of frames covered by `duration`, clamped to the
    /// segment's own length.
    pub fn frame_count_in(&self, duration: Duration) -> f64 {
        let clamped = duration.min(self.duration());
        clamped.as_millis() as f64 * (self.format.frame_rate as f64 / 1000.0)
    }

    /// The segment's duration, rounded to whole milliseconds. Zero when the
    /// frame rate is zero.
    pub fn duration(&self) -> Duration {
        if self.format.frame_rate == 0 {
            return Duration::ZERO;
        }
        let millis =
            (1000.0 * self.frame_count() as f64 / self.format.frame_rate as f64).round();
        Duration::from_millis(millis as u64)
    }

    /// Extracts the audio between `start` and `end`.
    ///
    /// Both bounds are clamped to the segment's duration. When rounding at
    /// the end of the buffer leaves the slice a few frames short of the
    /// requested span, up to about 2 ms of silence is generated to make up
    /// the difference; a larger shortfall is a `SliceUnderrun`.
    pub fn slice(&self, start: Duration, end: Duration) -> AudioSegmentResult<AudioSegment> {
        if start > end {
            return Err(AudioSegmentError::InvalidRange(format!(
                "slice start {start:?} exceeds end {end:?}"
            )));
        }

        let total = self.duration();
        let start = start.min(total);
        let end = end.min(total);

        let frame_width = self.format.frame_width as usize;
        let start_index = self.frame_index(start) * frame_width;
        let end_index = self.frame_index(end) * frame_width;
        let expected_len = end_index - start_index;

        let end_index = end_index.min(self.data.len());
        let start_index = start_index.min(end_index);
        let mut data = self.data[start_index..end_index].to_vec();

        let missing_frames = (expected_len - data.len()) / frame_width;
        if missing_frames > 0 {
            let budget = self.frame_count_in(Duration::from_millis(2));
            if missing_frames as f64 > budget {
                return Err(AudioSegmentError::SliceUnderrun {
                    missing: missing_frames,
                    budget: budget as usize,
                });
            }

            trace!(missing_frames, "padding slice tail with silence");
            let silent_frame = if data.len() >= frame_width {
                ops::scale(&data[..frame_width], self.format.sample_width as usize, 0.0)?
            } else {
                vec![0u8; frame_width]
            };
            data.extend_from_slice(&silent_frame.repeat(missing_frames));
        }

        self.derive(data)
    }

    /// Concatenates `others` after the receiver.
    ///
    /// All operands are synchronized to their common format first; the result
    /// carries that synchronized format.
    pub fn append(&self, others: &[AudioSegment]) -> AudioSegmentResult<AudioSegment> {
        let mut operands: Vec<&AudioSegment> = Vec::with_capacity(others.len() + 1);
        operands.push(self);
        operands.extend(others.iter());

        let synced = AudioSegment::sync(&operands)?;
        let total: usize = synced.iter().map(|segment| segment.data.len()).sum();
        let mut data = Vec::with_capacity(total);
        for segment in &synced {
            data.extend_from_slice(&segment.data);
        }
        synced[0].derive(data)
    }

    /// Repeats the segment's audio `count` times.
    pub fn repeat(&self, count: usize) -> AudioSegmentResult<AudioSegment> {
        self.derive(self.data.repeat(count))
    }

    /// Reverses the sample order of the segment.
    pub fn reverse(&self) -> AudioSegmentResult<AudioSegment> {
        let data = ops::reverse_samples(&self.data, self.format.sample_width as usize)?;
        self.derive(data)
    }

    /// Applies a gain, scaling every sample by the volume's amplitude ratio.
    pub fn apply_gain(&self, volume_change: Volume) -> AudioSegmentResult<AudioSegment> {
        let data = ops::scale(
            &self.data,
            self.format.sample_width as usize,
            volume_change.to_ratio(true),
        )?;
        self.derive(data)
    }

    /// Converts the segment to another sample width.
    ///
    /// 8-bit segments follow the unsigned convention of their external
    /// format: the implicit 128 offset is removed before rescaling and
    /// restored when the target is also 8-bit.
    pub fn fork_with_sample_width(&self, sample_width: u16) -> AudioSegmentResult<AudioSegment> {
        if sample_width == self.format.sample_width {
            return Ok(self.clone());
        }

        let mut data = self.data.to_vec();
        if self.format.sample_width == 1 {
            data = ops::bias(&data, 1, -128)?;
        }

        data = ops::convert_width(
            &data,
            self.format.sample_width as usize,
            sample_width as usize,
        )?;

        if sample_width == 1 {
            data = ops::bias(&data, 1, 128)?;
        }

        AudioSegment::new(
            data,
            SegmentFormat {
                sample_width,
                frame_width: sample_width as u32 * self.format.channels as u32,
                ..self.format
            },
        )
    }

    /// Converts the segment to another frame rate by linear resampling.
    pub fn fork_with_frame_rate(&self, frame_rate: u32) -> AudioSegmentResult<AudioSegment> {
        if frame_rate == self.format.frame_rate {
            return Ok(self.clone());
        }

        debug!(
            from = self.format.frame_rate,
            to = frame_rate,
            "resampling segment"
        );

        let data = if self.data.is_empty() {
            Vec::new()
        } else {
            let (converted, _) = ops::convert_sample_rate(
                &self.data,
                self.format.sample_width as usize,
                self.format.channels as usize,
                self.format.frame_rate,
                frame_rate,
                1,
                0,
            )?;
            converted
        };

        AudioSegment::new(
            data,
            SegmentFormat {
                frame_rate,
                ..self.format
            },
        )
    }

    /// Converts the segment to another channel count.
    ///
    /// Mono to stereo duplicates the channel at unity gain; stereo to mono
    /// mixes both channels at half gain each.
    pub fn fork_with_channels(&self, channels: u16) -> AudioSegmentResult<AudioSegment> {
        if !VALID_CHANNELS.contains(&channels) {
            return Err(AudioSegmentError::InvalidChannels(channels));
        }
        if channels == self.format.channels {
            return Ok(self.clone());
        }

        let width = self.format.sample_width as usize;
        let (data, frame_width) = if channels == 2 {
            (
                ops::expand_to_stereo(&self.data, width, 1.0, 1.0)?,
                self.format.frame_width * 2,
            )
        } else {
            (
                ops::fold_to_mono(&self.data, width, 0.5, 0.5)?,
                self.format.frame_width / 2,
            )
        };

        AudioSegment::new(
            data,
            SegmentFormat {
                channels,
                frame_width,
                ..self.format
            },
        )
    }

    /// Converts every input segment to the common format across all of them:
    /// the maximum channel count, frame rate and sample width, applied in
    /// that order.
    pub fn sync(segments: &[&AudioSegment]) -> AudioSegmentResult<Vec<AudioSegment>> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        let channels = segments.iter().map(|s| s.format.channels).max().unwrap_or(1);
        let frame_rate = segments.iter().map(|s| s.format.frame_rate).max().unwrap_or(1);
        let sample_width = segments
            .iter()
            .map(|s| s.format.sample_width)
            .max()
            .unwrap_or(1);

        debug!(channels, frame_rate, sample_width, "synchronizing segments");

        segments
            .iter()
            .map(|segment| {
                let synced = segment.fork_with_channels(channels)?;
                let synced = synced.fork_with_frame_rate(frame_rate)?;
                synced.fork_with_sample_width(sample_width)
            })
            .collect()
    }

    /// Mixes `other` into the receiver starting at `config.position`.
    ///
    /// The overlaid segment is applied to successive windows of the tail,
    /// `config.loop_count` times or until the tail is exhausted when
    /// `config.loop_to_end` is set; the last application is trimmed to fit.
    /// Windows are mixed by clipped addition, with the receiver's side scaled
    /// by `config.gain_during_overlay` when that gain is nonzero. Passing
    /// `None` returns an equivalent copy of the receiver.
    pub fn overlay(
        &self,
        other: Option<&AudioSegment>,
        config: &OverlayConfig,
    ) -> AudioSegmentResult<AudioSegment> {
        let Some(other) = other else {
            return self.derive(self.data.to_vec());
        };

        let mut remaining_loops: i64 = if config.loop_count == 0 {
            1
        } else {
            config.loop_count as i64
        };
        if config.loop_to_end {
            remaining_loops = -1;
        }

        let synced = AudioSegment::sync(&[self, other])?;
        let (segment, other) = (&synced[0], &synced[1]);
        let sample_width = segment.format.sample_width as usize;

        debug!(
            position_ms = config.position.as_millis() as u64,
            loops = remaining_loops,
            "overlaying segment"
        );

        let head = segment.slice(Duration::ZERO, config.position)?;
        let tail = segment.slice(config.position, segment.duration())?;

        let mut dest = Vec::with_capacity(segment.data.len());
        dest.extend_from_slice(&head.data);

        let tail_data = &tail.data;
        let other_data = &other.data;
        let mut other_len = other_data.len();
        let gain = config.gain_during_overlay;

        let mut pos = 0usize;
        while remaining_loops != 0 {
            let remaining_len = tail_data.len().saturating_sub(pos);
            if other_len >= remaining_len {
                other_len = remaining_len;
                // Trimmed to fit: this is the last application.
                remaining_loops = 1;
            }

            let window = &tail_data[pos..pos + other_len];
            let mixed = if gain.db() != 0.0 {
                let adjusted = ops::scale(window, sample_width, gain.to_ratio(true))?;
                ops::add(&adjusted, &other_data[..other_len], sample_width)?
            } else {
                ops::add(window, &other_data[..other_len], sample_width)?
            };
            dest.extend_from_slice(&mixed);

            pos += other_len;
            remaining_loops -= 1;
        }

        dest.extend_from_slice(&tail_data[pos..]);
        segment.derive(dest)
    }

    /// Root mean square of the segment's samples, memoized on first use.
    ///
    /// 8-bit segments are upconverted to 16-bit first, where the squared sums
    /// are better behaved, and report that segment's RMS.
    pub fn rms(&self) -> f64 {
        *self.rms.get_or_init(|| {
            if self.format.sample_width == 1 {
                return match self.fork_with_sample_width(2) {
                    Ok(wider) => wider.rms(),
                    Err(_) => 0.0,
                };
            }
            ops::rms(&self.data, self.format.sample_width as usize)
                .map_or(0.0, |value| value as f64)
        })
    }

    /// Loudness of the segment as RMS relative to the maximum possible
    /// amplitude. Silence reports [`Volume::SILENCE`].
    pub fn dbfs(&self) -> Volume {
        Volume::from_ratio(self.rms(), self.max_possible_amplitude(), true)
    }

    /// The largest absolute sample value in the segment.
    pub fn max(&self) -> f64 {
        ops::max_abs(&self.data, self.format.sample_width as usize).map_or(0.0, f64::from)
    }

    /// Peak level of the segment relative to the maximum possible amplitude.
    pub fn max_dbfs(&self) -> Volume {
        Volume::from_ratio(self.max(), self.max_possible_amplitude(), true)
    }

    /// The largest amplitude the segment's sample width can represent:
    /// `2^(8 * sample_width) / 2`.
    pub fn max_possible_amplitude(&self) -> f64 {
        (1u64 << (8 * self.format.sample_width)) as f64 / 2.0
    }

    /// Converts a position to a frame index, rounding to the nearest frame.
    fn frame_index(&self, position: Duration) -> usize {
        (self.format.frame_rate as f64 * position.as_millis() as f64 / 1000.0).round() as usize
    }

    /// Creates a new segment carrying this segment's format and the given
    /// data. The data length is revalidated against the frame width.
    fn derive(&self, data: Vec<u8>) -> AudioSegmentResult<AudioSegment> {
        AudioSegment::new(data, self.format)
    }
}

impl fmt::Display for AudioSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioSegment(sample_width={}, frame_rate={}, frame_width={}, channels={}, duration={:?})",
            self.format.sample_width,
            self.format.frame_rate,
            self.format.frame_width,
            self.format.channels,
            self.duration(),
        )
    }
}

impl PartialEq for AudioSegment {
    /// Segments are equal when their formats and raw data match; the RMS
    /// memo does not participate.
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format && self.data == other.data
    }
}

impl Eq for AudioSegment {}

/// Sign-extends each 3-byte little-endian sample into a 4-byte one.
fn expand_24_bit(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 3 * 4);
    for chunk in data.chunks_exact(3) {
        let padding = if chunk[2] & 0x80 != 0 { 0xFF } else { 0x00 };
        out.extend_from_slice(&[chunk[0], chunk[1], chunk[2], padding]);
    }
    out
}
