//! Error types and result utilities for audio segment operations.

use thiserror::Error;

/// Convenience type alias for results that may contain an AudioSegmentError.
pub type AudioSegmentResult<T> = Result<T, AudioSegmentError>;

/// Error types that can occur during audio segment operations.
///
/// Every failure is detected synchronously and reflects a programming or input
/// error, never a transient condition; no operation is retried internally.
/// Segments are immutable, so a failed derive leaves the receiver untouched.
#[derive(Error, Debug)]
pub enum AudioSegmentError {
    /// Error that occurs when invalid parameters are provided to a sample
    /// buffer operation.
    ///
    /// This includes unsupported sample widths, buffers that are not a whole
    /// number of samples or frames, and out-of-range sample offsets.
    #[error("Invalid parameter error: {0}")]
    InvalidParameters(String),

    /// Error that occurs when a binary operation is applied to buffers of
    /// unequal length.
    #[error("Length mismatch error: left buffer is {left} bytes, right buffer is {right} bytes")]
    LengthMismatch {
        /// Byte length of the left-hand buffer.
        left: usize,
        /// Byte length of the right-hand buffer.
        right: usize,
    },

    /// Error that occurs when a slice is requested with inverted bounds.
    #[error("Invalid range error: {0}")]
    InvalidRange(String),

    /// Error that occurs when converting to an unsupported channel count.
    ///
    /// Only mono and stereo segments are supported.
    #[error("Invalid channel count: {0} (supported counts are 1 and 2)")]
    InvalidChannels(u16),

    /// Error that occurs when end-of-buffer rounding in a slice would require
    /// more than the tolerated amount of generated silence.
    #[error("Slice underrun: {missing} missing frames exceeds the silence budget of {budget} frames")]
    SliceUnderrun {
        /// Number of frames the slice came up short.
        missing: usize,
        /// Maximum number of whole frames the slice may pad with silence.
        budget: usize,
    },

    /// Error that occurs when a segment cannot be constructed from a raw
    /// buffer and format descriptor.
    #[error("Construction error: {0}")]
    Construction(String),
}
