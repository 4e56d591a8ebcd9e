// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![deny(missing_docs)] // Documentation is a must for release

//! # AudioSegments
//!
//! An immutable, sample-accurate PCM audio manipulation library. An
//! [`AudioSegment`] wraps a raw PCM buffer together with its format (sample
//! width, channel count, frame rate) and exposes composition operations that
//! each return a *new* segment: slicing, concatenation, gain, channel, width
//! and rate conversion, and looped overlay mixing. Underneath sits a
//! fixed-point sample engine with bit-exact integer semantics across 8, 16
//! and 32 bit sample widths.
//!
//! ## Design
//!
//! - **Immutability**: a segment never changes after construction. Derived
//!   operations allocate fresh buffers; no-op conversions share the
//!   receiver's buffer, which is always safe. Segments can be read from any
//!   number of threads without locking.
//! - **Two overflow policies**: multiply and add paths saturate (`clip`),
//!   while bias and rate/width conversion paths wrap (two's-complement
//!   overflow), matching the conventions level math downstream is calibrated
//!   against.
//! - **Format synchronization**: operations combining segments of differing
//!   formats convert every operand up to the common channel count, frame
//!   rate and sample width before mixing, in that order.
//!
//! ## Quick Start
//!
//! ```rust
//! use audio_segments::{AudioSegment, SegmentFormat, Volume};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), audio_segments::AudioSegmentError> {
//! // 100 ms of 16-bit mono audio at 44.1 kHz.
//! let beep = AudioSegment::new(
//!     vec![0u8; 8820],
//!     SegmentFormat {
//!         sample_width: 2,
//!         frame_rate: 44100,
//!         frame_width: 2,
//!         channels: 1,
//!     },
//! )?;
//! assert_eq!(beep.duration(), Duration::from_millis(100));
//!
//! let quieter = beep.apply_gain(Volume::from_db(-6.0))?;
//! let track = beep.append(&[quieter])?;
//! assert_eq!(track.duration(), Duration::from_millis(200));
//! # Ok(())
//! # }
//! ```
//!
//! ## Mixing
//!
//! ```rust
//! use audio_segments::{AudioSegment, OverlayConfig};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), audio_segments::AudioSegmentError> {
//! let voice = AudioSegment::silent(Duration::from_millis(500), 8000);
//! let bed = AudioSegment::silent(Duration::from_millis(100), 8000);
//!
//! // Loop the bed under the whole voice segment.
//! let config = OverlayConfig {
//!     loop_to_end: true,
//!     ..OverlayConfig::default()
//! };
//! let mixed = voice.overlay(Some(&bed), &config)?;
//! assert_eq!(mixed.duration(), voice.duration());
//! assert!(mixed.dbfs().is_silence());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`AudioSegmentResult`]; failures are
//! typed by what went wrong and are never retried internally:
//!
//! ```rust
//! use audio_segments::{AudioSegmentError, AudioSegmentResult};
//!
//! let result: AudioSegmentResult<()> = Err(AudioSegmentError::InvalidChannels(6));
//! match result {
//!     Ok(()) => {}
//!     Err(AudioSegmentError::InvalidChannels(count)) => {
//!         eprintln!("unsupported channel count: {count}")
//!     }
//!     Err(other) => eprintln!("operation failed: {other}"),
//! }
//! ```
//!
//! ## Scope
//!
//! The crate ends at decoded PCM: [`RawPcm`] is the interchange point with
//! external container decoders and encoders. File formats, codec invocation
//! and playback are collaborator responsibilities.

mod error;
pub mod ops;
mod pcm;
pub mod sample;
mod segment;
mod volume;

pub use crate::error::{AudioSegmentError, AudioSegmentResult};
pub use crate::ops::{ChannelTap, ResampleState};
pub use crate::pcm::{PCM_FORMAT_TAG, RawPcm};
pub use crate::segment::{AudioSegment, OverlayConfig, SegmentFormat, VALID_CHANNELS};
pub use crate::volume::Volume;
