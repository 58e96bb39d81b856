//! # Timecode Module
//!
//! SMPTE timecodes (`HH:MM:SS:FF`, non-drop-frame) at a fixed integer frame
//! rate, and their conversion to and from absolute frame numbers.
//!
//! ## Usage
//!
//! ```rust
//! use timecode_sync::timecode::Timecode;
//!
//! let sequence = Timecode::parse("01:00:00:00", 24)?;
//! let clip = Timecode::parse("01:00:01:00", 24)?;
//!
//! assert_eq!(sequence.to_frame(), 86_400);
//! assert_eq!(clip.offset_from(&sequence), 24);
//! # Ok::<(), timecode_sync::error::TimecodeError>(())
//! ```

pub mod types;

pub use types::Timecode;
