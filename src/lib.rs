//! # Timecode-Sync
//!
//! Re-time the clips of a Final Cut Pro 7 / Premiere Pro XML interchange
//! file from their embedded SMPTE timecodes.
//!
//! Editors export clip positions as start/end frame numbers, which are
//! often stale after footage from separate cameras and recorders has been
//! dropped into one sequence. The source timecode stamped on each file is
//! the reliable reference, so this crate moves every track's clip to
//! `clip timecode - sequence timecode`, keeping its duration.
//!
//! ## Quick Start
//!
//! ```rust
//! use timecode_sync::{Config, Document, Synchronizer};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut document = Document::parse(
//!     "<xmeml><sequence><name>Main</name>\
//!      <timecode><rate><timebase>24</timebase></rate><string>01:00:00:00</string></timecode>\
//!      <media><video><track><clipitem><name>A001</name><start>0</start><end>48</end>\
//!      <file><timecode><string>01:00:00:12</string></timecode></file>\
//!      </clipitem></track></video></media></sequence></xmeml>",
//! )?;
//!
//! let synchronizer = Synchronizer::new(&Config::default())?;
//! let report = synchronizer.process(&mut document)?;
//!
//! let clip = &report.sequences[0].clips[0];
//! assert_eq!((clip.new_start, clip.new_end), (12, 60));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`timecode`] - SMPTE timecode values and frame arithmetic
//! - [`xml`] - Mutable XML tree with path selectors
//! - [`sync`] - The re-timing pass over sequences and tracks
//! - [`config`] - Configuration management

pub mod config;
pub mod error;
pub mod sync;
pub mod timecode;
pub mod xml;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, TimecodeSyncError},
    sync::{SyncReport, Synchronizer},
    timecode::Timecode,
    xml::Document,
};
