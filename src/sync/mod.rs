//! # Synchronization Module
//!
//! Re-times the clip items of an interchange document so that every
//! track sits on the sequence timeline where its source timecode says it
//! belongs.
//!
//! For each sequence, the start of a track's leading clip becomes
//! `clip timecode - sequence timecode` (in frames at the sequence rate).
//! Tracks whose clip carries no usable timecode reuse the start of the
//! last track with the same name, such as the audio of a video clip.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use timecode_sync::{Config, Document, Synchronizer};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut document = Document::from_file("input.xml")?;
//!
//! let synchronizer = Synchronizer::new(&Config::default())?;
//! let report = synchronizer.process(&mut document)?;
//!
//! println!("Re-timed {} clips", report.clips_retimed());
//! document.write_to_file("output.xml")?;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod types;

pub use engine::Synchronizer;
pub use types::{ClipChange, OffsetSource, OffsetTable, SequenceReport, SyncReport};
