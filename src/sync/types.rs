use std::collections::HashMap;

use crate::timecode::Timecode;

/// Last computed start frame per track name, for one sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    starts: HashMap<String, i64>,
}

impl OffsetTable {
    /// Start recorded for this track name, if any
    pub fn get(&self, track: &str) -> Option<i64> {
        self.starts.get(track).copied()
    }

    /// Record the new start of a track, replacing any earlier entry
    pub fn record(&mut self, track: &str, start: i64) {
        self.starts.insert(track.to_string(), start);
    }

    /// Whether a start was recorded for this track name
    pub fn contains(&self, track: &str) -> bool {
        self.starts.contains_key(track)
    }

    /// Number of distinct track names
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// True before any start is recorded
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

/// Where a clip's new start came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetSource {
    /// The clip's own file timecode
    Timecode(Timecode),
    /// Copied from the last track with the same name
    Inherited,
}

/// A clip item that was moved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipChange {
    pub track: String,
    pub source: OffsetSource,
    pub old_start: i64,
    pub old_end: i64,
    pub new_start: i64,
    pub new_end: i64,
}

impl ClipChange {
    /// Length in frames, unchanged by the move
    pub fn duration(&self) -> i64 {
        self.new_end - self.new_start
    }
}

/// Outcome of re-timing one sequence
#[derive(Debug, Clone)]
pub struct SequenceReport {
    pub name: String,
    pub fps: u32,
    pub timecode: Timecode,

    /// Moved clips, in document order
    pub clips: Vec<ClipChange>,

    /// Tracks without a named clip item
    pub skipped_tracks: usize,

    /// Tracks left untouched because their start could not be resolved
    pub unresolved: Vec<String>,

    /// Offset table as it stood at the end of the sequence
    pub offsets: OffsetTable,
}

impl SequenceReport {
    /// Empty report for a sequence; `fps` comes from the timecode
    pub fn new(name: String, timecode: Timecode) -> Self {
        Self {
            name,
            fps: timecode.fps(),
            timecode,
            clips: Vec::new(),
            skipped_tracks: 0,
            unresolved: Vec::new(),
            offsets: OffsetTable::default(),
        }
    }

    /// Changes for every clip on tracks with this name
    pub fn changes_for<'a>(&'a self, track: &'a str) -> impl Iterator<Item = &'a ClipChange> + 'a {
        self.clips.iter().filter(move |change| change.track == track)
    }
}

/// Outcome of re-timing a whole document
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub sequences: Vec<SequenceReport>,
}

impl SyncReport {
    /// Moved clips across all sequences
    pub fn clips_retimed(&self) -> usize {
        self.sequences.iter().map(|sequence| sequence.clips.len()).sum()
    }

    /// Tracks without a named clip item, across all sequences
    pub fn tracks_skipped(&self) -> usize {
        self.sequences.iter().map(|sequence| sequence.skipped_tracks).sum()
    }

    /// Tracks left unresolved under the `skip` policy
    pub fn unresolved_tracks(&self) -> usize {
        self.sequences.iter().map(|sequence| sequence.unresolved.len()).sum()
    }
}
