use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::{
    config::{Config, ElementPaths, SyncConfig, UnresolvedPolicy},
    error::{Result, SequenceError},
    sync::types::{ClipChange, OffsetSource, OffsetTable, SequenceReport, SyncReport},
    timecode::Timecode,
    xml::{Document, Element, ElementPath},
};

/// Re-times the clip items of every sequence in an interchange document
///
/// For each sequence, every track is visited in document order. The
/// track's leading clip (its first clip item with a name) is moved so that
/// its start equals its file timecode minus the sequence timecode. A clip
/// without a usable timecode takes the start of the last track with the
/// same name. Durations never change.
pub struct Synchronizer {
    config: SyncConfig,
    paths: Selectors,
}

/// Configured element paths, parsed once
struct Selectors {
    sequence: ElementPath,
    sequence_name: ElementPath,
    frame_rate: ElementPath,
    sequence_timecode: ElementPath,
    tracks: ElementPath,
    clip: ElementPath,
    clip_name: ElementPath,
    clip_start: ElementPath,
    clip_end: ElementPath,
    clip_timecode: ElementPath,
}

impl Selectors {
    fn parse(paths: &ElementPaths) -> Result<Self> {
        Ok(Self {
            sequence: ElementPaths::parse("sequence", &paths.sequence)?,
            sequence_name: ElementPaths::parse("sequence_name", &paths.sequence_name)?,
            frame_rate: ElementPaths::parse("frame_rate", &paths.frame_rate)?,
            sequence_timecode: ElementPaths::parse("sequence_timecode", &paths.sequence_timecode)?,
            tracks: ElementPaths::parse("tracks", &paths.tracks)?,
            clip: ElementPaths::parse("clip", &paths.clip)?,
            clip_name: ElementPaths::parse("clip_name", &paths.clip_name)?,
            clip_start: ElementPaths::parse("clip_start", &paths.clip_start)?,
            clip_end: ElementPaths::parse("clip_end", &paths.clip_end)?,
            clip_timecode: ElementPaths::parse("clip_timecode", &paths.clip_timecode)?,
        })
    }
}

/// What happened to a single track
enum TrackOutcome {
    Retimed(ClipChange),
    Skipped,
    Unresolved(String),
}

impl Synchronizer {
    /// Create a synchronizer from the given configuration
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.sync.clone(),
            paths: Selectors::parse(&config.paths)?,
        })
    }

    /// Load `input`, re-time it, and write the result to `output`
    ///
    /// Nothing is written unless every sequence was processed successfully.
    /// With no `output` the document is only processed (dry run).
    pub fn sync_file(&self, input: &Path, output: Option<&Path>) -> Result<SyncReport> {
        info!("Reading input XML {:?}...", input);
        let mut document = Document::from_file(input)?;

        let report = self.process(&mut document)?;

        match output {
            Some(output) => {
                info!("Writing adjusted XML to {:?}...", output);
                document.write_to_file(output)?;
            }
            None => info!("Dry run, no output written"),
        }

        Ok(report)
    }

    /// Re-time every sequence in the document, in place
    pub fn process(&self, document: &mut Document) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        document.for_each_mut(&self.paths.sequence, &mut |sequence: &mut Element| -> Result<()> {
            let sequence_report = self.process_sequence(sequence)?;
            report.sequences.push(sequence_report);
            Ok(())
        })?;

        if report.sequences.is_empty() {
            warn!("No sequences found at '{}'", self.paths.sequence);
        }

        Ok(report)
    }

    fn process_sequence(&self, sequence: &mut Element) -> Result<SequenceReport> {
        let name = sequence
            .first(&self.paths.sequence_name)
            .map(Element::text)
            .ok_or_else(|| SequenceError::MissingField {
                sequence: "<unnamed>".to_string(),
                field: self.paths.sequence_name.to_string(),
            })?;

        let fps: u32 = parse_number(sequence, &self.paths.frame_rate, &name)?;
        let timecode = required_text(sequence, &self.paths.sequence_timecode, &name)?;
        let master = Timecode::parse(&timecode, fps)?;

        info!("--------------------");
        info!("Sequence name: {}", name);
        info!("Sequence timecode: {}", master);
        info!("Sequence starting frame: {}", master.to_frame());

        let mut offsets = OffsetTable::default();
        let mut report = SequenceReport::new(name.clone(), master);

        sequence.for_each_mut(&self.paths.tracks, &mut |track: &mut Element| -> Result<()> {
            match self.retime_track(track, &name, &master, &offsets)? {
                TrackOutcome::Retimed(change) => {
                    offsets.record(&change.track, change.new_start);
                    report.clips.push(change);
                }
                TrackOutcome::Skipped => report.skipped_tracks += 1,
                TrackOutcome::Unresolved(track_name) => match self.config.unresolved_offset {
                    UnresolvedPolicy::Error => {
                        return Err(SequenceError::UnresolvedOffset {
                            sequence: name.clone(),
                            track: track_name,
                        }
                        .into());
                    }
                    UnresolvedPolicy::Skip => {
                        warn!("Couldn't find a start time for {}, leaving it untouched", track_name);
                        report.unresolved.push(track_name);
                    }
                },
            }
            Ok(())
        })?;

        report.offsets = offsets;
        Ok(report)
    }

    fn retime_track(
        &self,
        track: &mut Element,
        sequence: &str,
        master: &Timecode,
        offsets: &OffsetTable,
    ) -> Result<TrackOutcome> {
        let clip_name = &self.paths.clip_name;
        let Some(clip) = track.find_mut(&self.paths.clip, |candidate| candidate.first(clip_name).is_some()) else {
            debug!("Skipping track without a named clip item");
            return Ok(TrackOutcome::Skipped);
        };

        let track_name = clip.first(clip_name).map(Element::text).unwrap_or_default();
        info!("Track name: {}", track_name);

        let old_start: i64 = parse_number(clip, &self.paths.clip_start, sequence)?;
        let old_end: i64 = parse_number(clip, &self.paths.clip_end, sequence)?;
        let overflow = || SequenceError::FrameOverflow {
            sequence: sequence.to_string(),
            track: track_name.clone(),
        };
        let duration = old_end.checked_sub(old_start).ok_or_else(overflow)?;

        let (new_start, source) = match self.clip_timecode(clip, master.fps()) {
            Some(timecode) => (timecode.offset_from(master), OffsetSource::Timecode(timecode)),
            None => match offsets.get(&track_name) {
                Some(start) => {
                    debug!("  no usable timecode, using start of earlier '{}' track", track_name);
                    (start, OffsetSource::Inherited)
                }
                None => return Ok(TrackOutcome::Unresolved(track_name)),
            },
        };

        if new_start < 0 && self.config.warn_on_negative_start {
            warn!(
                "Track {} starts {} frames before the sequence; the sequence timecode must equal or precede the clip timecode",
                track_name,
                new_start.unsigned_abs()
            );
        }

        let new_end = new_start.checked_add(duration).ok_or_else(overflow)?;
        set_number(clip, &self.paths.clip_start, new_start, sequence)?;
        set_number(clip, &self.paths.clip_end, new_end, sequence)?;

        info!("  start : {} --> {}", old_start, new_start);
        if new_start >= 0 {
            if let Ok(timecode) = Timecode::from_frame(new_start, master.fps()) {
                info!("  start timecode: {}", timecode);
            }
        }
        info!("  end   : {} --> {}", old_end, new_end);
        debug!("  length: {} --> {}", duration, new_end - new_start);

        Ok(TrackOutcome::Retimed(ClipChange {
            track: track_name,
            source,
            old_start,
            old_end,
            new_start,
            new_end,
        }))
    }

    /// The clip's own file timecode, if present and well-formed
    fn clip_timecode(&self, clip: &Element, fps: u32) -> Option<Timecode> {
        let text = clip.first(&self.paths.clip_timecode)?.text();
        match Timecode::parse(&text, fps) {
            Ok(timecode) => Some(timecode),
            Err(e) => {
                debug!("  ignoring clip timecode: {}", e);
                None
            }
        }
    }
}

fn required_text(element: &Element, path: &ElementPath, sequence: &str) -> Result<String> {
    element
        .first(path)
        .map(Element::text)
        .ok_or_else(|| missing_field(path, sequence).into())
}

fn parse_number<T: FromStr>(element: &Element, path: &ElementPath, sequence: &str) -> Result<T> {
    let text = required_text(element, path, sequence)?;
    text.trim().parse().map_err(|_| {
        SequenceError::InvalidNumber {
            sequence: sequence.to_string(),
            field: path.to_string(),
            value: text.clone(),
        }
        .into()
    })
}

fn set_number(element: &mut Element, path: &ElementPath, value: i64, sequence: &str) -> Result<()> {
    let target = element
        .first_mut(path)
        .ok_or_else(|| missing_field(path, sequence))?;
    target.set_text(value.to_string());
    Ok(())
}

fn missing_field(path: &ElementPath, sequence: &str) -> SequenceError {
    SequenceError::MissingField {
        sequence: sequence.to_string(),
        field: path.to_string(),
    }
}
