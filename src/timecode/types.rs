use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TimecodeError;

/// Four two-digit groups; searched for anywhere in the input.
static TIMECODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]{2}):([0-9]{2}):([0-9]{2}):([0-9]{2})").expect("timecode pattern is valid")
});

/// A non-drop-frame SMPTE timecode at a fixed frame rate
///
/// Field values are taken as written: only their two-digit width is
/// checked, so `00:99:00:00` is accepted. All arithmetic goes through
/// [`Timecode::to_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timecode {
    hh: u32,
    mm: u32,
    ss: u32,
    ff: u32,
    fps: u32,
}

impl Timecode {
    /// Parse a `HH:MM:SS:FF` string at the given frame rate
    pub fn parse(input: &str, fps: u32) -> Result<Self, TimecodeError> {
        if fps == 0 {
            return Err(TimecodeError::InvalidFrameRate { fps });
        }

        let malformed = || TimecodeError::Malformed {
            input: input.to_string(),
        };

        let captures = TIMECODE_PATTERN.captures(input).ok_or_else(malformed)?;
        let field = |index: usize| -> Result<u32, TimecodeError> {
            captures
                .get(index)
                .and_then(|m| m.as_str().parse().ok())
                .ok_or_else(malformed)
        };

        Ok(Self {
            hh: field(1)?,
            mm: field(2)?,
            ss: field(3)?,
            ff: field(4)?,
            fps,
        })
    }

    /// Build the timecode that lands on an absolute frame number
    ///
    /// Negative frames clamp to zero. Hours are not wrapped at 24, and
    /// frames past `u32::MAX` hours fail with `FrameOutOfRange`.
    pub fn from_frame(frame: i64, fps: u32) -> Result<Self, TimecodeError> {
        if fps == 0 {
            return Err(TimecodeError::InvalidFrameRate { fps });
        }

        let absolute = frame.max(0) as u64;
        let rate = u64::from(fps);
        let total_seconds = absolute / rate;
        let hh = u32::try_from(total_seconds / 3600)
            .map_err(|_| TimecodeError::FrameOutOfRange { frame, fps })?;

        Ok(Self {
            hh,
            mm: (total_seconds / 60 % 60) as u32,
            ss: (total_seconds % 60) as u32,
            ff: (absolute % rate) as u32,
            fps,
        })
    }

    /// Absolute frame number, where frame 0 is `00:00:00:00`
    pub fn to_frame(&self) -> i64 {
        let seconds = i64::from(self.ss) + i64::from(self.mm) * 60 + i64::from(self.hh) * 3600;
        i64::from(self.ff) + seconds * i64::from(self.fps)
    }

    /// Frames between `other` and this timecode (negative if this one is earlier)
    pub fn offset_from(&self, other: &Timecode) -> i64 {
        self.to_frame() - other.to_frame()
    }

    /// Hours field, as written
    pub fn hours(&self) -> u32 {
        self.hh
    }

    /// Minutes field, as written
    pub fn minutes(&self) -> u32 {
        self.mm
    }

    /// Seconds field, as written
    pub fn seconds(&self) -> u32 {
        self.ss
    }

    /// Frames field, as written
    pub fn frames(&self) -> u32 {
        self.ff
    }

    /// Frame rate the timecode counts in
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}:{:02}", self.hh, self.mm, self.ss, self.ff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_fields() {
        let tc = Timecode::parse("01:02:03:04", 25).unwrap();
        assert_eq!(tc.hours(), 1);
        assert_eq!(tc.minutes(), 2);
        assert_eq!(tc.seconds(), 3);
        assert_eq!(tc.frames(), 4);
        assert_eq!(tc.fps(), 25);
    }

    #[test]
    fn test_sequence_and_clip_frames() {
        let sequence = Timecode::parse("01:00:00:00", 24).unwrap();
        let clip = Timecode::parse("01:00:01:00", 24).unwrap();

        assert_eq!(sequence.to_frame(), 86_400);
        assert_eq!(clip.to_frame(), 86_424);
        assert_eq!(clip.offset_from(&sequence), 24);
        assert_eq!(sequence.offset_from(&clip), -24);
    }

    #[test]
    fn test_malformed_timecodes_rejected() {
        for input in ["", "1:00:00:00", "01:00:00", "01-00-00-00", "aa:bb:cc:dd", "01:00:00;00"] {
            let err = Timecode::parse(input, 24).unwrap_err();
            assert_eq!(err, TimecodeError::Malformed { input: input.to_string() });
        }
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        assert!(Timecode::parse("٠١:٠٠:٠٠:٠٠", 24).is_err());
    }

    #[test]
    fn test_out_of_range_fields_accepted() {
        let tc = Timecode::parse("00:99:00:00", 24).unwrap();
        assert_eq!(tc.minutes(), 99);
        assert_eq!(tc.to_frame(), 99 * 60 * 24);
    }

    #[test]
    fn test_pattern_found_inside_longer_text() {
        let tc = Timecode::parse(" 10:20:30:12 ", 30).unwrap();
        assert_eq!(tc.to_string(), "10:20:30:12");
    }

    #[test]
    fn test_zero_fps_rejected() {
        assert_eq!(
            Timecode::parse("00:00:00:00", 0).unwrap_err(),
            TimecodeError::InvalidFrameRate { fps: 0 }
        );
        assert!(Timecode::from_frame(10, 0).is_err());
    }

    #[test]
    fn test_from_frame() {
        let tc = Timecode::from_frame(86_424 + 5, 24).unwrap();
        assert_eq!(tc.to_string(), "01:00:01:05");

        let clamped = Timecode::from_frame(-12, 24).unwrap();
        assert_eq!(clamped.to_frame(), 0);
    }

    #[test]
    fn test_from_frame_rejects_hours_past_u32() {
        assert_eq!(
            Timecode::from_frame(i64::MAX, 1).unwrap_err(),
            TimecodeError::FrameOutOfRange { frame: i64::MAX, fps: 1 }
        );

        let largest = i64::from(u32::MAX) * 3600;
        assert_eq!(Timecode::from_frame(largest, 1).unwrap().hours(), u32::MAX);
    }

    proptest! {
        #[test]
        fn prop_canonical_string_round_trips(
            hh in 0u32..100,
            mm in 0u32..100,
            ss in 0u32..100,
            ff in 0u32..100,
            fps in 1u32..=120
        ) {
            let input = format!("{:02}:{:02}:{:02}:{:02}", hh, mm, ss, ff);
            let tc = Timecode::parse(&input, fps).unwrap();
            prop_assert_eq!(tc.to_string(), input);
        }

        #[test]
        fn prop_to_frame_increases_with_each_field(
            hh in 0u32..99,
            mm in 0u32..99,
            ss in 0u32..99,
            ff in 0u32..99,
            fps in 1u32..=120
        ) {
            let base = Timecode { hh, mm, ss, ff, fps }.to_frame();
            let next_hour = Timecode { hh: hh + 1, mm, ss, ff, fps }.to_frame();
            let next_minute = Timecode { hh, mm: mm + 1, ss, ff, fps }.to_frame();
            let next_second = Timecode { hh, mm, ss: ss + 1, ff, fps }.to_frame();
            let next_frame = Timecode { hh, mm, ss, ff: ff + 1, fps }.to_frame();

            prop_assert!(next_hour > base, "hours not monotonic");
            prop_assert!(next_minute > base, "minutes not monotonic");
            prop_assert!(next_second > base, "seconds not monotonic");
            prop_assert!(next_frame > base, "frames not monotonic");
        }

        #[test]
        fn prop_zero_is_frame_zero(fps in 1u32..=120) {
            prop_assert_eq!(Timecode::parse("00:00:00:00", fps).unwrap().to_frame(), 0);
        }

        #[test]
        fn prop_from_frame_inverts_to_frame(frame in 0i64..10_000_000, fps in 1u32..=120) {
            prop_assert_eq!(Timecode::from_frame(frame, fps).unwrap().to_frame(), frame);
        }
    }
}
