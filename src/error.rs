use thiserror::Error;

/// Main error type for the timecode-sync library
#[derive(Error, Debug)]
pub enum TimecodeSyncError {
    #[error("Timecode error: {0}")]
    Timecode(#[from] TimecodeError),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Timecode-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimecodeError {
    #[error("Malformed timecode '{input}', expected HH:MM:SS:FF")]
    Malformed { input: String },

    #[error("Invalid frame rate: {fps}")]
    InvalidFrameRate { fps: u32 },

    #[error("Frame {frame} at {fps} fps is too far out to express as a timecode")]
    FrameOutOfRange { frame: i64, fps: u32 },
}

/// XML loading, navigation and writing errors
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Failed to parse XML at byte {position}: {reason}")]
    ParseFailed { position: u64, reason: String },

    #[error("Malformed document: {reason}")]
    Malformed { reason: String },

    #[error("Invalid element path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Failed to write XML: {reason}")]
    WriteFailed { reason: String },
}

/// Errors raised while re-timing a sequence
#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Sequence '{sequence}' is missing required element '{field}'")]
    MissingField { sequence: String, field: String },

    #[error("Sequence '{sequence}': '{field}' is not an integer: '{value}'")]
    InvalidNumber {
        sequence: String,
        field: String,
        value: String,
    },

    #[error("Sequence '{sequence}': track '{track}' has no timecode and no earlier track with the same name")]
    UnresolvedOffset { sequence: String, track: String },

    #[error("Sequence '{sequence}': re-timing track '{track}' overflows the frame range")]
    FrameOverflow { sequence: String, track: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using TimecodeSyncError
pub type Result<T> = std::result::Result<T, TimecodeSyncError>;

impl TimecodeSyncError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Sequence(SequenceError::UnresolvedOffset { sequence, track }) => {
                format!(
                    "Track '{}' in sequence '{}' has no file timecode and no earlier track with the same name to copy its start from. \
                     Set `unresolved_offset = \"skip\"` under [sync] to leave such tracks untouched.",
                    track, sequence
                )
            }
            Self::Timecode(TimecodeError::Malformed { input }) => {
                format!("Could not read timecode '{}'. Timecodes must look like HH:MM:SS:FF (drop-frame is not supported).", input)
            }
            Self::Xml(XmlError::ParseFailed { .. }) => {
                format!("The input is not a well-formed XML file: {}", self)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_message_names_track() {
        let err: TimecodeSyncError = SequenceError::UnresolvedOffset {
            sequence: "Main".to_string(),
            track: "A001".to_string(),
        }
        .into();

        let message = err.user_message();
        assert!(message.contains("A001"));
        assert!(message.contains("Main"));
    }

    #[test]
    fn test_other_errors_fall_back_to_display() {
        let err: TimecodeSyncError = SequenceError::FrameOverflow {
            sequence: "Main".to_string(),
            track: "A001".to_string(),
        }
        .into();

        assert_eq!(
            err.user_message(),
            "Sequence error: Sequence 'Main': re-timing track 'A001' overflows the frame range"
        );
    }
}
