use std::fmt;
use std::str::FromStr;

use crate::error::XmlError;

/// One step of an [`ElementPath`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `*`, matches any element
    Any,
    /// Matches elements with exactly this qualified name
    Name(String),
}

impl Segment {
    /// Whether an element with this name fits the segment
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Segment::Any => true,
            Segment::Name(expected) => expected == name,
        }
    }
}

/// A `/`-separated element selector such as `media/*/track`
///
/// Paths are always relative to the element they are applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    segments: Vec<Segment>,
}

impl ElementPath {
    /// Segments in order, outermost first
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl FromStr for ElementPath {
    type Err = XmlError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| XmlError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let segments = path
            .split('/')
            .map(|segment| match segment.trim() {
                "" => Err(invalid("empty segment")),
                "*" => Ok(Segment::Any),
                name if name.contains(char::is_whitespace) => Err(invalid("segment contains whitespace")),
                name => Ok(Segment::Name(name.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            match segment {
                Segment::Any => f.write_str("*")?,
                Segment::Name(name) => f.write_str(name)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wildcard_path() {
        let path: ElementPath = "media/*/track".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Name("media".to_string()),
                Segment::Any,
                Segment::Name("track".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "media/*/track");
    }

    #[test]
    fn test_reject_empty_segments() {
        assert!("".parse::<ElementPath>().is_err());
        assert!("media//track".parse::<ElementPath>().is_err());
        assert!("/media".parse::<ElementPath>().is_err());
        assert!("clip item".parse::<ElementPath>().is_err());
    }

    #[test]
    fn test_segment_matching() {
        assert!(Segment::Any.matches("video"));
        assert!(Segment::Name("track".to_string()).matches("track"));
        assert!(!Segment::Name("track".to_string()).matches("tracks"));
    }
}
