use thiserror::Error;

/// Structural problems found while reading a Standard MIDI File.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The buffer does not start with a usable `MThd` chunk
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// The buffer ended in the middle of a field
    #[error("input truncated at byte {offset}")]
    TruncatedInput { offset: usize },
    /// An event would read past the end declared by its track chunk
    #[error("event at byte {offset} overruns track ending at byte {end}")]
    TrackOverrun { offset: usize, end: usize },
    /// A status byte that none of the skip rules can size
    #[error("unknown event status {status:#04X} at byte {offset}")]
    UnknownEventType { status: u8, offset: usize },
    /// A chunk other than `MTrk` where a track was expected
    #[error("unexpected chunk {tag:?} at byte {offset}")]
    UnexpectedChunk { tag: String, offset: usize },
}

impl ParseError {
    /// True for conditions the session-level parser recovers from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ParseError::TrackOverrun { .. }
                | ParseError::UnknownEventType { .. }
                | ParseError::UnexpectedChunk { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParseError::UnknownEventType {
            status: 0xF4,
            offset: 31,
        };
        assert_eq!(err.to_string(), "unknown event status 0xF4 at byte 31");

        let err = ParseError::TrackOverrun { offset: 40, end: 42 };
        assert_eq!(
            err.to_string(),
            "event at byte 40 overruns track ending at byte 42"
        );
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(ParseError::TrackOverrun { offset: 0, end: 0 }.is_recoverable());
        assert!(!ParseError::TruncatedInput { offset: 0 }.is_recoverable());
        assert!(!ParseError::InvalidHeader("bad tag".into()).is_recoverable());
    }
}
