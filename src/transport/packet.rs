use crate::midi::EventKind;
use std::fmt;

const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;

/// One note message with the timestamp framing used by MIDI over wireless links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotePacket {
    /// Milliseconds on the sender's monotonic clock
    pub timestamp_ms: u64,
    pub kind: EventKind,
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
}

impl NotePacket {
    pub fn note_on(timestamp_ms: u64, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            timestamp_ms,
            kind: EventKind::NoteOn,
            channel,
            note,
            velocity,
        }
    }

    pub fn note_off(timestamp_ms: u64, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            timestamp_ms,
            kind: EventKind::NoteOff,
            channel,
            note,
            velocity,
        }
    }

    pub fn status(&self) -> u8 {
        let kind = match self.kind {
            EventKind::NoteOn => NOTE_ON,
            EventKind::NoteOff => NOTE_OFF,
        };
        kind | (self.channel & 0x0F)
    }

    /// Timestamp high and low bytes, status, note, velocity.
    ///
    /// The timestamp keeps 13 bits: six in the header byte and seven in the
    /// timestamp byte, each with the high bit set.
    pub fn to_bytes(&self) -> [u8; 5] {
        let header = 0x80 | ((self.timestamp_ms >> 7) & 0x3F) as u8;
        let timestamp = 0x80 | (self.timestamp_ms & 0x7F) as u8;
        [
            header,
            timestamp,
            self.status(),
            self.note & 0x7F,
            self.velocity & 0x7F,
        ]
    }

    /// The bare three-byte channel message, without timestamp framing.
    pub fn midi_message(&self) -> [u8; 3] {
        [self.status(), self.note & 0x7F, self.velocity & 0x7F]
    }
}

impl fmt::Display for NotePacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            EventKind::NoteOn => "Note On",
            EventKind::NoteOff => "Note Off",
        };
        write!(
            f,
            "{} ch={} note={} vel={} @{}ms",
            kind, self.channel, self.note, self.velocity, self.timestamp_ms
        )
    }
}
