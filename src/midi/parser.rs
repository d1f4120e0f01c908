//! Standard MIDI File parsing.
//!
//! Only note-on and note-off events are materialised. Everything else in a
//! track is sized according to its status byte and stepped over, with its delta
//! time folded into the next note event so playback timing is preserved.

use super::cursor::{read_fixed_be, read_u8, read_variable_length};
use super::error::{ParseError, Result};
use log::{debug, warn};
use std::time::Duration;

const HEADER_TAG: &[u8; 4] = b"MThd";
const TRACK_TAG: &[u8; 4] = b"MTrk";
/// Tag plus length field that prefixes every chunk
const CHUNK_PREFIX_LEN: usize = 8;
/// format, track count and time division
const HEADER_FIELDS_LEN: u32 = 6;

const META_EVENT: u8 = 0xFF;
const SYSEX_EVENT: u8 = 0xF0;
const SYSEX_ESCAPE: u8 = 0xF7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiHeader {
    pub format_type: u16,
    pub track_count: u16,
    /// Ticks per quarter note
    pub time_division: u16,
}

impl MidiHeader {
    /// Wall-clock length of `ticks` when one quarter note lasts `tempo_scale` seconds.
    pub fn ticks_to_duration(&self, ticks: u32, tempo_scale: f64) -> Duration {
        let seconds = f64::from(ticks) / f64::from(self.time_division) * tempo_scale;
        Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn,
    NoteOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    /// Ticks since the previous materialised event of the same track
    pub delta_ticks: u32,
    pub kind: EventKind,
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    events: Vec<TimedEvent>,
}

impl Track {
    pub fn new(events: Vec<TimedEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&TimedEvent> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Validates the `MThd` chunk and returns the header with the offset of the first track chunk.
pub fn parse_header(buffer: &[u8]) -> Result<(MidiHeader, usize)> {
    let truncated = |_| ParseError::InvalidHeader("header chunk is truncated".to_string());

    if buffer.get(..4) != Some(HEADER_TAG.as_slice()) {
        return Err(ParseError::InvalidHeader(
            "missing MThd chunk tag".to_string(),
        ));
    }

    let (length, offset) = read_fixed_be(buffer, 4, 4).map_err(truncated)?;
    if length < HEADER_FIELDS_LEN {
        return Err(ParseError::InvalidHeader(format!(
            "header chunk length {} is shorter than {}",
            length, HEADER_FIELDS_LEN
        )));
    }

    let (format_type, offset) = read_fixed_be(buffer, offset, 2).map_err(truncated)?;
    let (track_count, offset) = read_fixed_be(buffer, offset, 2).map_err(truncated)?;
    let (time_division, _) = read_fixed_be(buffer, offset, 2).map_err(truncated)?;

    if format_type > 2 {
        return Err(ParseError::InvalidHeader(format!(
            "unsupported format type {}",
            format_type
        )));
    }
    if time_division == 0 {
        return Err(ParseError::InvalidHeader(
            "time division is zero".to_string(),
        ));
    }
    if time_division & 0x8000 != 0 {
        return Err(ParseError::InvalidHeader(
            "SMPTE time division is not supported".to_string(),
        ));
    }

    let header = MidiHeader {
        format_type: format_type as u16,
        track_count: track_count as u16,
        time_division: time_division as u16,
    };
    debug!("Parsed MIDI header: {:?}", header);

    // Longer header chunks carry fields we do not read; the first track follows them.
    Ok((header, CHUNK_PREFIX_LEN + length as usize))
}

/// Parses the `MTrk` chunk at `offset`, returning its note events and the offset just past the chunk.
///
/// Any structural problem inside the chunk is returned as an error; [`Song::parse`]
/// is the lenient entry point that recovers from the ones it can.
pub fn parse_track(buffer: &[u8], offset: usize) -> Result<(Track, usize)> {
    let mut reader = TrackReader::open(buffer, offset)?;
    let mut events = Vec::new();
    while let Some(event) = reader.next_event()? {
        events.push(event);
    }
    Ok((Track::new(events), reader.end()))
}

/// Incremental reader over the events of one track chunk.
struct TrackReader<'a> {
    /// Buffer cut at the declared end of the chunk (or the end of input, if sooner)
    view: &'a [u8],
    position: usize,
    end: usize,
    running_status: Option<u8>,
    /// Delta time of skipped events not yet attributed to a note event
    pending_ticks: u32,
}

impl<'a> TrackReader<'a> {
    fn open(buffer: &'a [u8], offset: usize) -> Result<Self> {
        let truncated = ParseError::TruncatedInput {
            offset: buffer.len(),
        };
        let tag = offset
            .checked_add(4)
            .and_then(|tag_end| buffer.get(offset..tag_end))
            .ok_or_else(|| truncated.clone())?;
        if tag != TRACK_TAG.as_slice() {
            return Err(ParseError::UnexpectedChunk {
                tag: String::from_utf8_lossy(tag).into_owned(),
                offset,
            });
        }

        let (length, start) = read_fixed_be(buffer, offset + 4, 4)?;
        let end = start.checked_add(length as usize).ok_or(truncated)?;

        Ok(Self {
            view: &buffer[..end.min(buffer.len())],
            position: start,
            end,
            running_status: None,
            pending_ticks: 0,
        })
    }

    fn end(&self) -> usize {
        self.end
    }

    /// Reads forward to the next note event, or `None` once the chunk is exhausted.
    fn next_event(&mut self) -> Result<Option<TimedEvent>> {
        while self.position < self.end {
            let start = self.position;
            match self.read_event() {
                Ok(Some(event)) => return Ok(Some(event)),
                Ok(None) => {}
                Err(ParseError::TruncatedInput { offset }) => {
                    // Inside the declared chunk the only way to run dry is to cross its end.
                    return Err(if self.end <= self.view.len() {
                        ParseError::TrackOverrun {
                            offset: start,
                            end: self.end,
                        }
                    } else {
                        ParseError::TruncatedInput { offset }
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Steps past the byte an [`ParseError::UnknownEventType`] was reported at.
    fn skip_unknown(&mut self, offset: usize) {
        self.position = offset + 1;
    }

    /// Consumes one event. Returns the event only when it is a note on/off.
    fn read_event(&mut self) -> Result<Option<TimedEvent>> {
        let (delta, position) = read_variable_length(self.view, self.position)?;
        self.pending_ticks = self.pending_ticks.saturating_add(delta);
        self.position = position;

        let (byte, after_byte) = read_u8(self.view, self.position)?;
        let (status, data_start) = if byte & 0x80 != 0 {
            (byte, after_byte)
        } else {
            // Running status: the byte just read is the first data byte.
            let status = self.running_status.ok_or(ParseError::UnknownEventType {
                status: byte,
                offset: self.position,
            })?;
            (status, self.position)
        };

        match status {
            0x80..=0xEF => {
                self.running_status = Some(status);
                let channel = status & 0x0F;
                match status & 0xF0 {
                    0x80 | 0x90 => {
                        let (note, position) = read_u8(self.view, data_start)?;
                        let (velocity, position) = read_u8(self.view, position)?;
                        self.position = position;

                        let kind = if status & 0xF0 == 0x90 {
                            EventKind::NoteOn
                        } else {
                            EventKind::NoteOff
                        };
                        let event = TimedEvent {
                            delta_ticks: std::mem::take(&mut self.pending_ticks),
                            kind,
                            channel,
                            note: note & 0x7F,
                            velocity: velocity & 0x7F,
                        };
                        Ok(Some(event))
                    }
                    0xC0 | 0xD0 => self.skip(data_start, 1),
                    _ => self.skip(data_start, 2),
                }
            }
            META_EVENT => {
                let (_meta_type, position) = read_u8(self.view, data_start)?;
                let (length, position) = read_variable_length(self.view, position)?;
                self.skip(position, length as usize)
            }
            SYSEX_EVENT | SYSEX_ESCAPE => {
                let (length, position) = read_variable_length(self.view, data_start)?;
                self.skip(position, length as usize)
            }
            _ => Err(ParseError::UnknownEventType {
                status,
                offset: self.position,
            }),
        }
    }

    fn skip(&mut self, from: usize, count: usize) -> Result<Option<TimedEvent>> {
        let to = from
            .checked_add(count)
            .filter(|to| *to <= self.view.len())
            .ok_or(ParseError::TruncatedInput {
                offset: self.view.len(),
            })?;
        self.position = to;
        Ok(None)
    }
}

/// A parsed file ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    header: MidiHeader,
    tracks: Vec<Track>,
    diagnostics: Vec<ParseError>,
}

impl Song {
    /// Parses a whole file, keeping whatever can be played.
    ///
    /// A bad header is fatal. Inside tracks, unknown status bytes are skipped one
    /// byte at a time, an overrunning event ends its track at the declared
    /// boundary, and truncated input keeps the events read so far and stops.
    /// Non-`MTrk` chunks are skipped by their declared length.
    pub fn parse(buffer: &[u8]) -> Result<Song> {
        let (header, mut offset) = parse_header(buffer)?;
        let mut tracks = Vec::with_capacity(usize::from(header.track_count));
        let mut diagnostics = Vec::new();

        while tracks.len() < usize::from(header.track_count) && offset < buffer.len() {
            let mut reader = match TrackReader::open(buffer, offset) {
                Ok(reader) => reader,
                Err(err @ ParseError::UnexpectedChunk { .. }) => {
                    warn!("Skipping chunk: {}", err);
                    diagnostics.push(err);
                    match read_fixed_be(buffer, offset + 4, 4) {
                        Ok((length, start)) => match start.checked_add(length as usize) {
                            Some(next) => {
                                offset = next;
                                continue;
                            }
                            None => {
                                let err = ParseError::TruncatedInput {
                                    offset: buffer.len(),
                                };
                                warn!("Stopping parse: {}", err);
                                diagnostics.push(err);
                                break;
                            }
                        },
                        Err(err) => {
                            warn!("Stopping parse: {}", err);
                            diagnostics.push(err);
                            break;
                        }
                    }
                }
                Err(err) => {
                    warn!("Stopping parse: {}", err);
                    diagnostics.push(err);
                    break;
                }
            };

            let mut events = Vec::new();
            let mut next_offset = Some(reader.end());
            loop {
                match reader.next_event() {
                    Ok(Some(event)) => events.push(event),
                    Ok(None) => break,
                    Err(ParseError::UnknownEventType { status, offset }) => {
                        warn!(
                            "Skipping unknown event status {:#04X} at byte {}",
                            status, offset
                        );
                        diagnostics.push(ParseError::UnknownEventType { status, offset });
                        reader.skip_unknown(offset);
                    }
                    Err(err @ ParseError::TrackOverrun { .. }) => {
                        warn!("Track {} cut short: {}", tracks.len(), err);
                        diagnostics.push(err);
                        break;
                    }
                    Err(err) => {
                        warn!("Track {} cut short, stopping parse: {}", tracks.len(), err);
                        diagnostics.push(err);
                        next_offset = None;
                        break;
                    }
                }
            }

            debug!("Track {} holds {} note events", tracks.len(), events.len());
            tracks.push(Track::new(events));
            match next_offset {
                Some(next) => offset = next,
                None => break,
            }
        }

        if tracks.len() < usize::from(header.track_count) {
            warn!(
                "Header declares {} tracks, found {}",
                header.track_count,
                tracks.len()
            );
        }

        Ok(Song {
            header,
            tracks,
            diagnostics,
        })
    }

    pub fn header(&self) -> &MidiHeader {
        &self.header
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Problems the parser recovered from, in the order met.
    pub fn diagnostics(&self) -> &[ParseError] {
        &self.diagnostics
    }

    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }
}
