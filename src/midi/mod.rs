//! Standard MIDI File reading for midiloop
//!
//! This module turns raw file bytes into playable note sequences:
//! - [`cursor`] decodes big-endian integers and variable-length quantities
//! - [`parse_header`] and [`parse_track`] read single chunks strictly
//! - [`Song::parse`] reads a whole file, recovering from damaged tracks
//!
pub mod cursor;
mod error;
mod parser;

pub use error::{ParseError, Result};
pub use parser::{parse_header, parse_track, EventKind, MidiHeader, Song, TimedEvent, Track};
