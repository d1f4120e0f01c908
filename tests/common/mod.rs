#![allow(dead_code)]

use midiloop::midi::cursor::encode_variable_length;

/// Bytes of an `MThd` chunk.
pub fn header(format_type: u16, track_count: u16, division: u16) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&format_type.to_be_bytes());
    bytes.extend_from_slice(&track_count.to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());
    bytes
}

/// An `MTrk` chunk around `body`, with the length field set to `body.len()`.
pub fn track(body: &[u8]) -> Vec<u8> {
    track_with_length(body, body.len() as u32)
}

/// An `MTrk` chunk whose length field claims `declared` bytes regardless of `body`.
pub fn track_with_length(body: &[u8], declared: u32) -> Vec<u8> {
    let mut bytes = b"MTrk".to_vec();
    bytes.extend_from_slice(&declared.to_be_bytes());
    bytes.extend_from_slice(body);
    bytes
}

/// Delta time followed by raw event bytes.
pub fn event(delta: u32, data: &[u8]) -> Vec<u8> {
    let mut bytes = encode_variable_length(delta);
    bytes.extend_from_slice(data);
    bytes
}

pub fn end_of_track(delta: u32) -> Vec<u8> {
    event(delta, &[0xFF, 0x2F, 0x00])
}

/// A whole file: header followed by the given track chunks.
pub fn smf(division: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = header(1, tracks.len() as u16, division);
    for chunk in tracks {
        bytes.extend_from_slice(chunk);
    }
    bytes
}

/// A track body from a list of events.
pub fn body(events: &[Vec<u8>]) -> Vec<u8> {
    events.concat()
}

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
