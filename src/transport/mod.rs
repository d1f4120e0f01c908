//! Note output for midiloop
//!
//! The playback engine hands every note it plays to an [`OutputTransport`] as a
//! [`NotePacket`]. Implementations decide how the packet reaches a device:
//! - [`MidirTransport`] writes to a hardware or virtual MIDI port via midir
//! - [`LogTransport`] only logs, for dry runs
//! - [`RecordingTransport`] keeps every packet in memory for tests
//!
mod midir_transport;
mod mock;
mod packet;

use thiserror::Error;

pub use midir_transport::{list_output_ports, select_output_port, MidirTransport};
pub use mock::{RecordedPacket, RecordingTransport};
pub use packet::NotePacket;

/// Failure to deliver a note to the output device.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("MIDI output connection error: {0}")]
    Connection(String),
    #[error("MIDI output device '{0}' not found")]
    DeviceNotFound(String),
    #[error("no MIDI output ports available")]
    NoPorts,
    #[error("MIDI send error: {0}")]
    Send(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// A sink for timestamped note packets.
pub trait OutputTransport: Send {
    fn send(&mut self, packet: &NotePacket) -> Result<()>;
}

impl<T: OutputTransport + ?Sized> OutputTransport for Box<T> {
    fn send(&mut self, packet: &NotePacket) -> Result<()> {
        (**self).send(packet)
    }
}

/// Writes packets to the log instead of a device.
#[derive(Debug, Default)]
pub struct LogTransport;

impl OutputTransport for LogTransport {
    fn send(&mut self, packet: &NotePacket) -> Result<()> {
        log::info!("{} [{:02X?}]", packet, packet.to_bytes());
        Ok(())
    }
}
