use super::{NotePacket, OutputTransport, Result, TransportError};
use dialoguer::Select;
use log::{debug, error, info};
use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};

const CLIENT_NAME: &str = "midiloop-output";
const CONNECTION_NAME: &str = "midiloop-output-conn";
const ALL_NOTES_OFF: u8 = 123;

/// Sends packets to a MIDI output port.
///
/// The connection is owned for the transport's lifetime and released on drop,
/// after silencing every channel.
pub struct MidirTransport {
    connection: Option<MidiOutputConnection>,
    port_name: String,
}

impl MidirTransport {
    /// Connects to the first port whose name contains `device_name`, or the first port at all.
    pub fn connect(device_name: Option<&str>) -> Result<Self> {
        let midi_out = open_client()?;
        let ports = midi_out.ports();
        let available = port_names(&midi_out, &ports);
        info!("Available MIDI output ports: {:?}", available);

        let index = match device_name {
            Some(name) => available
                .iter()
                .position(|port| port.contains(name))
                .ok_or_else(|| {
                    error!("MIDI output device '{}' not found", name);
                    TransportError::DeviceNotFound(name.to_string())
                })?,
            None if ports.is_empty() => return Err(TransportError::NoPorts),
            None => {
                info!("No device specified, connecting to first available MIDI output");
                0
            }
        };

        Self::connect_port(midi_out, &ports[index], available[index].clone())
    }

    /// Lets the user pick an output port on the terminal.
    pub fn connect_interactive() -> Result<Self> {
        let midi_out = open_client()?;
        let ports = midi_out.ports();
        let available = port_names(&midi_out, &ports);
        let index = select_output_port(&available)?;
        Self::connect_port(midi_out, &ports[index], available[index].clone())
    }

    fn connect_port(midi_out: MidiOutput, port: &MidiOutputPort, port_name: String) -> Result<Self> {
        info!("Connecting to MIDI output port: {}", port_name);
        let connection = midi_out
            .connect(port, CONNECTION_NAME)
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self {
            connection: Some(connection),
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn silence(connection: &mut MidiOutputConnection) {
        for channel in 0..16u8 {
            if let Err(e) = connection.send(&[0xB0 | channel, ALL_NOTES_OFF, 0]) {
                error!("Failed to send All Notes Off on channel {}: {}", channel, e);
                break;
            }
        }
    }
}

impl OutputTransport for MidirTransport {
    fn send(&mut self, packet: &NotePacket) -> Result<()> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| TransportError::Connection("MIDI output not connected".to_string()))?;

        // A wired port takes the plain channel message; the timestamp framing stays with us.
        debug!("Sending {}", packet);
        connection
            .send(&packet.midi_message())
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

impl Drop for MidirTransport {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            Self::silence(&mut connection);
            let _ = connection.close();
            info!("Closed MIDI output port: {}", self.port_name);
        }
    }
}

fn open_client() -> Result<MidiOutput> {
    MidiOutput::new(CLIENT_NAME).map_err(|e| TransportError::Connection(e.to_string()))
}

fn port_names(midi_out: &MidiOutput, ports: &[MidiOutputPort]) -> Vec<String> {
    ports
        .iter()
        .map(|port| {
            midi_out
                .port_name(port)
                .unwrap_or_else(|_| "<unnamed port>".to_string())
        })
        .collect()
}

/// Names of every MIDI output port currently visible.
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("midiloop-port-lister")
        .map_err(|e| TransportError::Connection(e.to_string()))?;
    let ports = midi_out.ports();
    Ok(port_names(&midi_out, &ports))
}

/// Prompts for one of `ports` and returns its index.
pub fn select_output_port(ports: &[String]) -> Result<usize> {
    if ports.is_empty() {
        return Err(TransportError::NoPorts);
    }
    Select::new()
        .with_prompt("MIDI output")
        .items(ports)
        .default(0)
        .interact()
        .map_err(|e| TransportError::Connection(e.to_string()))
}
