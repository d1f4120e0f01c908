use super::{NotePacket, OutputTransport, Result, TransportError};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// A packet as seen by [`RecordingTransport`], with the wall-clock instant it arrived.
#[derive(Debug, Clone, Copy)]
pub struct RecordedPacket {
    pub received_at: Instant,
    pub packet: NotePacket,
}

/// In-memory transport that keeps everything it is sent.
///
/// Clones share one log, so a test can hand one clone to the engine and read the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    log: Arc<Mutex<Vec<RecordedPacket>>>,
    fail_every: Option<usize>,
    attempts: Arc<Mutex<usize>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every `n`th send (1-based) with a send error instead of recording it.
    pub fn failing_every(n: usize) -> Self {
        Self {
            fail_every: Some(n.max(1)),
            ..Self::default()
        }
    }

    pub fn packets(&self) -> Vec<RecordedPacket> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.log.lock().map(|log| log.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of sends attempted, including rejected ones.
    pub fn attempts(&self) -> usize {
        self.attempts.lock().map(|n| *n).unwrap_or_default()
    }
}

impl OutputTransport for RecordingTransport {
    fn send(&mut self, packet: &NotePacket) -> Result<()> {
        let attempt = {
            let mut attempts = self
                .attempts
                .lock()
                .map_err(|e| TransportError::Send(e.to_string()))?;
            *attempts += 1;
            *attempts
        };

        if matches!(self.fail_every, Some(n) if attempt % n == 0) {
            return Err(TransportError::Send(format!(
                "injected failure on send {}",
                attempt
            )));
        }

        self.log
            .lock()
            .map_err(|e| TransportError::Send(e.to_string()))?
            .push(RecordedPacket {
                received_at: Instant::now(),
                packet: *packet,
            });
        Ok(())
    }
}
