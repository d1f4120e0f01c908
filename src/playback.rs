//! The realtime playback loop.
//!
//! [`PlaybackEngine`] walks every track of a [`Song`] in order, converts each
//! event's delta ticks to a wall-clock wait, and sends notes to an
//! [`OutputTransport`]. All waiting is done in slices of at most one poll
//! interval, so start/stop/pause and volume changes written to the shared
//! [`PlaybackState`] take effect within one slice. When the file is exhausted
//! playback starts over after the inter-loop delay, until a shutdown is requested.

use crate::config::{NoteOffMode, Settings, StopPolicy};
use crate::midi::{EventKind, Song, TimedEvent};
use crate::state::PlaybackState;
use crate::transport::{NotePacket, OutputTransport};
use log::{debug, error, info, trace};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    /// Seconds per quarter note
    pub tempo_scale: f64,
    pub sounding_duration: Duration,
    pub inter_loop_delay: Duration,
    pub poll_interval: Duration,
    pub stop_policy: StopPolicy,
    pub note_off_mode: NoteOffMode,
}

impl From<&Settings> for PlaybackSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            tempo_scale: settings.tempo_scale,
            sounding_duration: settings.sounding_duration(),
            inter_loop_delay: settings.inter_loop_delay(),
            poll_interval: settings.poll_interval(),
            stop_policy: settings.stop_policy,
            note_off_mode: settings.note_off_mode,
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// Index of the next event to play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub track: usize,
    pub event: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// A stop under [`StopPolicy::Rewind`] moved the position back to the start
    Rewound,
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
struct PendingRelease {
    due: Instant,
    channel: u8,
    note: u8,
}

pub struct PlaybackEngine<T: OutputTransport> {
    song: Arc<Song>,
    state: Arc<PlaybackState>,
    transport: T,
    settings: PlaybackSettings,
    position: Position,
    /// When the previously played event was due; the next delay counts from here
    anchor: Option<Instant>,
    pending: Vec<PendingRelease>,
    seen_stops: u64,
    epoch: Instant,
}

impl<T: OutputTransport> PlaybackEngine<T> {
    pub fn new(
        song: Arc<Song>,
        state: Arc<PlaybackState>,
        transport: T,
        settings: PlaybackSettings,
    ) -> Self {
        let seen_stops = state.stop_count();
        Self {
            song,
            state,
            transport,
            settings,
            position: Position::default(),
            anchor: None,
            pending: Vec::new(),
            seen_stops,
            epoch: Instant::now(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Plays the song over and over until [`PlaybackState::request_shutdown`] is called.
    ///
    /// Every sounding note is released before returning.
    pub fn run(&mut self) {
        info!(
            "Playback engine running: {} tracks, {} note events",
            self.song.tracks().len(),
            self.song.event_count()
        );

        while !self.state.is_shutting_down() {
            self.play_pass();
            if self.state.is_shutting_down() {
                break;
            }

            let mut delay = self.settings.inter_loop_delay;
            if self.song.event_count() == 0 {
                delay = delay.max(self.settings.poll_interval);
            }
            trace!("Waiting {:?} before the next pass", delay);
            if self.wait(delay) == Flow::Shutdown {
                break;
            }
        }

        self.release_all();
        info!(
            "Playback engine stopped after {} passes",
            self.state.progress().passes()
        );
    }

    /// Plays from the current position to the end of the last track, then rewinds.
    ///
    /// Returns early, keeping the position, when a shutdown is requested.
    pub fn play_pass(&mut self) {
        while let Some(event) = self.current_event() {
            self.state
                .progress()
                .set_position(self.position.track, self.position.event);

            match self.wait_until_active() {
                Flow::Continue => {}
                Flow::Rewound => continue,
                Flow::Shutdown => return,
            }

            let delay = self
                .song
                .header()
                .ticks_to_duration(event.delta_ticks, self.settings.tempo_scale);
            match self.wait(delay) {
                Flow::Continue => {}
                Flow::Rewound => continue,
                Flow::Shutdown => return,
            }

            self.emit(&event);
            self.position.event += 1;
        }

        self.position = Position::default();
        let passes = self.state.progress().complete_pass();
        debug!("Completed pass {}", passes);
    }

    /// The event at the current position, stepping over exhausted or empty tracks.
    fn current_event(&mut self) -> Option<TimedEvent> {
        let tracks = self.song.tracks();
        while let Some(track) = tracks.get(self.position.track) {
            if let Some(event) = track.get(self.position.event) {
                return Some(*event);
            }
            self.position.track += 1;
            self.position.event = 0;
        }
        None
    }

    /// Blocks while stopped or paused. Sounding notes are released on the way in.
    fn wait_until_active(&mut self) -> Flow {
        let mut idle = false;
        loop {
            if self.state.is_shutting_down() {
                return Flow::Shutdown;
            }
            if self.take_rewind() {
                return Flow::Rewound;
            }
            if self.state.is_active() {
                if idle {
                    debug!("Playback active again at {:?}", self.position);
                }
                return Flow::Continue;
            }
            if !idle {
                debug!(
                    "Playback idle at {:?} (running={}, paused={})",
                    self.position,
                    self.state.is_running(),
                    self.state.is_paused()
                );
                self.release_all();
                // Timing restarts from the moment playback resumes.
                self.anchor = None;
                idle = true;
            }
            thread::sleep(self.settings.poll_interval);
        }
    }

    /// Sleeps for `delay` of active time, polling the control state every slice.
    ///
    /// Time spent stopped or paused pushes the deadline back by the same amount,
    /// so resuming never fires a burst of overdue events.
    fn wait(&mut self, delay: Duration) -> Flow {
        let now = Instant::now();
        let anchor = match self.anchor {
            Some(anchor) if now.saturating_duration_since(anchor) <= self.settings.poll_interval => {
                anchor
            }
            _ => now,
        };
        let mut deadline = anchor + delay;

        loop {
            let now = Instant::now();
            self.release_due(now);

            if self.state.is_shutting_down() {
                return Flow::Shutdown;
            }
            if self.take_rewind() {
                return Flow::Rewound;
            }
            if !self.state.is_active() {
                match self.wait_until_active() {
                    Flow::Continue => {}
                    other => return other,
                }
                deadline += now.elapsed();
                continue;
            }
            if now >= deadline {
                break;
            }

            let mut slice = (deadline - now).min(self.settings.poll_interval);
            if let Some(due) = self.pending.iter().map(|release| release.due).min() {
                slice = slice.min(due.saturating_duration_since(now));
            }
            thread::sleep(slice);
        }

        self.anchor = Some(deadline);
        Flow::Continue
    }

    /// Consumes an unseen stop. Under the rewind policy this resets the position.
    fn take_rewind(&mut self) -> bool {
        let stops = self.state.stop_count();
        if stops == self.seen_stops {
            return false;
        }
        self.seen_stops = stops;

        match self.settings.stop_policy {
            StopPolicy::Freeze => false,
            StopPolicy::Rewind => {
                info!("Stop received, rewinding to the first event");
                self.release_all();
                self.position = Position::default();
                self.anchor = None;
                true
            }
        }
    }

    fn emit(&mut self, event: &TimedEvent) {
        match (event.kind, self.settings.note_off_mode) {
            (EventKind::NoteOn, mode) if event.velocity > 0 => {
                // A retriggered note must not be cut short by the earlier note's release.
                if let Some(index) = self
                    .pending
                    .iter()
                    .position(|r| r.channel == event.channel && r.note == event.note)
                {
                    let release = self.pending.swap_remove(index);
                    self.send_note_off(release.channel, release.note);
                }

                let packet = NotePacket::note_on(
                    self.timestamp_ms(),
                    event.channel,
                    event.note,
                    self.state.volume(),
                );
                self.send(&packet);

                if mode == NoteOffMode::Sounding {
                    self.pending.push(PendingRelease {
                        due: Instant::now() + self.settings.sounding_duration,
                        channel: event.channel,
                        note: event.note,
                    });
                }
            }
            (_, NoteOffMode::File) => self.send_note_off(event.channel, event.note),
            (_, NoteOffMode::Sounding) => {
                trace!("Skipping {:?} note={}", event.kind, event.note);
            }
        }
    }

    fn release_due(&mut self, now: Instant) {
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due <= now {
                let release = self.pending.remove(index);
                self.send_note_off(release.channel, release.note);
            } else {
                index += 1;
            }
        }
    }

    fn release_all(&mut self) {
        for release in std::mem::take(&mut self.pending) {
            self.send_note_off(release.channel, release.note);
        }
    }

    fn send_note_off(&mut self, channel: u8, note: u8) {
        let packet = NotePacket::note_off(self.timestamp_ms(), channel, note, self.state.volume());
        self.send(&packet);
    }

    fn send(&mut self, packet: &NotePacket) {
        debug!("Emitting {}", packet);
        if let Err(e) = self.transport.send(packet) {
            error!("Failed to send {}: {}", packet, e);
        }
    }

    fn timestamp_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}
