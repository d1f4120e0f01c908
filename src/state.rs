use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};

/// Inclusive bounds every volume write is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeRange {
    pub min: u8,
    pub max: u8,
}

impl VolumeRange {
    pub fn new(min: u8, max: u8) -> Self {
        let max = max.min(127);
        Self {
            min: min.min(max),
            max,
        }
    }

    pub fn clamp(&self, value: i32) -> u8 {
        value.clamp(i32::from(self.min), i32::from(self.max)) as u8
    }
}

impl Default for VolumeRange {
    fn default() -> Self {
        Self { min: 0, max: 127 }
    }
}

/// Control knobs shared between the command receiver and the playback engine.
///
/// Every field is a single atomic, so a write is visible to the engine at its
/// next poll without any locking.
pub struct PlaybackState {
    running: AtomicBool,
    paused: AtomicBool,
    volume: AtomicU8,
    volume_range: VolumeRange,
    /// Bumped on every stop so the engine can see a stop/start pair it slept through
    stop_count: AtomicU64,
    /// Set once when the process is asked to exit; never cleared
    shutdown: AtomicBool,
    progress: PlaybackProgress,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(64, VolumeRange::default())
    }
}

impl PlaybackState {
    pub fn new(initial_volume: u8, volume_range: VolumeRange) -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            volume: AtomicU8::new(volume_range.clamp(i32::from(initial_volume))),
            volume_range,
            stop_count: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
            progress: PlaybackProgress::default(),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.stop_count.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Flips the paused flag and returns the new value.
    pub fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// True when events may be emitted: running and not paused.
    pub fn is_active(&self) -> bool {
        self.is_running() && !self.is_paused()
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::SeqCst)
    }

    pub fn volume_range(&self) -> VolumeRange {
        self.volume_range
    }

    pub fn set_volume(&self, volume: u8) {
        self.volume
            .store(self.volume_range.clamp(i32::from(volume)), Ordering::SeqCst);
    }

    /// Moves the volume by `delta`, clamped into the configured range. Returns the new volume.
    pub fn adjust_volume(&self, delta: i32) -> u8 {
        let range = self.volume_range;
        let previous = self
            .volume
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(range.clamp(i32::from(current) + delta))
            })
            .unwrap_or_else(|current| current);
        range.clamp(i32::from(previous) + delta)
    }

    /// Asks every worker polling this state to wind down.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> u64 {
        self.stop_count.load(Ordering::SeqCst)
    }

    pub fn progress(&self) -> &PlaybackProgress {
        &self.progress
    }
}

/// Where the engine currently is, published for display.
#[derive(Default)]
pub struct PlaybackProgress {
    track: AtomicUsize,
    event: AtomicUsize,
    passes: AtomicU64,
}

impl PlaybackProgress {
    pub fn set_position(&self, track: usize, event: usize) {
        self.track.store(track, Ordering::Relaxed);
        self.event.store(event, Ordering::Relaxed);
    }

    pub fn position(&self) -> (usize, usize) {
        (
            self.track.load(Ordering::Relaxed),
            self.event.load(Ordering::Relaxed),
        )
    }

    pub fn complete_pass(&self) -> u64 {
        self.passes.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }
}
