use midiloop::state::{PlaybackState, VolumeRange};
use std::sync::Arc;
use std::thread;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_initialization() {
        let state = PlaybackState::default();
        assert!(!state.is_running());
        assert!(!state.is_paused());
        assert!(!state.is_active());
        assert_eq!(state.volume(), 64);
        assert_eq!(state.stop_count(), 0);
        assert_eq!(state.progress().position(), (0, 0));
    }

    #[test]
    fn test_start_stop() {
        let state = PlaybackState::default();

        state.start();
        assert!(state.is_running());
        assert!(state.is_active());

        state.stop();
        assert!(!state.is_running());
        assert_eq!(state.stop_count(), 1);
    }

    #[test]
    fn test_toggle_pause() {
        let state = PlaybackState::default();
        state.start();

        assert!(state.toggle_pause());
        assert!(state.is_paused());
        assert!(!state.is_active());

        assert!(!state.toggle_pause());
        assert!(state.is_active());
    }

    #[test]
    fn test_volume_up_clamps_at_max() {
        let state = PlaybackState::new(117, VolumeRange::new(0, 127));

        assert_eq!(state.adjust_volume(10), 127);
        for _ in 0..5 {
            assert_eq!(state.adjust_volume(10), 127);
        }
        assert_eq!(state.volume(), 127);
    }

    #[test]
    fn test_volume_down_clamps_at_min() {
        let state = PlaybackState::new(25, VolumeRange::new(10, 117));

        assert_eq!(state.adjust_volume(-10), 15);
        assert_eq!(state.adjust_volume(-10), 10);
        assert_eq!(state.adjust_volume(-10), 10);
    }

    #[test]
    fn test_initial_and_set_volume_are_clamped() {
        let state = PlaybackState::new(5, VolumeRange::new(10, 117));
        assert_eq!(state.volume(), 10);

        state.set_volume(200);
        assert_eq!(state.volume(), 117);
    }

    #[test]
    fn test_volume_range_never_exceeds_midi_limit() {
        let range = VolumeRange::new(0, 200);
        assert_eq!(range.max, 127);
        assert_eq!(range.clamp(1000), 127);
        assert_eq!(range.clamp(-5), 0);
    }

    #[test]
    fn test_concurrent_volume_adjustments_stay_in_range() {
        let state = Arc::new(PlaybackState::new(64, VolumeRange::default()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = state.clone();
                thread::spawn(move || {
                    let delta = if i % 2 == 0 { 10 } else { -10 };
                    for _ in 0..100 {
                        let volume = state.adjust_volume(delta);
                        assert!(volume <= 127);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(state.volume() <= 127);
    }

    #[test]
    fn test_rapid_stop_start_is_counted() {
        let state = Arc::new(PlaybackState::default());
        let state_clone = state.clone();

        let toggler = thread::spawn(move || {
            for _ in 0..100 {
                state_clone.start();
                state_clone.stop();
            }
        });
        toggler.join().unwrap();

        assert!(!state.is_running());
        assert_eq!(state.stop_count(), 100);
    }

    #[test]
    fn test_progress_tracking() {
        let state = PlaybackState::default();
        state.progress().set_position(2, 17);
        assert_eq!(state.progress().position(), (2, 17));
        assert_eq!(state.progress().complete_pass(), 1);
        assert_eq!(state.progress().complete_pass(), 2);
        assert_eq!(state.progress().passes(), 2);
    }

    #[test]
    fn test_shutdown_request_is_sticky() {
        let state = Arc::new(PlaybackState::default());
        assert!(!state.is_shutting_down());

        let signal = state.clone();
        thread::spawn(move || signal.request_shutdown())
            .join()
            .unwrap();

        state.start();
        state.stop();
        assert!(state.is_shutting_down());
    }
}
