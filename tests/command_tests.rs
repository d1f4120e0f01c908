use midiloop::command::{
    forward_commands, run_command_receiver, Command, ControlHandler, ControlMessage, Outcome,
};
use midiloop::state::{PlaybackState, VolumeRange};
use std::io::Cursor;
use std::sync::Arc;
use std::thread;

fn handler_for(state: &Arc<PlaybackState>) -> ControlHandler {
    ControlHandler::new(state.clone(), 0.5, 10)
}

#[test]
fn test_start_and_stop_applied() {
    let state = Arc::new(PlaybackState::default());
    let handler = handler_for(&state);

    assert_eq!(handler.apply(ControlMessage::new(Command::Start)), Outcome::Applied);
    assert!(state.is_running());

    assert_eq!(handler.apply(ControlMessage::new(Command::Stop)), Outcome::Applied);
    assert!(!state.is_running());
}

#[test]
fn test_weak_commands_are_ignored() {
    let state = Arc::new(PlaybackState::default());
    let handler = handler_for(&state);

    let outcome = handler.apply(ControlMessage::with_strength(Command::VolumeUp, 0.3));
    assert_eq!(outcome, Outcome::Ignored);
    assert_eq!(state.volume(), 64);

    // The threshold itself is not enough.
    let outcome = handler.apply(ControlMessage::with_strength(Command::Start, 0.5));
    assert_eq!(outcome, Outcome::Ignored);
    assert!(!state.is_running());

    let outcome = handler.apply(ControlMessage::with_strength(Command::VolumeUp, 0.51));
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(state.volume(), 74);
}

#[test]
fn test_repeated_volume_up_settles_at_max() {
    let state = Arc::new(PlaybackState::new(117, VolumeRange::new(0, 127)));
    let handler = handler_for(&state);

    for _ in 0..4 {
        handler.apply(ControlMessage::with_strength(Command::VolumeUp, 0.9));
        assert!(state.volume() <= 127);
    }
    assert_eq!(state.volume(), 127);
}

#[test]
fn test_toggle_pause_twice_resumes() {
    let state = Arc::new(PlaybackState::default());
    let handler = handler_for(&state);

    handler.apply(ControlMessage::new(Command::TogglePause));
    assert!(state.is_paused());
    handler.apply(ControlMessage::new(Command::TogglePause));
    assert!(!state.is_paused());
}

#[test]
fn test_receiver_applies_in_arrival_order() {
    let state = Arc::new(PlaybackState::new(60, VolumeRange::default()));
    let (tx, rx) = crossbeam::channel::unbounded();
    let handler = handler_for(&state);

    let receiver = thread::spawn(move || run_command_receiver(rx, handler));

    for message in [
        ControlMessage::new(Command::Start),
        ControlMessage::new(Command::VolumeUp),
        ControlMessage::new(Command::VolumeUp),
        ControlMessage::new(Command::VolumeDown),
        ControlMessage::new(Command::Stop),
    ] {
        tx.send(message).unwrap();
    }
    drop(tx);
    receiver.join().unwrap();

    assert_eq!(state.volume(), 70);
    assert!(!state.is_running());
    assert_eq!(state.stop_count(), 1);
}

#[test]
fn test_forward_commands_skips_bad_lines() {
    let input = Cursor::new("start\n\nlouder\nup:0.9\nup:abc\ndown:0.2\npause\n");
    let (tx, rx) = crossbeam::channel::unbounded();

    forward_commands(input, &tx);
    drop(tx);

    let received: Vec<ControlMessage> = rx.iter().collect();
    assert_eq!(
        received,
        vec![
            ControlMessage::new(Command::Start),
            ControlMessage::with_strength(Command::VolumeUp, 0.9),
            ControlMessage::with_strength(Command::VolumeDown, 0.2),
            ControlMessage::new(Command::TogglePause),
        ]
    );
}

#[test]
fn test_forward_commands_stops_when_receiver_gone() {
    let input = Cursor::new("start\nstop\n");
    let (tx, rx) = crossbeam::channel::unbounded::<ControlMessage>();
    drop(rx);

    // Returns instead of blocking or panicking.
    forward_commands(input, &tx);
}
