//! Terminal status display
//!
//! A single spinner line on stderr shows what the player is doing:
//! - run/pause state
//! - current track and event
//! - volume and completed passes
//!
//! The line is built with indicatif and refreshed by a polling inspector thread.

mod inspector;
mod progress;

pub use inspector::{describe_state, run_state_inspector};
pub use progress::create_playback_spinner;
