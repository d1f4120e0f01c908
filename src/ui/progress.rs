use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

pub fn create_playback_spinner() -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⣀⣤⣦⣶⣷⣿⣷⣶⣦⣤ "),
    );
    pb.set_prefix("Playback");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
