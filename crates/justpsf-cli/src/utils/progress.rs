use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use justpsf::engine::progress::{Progress, ProgressCallback};
use std::time::Duration;

const SPINNER_TICK_MS: u64 = 80;

/// Renders engine progress events on stderr.
///
/// Phases show as a spinner that is replaced by a check mark once finished;
/// counted tasks inside a phase switch the line to a bar.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: ProgressBar,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// A handler that tracks state but never draws, for `--quiet` runs.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        pb.finish_and_clear();
        Self { pb }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        // ProgressBar is a shared handle; clones update the same bar.
        let pb = self.pb.clone();

        Box::new(move |progress: Progress| match progress {
            Progress::PhaseStart { name } => {
                pb.reset();
                pb.set_length(0);
                pb.set_style(spinner_style());
                pb.set_prefix(name);
                pb.set_message(name);
                pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::PhaseFinish => {
                pb.disable_steady_tick();
                pb.set_style(done_style());
                let name = pb.prefix();
                pb.finish_with_message(format!("✓ {name}"));
            }
            Progress::TaskStart { total_steps } => {
                pb.disable_steady_tick();
                pb.set_length(total_steps);
                pb.set_position(0);
                pb.set_style(bar_style());
            }
            Progress::TaskIncrement => pb.inc(1),
            Progress::TaskFinish => {
                if let Some(length) = pb.length() {
                    pb.set_position(length);
                }
            }
            Progress::Message(msg) => pb.println(format!("  {msg}")),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn done_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:.green}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:<20} [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handler_starts_finished_and_empty() {
        let handler = CliProgressHandler::hidden();
        assert_eq!(handler.pb.length(), Some(0));
        assert!(handler.pb.is_finished());
    }

    #[test]
    fn callback_tracks_phases_and_tasks() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Canonicalization",
        });
        assert_eq!(handler.pb.message(), "Canonicalization");
        assert!(!handler.pb.is_finished());

        callback(Progress::TaskStart { total_steps: 7 });
        assert_eq!(handler.pb.length(), Some(7));
        assert_eq!(handler.pb.position(), 0);

        callback(Progress::TaskIncrement);
        callback(Progress::TaskIncrement);
        assert_eq!(handler.pb.position(), 2);

        callback(Progress::TaskFinish);
        assert_eq!(handler.pb.position(), 7);

        callback(Progress::PhaseFinish);
        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.message(), "✓ Canonicalization");
    }

    #[test]
    fn callback_can_be_moved_to_another_thread() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart {
                name: "Bond inference",
            });
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.message(), "✓ Bond inference");
    }
}
