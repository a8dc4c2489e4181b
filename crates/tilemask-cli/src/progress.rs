use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;
use tilemask_dataset::{BuildPhase, BuildProgress};

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg}\n[{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ")
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.abandon_with_message(format!("✗ {}", message));
}

/// Progress display for a dataset build, one bar per locality
///
/// A locality that never reports [`BuildPhase::Finished`] failed; its bar is
/// closed as an error when the next locality starts or the run ends.
pub struct BuildProgressDisplay {
    multi: MultiProgress,
    current: Option<(String, ProgressBar)>,
    hidden: bool,
}

impl BuildProgressDisplay {
    pub fn new(hidden: bool) -> Self {
        Self { multi: MultiProgress::new(), current: None, hidden }
    }

    pub fn update(&mut self, progress: &BuildProgress) {
        let is_new = self.current.as_ref().map_or(true, |(tag, _)| tag != &progress.locality);
        if is_new {
            self.close_failed();
            let bar = if self.hidden {
                ProgressBar::hidden()
            } else {
                self.multi.add(create_spinner(&progress.message))
            };
            self.current = Some((progress.locality.clone(), bar));
        }

        match progress.phase {
            BuildPhase::LoadingFootprints => {
                if let Some((_, bar)) = &self.current {
                    bar.set_message(progress.message.clone());
                }
            }
            BuildPhase::ProcessingTiles => {
                if let Some((tag, bar)) = &self.current {
                    let total = progress.total as u64;
                    if bar.length() != Some(total) {
                        bar.disable_steady_tick();
                        bar.set_style(bar_style());
                        bar.set_length(total);
                    }
                    bar.set_position(progress.current as u64);
                    bar.set_message(format!("{}: {}", tag, progress.message));
                }
            }
            BuildPhase::Finished => {
                if let Some((tag, bar)) = self.current.take() {
                    bar.set_position(progress.total as u64);
                    finish_success(&bar, &format!("{}: {}", tag, progress.message));
                }
            }
        }
    }

    /// Close any bar left open by a failed locality
    pub fn finish(mut self) {
        self.close_failed();
    }

    fn close_failed(&mut self) {
        if let Some((tag, bar)) = self.current.take() {
            finish_error(&bar, &format!("{}: failed", tag));
        }
    }
}
