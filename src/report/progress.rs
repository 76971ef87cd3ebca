//! Terminal spinner driven by pipeline progress.

use crate::models::Stage;
use crate::pipeline::ProgressNotifier;
use indicatif::{ProgressBar, ProgressStyle};

/// Shows "Thinking..." with the current stage and a call counter.
pub struct SpinnerProgress {
    pb: ProgressBar,
}

impl SpinnerProgress {
    /// `total_calls` is the number of completion calls the run will make.
    pub fn new(total_calls: usize) -> Self {
        let pb = ProgressBar::new(total_calls as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Thinking... [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        Self { pb }
    }

    /// Remove the spinner from the terminal.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl ProgressNotifier for SpinnerProgress {
    fn on_stage(&self, stage: Stage) {
        self.pb.set_message(stage.status());
    }

    fn on_call_complete(&self, _stage: Stage) {
        self.pb.inc(1);
    }
}
