//! `indicatif` progress bar for fetch batches.

use coyo_core::fetch::{FetchOutcome, FetchProgress};
use indicatif::{ProgressBar, ProgressStyle};

/// Terminal progress display: one bar advanced per outcome, status lines printed above it.
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    pub fn new(total: u64, message: &str) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(
                "{msg} {wide_bar:.cyan/dim} {pos}/{len} {percent}% [{elapsed_precise}<{eta}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    pub fn report(&self, outcome: &FetchOutcome, progress: FetchProgress) {
        self.bar.println(outcome.to_string());
        self.bar.set_position(progress.completed as u64);
    }

    pub fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}
