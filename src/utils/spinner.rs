use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a sync runs. Switches to a step counter once git
/// starts reporting `Rebasing (n/m)`.
pub struct Spinner {
    pb: ProgressBar,
    counting: bool,
}

impl Spinner {
    const TICK_RATE: Duration = Duration::from_millis(80);
    const TEMPLATE: &'static str = "{spinner:.green} {msg}";
    const STEP_TEMPLATE: &'static str = "{spinner:.green} {msg} [{pos}/{len}]";

    /// Start a spinner with the provided message.
    pub fn new(message: String) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template(Self::TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Self::TICK_RATE);
        Spinner {
            pb,
            counting: false,
        }
    }

    /// Update the spinner message, dropping any step counter.
    pub fn update_message(&mut self, new_message: String) {
        if self.counting {
            self.pb.set_style(
                ProgressStyle::with_template(Self::TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            self.counting = false;
        }
        self.pb.set_message(new_message);
    }

    /// Show a `current/total` counter next to the message.
    pub fn set_step(&mut self, current: u32, total: u32) {
        if !self.counting {
            self.pb.set_style(
                ProgressStyle::with_template(Self::STEP_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            self.counting = true;
        }
        self.pb.set_length(u64::from(total));
        self.pb.set_position(u64::from(current));
    }

    /// Print a line while keeping the spinner intact.
    pub fn println<T: AsRef<str>>(&self, message: T) {
        self.pb.println(message.as_ref());
    }

    /// Stop the spinner and clear it from the terminal.
    pub fn stop(&self) {
        self.pb.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}
