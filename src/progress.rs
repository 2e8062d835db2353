//! Status spinner that compiles to nothing without the `progress` feature

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "progress")]
use std::time::Duration;

/// Spinner shown on stderr while indexes are generated
pub struct Spinner {
    #[cfg(feature = "progress")]
    bar: Option<ProgressBar>,
}

impl Spinner {
    /// Start spinning with `message`; a disabled spinner stays silent
    #[cfg(feature = "progress")]
    pub fn start(message: &str, enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar: Some(bar) }
    }

    #[cfg(not(feature = "progress"))]
    pub fn start(_message: &str, _enabled: bool) -> Self {
        Self {}
    }

    /// Remove the spinner before anything else is printed
    pub fn finish(self) {
        #[cfg(feature = "progress")]
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
