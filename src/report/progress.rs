//! Progress indicator and notices shown on stderr.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Fire-and-forget progress display. Implementations never fail.
pub trait Progress: Send + Sync {
    fn notice(&self, message: &str);
    fn show_progress(&self);
    fn clear_progress(&self);
}

/// Discards everything. Used for `--silent`.
#[derive(Debug, Default)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn notice(&self, _message: &str) {}
    fn show_progress(&self) {}
    fn clear_progress(&self) {}
}

const UNICODE_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];
const ASCII_TICKS: &[&str] = &["|", "/", "-", "\\", " "];

/// Spinner on stderr while a tarball is being built; notices are printed
/// above it as `npack notice <message>`. Hidden when stderr is not a terminal.
pub struct SpinnerProgress {
    unicode: bool,
    draw_target: fn() -> ProgressDrawTarget,
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerProgress {
    pub fn new(unicode: bool) -> Self {
        Self {
            unicode,
            draw_target: ProgressDrawTarget::stderr,
            bar: Mutex::new(None),
        }
    }

    #[cfg(test)]
    fn hidden(unicode: bool) -> Self {
        Self {
            unicode,
            draw_target: ProgressDrawTarget::hidden,
            bar: Mutex::new(None),
        }
    }

    fn style(&self) -> ProgressStyle {
        let ticks = if self.unicode { UNICODE_TICKS } else { ASCII_TICKS };
        ProgressStyle::default_spinner()
            .tick_strings(ticks)
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn is_active(&self) -> bool {
        self.bar.lock().map(|b| b.is_some()).unwrap_or(false)
    }
}

impl Progress for SpinnerProgress {
    fn notice(&self, message: &str) {
        let line = format!("npack notice {}", message);
        match self.bar.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(bar) => bar.suspend(|| eprintln!("{}", line)),
                None => eprintln!("{}", line),
            },
            Err(_) => eprintln!("{}", line),
        }
    }

    fn show_progress(&self) {
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };
        if guard.is_some() {
            return;
        }
        let bar = ProgressBar::with_draw_target(None, (self.draw_target)());
        bar.set_style(self.style());
        bar.set_message("packing");
        bar.enable_steady_tick(Duration::from_millis(100));
        *guard = Some(bar);
    }

    fn clear_progress(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_and_clear() {
        let progress = SpinnerProgress::hidden(false);
        assert!(!progress.is_active());

        progress.show_progress();
        assert!(progress.is_active());

        // Showing twice keeps a single spinner
        progress.show_progress();
        assert!(progress.is_active());

        progress.clear_progress();
        assert!(!progress.is_active());

        // Clearing when nothing is shown is a no-op
        progress.clear_progress();
    }

    #[test]
    fn test_notice_while_spinning() {
        let progress = SpinnerProgress::hidden(true);
        progress.show_progress();
        progress.notice("packing my-cool-pkg@1.0.0");
        progress.clear_progress();
    }

    #[test]
    fn test_silent_progress() {
        let progress = SilentProgress;
        progress.show_progress();
        progress.notice("ignored");
        progress.clear_progress();
    }
}
