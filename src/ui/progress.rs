// Transfer progress reporting

use colored::Colorize;
use std::io::{self, Write};

use crate::core::engine::ProgressSink;
use crate::ui::format_size;

/// Carriage-return progress bar sized to bytes transferred.
///
/// Stateful across events within one transfer: lazily initialized on the
/// first event, advanced by the clamped delta between reports, and reset to
/// empty by `finished`. The engine occasionally re-reports a smaller byte
/// count after a fragment restart; the bar never moves backwards.
pub struct TransferBar {
    active: bool,
    total: Option<u64>,
    position: u64,
}

const BAR_LENGTH: usize = 30;

impl TransferBar {
    pub fn new() -> Self {
        Self {
            active: false,
            total: None,
            position: 0,
        }
    }

    /// Bytes the bar currently sits at, or None when no transfer is active
    pub fn position(&self) -> Option<u64> {
        self.active.then_some(self.position)
    }

    fn begin(&mut self, total: Option<u64>) {
        self.active = true;
        self.total = total.filter(|&t| t > 0);
        self.position = 0;
    }

    fn render(&self) {
        match self.total {
            Some(total) => {
                let percentage = (self.position as f64 / total as f64 * 100.0) as usize;
                let filled = (percentage.min(100) as f64 / 100.0 * BAR_LENGTH as f64) as usize;
                let empty = BAR_LENGTH.saturating_sub(filled);

                print!(
                    "\r{} [{}{}] {}% ({}/{}) ",
                    "Downloading".white(),
                    "=".repeat(filled).green(),
                    " ".repeat(empty),
                    percentage.min(100),
                    format_size(Some(self.position)),
                    format_size(Some(total))
                );
            }
            // Indeterminate: no total known, show bytes only
            None => {
                print!(
                    "\r{} {} ",
                    "Downloading".white(),
                    format_size(Some(self.position)).green()
                );
            }
        }

        io::stdout().flush().ok();
    }
}

impl Default for TransferBar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TransferBar {
    fn started(&mut self, total: Option<u64>) {
        self.begin(total);
        self.render();
    }

    fn progressed(&mut self, downloaded: u64, total: Option<u64>) {
        if !self.active {
            self.begin(total);
        }
        if self.total.is_none() {
            self.total = total.filter(|&t| t > 0);
        }

        // Clamp the delta to zero rather than moving the bar backwards
        let delta = downloaded.saturating_sub(self.position);
        self.position += delta;
        self.render();
    }

    fn finished(&mut self) {
        if self.active {
            println!();
        }
        self.active = false;
        self.total = None;
        self.position = 0;
    }
}
