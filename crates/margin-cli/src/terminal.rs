//! Notifier that writes short messages to the terminal

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use margin_core::notify::{Notifier, ProgressToken};

/// Writes notices to stderr; stdout is reserved for command output
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    quiet: bool,
    next_token: AtomicU64,
}

impl TerminalNotifier {
    /// A quiet notifier suppresses progress lines but still reports errors
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            next_token: AtomicU64::new(0),
        }
    }

    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", line);
    }
}

impl Notifier for TerminalNotifier {
    fn notice(&self, message: &str) {
        if !self.quiet {
            self.write_line(message);
        }
    }

    fn error(&self, message: &str) {
        self.write_line(message);
    }

    fn begin_progress(&self, message: &str) -> ProgressToken {
        if !self.quiet {
            self.write_line(message);
        }
        ProgressToken(self.next_token.fetch_add(1, Ordering::SeqCst))
    }

    fn end_progress(&self, _token: ProgressToken) {}
}
