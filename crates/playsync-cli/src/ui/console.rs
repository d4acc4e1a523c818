//! Line-oriented console reporter.
//!
//! Per-package lines are printed only when progress output was requested;
//! warnings, errors and the final summary are always shown.

use crossterm::style::Stylize;
use playsync_core::Reporter;
use std::io::Write;
use std::sync::Mutex;

type Sink = Mutex<Box<dyn Write + Send>>;

pub struct ConsoleReporter {
    progress: bool,
    out: Sink,
    err: Sink,
}

impl std::fmt::Debug for ConsoleReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleReporter")
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl ConsoleReporter {
    /// Reporter on the process's stdout and stderr.
    pub fn stdio(progress: bool) -> Self {
        Self::with_writers(
            progress,
            Box::new(std::io::stdout()),
            Box::new(std::io::stderr()),
        )
    }

    pub fn with_writers(
        progress: bool,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            progress,
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    fn line(sink: &Sink, text: &str) {
        // A poisoned lock or a closed pipe only loses console output.
        if let Ok(mut w) = sink.lock() {
            let _ = writeln!(w, "{text}");
            let _ = w.flush();
        }
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        if self.progress {
            Self::line(&self.out, &format!("{}", title.bold()));
        }
    }

    fn item_started(&self, position: usize, total: usize, identifier: &str) {
        if self.progress {
            let counter = format!("[{position}/{total}]");
            Self::line(
                &self.out,
                &format!("  {} {identifier}", counter.dark_grey()),
            );
        }
    }

    fn item_done(&self, identifier: &str, detail: &str) {
        if self.progress {
            Self::line(
                &self.out,
                &format!("  {} {identifier} {}", "✓".green(), detail.dark_grey()),
            );
        }
    }

    fn item_failed(&self, identifier: &str, reason: &str) {
        if self.progress {
            Self::line(
                &self.out,
                &format!("  {} {identifier} {}", "✗".red(), reason.red()),
            );
        }
    }

    fn info(&self, msg: &str) {
        Self::line(&self.out, msg);
    }

    fn success(&self, msg: &str) {
        Self::line(&self.out, &format!("{}", msg.green()));
    }

    fn warning(&self, msg: &str) {
        Self::line(&self.err, &format!("{} {msg}", "warning:".yellow().bold()));
    }

    fn error(&self, msg: &str) {
        Self::line(&self.err, &format!("{} {msg}", "error:".red().bold()));
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        if self.progress {
            let operation = action.to_uppercase();
            Self::line(
                &self.out,
                &format!(
                    "{}",
                    format!("{operation} {count}, elapsed {elapsed_secs:.1}s").dark_grey()
                ),
            );
        }
    }
}
