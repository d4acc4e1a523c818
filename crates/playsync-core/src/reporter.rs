//! Reporter trait for dependency injection
//!
//! Core logic reports progress and status through this handle instead of
//! printing directly, so the CLI decides how things look and tests can
//! swap in [`NullReporter`].

/// Receives progress and status events from the engine.
pub trait Reporter: Send + Sync {
    /// Indicates a new phase has started (e.g. "Checking apks", "Downloading").
    fn section(&self, title: &str);

    /// A batch item is about to be fetched (`position` is 1-based).
    fn item_started(&self, position: usize, total: usize, identifier: &str);

    /// A batch item completed successfully.
    fn item_done(&self, identifier: &str, detail: &str);

    /// A batch item failed with a specific reason.
    fn item_failed(&self, identifier: &str, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display a final summary of multiple operations.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn item_started(&self, position: usize, total: usize, identifier: &str) {
        (**self).item_started(position, total, identifier);
    }
    fn item_done(&self, identifier: &str, detail: &str) {
        (**self).item_done(identifier, detail);
    }
    fn item_failed(&self, identifier: &str, reason: &str) {
        (**self).item_failed(identifier, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn item_started(&self, _: usize, _: usize, _: &str) {}
    fn item_done(&self, _: &str, _: &str) {}
    fn item_failed(&self, _: &str, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}
