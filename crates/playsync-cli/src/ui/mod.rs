//! Terminal output.

pub mod console;
pub mod search;

pub use console::ConsoleReporter;
