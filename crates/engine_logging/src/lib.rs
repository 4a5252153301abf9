#![deny(missing_docs)]
//! Shared logging setup for the mirror workspace.
//!
//! This crate wires the `log` facade to a `simplelog` terminal logger for the
//! CLI binary and provides a minimal initializer for tests.

use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

/// Initializes the terminal logger used by the CLI binary.
///
/// Safe to call more than once; later calls are ignored.
pub fn initialize_terminal(level: log::LevelFilter) {
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    initialize_terminal(level);
}
