//! Fully safe bump-allocating logger
//!
//! 100% safe Rust: owned Strings in LogEntry, a guard type for iteration,
//! and a bump allocator for temporary formatting that is reset after each
//! format operation.

use bumpalo::Bump;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// Verbosity level for engine output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// Silent - no output
    Silent = 0,
    /// Minimal - only phase boundaries
    Minimal = 1,
    /// Normal - phases, actions, and key mutations (default)
    #[default]
    Normal = 2,
    /// Verbose - every mutation and pipeline step
    Verbose = 3,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// A log entry with owned strings (no lifetime parameters)
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Verbosity level of this log entry
    pub level: VerbosityLevel,
    /// Log message (owned)
    pub message: String,
}

/// Guard type that provides read-only access to captured log entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Centralized logger using bump allocation for temporary formatting
#[derive(Debug)]
pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,

    /// Bump allocator for temporary string formatting.
    /// Reset after each format operation to avoid growth.
    format_bump: RefCell<Bump>,

    /// Captured log entries (owned strings)
    log_buffer: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    /// Create a new logger with default verbosity (Normal)
    pub fn new() -> Self {
        GameLogger {
            verbosity: VerbosityLevel::default(),
            output_mode: OutputMode::default(),
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    /// Create a logger with specified verbosity
    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            ..Self::new()
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    /// Log at Minimal level
    pub fn log_minimal(&self, message: &str) {
        self.log_at(VerbosityLevel::Minimal, message);
    }

    /// Log at Normal level
    pub fn log_normal(&self, message: &str) {
        self.log_at(VerbosityLevel::Normal, message);
    }

    /// Log at Verbose level
    pub fn log_verbose(&self, message: &str) {
        self.log_at(VerbosityLevel::Verbose, message);
    }

    fn log_at(&self, level: VerbosityLevel, message: &str) {
        if level > self.verbosity {
            return;
        }

        // Format into the bump arena, copy out as an owned String, then
        // reset the arena so it never grows.
        let owned = {
            let bump = self.format_bump.borrow();
            let s = bumpalo::format!(in &bump, "{}", message);
            s.as_str().to_string()
        };
        self.format_bump.borrow_mut().reset();

        if matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both) {
            println!("{owned}");
        }
        if matches!(self.output_mode, OutputMode::Memory | OutputMode::Both) {
            self.log_buffer.borrow_mut().push(LogEntry {
                level,
                message: owned,
            });
        }
    }

    /// Read-only access to captured entries (Memory/Both modes)
    pub fn entries(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    pub fn clear(&self) {
        self.log_buffer.borrow_mut().clear();
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

// A fresh bump arena; only the captured entries travel with a clone.
impl Clone for GameLogger {
    fn clone(&self) -> Self {
        GameLogger {
            verbosity: self.verbosity,
            output_mode: self.output_mode,
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(self.log_buffer.borrow().clone()),
        }
    }
}

/// Macro for conditional logging that avoids allocation when the
/// verbose-logging feature is disabled
#[macro_export]
macro_rules! log_if_verbose {
    ($logger:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $logger.log_normal(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$logger; // Suppress unused variable warning
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_capture_respects_verbosity() {
        let mut logger = GameLogger::with_verbosity(VerbosityLevel::Normal);
        logger.set_output_mode(OutputMode::Memory);

        logger.log_minimal("phase");
        logger.log_normal("action");
        logger.log_verbose("pipeline detail");

        let entries = logger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "phase");
        assert_eq!(entries[1].message, "action");
    }

    #[test]
    fn test_clone_keeps_buffer() {
        let mut logger = GameLogger::new();
        logger.set_output_mode(OutputMode::Memory);
        logger.log_minimal("one");

        let copy = logger.clone();
        assert_eq!(copy.entries().len(), 1);
    }
}
