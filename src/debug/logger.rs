// Trace logger
//
// Leveled logging with a bounded in-memory buffer and an optional file
// sink. The system facade feeds it executed-instruction traces and
// control-flow events; the buffer keeps the recent history available to
// an inspecting frontend without unbounded growth.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Local;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// No logging
    None,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warning,
    /// Info, warnings, and errors
    Info,
    /// Debug information
    Debug,
    /// Per-instruction trace logging
    Trace,
}

/// A single trace entry
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub level: LogLevel,
    pub message: String,
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Trace logger with a bounded buffer and optional file output
pub struct Logger {
    log_level: LogLevel,
    trace_buffer: Vec<TraceEntry>,
    /// Maximum buffered entries (0 = unlimited)
    max_buffer_size: usize,
    output_file: Option<File>,
}

impl Logger {
    pub fn new() -> Self {
        Logger {
            log_level: LogLevel::None,
            trace_buffer: Vec::new(),
            max_buffer_size: 10_000,
            output_file: None,
        }
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Whether per-instruction tracing is active
    pub fn tracing(&self) -> bool {
        self.log_level >= LogLevel::Trace
    }

    /// Cap the buffer; older entries fall off first
    pub fn set_max_buffer_size(&mut self, size: usize) {
        self.max_buffer_size = size;
        if size > 0 && self.trace_buffer.len() > size {
            self.trace_buffer.drain(0..self.trace_buffer.len() - size);
        }
    }

    /// Open a log file sink
    pub fn open_log_file<P: AsRef<Path>>(&mut self, path: P) -> std::io::Result<()> {
        self.output_file = Some(File::create(path)?);
        Ok(())
    }

    /// Open a log file named after the current local time
    pub fn open_timestamped_log_file(&mut self, directory: &Path) -> std::io::Result<()> {
        let name = format!("trace_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        self.open_log_file(directory.join(name))
    }

    pub fn close_log_file(&mut self) {
        self.output_file = None;
    }

    /// Log a message at a level; dropped if the level is filtered out
    pub fn log(&mut self, level: LogLevel, message: String) {
        if level > self.log_level || level == LogLevel::None {
            return;
        }
        self.add_entry(TraceEntry { level, message });
    }

    /// Log an executed-instruction trace line
    pub fn trace(&mut self, line: String) {
        self.log(LogLevel::Trace, line);
    }

    fn add_entry(&mut self, entry: TraceEntry) {
        if let Some(ref mut file) = self.output_file {
            let _ = writeln!(file, "{}", entry);
        }

        self.trace_buffer.push(entry);
        if self.max_buffer_size > 0 && self.trace_buffer.len() > self.max_buffer_size {
            self.trace_buffer.remove(0);
        }
    }

    pub fn trace_buffer(&self) -> &[TraceEntry] {
        &self.trace_buffer
    }

    pub fn clear_buffer(&mut self) {
        self.trace_buffer.clear();
    }

    /// The most recent `count` entries
    pub fn last_entries(&self, count: usize) -> &[TraceEntry] {
        let start = self.trace_buffer.len().saturating_sub(count);
        &self.trace_buffer[start..]
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
