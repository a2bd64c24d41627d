//! Debug side channel for the engine.
//!
//! The engine never logs on its own; it writes human-readable lines to the
//! sink it was built with. Sinks that report `enabled() == false` cost
//! nothing, since the engine skips formatting entirely.

/// Receiver for the engine's per-cycle debug lines.
pub trait DebugSink {
    fn enabled(&self) -> bool {
        true
    }

    fn emit(&mut self, line: &str);
}

/// Discards everything. The default sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl DebugSink for Silent {
    fn enabled(&self) -> bool {
        false
    }

    fn emit(&mut self, _line: &str) {}
}

/// Forwards lines to `tracing` at debug level, tagged with a prefix.
#[derive(Clone, Debug, Default)]
pub struct TracingSink {
    prefix: String,
}

impl TracingSink {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl DebugSink for TracingSink {
    fn enabled(&self) -> bool {
        tracing::enabled!(target: "spring", tracing::Level::DEBUG)
    }

    fn emit(&mut self, line: &str) {
        tracing::debug!(target: "spring", "{}{line}", self.prefix);
    }
}

/// Keeps prefixed lines in memory.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    prefix: String,
    lines: Vec<String>,
}

impl Recorder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl DebugSink for Recorder {
    fn emit(&mut self, line: &str) {
        self.lines.push(format!("{}{line}", self.prefix));
    }
}

impl<S: DebugSink + ?Sized> DebugSink for &mut S {
    fn enabled(&self) -> bool {
        (**self).enabled()
    }

    fn emit(&mut self, line: &str) {
        (**self).emit(line);
    }
}
