//! Execution tracing, gated the way the teacher's `LogLevel` gates its
//! `[DEBUG]`/`[TRACE]` prints — plain `println!`, no logging crate.
use clap::ValueEnum;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TraceLevel {
    Quiet,
    Debug,
    Trace,
}

impl Default for TraceLevel {
    fn default() -> Self {
        TraceLevel::Quiet
    }
}

impl TraceLevel {
    pub fn is_at_least_debug(&self) -> bool {
        matches!(self, TraceLevel::Debug | TraceLevel::Trace)
    }

    pub fn is_trace(&self) -> bool {
        matches!(self, TraceLevel::Trace)
    }
}
