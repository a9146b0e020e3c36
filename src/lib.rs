//! A single-pass bytecode compiler and stack-based VM for a small
//! dynamically-typed scripting language with closures, single-inheritance
//! classes, and a tri-color mark-and-sweep collector.
pub mod common;
pub mod frontend;
pub mod memory;
pub mod vm;

pub use vm::config::VmConfig;
pub use vm::trace::TraceLevel;
pub use vm::{InterpretResult, Vm};
