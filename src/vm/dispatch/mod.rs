//! Instruction handlers grouped by concern, the way the teacher's
//! `backend::vm::dispatch` module splits `access`/`arithmetic`/`compare`/
//! `control`/`calls` into one `impl VirtualMachine` block per file instead
//! of one giant match arm body.
mod access;
mod arithmetic;
mod calls;
mod classes;
