//! Heap object representation.
//!
//! Every heap value lives behind a raw `*mut Obj` pointer threaded into the
//! allocator's singly-linked allocation list (`Obj::next`). A `Cell<bool>`
//! mark bit is flipped in place during collection, so tracing never needs a
//! mutable borrow of the owning `Heap` — only sweep and allocation do.
use std::cell::Cell;
use std::fmt;

use crate::common::chunk::Chunk;
use crate::common::value::Value;
use crate::memory::table::Table;

pub struct Obj {
    pub marked: Cell<bool>,
    pub next: Cell<*mut Obj>,
    pub kind: ObjKind,
}

pub enum ObjKind {
    Str(ObjString),
    Function(ObjFunction),
    Closure(ObjClosure),
    Upvalue(ObjUpvalue),
    Native(ObjNative),
    Class(ObjClass),
    Instance(ObjInstance),
    BoundMethod(ObjBoundMethod),
}

pub struct ObjString {
    pub chars: String,
    pub hash: u32,
}

/// FNV-1a, matching spec.md §3's precomputed string hash.
pub fn fnv1a_hash(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 2166136261;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

pub struct ObjFunction {
    pub arity: u8,
    pub upvalue_count: u8,
    pub name: Option<*mut Obj>,
    pub chunk: Chunk,
}

impl ObjFunction {
    pub fn new() -> Self {
        ObjFunction { arity: 0, upvalue_count: 0, name: None, chunk: Chunk::new() }
    }
}

/// Describes where a closure captures each of its upvalues from, carried
/// alongside `CLOSURE`'s operand pairs (spec.md §4.4, "Functions").
#[derive(Clone, Copy)]
pub struct UpvalueDesc {
    pub index: u8,
    pub is_local: bool,
}

pub struct ObjClosure {
    pub function: *mut Obj,
    pub upvalues: Vec<*mut Obj>,
}

pub enum UpvalueLocation {
    Open(usize),
    Closed(Value),
}

pub struct ObjUpvalue {
    pub location: UpvalueLocation,
}

pub type NativeFn = fn(args: &[Value]) -> Result<Value, String>;

pub struct ObjNative {
    pub name: &'static str,
    pub function: NativeFn,
}

pub struct ObjClass {
    pub name: *mut Obj,
    pub methods: Table,
}

pub struct ObjInstance {
    pub class: *mut Obj,
    pub fields: Table,
}

pub struct ObjBoundMethod {
    pub receiver: Value,
    pub method: *mut Obj,
}

impl Obj {
    /// Reads the string payload of a `Str` object; panics on any other kind,
    /// matching the VM's convention of only calling this after a kind check.
    pub fn as_str(&self) -> &ObjString {
        match &self.kind {
            ObjKind::Str(s) => s,
            _ => panic!("object is not a string"),
        }
    }
}

impl fmt::Debug for ObjKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjKind::Str(s) => write!(f, "String({:?})", s.chars),
            ObjKind::Function(func) => {
                write!(f, "Function({})", func.name.map_or("<script>", |_| "<fn>"))
            }
            ObjKind::Closure(_) => write!(f, "Closure"),
            ObjKind::Upvalue(_) => write!(f, "Upvalue"),
            ObjKind::Native(n) => write!(f, "Native({})", n.name),
            ObjKind::Class(c) => write!(f, "Class({:?})", unsafe { &(*c.name).as_str().chars }),
            ObjKind::Instance(_) => write!(f, "Instance"),
            ObjKind::BoundMethod(_) => write!(f, "BoundMethod"),
        }
    }
}

/// Renders a value the way `print` does, dereferencing heap objects.
///
/// # Safety
/// Every `Value::Obj` pointer reachable from a live root is guaranteed
/// non-dangling by the collector's mark phase; this is the same invariant
/// every VM opcode handler relies on when it dereferences a `Value::Obj`.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::Obj(ptr) => format_obj(*ptr),
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n == n.trunc() && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn format_obj(ptr: *mut Obj) -> String {
    let obj = unsafe { &*ptr };
    match &obj.kind {
        ObjKind::Str(s) => s.chars.clone(),
        ObjKind::Function(func) => match func.name {
            Some(name) => format!("<fn {}>", unsafe { &(*name).as_str().chars }),
            None => "<script>".to_string(),
        },
        ObjKind::Closure(c) => format_obj(c.function),
        ObjKind::Upvalue(_) => "upvalue".to_string(),
        ObjKind::Native(n) => format!("<native fn {}>", n.name),
        ObjKind::Class(c) => unsafe { (*c.name).as_str().chars.clone() },
        ObjKind::Instance(inst) => {
            let class = unsafe { &*inst.class };
            match &class.kind {
                ObjKind::Class(c) => format!("{} instance", unsafe { (*c.name).as_str().chars.clone() }),
                _ => unreachable!(),
            }
        }
        ObjKind::BoundMethod(bm) => format_obj(bm.method),
    }
}
