//! The allocator and tri-color mark-and-sweep collector (spec.md §4.8).
//!
//! `Heap` owns every live object through a singly-linked allocation list
//! threaded via `Obj::next`; collection never runs here directly — the VM
//! drives it (it alone knows the roots) by calling [`Heap::begin_sweep`]
//! after tracing finishes marking from outside this module.
use std::cell::Cell;

use crate::common::value::Value;
use crate::memory::object::{
    fnv1a_hash, NativeFn, Obj, ObjBoundMethod, ObjClass, ObjClosure, ObjFunction, ObjInstance,
    ObjKind, ObjNative, ObjString, ObjUpvalue, UpvalueLocation,
};
use crate::memory::table::Table;

pub const HEAP_GROW_FACTOR: usize = 2;
const INITIAL_GC_THRESHOLD: usize = 1024 * 1024;

pub struct Heap {
    objects: *mut Obj,
    pub strings: Table,
    pub bytes_allocated: usize,
    pub next_gc: usize,
}

impl Heap {
    pub fn new() -> Self {
        Heap { objects: std::ptr::null_mut(), strings: Table::new(), bytes_allocated: 0, next_gc: INITIAL_GC_THRESHOLD }
    }

    pub fn should_collect(&self) -> bool {
        self.bytes_allocated > self.next_gc
    }

    fn push(&mut self, kind: ObjKind, size: usize) -> *mut Obj {
        let obj = Box::new(Obj { marked: Cell::new(false), next: Cell::new(self.objects), kind });
        let ptr = Box::into_raw(obj);
        self.objects = ptr;
        self.bytes_allocated += size;
        ptr
    }

    /// Interns `chars`: returns the existing object if one with equal
    /// content is already live, otherwise allocates and installs a new one.
    pub fn intern_string(&mut self, chars: String) -> *mut Obj {
        let hash = fnv1a_hash(chars.as_bytes());
        if let Some(existing) = self.strings.find_string(&chars, hash) {
            return existing;
        }
        let size = std::mem::size_of::<Obj>() + chars.capacity();
        let ptr = self.push(ObjKind::Str(ObjString { chars, hash }), size);
        self.strings.set(ptr, Value::Nil);
        ptr
    }

    pub fn alloc_function(&mut self, function: ObjFunction) -> *mut Obj {
        let size = std::mem::size_of::<Obj>() + function.chunk.code.len();
        self.push(ObjKind::Function(function), size)
    }

    pub fn alloc_closure(&mut self, function: *mut Obj, upvalues: Vec<*mut Obj>) -> *mut Obj {
        let size = std::mem::size_of::<Obj>() + upvalues.len() * std::mem::size_of::<*mut Obj>();
        self.push(ObjKind::Closure(ObjClosure { function, upvalues }), size)
    }

    pub fn alloc_open_upvalue(&mut self, stack_slot: usize) -> *mut Obj {
        let size = std::mem::size_of::<Obj>();
        self.push(ObjKind::Upvalue(ObjUpvalue { location: UpvalueLocation::Open(stack_slot) }), size)
    }

    pub fn alloc_native(&mut self, name: &'static str, function: NativeFn) -> *mut Obj {
        let size = std::mem::size_of::<Obj>();
        self.push(ObjKind::Native(ObjNative { name, function }), size)
    }

    pub fn alloc_class(&mut self, name: *mut Obj) -> *mut Obj {
        let size = std::mem::size_of::<Obj>();
        self.push(ObjKind::Class(ObjClass { name, methods: Table::new() }), size)
    }

    pub fn alloc_instance(&mut self, class: *mut Obj) -> *mut Obj {
        let size = std::mem::size_of::<Obj>();
        self.push(ObjKind::Instance(ObjInstance { class, fields: Table::new() }), size)
    }

    pub fn alloc_bound_method(&mut self, receiver: Value, method: *mut Obj) -> *mut Obj {
        let size = std::mem::size_of::<Obj>();
        self.push(ObjKind::BoundMethod(ObjBoundMethod { receiver, method }), size)
    }

    /// Phase 3 of collection: drop intern-pool entries whose string is
    /// unreachable, so dead strings don't dangle in the pool.
    pub fn sweep_string_pool(&mut self) {
        self.strings.remove_unmarked_keys();
    }

    /// Phase 4: walk the allocation list, freeing unmarked objects and
    /// clearing the mark bit on survivors.
    pub fn sweep(&mut self) {
        let mut prev: *mut Obj = std::ptr::null_mut();
        let mut current = self.objects;
        while !current.is_null() {
            let obj = unsafe { &*current };
            let next = obj.next.get();
            if obj.marked.get() {
                obj.marked.set(false);
                prev = current;
            } else {
                if prev.is_null() {
                    self.objects = next;
                } else {
                    unsafe { &*prev }.next.set(next);
                }
                let freed = unsafe { Box::from_raw(current) };
                self.bytes_allocated -= object_size(&freed);
            }
            current = next;
        }
    }

    pub fn update_threshold(&mut self) {
        self.next_gc = self.bytes_allocated * HEAP_GROW_FACTOR;
    }

    /// Frees every remaining object; called when the owning VM is dropped.
    pub fn free_all(&mut self) {
        let mut current = self.objects;
        while !current.is_null() {
            let obj = unsafe { Box::from_raw(current) };
            current = obj.next.get();
        }
        self.objects = std::ptr::null_mut();
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        self.free_all();
    }
}

fn object_size(obj: &Obj) -> usize {
    let base = std::mem::size_of::<Obj>();
    base + match &obj.kind {
        ObjKind::Str(s) => s.chars.capacity(),
        ObjKind::Function(f) => f.chunk.code.len(),
        ObjKind::Closure(c) => c.upvalues.len() * std::mem::size_of::<*mut Obj>(),
        _ => 0,
    }
}

/// Marks `ptr` and pushes it onto the gray worklist if this is its first
/// visit this cycle. No-op on a null pointer (absent name/receiver slots).
pub fn mark_object(ptr: *mut Obj, gray: &mut Vec<*mut Obj>) {
    if ptr.is_null() {
        return;
    }
    let obj = unsafe { &*ptr };
    if obj.marked.get() {
        return;
    }
    obj.marked.set(true);
    gray.push(ptr);
}

pub fn mark_value(value: &Value, gray: &mut Vec<*mut Obj>) {
    if let Value::Obj(ptr) = value {
        mark_object(*ptr, gray);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates_equal_strings() {
        let mut heap = Heap::new();
        let a = heap.intern_string("hello".to_string());
        let b = heap.intern_string("hello".to_string());
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn sweep_frees_unreached_objects_and_keeps_marked_ones() {
        let mut heap = Heap::new();
        let kept = heap.intern_string("kept".to_string());
        let _garbage = heap.intern_string("garbage".to_string());
        let before = heap.bytes_allocated;

        let mut gray = vec![kept];
        unsafe { &*kept }.marked.set(true);
        while let Some(ptr) = gray.pop() {
            trace_references(ptr, &mut gray);
        }
        heap.sweep_string_pool();
        heap.sweep();

        assert!(heap.bytes_allocated < before);
        assert!(heap.strings.find_string("kept", fnv1a_hash(b"kept")).is_some());
        assert!(heap.strings.find_string("garbage", fnv1a_hash(b"garbage")).is_none());
    }
}

/// Blackens one gray object: traces its outgoing references, pushing any
/// newly-discovered object onto the same worklist.
pub fn trace_references(ptr: *mut Obj, gray: &mut Vec<*mut Obj>) {
    let obj = unsafe { &*ptr };
    match &obj.kind {
        ObjKind::Str(_) | ObjKind::Native(_) => {}
        ObjKind::Function(f) => {
            if let Some(name) = f.name {
                mark_object(name, gray);
            }
            for constant in &f.chunk.constants {
                mark_value(constant, gray);
            }
        }
        ObjKind::Closure(c) => {
            mark_object(c.function, gray);
            for &uv in &c.upvalues {
                mark_object(uv, gray);
            }
        }
        ObjKind::Upvalue(uv) => {
            if let UpvalueLocation::Closed(v) = &uv.location {
                mark_value(v, gray);
            }
        }
        ObjKind::Class(c) => {
            mark_object(c.name, gray);
            for (key, value) in c.methods.iter() {
                mark_object(key, gray);
                mark_value(&value, gray);
            }
        }
        ObjKind::Instance(inst) => {
            mark_object(inst.class, gray);
            for (key, value) in inst.fields.iter() {
                mark_object(key, gray);
                mark_value(&value, gray);
            }
        }
        ObjKind::BoundMethod(bm) => {
            mark_value(&bm.receiver, gray);
            mark_object(bm.method, gray);
        }
    }
}
