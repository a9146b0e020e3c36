//! Calling convention: plain function calls, native calls, class
//! instantiation, bound-method calls, and the upvalue capture/close
//! machinery closures rely on.
use crate::common::value::Value;
use crate::memory::object::{Obj, ObjKind, UpvalueLocation};
use crate::vm::error::{ErrorKind, VMError};
use crate::vm::{closure_function, function_arity, CallFrame, Vm};

impl Vm {
    pub(in crate::vm) fn call_value(&mut self, callee: Value, arg_count: u8) -> Result<(), VMError> {
        if let Value::Obj(ptr) = callee {
            match unsafe { &(*ptr).kind } {
                ObjKind::Closure(_) => return self.call(ptr, arg_count),
                ObjKind::Native(native) => {
                    let function = native.function;
                    let start = self.stack.len() - arg_count as usize;
                    let args: Vec<Value> = self.stack[start..].to_vec();
                    let result = function(&args)
                        .map_err(|_| self.runtime_error(ErrorKind::CanOnlyCallFunctionsAndClasses))?;
                    self.stack.truncate(start - 1);
                    return self.push(result);
                }
                ObjKind::Class(_) => {
                    let instance = self.heap.alloc_instance(ptr);
                    let start = self.stack.len() - arg_count as usize - 1;
                    self.stack[start] = Value::Obj(instance);
                    if let Some(initializer) = self.find_method(ptr, self.init_string) {
                        return self.call(initializer, arg_count);
                    } else if arg_count != 0 {
                        return Err(self.runtime_error(ErrorKind::WrongArity { expected: 0, got: arg_count }));
                    }
                    return Ok(());
                }
                ObjKind::BoundMethod(bound) => {
                    let method = bound.method;
                    let receiver = bound.receiver;
                    let start = self.stack.len() - arg_count as usize - 1;
                    self.stack[start] = receiver;
                    return self.call(method, arg_count);
                }
                _ => {}
            }
        }
        Err(self.runtime_error(ErrorKind::CanOnlyCallFunctionsAndClasses))
    }

    pub(in crate::vm) fn call(&mut self, closure: *mut Obj, arg_count: u8) -> Result<(), VMError> {
        let function = closure_function(closure);
        let arity = function_arity(function);
        if arg_count != arity {
            return Err(self.runtime_error(ErrorKind::WrongArity { expected: arity, got: arg_count }));
        }
        if self.frames.len() >= self.config.frames_max {
            return Err(self.runtime_error(ErrorKind::StackOverflow));
        }
        let slot_base = self.stack.len() - arg_count as usize - 1;
        self.frames.push(CallFrame { closure, ip: 0, slot_base });
        Ok(())
    }

    pub(in crate::vm) fn invoke(&mut self, name: *mut Obj, arg_count: u8) -> Result<(), VMError> {
        let receiver = self.peek(arg_count as usize);
        let instance_ptr = match receiver {
            Value::Obj(ptr) if matches!(unsafe { &(*ptr).kind }, ObjKind::Instance(_)) => ptr,
            _ => return Err(self.runtime_error(ErrorKind::OnlyInstancesHaveMethods)),
        };
        let (class, field) = match unsafe { &(*instance_ptr).kind } {
            ObjKind::Instance(inst) => (inst.class, inst.fields.get(name)),
            _ => unreachable!(),
        };
        if let Some(value) = field {
            let start = self.stack.len() - arg_count as usize - 1;
            self.stack[start] = value;
            return self.call_value(value, arg_count);
        }
        self.invoke_from_class(class, name, arg_count)
    }

    pub(in crate::vm) fn invoke_from_class(&mut self, class: *mut Obj, name: *mut Obj, arg_count: u8) -> Result<(), VMError> {
        match self.find_method(class, name) {
            Some(method) => self.call(method, arg_count),
            None => {
                let name_str = unsafe { &(*name).as_str().chars }.clone();
                Err(self.runtime_error(ErrorKind::UndefinedProperty(name_str)))
            }
        }
    }

    pub(in crate::vm) fn op_closure(&mut self) -> Result<(), VMError> {
        let function = self.read_constant().as_obj().expect("CLOSURE operand is a function constant");
        let upvalue_count = function_upvalue_count(function);
        let mut upvalues = Vec::with_capacity(upvalue_count as usize);
        for _ in 0..upvalue_count {
            let is_local = self.read_byte() != 0;
            let index = self.read_byte() as usize;
            if is_local {
                let base = self.frames.last().unwrap().slot_base;
                upvalues.push(self.capture_upvalue(base + index));
            } else {
                let enclosing_closure = self.frames.last().unwrap().closure;
                let upvalue = match unsafe { &(*enclosing_closure).kind } {
                    ObjKind::Closure(c) => c.upvalues[index],
                    _ => unreachable!(),
                };
                upvalues.push(upvalue);
            }
        }
        let closure = self.heap.alloc_closure(function, upvalues);
        self.push(Value::Obj(closure))
    }

    pub(in crate::vm) fn capture_upvalue(&mut self, stack_slot: usize) -> *mut Obj {
        if let Some(&existing) = self.open_upvalues.iter().find(|&&u| {
            matches!(
                unsafe { &(*u).kind },
                ObjKind::Upvalue(uv) if matches!(uv.location, UpvalueLocation::Open(slot) if slot == stack_slot)
            )
        }) {
            return existing;
        }
        let created = self.heap.alloc_open_upvalue(stack_slot);
        self.open_upvalues.push(created);
        created
    }

    pub(in crate::vm) fn close_upvalues(&mut self, from_slot: usize) {
        let mut remaining = Vec::new();
        for upvalue in self.open_upvalues.drain(..) {
            let obj = unsafe { &mut *upvalue };
            let mut closed = false;
            if let ObjKind::Upvalue(uv) = &mut obj.kind {
                if let UpvalueLocation::Open(slot) = uv.location {
                    if slot >= from_slot {
                        uv.location = UpvalueLocation::Closed(self.stack[slot]);
                        closed = true;
                    }
                }
            }
            if !closed {
                remaining.push(upvalue);
            }
        }
        self.open_upvalues = remaining;
    }
}

fn function_upvalue_count(function: *mut Obj) -> u8 {
    match unsafe { &(*function).kind } {
        ObjKind::Function(f) => f.upvalue_count,
        _ => unreachable!(),
    }
}
