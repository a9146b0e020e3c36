//! Global/local/upvalue/property reads and writes.
use crate::common::value::Value;
use crate::memory::object::{ObjKind, UpvalueLocation};
use crate::vm::error::{ErrorKind, VMError};
use crate::vm::Vm;

impl Vm {
    pub(in crate::vm) fn op_get_global(&mut self) -> Result<(), VMError> {
        let name = self.read_string();
        match self.globals.get(name) {
            Some(value) => self.push(value),
            None => {
                let name_str = unsafe { &(*name).as_str().chars }.clone();
                Err(self.runtime_error(ErrorKind::UndefinedVariable(name_str)))
            }
        }
    }

    pub(in crate::vm) fn op_define_global(&mut self) {
        let name = self.read_string();
        let value = self.peek(0);
        self.globals.set(name, value);
        self.pop();
    }

    pub(in crate::vm) fn op_set_global(&mut self) -> Result<(), VMError> {
        let name = self.read_string();
        let value = self.peek(0);
        if self.globals.set(name, value) {
            self.globals.delete(name);
            let name_str = unsafe { &(*name).as_str().chars }.clone();
            return Err(self.runtime_error(ErrorKind::UndefinedVariable(name_str)));
        }
        Ok(())
    }

    pub(in crate::vm) fn op_get_upvalue(&mut self) -> Result<(), VMError> {
        let slot = self.read_byte() as usize;
        let closure = self.frames.last().unwrap().closure;
        let upvalue = match unsafe { &(*closure).kind } {
            ObjKind::Closure(c) => c.upvalues[slot],
            _ => unreachable!(),
        };
        let value = match unsafe { &(*upvalue).kind } {
            ObjKind::Upvalue(uv) => match uv.location {
                UpvalueLocation::Open(stack_slot) => self.stack[stack_slot],
                UpvalueLocation::Closed(v) => v,
            },
            _ => unreachable!(),
        };
        self.push(value)
    }

    pub(in crate::vm) fn op_set_upvalue(&mut self) {
        let slot = self.read_byte() as usize;
        let value = self.peek(0);
        let closure = self.frames.last().unwrap().closure;
        let upvalue = match unsafe { &(*closure).kind } {
            ObjKind::Closure(c) => c.upvalues[slot],
            _ => unreachable!(),
        };
        match unsafe { &mut (*upvalue).kind } {
            ObjKind::Upvalue(uv) => match uv.location {
                UpvalueLocation::Open(stack_slot) => self.stack[stack_slot] = value,
                UpvalueLocation::Closed(_) => uv.location = UpvalueLocation::Closed(value),
            },
            _ => unreachable!(),
        }
    }

    pub(in crate::vm) fn op_get_property(&mut self) -> Result<(), VMError> {
        let name = self.read_string();
        let receiver = self.peek(0);
        let instance_ptr = match receiver {
            Value::Obj(ptr) if matches!(unsafe { &(*ptr).kind }, ObjKind::Instance(_)) => ptr,
            _ => return Err(self.runtime_error(ErrorKind::OnlyInstancesHaveProperties)),
        };
        let (class, field) = match unsafe { &(*instance_ptr).kind } {
            ObjKind::Instance(inst) => (inst.class, inst.fields.get(name)),
            _ => unreachable!(),
        };
        if let Some(value) = field {
            self.pop();
            return self.push(value);
        }
        self.bind_method(class, name)
    }

    pub(in crate::vm) fn op_set_property(&mut self) -> Result<(), VMError> {
        let name = self.read_string();
        let value = self.peek(0);
        let receiver = self.peek(1);
        let instance_ptr = match receiver {
            Value::Obj(ptr) if matches!(unsafe { &(*ptr).kind }, ObjKind::Instance(_)) => ptr,
            _ => return Err(self.runtime_error(ErrorKind::OnlyInstancesHaveProperties)),
        };
        match unsafe { &mut (*instance_ptr).kind } {
            ObjKind::Instance(inst) => {
                inst.fields.set(name, value);
            }
            _ => unreachable!(),
        }
        self.pop();
        self.pop();
        self.push(value)
    }

    pub(in crate::vm) fn op_get_super(&mut self) -> Result<(), VMError> {
        let name = self.read_string();
        let superclass = self.pop().as_obj().expect("superclass operand is a class");
        self.bind_method(superclass, name)
    }

    pub(in crate::vm) fn bind_method(&mut self, class: *mut crate::memory::object::Obj, name: *mut crate::memory::object::Obj) -> Result<(), VMError> {
        match self.find_method(class, name) {
            Some(method) => {
                let receiver = self.peek(0);
                let bound = self.heap.alloc_bound_method(receiver, method);
                self.pop();
                self.push(Value::Obj(bound))
            }
            None => {
                let name_str = unsafe { &(*name).as_str().chars }.clone();
                Err(self.runtime_error(ErrorKind::UndefinedProperty(name_str)))
            }
        }
    }
}
