//! Class declaration support: inheritance, method tables, method lookup.
use crate::common::value::Value;
use crate::memory::object::{Obj, ObjKind};
use crate::vm::error::{ErrorKind, VMError};
use crate::vm::Vm;

impl Vm {
    pub(in crate::vm) fn find_method(&self, class: *mut Obj, name: *mut Obj) -> Option<*mut Obj> {
        match unsafe { &(*class).kind } {
            ObjKind::Class(c) => c.methods.get(name).and_then(|v| v.as_obj()),
            _ => None,
        }
    }

    pub(in crate::vm) fn op_inherit(&mut self) -> Result<(), VMError> {
        let subclass = self.peek(0).as_obj().expect("INHERIT subclass operand is a class");
        let superclass = match self.peek(1) {
            Value::Obj(ptr) if matches!(unsafe { &(*ptr).kind }, ObjKind::Class(_)) => ptr,
            _ => return Err(self.runtime_error(ErrorKind::SuperclassMustBeAClass)),
        };
        let super_methods_ptr: *const crate::memory::table::Table = match unsafe { &(*superclass).kind } {
            ObjKind::Class(c) => &c.methods,
            _ => unreachable!(),
        };
        match unsafe { &mut (*subclass).kind } {
            ObjKind::Class(c) => unsafe { &*super_methods_ptr }.add_all(&mut c.methods),
            _ => unreachable!(),
        }
        // Pops the subclass duplicate the compiler pushed for this opcode;
        // the superclass value underneath it stays as the `super` local's slot.
        self.pop();
        Ok(())
    }

    pub(in crate::vm) fn define_method(&mut self, name: *mut Obj) {
        let method = self.pop();
        let class = self.peek(0).as_obj().expect("METHOD target operand is a class");
        match unsafe { &mut (*class).kind } {
            ObjKind::Class(c) => {
                c.methods.set(name, method);
            }
            _ => unreachable!(),
        }
    }
}
