//! `ADD`/`SUBTRACT`/`MULTIPLY`/`DIVIDE`/`NEGATE` and the ordering comparisons.
use crate::common::value::Value;
use crate::vm::error::{ErrorKind, VMError};
use crate::vm::Vm;

impl Vm {
    pub(in crate::vm) fn op_negate(&mut self) -> Result<(), VMError> {
        match self.peek(0) {
            Value::Number(n) => {
                self.pop();
                self.push(Value::Number(-n))
            }
            _ => Err(self.runtime_error(ErrorKind::OperandMustBeNumber)),
        }
    }

    pub(in crate::vm) fn op_arith(&mut self, op: fn(f64, f64) -> f64) -> Result<(), VMError> {
        match (self.peek(1), self.peek(0)) {
            (Value::Number(a), Value::Number(b)) => {
                self.pop();
                self.pop();
                self.push(Value::Number(op(a, b)))
            }
            _ => Err(self.runtime_error(ErrorKind::OperandsMustBeNumbers)),
        }
    }

    /// `+` additionally concatenates two strings; everything else is the
    /// plain numeric case handled by [`Vm::op_arith`].
    pub(in crate::vm) fn op_add(&mut self) -> Result<(), VMError> {
        match (self.peek(1), self.peek(0)) {
            (Value::Number(a), Value::Number(b)) => {
                self.pop();
                self.pop();
                self.push(Value::Number(a + b))
            }
            (a, b) if a.is_str() && b.is_str() => {
                self.pop();
                self.pop();
                let a_chars = unsafe { &(*a.as_obj().unwrap()).as_str().chars }.clone();
                let b_chars = unsafe { &(*b.as_obj().unwrap()).as_str().chars }.clone();
                let concatenated = self.heap.intern_string(a_chars + &b_chars);
                self.push(Value::Obj(concatenated))
            }
            _ => Err(self.runtime_error(ErrorKind::OperandsMustBeTwoNumbersOrTwoStrings)),
        }
    }

    pub(in crate::vm) fn op_compare(&mut self, op: fn(f64, f64) -> bool) -> Result<(), VMError> {
        match (self.peek(1), self.peek(0)) {
            (Value::Number(a), Value::Number(b)) => {
                self.pop();
                self.pop();
                self.push(Value::Bool(op(a, b)))
            }
            _ => Err(self.runtime_error(ErrorKind::OperandsMustBeNumbers)),
        }
    }
}
