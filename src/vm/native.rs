//! Native function bindings, grounded in the teacher's `std_lib::lua_builtin_print`
//! pattern: a plain `fn(&[Value]) -> Result<Value, String>` wrapped in an
//! `ObjNative` and installed as a global.
use crate::common::value::Value;
use crate::vm::Vm;

fn clock(_args: &[Value]) -> Result<Value, String> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| e.to_string())?;
    Ok(Value::Number(now.as_secs_f64()))
}

impl Vm {
    pub fn define_native(&mut self, name: &'static str, function: crate::memory::object::NativeFn) {
        let native = self.heap.alloc_native(name, function);
        let interned = self.heap.intern_string(name.to_string());
        self.globals.set(interned, Value::Obj(native));
    }

    pub fn load_standard_library(&mut self) {
        self.define_native("clock", clock);
    }
}
