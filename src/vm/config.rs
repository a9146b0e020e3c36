//! Tunable limits and thresholds, collected in one place the way the
//! teacher's `backend::vm` module keeps its `MAX_CALL_STACK`/`VM_THRESHOLD`
//! constants next to `VirtualMachine`.
#[derive(Debug, Clone, Copy)]
pub struct VmConfig {
    pub frames_max: usize,
    pub stack_max: usize,
    pub heap_grow_factor: usize,
    pub initial_gc_threshold: usize,
    pub stress_gc: bool,
}

pub const FRAMES_MAX: usize = 64;

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            frames_max: FRAMES_MAX,
            stack_max: FRAMES_MAX * 256,
            heap_grow_factor: crate::memory::gc::HEAP_GROW_FACTOR,
            initial_gc_threshold: 1024 * 1024,
            stress_gc: false,
        }
    }
}
