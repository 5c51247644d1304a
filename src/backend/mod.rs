// Back-end:
//  - cranelift IR construction
//  - JIT machine code generation

pub mod support;
pub mod translation;

use cranelift_module::Module;
use cranelift_simplejit::{SimpleJITBackend, SimpleJITBuilder};

pub use translation::{compile, CompiledFunction};

pub type ConcreteModule = Module<SimpleJITBackend>;

pub fn new_module() -> ConcreteModule {
	let builder = SimpleJITBuilder::new(cranelift_module::default_libcall_names());
	Module::<SimpleJITBackend>::new(builder)
}
