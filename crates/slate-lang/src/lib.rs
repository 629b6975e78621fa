//! The slate language engine.
//!
//! This crate provides the core language functionality:
//! - `library` - Library trait, registry and the dispatch protocol
//! - `libs` - The standard libraries (reals, symbolics, programs, ...)
//! - `compile` - Token scanning and object compilation
//! - `decompile` - Object-to-source rendering
//! - `heap` - The growable word arena compiled objects live in

pub mod compile;
pub mod decompile;
pub mod heap;
pub mod library;
pub mod libs;
pub mod well_known;

// Re-export commonly used types at crate root
pub use compile::Compiler;
pub use decompile::{DecompileOptions, Decompiler};
pub use heap::{Heap, ObjRef};
pub use library::{
    CompileContext, CompileReply, DecompContext, DecompReply, Library, LibraryId, LibraryRegistry,
    ObjectInfo, ProbeContext, ProbeReply, TokenAction, ValidateContext, ValidateReply,
};
pub use libs::register_standard;

use slate_core::CompileError;

/// Registry with every standard library installed.
pub fn standard_registry() -> LibraryRegistry {
    let mut registry = LibraryRegistry::new();
    register_standard(&mut registry);
    registry
}

/// One-shot convenience: compile `source` into `heap` with the standard
/// libraries, wrapping the input in a program composite.
pub fn compile_source(
    registry: &LibraryRegistry,
    heap: &mut Heap,
    source: &str,
) -> Result<ObjRef, CompileError> {
    Compiler::new(registry).compile(heap, source, true)
}
