//! Object-to-source rendering.

pub mod decompiler;

pub use decompiler::{DEFAULT_WIDTH, DecompileOptions, Decompiler};
