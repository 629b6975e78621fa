//! Source-to-object compilation.

pub mod compiler;
pub mod constructs;
pub mod infix;
pub mod scanner;

pub use compiler::Compiler;
pub use constructs::{ConstructStack, OpenConstruct};
pub use infix::InfixState;
pub use scanner::Scanner;
