//! The standard libraries.
//!
//! Ids double as scan priority, so the registration order here is
//! irrelevant; the registry keeps them sorted.

use std::sync::Arc;

use crate::library::LibraryRegistry;

pub mod arith;
pub mod ident;
pub mod list;
pub mod prog;
pub mod real;
pub mod strings;
pub mod symbolic;
pub mod vector;

/// Installs every standard library into `registry`.
pub fn register_standard(registry: &mut LibraryRegistry) {
    registry.register(Arc::new(real::RealLib));
    registry.register(Arc::new(symbolic::SymbolicLib));
    registry.register(Arc::new(arith::ArithLib));
    registry.register(Arc::new(strings::StringLib));
    registry.register(Arc::new(vector::VectorLib));
    registry.register(Arc::new(list::ListLib));
    registry.register(Arc::new(prog::ProgLib));
    registry.register(Arc::new(ident::IdentLib));
}
