//! Library protocol: trait, dispatch contexts and registry.

pub mod context;
pub mod id;
pub mod registry;
pub mod traits;

pub use context::{CompileContext, DecompContext, ProbeContext, ValidateContext};
pub use id::LibraryId;
pub use registry::LibraryRegistry;
pub use traits::{
    CompileReply, DecompReply, Library, ObjectInfo, ProbeReply, TokenAction, ValidateReply,
};
