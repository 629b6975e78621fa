//! Shared core types for the Slate language: the 32-bit word encoding,
//! source spans, packed token descriptors, layout hints and error codes.

pub mod error;
pub mod hints;
pub mod span;
pub mod token;
pub mod word;

pub use error::{CompileError, ErrorCode};
pub use hints::Hints;
pub use span::{Pos, Span};
pub use token::{TokenInfo, TokenKind, VARIADIC};
pub use word::{
    MAX_OBJECT_SIZE, PROLOG_BIT, Word, extract_cmd, extract_lib, extract_size, is_prolog,
    make_call, make_prolog, object_words, skip_object, with_size,
};
