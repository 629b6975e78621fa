//! Error codes shared by the compiler and decompiler.

use thiserror::Error;

use crate::span::Span;

/// Stable error taxonomy for the language core.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Error)]
pub enum ErrorCode {
    /// No library recognized the token.
    #[error("invalid token")]
    InvalidToken,
    /// Recognized tokens assembled into something structurally wrong.
    #[error("syntax error")]
    Syntax,
    /// A construct was opened and never closed.
    #[error("missing matching end of construct")]
    StartWithoutEnd,
    /// A construct close appeared with nothing open.
    #[error("end of construct without a start")]
    EndWithoutStart,
    /// An expression bracket was unmatched or mismatched.
    #[error("missing or mismatched bracket")]
    MissingBracket,
    /// A fixed-arity function received the wrong number of arguments.
    #[error("wrong argument count")]
    BadArgCount,
    /// The token is valid elsewhere but forbidden in symbolic expressions.
    #[error("not allowed inside symbolic expressions")]
    NotAllowedInSymbolic,
    /// The heap word limit was exhausted.
    #[error("out of memory")]
    OutOfMemory,
    /// A compiled object failed structural checks during decompilation.
    #[error("malformed object")]
    MalformedObject,
}

impl ErrorCode {
    /// Short stable identifier, usable in logs and test assertions.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidToken => "E001",
            ErrorCode::Syntax => "E002",
            ErrorCode::StartWithoutEnd => "E003",
            ErrorCode::EndWithoutStart => "E004",
            ErrorCode::MissingBracket => "E005",
            ErrorCode::BadArgCount => "E006",
            ErrorCode::NotAllowedInSymbolic => "E007",
            ErrorCode::OutOfMemory => "E008",
            ErrorCode::MalformedObject => "E009",
        }
    }
}

/// A compile failure, located at the token that triggered it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
#[error("{code} at {}..{}", span.start().offset(), span.end().offset())]
pub struct CompileError {
    pub code: ErrorCode,
    pub span: Span,
}

impl CompileError {
    pub const fn new(code: ErrorCode, span: Span) -> Self {
        Self { code, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        use std::collections::HashSet;
        let all = [
            ErrorCode::InvalidToken,
            ErrorCode::Syntax,
            ErrorCode::StartWithoutEnd,
            ErrorCode::EndWithoutStart,
            ErrorCode::MissingBracket,
            ErrorCode::BadArgCount,
            ErrorCode::NotAllowedInSymbolic,
            ErrorCode::OutOfMemory,
            ErrorCode::MalformedObject,
        ];
        let set: HashSet<_> = all.iter().map(|c| c.as_str()).collect();
        assert_eq!(set.len(), all.len());
    }

    #[test]
    fn compile_error_display_names_span() {
        let err = CompileError::new(ErrorCode::InvalidToken, Span::of_range(4, 7));
        let text = err.to_string();
        assert!(text.contains("4..7"), "{text}");
    }
}
