//! The library dispatch protocol.
//!
//! Every token class and object format belongs to exactly one library. The
//! compiler and decompiler drivers never special-case syntax themselves;
//! they offer tokens and words to the registered libraries and act on the
//! tagged replies defined here.

use slate_core::{ErrorCode, Hints, TokenInfo, Word};

use super::context::{CompileContext, DecompContext, ProbeContext, ValidateContext};
use super::id::LibraryId;

/// Reply to a probe in infix mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProbeReply {
    /// The leading characters mean nothing to this library.
    NoMatch,
    /// The library claims `info.len()` code points with this classification.
    Match(TokenInfo),
    /// The token closes the enclosing symbolic construct; `consumed` code
    /// points belong to the terminator.
    EndExpression { consumed: usize },
}

/// What the driver should do after a library accepted a token.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenAction {
    /// Token compiled; validate the new object against the open construct.
    Continue,
    /// Token compiled; skip validation.
    ContinueNoValidate,
    /// The emitted word opens a composite; push it on the construct stack.
    StartConstruct,
    /// The emitted prolog opens a symbolic expression; enter infix mode.
    StartConstructInfix,
    /// Replace the innermost construct header with the word just emitted.
    ChangeConstruct,
    /// Bump the argument count stored in the innermost construct header.
    IncArgCount,
    /// Close the innermost construct and patch its size.
    EndConstruct,
    /// Close the innermost construct after flushing the operator stack.
    EndConstructInfix,
    /// The token is incomplete; route following tokens back to this library.
    NeedMore,
    /// As `NeedMore`, and the partial object also opens a construct.
    NeedMoreStartConstruct,
}

/// Reply to a compile offer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompileReply {
    /// Token not recognized; the driver keeps scanning libraries.
    NotMine,
    /// Token handled. `consumed` is `Some(n)` when only the first `n` code
    /// points were used and the remainder must be re-scanned as a fresh
    /// token (the split-token family).
    Handled { action: TokenAction, consumed: Option<usize> },
}

impl CompileReply {
    pub const fn ok() -> Self {
        Self::Handled { action: TokenAction::Continue, consumed: None }
    }

    pub const fn ok_split(consumed: usize) -> Self {
        Self::Handled { action: TokenAction::Continue, consumed: Some(consumed) }
    }

    pub const fn action(action: TokenAction) -> Self {
        Self::Handled { action, consumed: None }
    }

    pub const fn action_split(action: TokenAction, consumed: usize) -> Self {
        Self::Handled { action, consumed: Some(consumed) }
    }
}

/// Verdict of a construct owner on a freshly compiled child object.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ValidateReply {
    Ok,
    /// Accept the child and bump the count in the construct header.
    IncArgCount,
    /// Accept the child and close the construct.
    EndConstruct,
    /// Reject the child; compilation fails with a syntax error.
    Invalid,
}

/// Reply to a decompile offer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecompReply {
    /// Rendered; advance past the whole object.
    Continue,
    /// Rendered a composite opener; descend into its payload.
    StartConstruct,
    /// Rendered; swap the innermost open composite for this word.
    ChangeConstruct,
    /// Rendered a composite closer; pop the innermost open composite.
    EndConstruct,
    /// The word opens a symbolic expression; enter the infix renderer.
    StartConstructInfix,
    /// Unrecognized word; the driver renders a hex placeholder.
    Invalid,
}

/// Classification and layout hints for one word, as reported by `get_info`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ObjectInfo {
    pub token: TokenInfo,
    pub hints: Hints,
}

impl ObjectInfo {
    pub const fn new(token: TokenInfo) -> Self {
        Self { token, hints: Hints::NONE }
    }

    pub const fn with_hints(token: TokenInfo, hints: Hints) -> Self {
        Self { token, hints }
    }
}

/// A pluggable token-and-object handler.
///
/// Implementations are stateless; any state a multi-token compile needs is
/// carried in the partially emitted object itself.
pub trait Library: Send + Sync {
    fn id(&self) -> LibraryId;

    fn name(&self) -> &'static str;

    /// Classify the leading characters of a token inside an expression.
    fn probe(&self, _ctx: &ProbeContext<'_>) -> ProbeReply {
        ProbeReply::NoMatch
    }

    /// Compile one token (or, in infix mode, its probe-claimed prefix).
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode>;

    /// Continuation tokens while this library holds the forced slot.
    fn compile_continue(&self, _ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode> {
        Err(ErrorCode::Syntax)
    }

    /// Inspect a child just compiled into a construct this library owns.
    fn validate(&self, _ctx: &ValidateContext<'_>) -> ValidateReply {
        ValidateReply::Ok
    }

    /// Classification and layout hints for a word owned by this library.
    fn get_info(&self, _word: Word) -> Option<ObjectInfo> {
        None
    }

    /// Render one word or object to text.
    fn decompile(&self, ctx: &mut DecompContext<'_, '_>) -> Result<DecompReply, ErrorCode>;
}
