//! The compile driver.
//!
//! Walks blank-delimited tokens, offers each one to the installed
//! libraries in descending id order, and reacts to the tagged replies:
//! construct bookkeeping, forced continuations, token splits and the
//! switch in and out of infix mode. The driver owns all cross-token state;
//! libraries stay stateless.

use std::sync::Arc;

use slate_core::{
    CompileError, ErrorCode, MAX_OBJECT_SIZE, Span, TokenInfo, TokenKind, VARIADIC, Word,
    extract_lib, extract_size, is_prolog, make_call, make_prolog, with_size,
};

use crate::compile::constructs::ConstructStack;
use crate::compile::infix::InfixState;
use crate::compile::scanner::Scanner;
use crate::heap::{Heap, ObjRef};
use crate::library::{
    CompileContext, CompileReply, Library, LibraryRegistry, ProbeContext, ProbeReply, TokenAction,
    ValidateContext, ValidateReply,
};
use crate::libs::{arith, prog, symbolic};
use crate::well_known::PROG_LIB;

/// Compiles source text into heap objects using an installed registry.
pub struct Compiler<'r> {
    registry: &'r LibraryRegistry,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r LibraryRegistry) -> Self {
        Self { registry }
    }

    /// Compiles `source` into `heap`. With `wrap`, the whole input is
    /// enclosed in one program composite followed by an exit marker.
    ///
    /// On success the result is committed and a handle returned; on
    /// failure the working region is abandoned and the committed region
    /// is untouched.
    pub fn compile(
        &self,
        heap: &mut Heap,
        source: &str,
        wrap: bool,
    ) -> Result<ObjRef, CompileError> {
        heap.abandon();
        let start = heap.cursor();
        let result = {
            let mut driver = Driver {
                registry: self.registry,
                heap,
                source,
                scanner: Scanner::new(source),
                pending: None,
                constructs: ConstructStack::new(),
                infix: None,
                cont_lib: None,
            };
            driver.run(wrap)
        };
        match result {
            Ok(()) => Ok(heap.commit(start)),
            Err(err) => {
                heap.abandon();
                Err(err)
            }
        }
    }
}

struct Driver<'r, 's, 'h> {
    registry: &'r LibraryRegistry,
    heap: &'h mut Heap,
    source: &'s str,
    scanner: Scanner<'s>,
    /// Remainder of a split token, processed before scanning further.
    pending: Option<(Span, Span)>,
    constructs: ConstructStack,
    infix: Option<InfixState>,
    /// Library holding the forced-continuation slot.
    cont_lib: Option<Arc<dyn Library>>,
}

impl<'s> Driver<'_, 's, '_> {
    fn run(&mut self, wrap: bool) -> Result<(), CompileError> {
        let start = self.heap.cursor();
        if wrap {
            let span = Span::of_range(0, 0);
            self.heap
                .append(make_prolog(PROG_LIB, 0))
                .map_err(|c| CompileError::new(c, span))?;
            self.constructs.push(start, span);
        }
        while let Some((gap, token)) = self.next_token() {
            if self.infix.is_some() {
                self.infix_token(token)?;
            } else {
                self.plain_token(gap, token)?;
            }
        }
        let end = self.end_span();
        if self.cont_lib.is_some() {
            return Err(CompileError::new(ErrorCode::StartWithoutEnd, end));
        }
        if wrap {
            // The wrapper must not absorb the close of a construct the
            // source left open; report the real offender.
            if self.constructs.len() > 1
                && let Some(top) = self.constructs.top()
            {
                return Err(CompileError::new(ErrorCode::StartWithoutEnd, top.open_span));
            }
            self.heap
                .append(make_call(PROG_LIB, prog::cmd::END))
                .map_err(|c| CompileError::new(c, end))?;
            self.end_construct(end)?;
            self.heap
                .append(make_call(PROG_LIB, prog::cmd::EXIT))
                .map_err(|c| CompileError::new(c, end))?;
        }
        if let Some(top) = self.constructs.top() {
            return Err(CompileError::new(ErrorCode::StartWithoutEnd, top.open_span));
        }
        if self.heap.cursor() == start {
            return Err(CompileError::new(ErrorCode::Syntax, end));
        }
        Ok(())
    }

    fn next_token(&mut self) -> Option<(Span, Span)> {
        self.pending.take().or_else(|| self.scanner.next_token())
    }

    fn text(&self, span: Span) -> &'s str {
        &self.source[span.start().offset() as usize..span.end().offset() as usize]
    }

    fn end_span(&self) -> Span {
        Span::of_range(self.source.len(), self.source.len())
    }

    /// One token in plain (RPN) mode.
    fn plain_token(&mut self, gap: Span, token: Span) -> Result<(), CompileError> {
        let gap_text = self.text(gap);
        let token_text = self.text(token);

        if let Some(lib) = self.cont_lib.clone() {
            let construct = self.constructs.top().map(|c| c.start);
            let obj_start = self.heap.cursor();
            let mut ctx =
                CompileContext::new(self.heap, token_text, gap_text, token, false, construct);
            let reply = lib
                .compile_continue(&mut ctx)
                .map_err(|c| CompileError::new(c, token))?;
            let CompileReply::Handled { action, consumed } = reply else {
                return Err(CompileError::new(ErrorCode::Syntax, token));
            };
            if !matches!(action, TokenAction::NeedMore | TokenAction::NeedMoreStartConstruct) {
                self.cont_lib = None;
            }
            return self.apply_action(action, consumed, token, obj_start);
        }

        let registry = self.registry;
        for lib in registry.iter_desc() {
            let obj_start = self.heap.cursor();
            let construct = self.constructs.top().map(|c| c.start);
            let mut ctx =
                CompileContext::new(self.heap, token_text, gap_text, token, false, construct);
            match lib.compile(&mut ctx).map_err(|c| CompileError::new(c, token))? {
                CompileReply::NotMine => {
                    // A refusal must leave no partial output behind.
                    self.heap.truncate(obj_start);
                }
                CompileReply::Handled { action, consumed } => {
                    if matches!(
                        action,
                        TokenAction::NeedMore | TokenAction::NeedMoreStartConstruct
                    ) {
                        self.cont_lib = Some(lib.clone());
                    }
                    return self.apply_action(action, consumed, token, obj_start);
                }
            }
        }
        Err(CompileError::new(ErrorCode::InvalidToken, token))
    }

    fn apply_action(
        &mut self,
        action: TokenAction,
        consumed: Option<usize>,
        token: Span,
        obj_start: usize,
    ) -> Result<(), CompileError> {
        if let Some(n) = consumed {
            self.split(token, n);
        }
        match action {
            TokenAction::Continue => self.validate_after(obj_start, token),
            TokenAction::ContinueNoValidate => Ok(()),
            TokenAction::StartConstruct => {
                self.constructs.push(obj_start, token);
                // Prolog-less construct markers (bare control words) are
                // themselves subject to validation.
                if !is_prolog(self.heap.word(obj_start)) {
                    self.validate_after(obj_start, token)?;
                }
                Ok(())
            }
            TokenAction::StartConstructInfix => {
                self.constructs.push(obj_start, token);
                self.infix = Some(InfixState::new(obj_start));
                Ok(())
            }
            TokenAction::ChangeConstruct => {
                let Some(top) = self.constructs.top_mut() else {
                    return Err(CompileError::new(ErrorCode::EndWithoutStart, token));
                };
                top.start = obj_start;
                Ok(())
            }
            TokenAction::IncArgCount => self.bump_count(token),
            TokenAction::EndConstruct => self.end_construct(token),
            TokenAction::EndConstructInfix => match self.infix.take() {
                Some(mut state) => self.end_infix(&mut state, token),
                None => Err(CompileError::new(ErrorCode::Syntax, token)),
            },
            TokenAction::NeedMore => Ok(()),
            TokenAction::NeedMoreStartConstruct => {
                self.constructs.push(obj_start, token);
                Ok(())
            }
        }
    }

    /// Queues the remainder of `token` after its first `consumed` code
    /// points as the next token to process.
    fn split(&mut self, token: Span, consumed: usize) {
        let text = self.text(token);
        let Some((byte, _)) = text.char_indices().nth(consumed) else {
            return;
        };
        let rem = token.start().offset() as usize + byte;
        let end = token.end().offset() as usize;
        self.pending = Some((Span::of_range(rem, rem), Span::of_range(rem, end)));
    }

    /// Offers the child at `child_start` to the enclosing construct owner.
    fn validate_after(&mut self, child_start: usize, span: Span) -> Result<(), CompileError> {
        let Some(top) = self.constructs.top().copied() else {
            return Ok(());
        };
        let registry = self.registry;
        let Some(lib) = registry.get(extract_lib(self.heap.word(top.start))) else {
            return Ok(());
        };
        let reply = {
            let ctx = ValidateContext::new(self.heap, top.start, child_start);
            lib.validate(&ctx)
        };
        match reply {
            ValidateReply::Ok => Ok(()),
            ValidateReply::IncArgCount => self.bump_count(span),
            ValidateReply::EndConstruct => self.end_construct(span),
            ValidateReply::Invalid => Err(CompileError::new(ErrorCode::Syntax, span)),
        }
    }

    fn bump_count(&mut self, span: Span) -> Result<(), CompileError> {
        let Some(top) = self.constructs.top() else {
            return Err(CompileError::new(ErrorCode::EndWithoutStart, span));
        };
        let word = self.heap.word(top.start);
        let count = extract_size(word) as usize + 1;
        if count > MAX_OBJECT_SIZE {
            return Err(CompileError::new(ErrorCode::OutOfMemory, span));
        }
        self.heap.set(top.start, with_size(word, count as u16));
        Ok(())
    }

    /// Closes the innermost construct: patch the prolog size, then offer
    /// the finished composite to the next construct out.
    fn end_construct(&mut self, span: Span) -> Result<(), CompileError> {
        let Some(c) = self.constructs.pop() else {
            return Err(CompileError::new(ErrorCode::EndWithoutStart, span));
        };
        let header = self.heap.word(c.start);
        if is_prolog(header) {
            let size = self.heap.cursor() - c.start - 1;
            if size > MAX_OBJECT_SIZE {
                return Err(CompileError::new(ErrorCode::OutOfMemory, span));
            }
            self.heap.set(c.start, with_size(header, size as u16));
        }
        self.validate_after(c.start, span)
    }

    /// One token in infix mode.
    fn infix_token(&mut self, token: Span) -> Result<(), CompileError> {
        let Some(mut state) = self.infix.take() else {
            return Err(CompileError::new(ErrorCode::Syntax, token));
        };
        match self.infix_token_inner(&mut state, token) {
            Ok(ended) => {
                if !ended {
                    self.infix = Some(state);
                }
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn infix_token_inner(
        &mut self,
        state: &mut InfixState,
        token: Span,
    ) -> Result<bool, CompileError> {
        let text = self.text(token);
        let registry = self.registry;

        // Probe contest: every library sees the token; the longest claim
        // wins and ties keep the first claimant in scan order.
        let mut best: Option<(&Arc<dyn Library>, TokenInfo)> = None;
        for lib in registry.iter_desc() {
            match lib.probe(&ProbeContext::new(text)) {
                ProbeReply::NoMatch => {}
                ProbeReply::EndExpression { consumed } => {
                    self.split(token, consumed);
                    self.end_infix(state, token)?;
                    return Ok(true);
                }
                ProbeReply::Match(info) => {
                    if !info.is_empty() && best.map_or(true, |(_, b)| info.len() > b.len()) {
                        best = Some((lib, info));
                    }
                }
            }
        }
        let Some((lib, mut info)) = best else {
            return Err(CompileError::new(ErrorCode::InvalidToken, token));
        };
        if info.kind() == TokenKind::NotAllowed {
            return Err(CompileError::new(ErrorCode::NotAllowedInSymbolic, token));
        }

        // Truncate the token to the claimed length; the rest re-scans.
        let char_count = text.chars().count();
        let (claim_text, claim_span) = if info.len() < char_count {
            self.split(token, info.len());
            let byte = text
                .char_indices()
                .nth(info.len())
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            let start = token.start().offset() as usize;
            (&text[..byte], Span::of_range(start, start + byte))
        } else {
            (text, token)
        };

        let obj_start = self.heap.cursor();
        let mut ctx = CompileContext::new(
            self.heap,
            claim_text,
            "",
            claim_span,
            true,
            Some(state.expr_start()),
        );
        let reply = lib
            .compile(&mut ctx)
            .map_err(|c| CompileError::new(c, claim_span))?;
        let CompileReply::Handled {
            action: TokenAction::Continue | TokenAction::ContinueNoValidate,
            consumed: None,
        } = reply
        else {
            return Err(CompileError::new(ErrorCode::InvalidToken, claim_span));
        };
        if self.heap.cursor() == obj_start {
            return Err(CompileError::new(ErrorCode::Syntax, claim_span));
        }

        if info.kind().is_operator() {
            // The library emitted the operator as a call word; take it
            // back off the stream and route it through the stack.
            let mut last = obj_start;
            loop {
                let next = self.heap.skip(last);
                if next >= self.heap.cursor() {
                    break;
                }
                last = next;
            }
            let opcode = self.heap.word(last);
            self.heap.truncate(last);

            let expects_operand = state.prev().is_none_or(|p| p.kind().expects_operand());
            let (opcode, reclassified) = reclassify_unary(opcode, info, expects_operand);
            info = reclassified;

            let err = |c| CompileError::new(c, claim_span);
            match info.kind() {
                TokenKind::OpenBracket => {
                    // A bracket right after an operand is a call: the
                    // operand is the callee name, evaluated through the
                    // variadic FUNCEVAL pseudo-function.
                    let prev_operand = state.prev().is_some_and(|p| !p.kind().is_operator());
                    if prev_operand {
                        let name_len = state.prev().map_or(0, |p| p.len());
                        state.push_operator(
                            symbolic::cmd::funceval_word(),
                            TokenInfo::new(
                                name_len,
                                TokenKind::Function,
                                VARIADIC,
                                symbolic::FUNCEVAL_PRECEDENCE,
                            ),
                        );
                    }
                    state.push_bracket(self.heap.cursor(), opcode);
                }
                TokenKind::CloseBracket => state.close_bracket(self.heap, opcode).map_err(err)?,
                TokenKind::Comma => state.comma(self.heap).map_err(err)?,
                TokenKind::Prefix => state.push_operator(opcode, info),
                _ => {
                    state.flush_for(self.heap, info).map_err(err)?;
                    state.push_operator(opcode, info);
                }
            }
        }
        state.set_prev(info);
        Ok(false)
    }

    fn end_infix(&mut self, state: &mut InfixState, token: Span) -> Result<(), CompileError> {
        state
            .finish(self.heap)
            .map_err(|c| CompileError::new(c, token))?;
        self.end_construct(token)
    }
}

/// `-`/`+` compile as binary SUB/ADD, but in operand position they are the
/// unary sign operators.
fn reclassify_unary(opcode: Word, info: TokenInfo, expects_operand: bool) -> (Word, TokenInfo) {
    if !expects_operand {
        return (opcode, info);
    }
    if opcode == arith::cmd::sub_word() {
        (
            arith::cmd::uminus_word(),
            TokenInfo::prefix(1, arith::UNARY_PRECEDENCE),
        )
    } else if opcode == arith::cmd::add_word() {
        (
            arith::cmd::uplus_word(),
            TokenInfo::prefix(1, arith::UNARY_PRECEDENCE),
        )
    } else {
        (opcode, info)
    }
}
