//! Operator-precedence engine for symbolic expressions.
//!
//! While a symbolic construct is open the compiler routes operator tokens
//! here. Operands stay in the object stream; operators wait on an explicit
//! stack and are *applied* by inserting a two-word symbolic header in front
//! of their arguments, building the expression tree bottom-up in place.
//!
//! Precedence is numerically inverted: lower values bind tighter.

use slate_core::{ErrorCode, TokenInfo, VARIADIC, make_prolog};
use smallvec::SmallVec;

use crate::heap::Heap;
use crate::libs::symbolic::cmd;
use crate::well_known::SYMB_LIB;

use slate_core::Word;

/// A pending operator: the call word it compiles to plus its probe info.
#[derive(Clone, Copy, Debug)]
pub struct OperatorEntry {
    pub opcode: Word,
    pub info: TokenInfo,
}

/// One slot of the operator stack.
#[derive(Clone, Copy, Debug)]
enum StackEntry {
    Op(OperatorEntry),
    /// An open bracket. `args_start` is the heap index where its argument
    /// objects begin.
    Bracket { args_start: usize, opcode: Word },
}

/// State of one symbolic expression under construction.
#[derive(Debug)]
pub struct InfixState {
    expr_start: usize,
    stack: SmallVec<[StackEntry; 8]>,
    prev: Option<TokenInfo>,
}

impl InfixState {
    /// `expr_start` is the heap index of the symbolic prolog.
    pub fn new(expr_start: usize) -> Self {
        Self { expr_start, stack: SmallVec::new(), prev: None }
    }

    pub fn expr_start(&self) -> usize {
        self.expr_start
    }

    /// Classification of the previously handled token, after any unary
    /// reclassification.
    pub fn prev(&self) -> Option<TokenInfo> {
        self.prev
    }

    pub fn set_prev(&mut self, info: TokenInfo) {
        self.prev = Some(info);
    }

    pub fn push_operator(&mut self, opcode: Word, info: TokenInfo) {
        self.stack.push(StackEntry::Op(OperatorEntry { opcode, info }));
    }

    pub fn push_bracket(&mut self, args_start: usize, opcode: Word) {
        self.stack.push(StackEntry::Bracket { args_start, opcode });
    }

    /// Pops and applies operators that bind at least as tightly as `new`.
    /// Left-associative binaries also yield to equal precedence. Stops at
    /// open brackets.
    pub fn flush_for(&mut self, heap: &mut Heap, new: TokenInfo) -> Result<(), ErrorCode> {
        while let Some(StackEntry::Op(top)) = self.stack.last().copied() {
            let binds_tighter = top.info.precedence() < new.precedence()
                || (new.kind().is_left_assoc() && top.info.precedence() <= new.precedence());
            if !binds_tighter {
                break;
            }
            self.stack.pop();
            self.apply(heap, top.opcode, fixed_args(top.info)?)?;
        }
        Ok(())
    }

    /// Handles an argument separator: flush down to the open bracket,
    /// which stays on the stack.
    pub fn comma(&mut self, heap: &mut Heap) -> Result<(), ErrorCode> {
        self.flush_to_bracket(heap)?;
        Ok(())
    }

    /// Handles a close bracket: flush, pop the bracket, check pairing,
    /// then apply the function (or the bracket's own opcode) to the
    /// arguments gathered since the bracket opened.
    pub fn close_bracket(&mut self, heap: &mut Heap, close: Word) -> Result<(), ErrorCode> {
        self.flush_to_bracket(heap)?;
        let Some(StackEntry::Bracket { args_start, opcode: open }) = self.stack.pop() else {
            return Err(ErrorCode::MissingBracket);
        };
        // Bracket pairs are adjacent command numbers. A plain list close
        // may additionally close a C-list open.
        let paired = open + 1 == close
            || (close == cmd::close_list_word() && open == cmd::open_clist_word());
        if !paired {
            return Err(ErrorCode::MissingBracket);
        }

        let mut nargs = heap.object_starts(args_start, heap.cursor()).len();
        if let Some(StackEntry::Op(f)) = self.stack.last().copied()
            && f.info.kind().is_function()
        {
            self.stack.pop();
            if f.info.nargs() != VARIADIC && f.info.nargs() as usize != nargs {
                return Err(ErrorCode::BadArgCount);
            }
            if f.opcode == cmd::funceval_word() {
                // The callee name precedes the argument list; count it and
                // rotate it into the last argument slot.
                nargs += 1;
                self.rotate_first_to_last(heap, nargs)?;
            }
            return self.apply(heap, f.opcode, nargs);
        }
        // A bare grouping paren around a single operand disappears; every
        // other bracket kind materializes with its own opcode.
        if open != cmd::open_paren_word() || nargs > 1 {
            return self.apply(heap, open, nargs);
        }
        Ok(())
    }

    /// Expression end: apply everything left on the stack, then require
    /// the body to have collapsed into exactly one object.
    pub fn finish(&mut self, heap: &mut Heap) -> Result<(), ErrorCode> {
        while let Some(entry) = self.stack.pop() {
            match entry {
                StackEntry::Bracket { .. } => return Err(ErrorCode::MissingBracket),
                StackEntry::Op(op) => self.apply(heap, op.opcode, fixed_args(op.info)?)?,
            }
        }
        let body = self.expr_start + 1;
        if heap.cursor() == body || heap.skip(body) != heap.cursor() {
            return Err(ErrorCode::Syntax);
        }
        Ok(())
    }

    fn flush_to_bracket(&mut self, heap: &mut Heap) -> Result<(), ErrorCode> {
        loop {
            match self.stack.last().copied() {
                None => return Err(ErrorCode::MissingBracket),
                Some(StackEntry::Bracket { .. }) => return Ok(()),
                Some(StackEntry::Op(op)) => {
                    self.stack.pop();
                    self.apply(heap, op.opcode, fixed_args(op.info)?)?;
                }
            }
        }
    }

    /// Wraps the last `nargs` objects of the body in a symbolic headed by
    /// `opcode`, by opening a two-word gap in front of them.
    fn apply(&self, heap: &mut Heap, opcode: Word, nargs: usize) -> Result<(), ErrorCode> {
        let starts = heap.object_starts(self.expr_start + 1, heap.cursor());
        if nargs == 0 || starts.len() < nargs {
            return Err(ErrorCode::BadArgCount);
        }
        let ptr = starts[starts.len() - nargs];
        heap.insert_blank(ptr, 2)?;
        let size = heap.cursor() - ptr - 1;
        if size > slate_core::MAX_OBJECT_SIZE {
            return Err(ErrorCode::OutOfMemory);
        }
        heap.set(ptr, make_prolog(SYMB_LIB, size as u16));
        heap.set(ptr + 1, opcode);
        Ok(())
    }

    fn rotate_first_to_last(&self, heap: &mut Heap, nargs: usize) -> Result<(), ErrorCode> {
        let starts = heap.object_starts(self.expr_start + 1, heap.cursor());
        if starts.len() < nargs {
            return Err(ErrorCode::BadArgCount);
        }
        let first = starts[starts.len() - nargs];
        let first_len = heap.skip(first) - first;
        heap.rotate_left(first, heap.cursor(), first_len);
        Ok(())
    }
}

/// Argument count an operator consumes when applied from the stack.
fn fixed_args(info: TokenInfo) -> Result<usize, ErrorCode> {
    match info.nargs() {
        VARIADIC => Err(ErrorCode::BadArgCount),
        n => Ok(n as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_core::make_call;
    use crate::well_known::ARITH_LIB;

    fn real(heap: &mut Heap, value: f64) {
        let bits = value.to_bits();
        heap.append(make_prolog(crate::well_known::REAL_LIB, 2)).unwrap();
        heap.append(bits as u32).unwrap();
        heap.append((bits >> 32) as u32).unwrap();
    }

    #[test]
    fn apply_wraps_last_n_objects() {
        let mut heap = Heap::new();
        heap.append(make_prolog(SYMB_LIB, 0)).unwrap();
        let state = InfixState::new(0);
        real(&mut heap, 1.0);
        real(&mut heap, 2.0);
        let add = make_call(ARITH_LIB, 0);
        state.apply(&mut heap, add, 2).unwrap();
        // [SYMB][SYMB(add,1,2)]
        assert_eq!(heap.word(1), make_prolog(SYMB_LIB, 7));
        assert_eq!(heap.word(2), add);
        assert_eq!(heap.skip(1), heap.cursor());
    }

    #[test]
    fn apply_with_too_few_objects_is_arity_error() {
        let mut heap = Heap::new();
        heap.append(make_prolog(SYMB_LIB, 0)).unwrap();
        let state = InfixState::new(0);
        real(&mut heap, 1.0);
        let add = make_call(ARITH_LIB, 0);
        assert_eq!(state.apply(&mut heap, add, 2), Err(ErrorCode::BadArgCount));
    }

    #[test]
    fn flush_respects_inverted_precedence() {
        let mut heap = Heap::new();
        heap.append(make_prolog(SYMB_LIB, 0)).unwrap();
        let mut state = InfixState::new(0);
        real(&mut heap, 2.0);
        // MUL (prec 8) waiting, ADD (prec 10) arrives: MUL binds tighter
        // and must be applied first.
        let mul = make_call(ARITH_LIB, 2);
        state.push_operator(mul, TokenInfo::binary_left(1, 8));
        real(&mut heap, 3.0);
        state.flush_for(&mut heap, TokenInfo::binary_left(1, 10)).unwrap();
        assert_eq!(heap.word(1), make_prolog(SYMB_LIB, 7));
        assert_eq!(heap.word(2), mul);
        assert!(state.stack.is_empty());
    }

    #[test]
    fn prefix_on_stack_survives_tighter_newcomer() {
        let mut heap = Heap::new();
        heap.append(make_prolog(SYMB_LIB, 0)).unwrap();
        let mut state = InfixState::new(0);
        let pow = make_call(ARITH_LIB, 4);
        state.push_operator(pow, TokenInfo::binary_right(1, 6));
        real(&mut heap, 2.0);
        // POW (6, right-assoc) does not yield to another POW.
        state.flush_for(&mut heap, TokenInfo::binary_right(1, 6)).unwrap();
        assert_eq!(state.stack.len(), 1);
    }

    #[test]
    fn unmatched_close_reports_missing_bracket() {
        let mut heap = Heap::new();
        heap.append(make_prolog(SYMB_LIB, 0)).unwrap();
        let mut state = InfixState::new(0);
        assert_eq!(
            state.close_bracket(&mut heap, cmd::close_paren_word()),
            Err(ErrorCode::MissingBracket)
        );
    }
}
