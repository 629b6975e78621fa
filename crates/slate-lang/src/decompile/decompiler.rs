//! The decompile driver.
//!
//! Renders compiled objects back to source text. Plain composites are laid
//! out with the layout hints their libraries report; symbolic expressions
//! are rebuilt through an explicit state machine over a frame stack, one
//! frame per subexpression, restoring infix notation with the minimal set
//! of parentheses.

use slate_core::{
    ErrorCode, Hints, TokenInfo, TokenKind, Word, extract_lib, is_prolog, skip_object,
};
use smallvec::SmallVec;

use crate::library::{DecompContext, DecompReply, LibraryRegistry, ObjectInfo};
use crate::libs::arith;
use crate::well_known::SYMB_LIB;

/// Wrap column used when no explicit width is requested.
pub const DEFAULT_WIDTH: usize = 40;

const INDENT_STEP: usize = 2;

/// Rendering options.
#[derive(Clone, Debug)]
pub struct DecompileOptions {
    /// Render re-compilable source rather than display text.
    pub edit: bool,
    /// Suppress layout hints and width wrapping.
    pub no_hints: bool,
    /// Wrap column; `None` uses [`DEFAULT_WIDTH`].
    pub max_width: Option<usize>,
    /// Locale argument separator used in expression argument lists.
    pub arg_separator: char,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        Self { edit: false, no_hints: false, max_width: None, arg_separator: ',' }
    }
}

impl DecompileOptions {
    /// Display rendering with layout hints.
    pub fn display() -> Self {
        Self::default()
    }

    /// One-line re-compilable source, the round-trip configuration.
    pub fn editing() -> Self {
        Self { edit: true, no_hints: true, ..Self::default() }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mode {
    Plain,
    StartSymbolic,
    StartExpression,
    BinaryLeft,
    BinaryMid,
    BinaryRight,
    PrefixArg,
    PostfixArg,
    FuncArgument,
    CustomFuncArg,
    Atomic,
}

/// One subexpression being rendered.
#[derive(Clone, Copy, Debug)]
struct Frame {
    /// Index of the symbolic prolog heading this subexpression.
    expr_start: usize,
    /// Mode to restore when the frame pops.
    saved_mode: Mode,
    /// Head operator, once classified.
    op: Option<(Word, TokenInfo)>,
    /// Whether a grouping paren was opened on entry.
    wrapped: bool,
}

struct State<'a> {
    code: &'a [Word],
    pos: usize,
    end: usize,
    mode: Mode,
    frames: SmallVec<[Frame; 8]>,
    constructs: SmallVec<[usize; 8]>,
    indent: usize,
    last_newline: bool,
    no_hints: bool,
    edit: bool,
}

/// Decompiles heap objects using an installed registry.
pub struct Decompiler<'r> {
    registry: &'r LibraryRegistry,
    options: DecompileOptions,
}

impl<'r> Decompiler<'r> {
    pub fn new(registry: &'r LibraryRegistry) -> Self {
        Self { registry, options: DecompileOptions::default() }
    }

    pub fn with_options(registry: &'r LibraryRegistry, options: DecompileOptions) -> Self {
        Self { registry, options }
    }

    /// Renders the object stream in `code` to text.
    pub fn decompile(&self, code: &[Word]) -> Result<String, ErrorCode> {
        let mut out = String::new();
        self.render_range(
            code,
            0,
            code.len(),
            &mut out,
            self.options.no_hints,
            self.options.edit,
        )?;
        // A width wrap may leave a dangling newline plus indent.
        if let Some(nl) = out.rfind('\n')
            && out[nl + 1..].chars().all(|c| c == ' ')
        {
            out.truncate(nl);
        }
        Ok(out)
    }

    /// Renders one nested object with hints suppressed. Libraries reach
    /// this through [`DecompContext::embed`].
    pub(crate) fn render_embedded(
        &self,
        code: &[Word],
        pos: usize,
        out: &mut String,
        edit: bool,
    ) -> Result<(), ErrorCode> {
        self.render_range(code, pos, skip_object(code, pos).min(code.len()), out, true, edit)
    }

    fn render_range(
        &self,
        code: &[Word],
        start: usize,
        end: usize,
        out: &mut String,
        no_hints: bool,
        edit: bool,
    ) -> Result<(), ErrorCode> {
        let mut st = State {
            code,
            pos: start,
            end,
            mode: Mode::Plain,
            frames: SmallVec::new(),
            constructs: SmallVec::new(),
            indent: 0,
            last_newline: false,
            no_hints,
            edit,
        };
        while st.pos < st.end {
            let hints = if st.mode == Mode::Plain {
                self.info_for(st.code[st.pos]).hints
            } else {
                Hints::NONE
            };
            if st.mode == Mode::Plain {
                self.hints_before(&mut st, out, hints);
            }

            let reply = self.dispatch(&st, st.pos, out);
            st.last_newline = false;
            match reply {
                DecompReply::Continue => {
                    st.pos = skip_object(st.code, st.pos).min(st.end);
                }
                DecompReply::StartConstruct => {
                    st.constructs.push(st.pos);
                    st.pos += 1;
                }
                DecompReply::ChangeConstruct => {
                    if st.constructs.pop().is_none() {
                        return Err(ErrorCode::MalformedObject);
                    }
                    st.constructs.push(st.pos);
                    st.pos += 1;
                }
                DecompReply::EndConstruct => {
                    if st.constructs.pop().is_none() {
                        return Err(ErrorCode::MalformedObject);
                    }
                    st.pos = skip_object(st.code, st.pos).min(st.end);
                }
                DecompReply::StartConstructInfix => {
                    let saved = st.mode;
                    st.frames.push(Frame {
                        expr_start: st.pos,
                        saved_mode: saved,
                        op: None,
                        wrapped: false,
                    });
                    st.pos += 1;
                    st.mode = if saved == Mode::Plain {
                        Mode::StartSymbolic
                    } else {
                        Mode::StartExpression
                    };
                }
                DecompReply::Invalid => {
                    out.push_str(&format!("0x{:08X}", st.code[st.pos]));
                    st.pos += 1;
                }
            }

            self.run_states(&mut st, out)?;

            if st.mode == Mode::Plain {
                self.hints_after(&mut st, out, hints);
            }
        }
        // A truncated stream leaves constructs or frames open.
        if st.mode != Mode::Plain || !st.frames.is_empty() || !st.constructs.is_empty() {
            return Err(ErrorCode::MalformedObject);
        }
        Ok(())
    }

    /// Advances the expression state machine until it either needs the
    /// next object rendered or leaves infix mode.
    fn run_states(&self, st: &mut State, out: &mut String) -> Result<(), ErrorCode> {
        loop {
            match st.mode {
                Mode::Plain => return Ok(()),

                Mode::StartSymbolic => {
                    out.push('\'');
                    st.mode = Mode::StartExpression;
                }

                Mode::StartExpression => {
                    // The frame must hold a head object.
                    if st.pos >= self.frame_end(st)? {
                        return Err(ErrorCode::MalformedObject);
                    }
                    let word = st.code[st.pos];
                    let info = self.info_for(word).token;
                    if info.kind().is_operator() {
                        if self.enter_operator(st, out, word, info)? {
                            return Ok(());
                        }
                    } else {
                        st.mode = Mode::Atomic;
                        return Ok(());
                    }
                }

                Mode::Atomic => {
                    if st.pos >= self.frame_end(st)? {
                        self.pop_frame(st, out)?;
                    } else {
                        out.push(self.options.arg_separator);
                        return Ok(());
                    }
                }

                Mode::BinaryLeft | Mode::BinaryMid => {
                    let end = self.frame_end(st)?;
                    // An operand must follow, or the arity is a lie.
                    if st.pos >= end {
                        return Err(ErrorCode::MalformedObject);
                    }
                    let (op_word, _) = self.frame_op(st)?;
                    // Additive and multiplicative sugar: a+(-b) renders as
                    // a-b, a+((-b)*c) drops the plus, a*inv(b) as a/b.
                    let mut emit = Some(op_word);
                    if op_word == arith::cmd::add_word() {
                        match symb_main_operator(st.code, st.pos) {
                            Some(inner) if inner == arith::cmd::uminus_word() => {
                                emit = Some(arith::cmd::sub_word());
                                st.pos = symb_unwrap(st.code, st.pos) + 2;
                            }
                            Some(inner)
                                if (inner == arith::cmd::mul_word()
                                    || inner == arith::cmd::div_word())
                                    && first_factor_is_negated(st.code, st.pos) =>
                            {
                                emit = None;
                            }
                            _ => {}
                        }
                    } else if op_word == arith::cmd::mul_word()
                        && symb_main_operator(st.code, st.pos) == Some(arith::cmd::inv_word())
                    {
                        emit = Some(arith::cmd::div_word());
                        st.pos = symb_unwrap(st.code, st.pos) + 2;
                    }
                    if let Some(w) = emit {
                        self.render_opcode(st, out, w);
                    }
                    st.mode = if skip_object(st.code, st.pos) == end {
                        Mode::BinaryRight
                    } else {
                        Mode::BinaryMid
                    };
                    return Ok(());
                }

                Mode::BinaryRight | Mode::PrefixArg => {
                    self.pop_frame(st, out)?;
                }

                Mode::PostfixArg => {
                    let (op_word, _) = self.frame_op(st)?;
                    self.render_opcode(st, out, op_word);
                    self.pop_frame(st, out)?;
                }

                Mode::FuncArgument => {
                    let end = self.frame_end(st)?;
                    if st.pos >= end {
                        let (op_word, op_info) = self.frame_op(st)?;
                        if op_info.kind() == TokenKind::OpenBracket {
                            // Close form is the adjacent command number.
                            self.render_opcode(st, out, op_word + 1);
                        } else {
                            out.push(')');
                        }
                        self.pop_frame(st, out)?;
                    } else {
                        out.push(self.options.arg_separator);
                        return Ok(());
                    }
                }

                Mode::CustomFuncArg => {
                    let end = self.frame_end(st)?;
                    // The callee name travels last; stop before it.
                    if st.pos >= end || skip_object(st.code, st.pos) == end {
                        out.push(')');
                        self.pop_frame(st, out)?;
                    } else {
                        out.push(self.options.arg_separator);
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Classifies the head operator of a fresh subexpression. Returns
    /// whether the caller must go render the next object.
    fn enter_operator(
        &self,
        st: &mut State,
        out: &mut String,
        word: Word,
        info: TokenInfo,
    ) -> Result<bool, ErrorCode> {
        let wrapped = self.needs_paren(st, word, info);
        {
            let frame = st.frames.last_mut().ok_or(ErrorCode::MalformedObject)?;
            frame.op = Some((word, info));
            frame.wrapped = wrapped;
        }
        if wrapped {
            out.push('(');
        }
        let end = self.frame_end(st)?;
        match info.kind() {
            TokenKind::BinaryLeft
            | TokenKind::BinaryRight
            | TokenKind::CasBinaryLeft
            | TokenKind::CasBinaryRight => {
                st.pos += 1;
                st.mode = Mode::BinaryLeft;
                Ok(true)
            }
            TokenKind::Postfix => {
                st.pos += 1;
                st.mode = Mode::PostfixArg;
                Ok(true)
            }
            TokenKind::Prefix => {
                self.render_opcode(st, out, word);
                st.pos += 1;
                st.mode = Mode::PrefixArg;
                Ok(true)
            }
            TokenKind::CustomFunction => {
                let args = st.pos + 1;
                let mut name = args;
                let mut p = args;
                while p < end {
                    name = p;
                    p = skip_object(st.code, p);
                }
                self.render_embedded(st.code, name, out, st.edit)?;
                out.push('(');
                st.pos = args;
                if skip_object(st.code, args) == end {
                    out.push(')');
                    self.pop_frame(st, out)?;
                    Ok(false)
                } else {
                    st.mode = Mode::CustomFuncArg;
                    Ok(true)
                }
            }
            TokenKind::OpenBracket => {
                self.render_opcode(st, out, word);
                st.pos += 1;
                if st.pos >= end {
                    self.render_opcode(st, out, word + 1);
                    self.pop_frame(st, out)?;
                    Ok(false)
                } else {
                    st.mode = Mode::FuncArgument;
                    Ok(true)
                }
            }
            _ => {
                // Function, CAS function, or an unknown rendered as one.
                self.render_opcode(st, out, word);
                out.push('(');
                st.pos += 1;
                if st.pos >= end {
                    out.push(')');
                    self.pop_frame(st, out)?;
                    Ok(false)
                } else {
                    st.mode = Mode::FuncArgument;
                    Ok(true)
                }
            }
        }
    }

    /// Whether the subexpression in the current frame must be wrapped in
    /// parentheses, judged against the enclosing frame's operator.
    fn needs_paren(&self, st: &State, word: Word, info: TokenInfo) -> bool {
        let n = st.frames.len();
        if n < 2 {
            return false;
        }
        let cur = &st.frames[n - 1];
        let Some((parent_word, parent_info)) = st.frames[n - 2].op else {
            return false;
        };
        if info.kind() == TokenKind::Prefix {
            // A sign binds visually loose: wrap whenever it appears as a
            // right-hand or unary operand, and always under POW.
            return matches!(
                cur.saved_mode,
                Mode::BinaryMid | Mode::BinaryRight | Mode::PostfixArg | Mode::PrefixArg
            ) || parent_word == arith::cmd::pow_word();
        }
        if parent_info.kind().is_function() || parent_info.kind() == TokenKind::CustomFunction {
            return false;
        }
        if info.kind() == TokenKind::OpenBracket {
            return false;
        }
        if parent_info.precedence() == info.precedence() {
            return word != arith::cmd::mul_word() && word != arith::cmd::add_word();
        }
        parent_info.precedence() < info.precedence()
    }

    fn frame_end(&self, st: &State) -> Result<usize, ErrorCode> {
        let frame = st.frames.last().ok_or(ErrorCode::MalformedObject)?;
        // A prolog may claim more words than the stream holds.
        Ok(skip_object(st.code, frame.expr_start).min(st.end))
    }

    fn frame_op(&self, st: &State) -> Result<(Word, TokenInfo), ErrorCode> {
        let frame = st.frames.last().ok_or(ErrorCode::MalformedObject)?;
        frame.op.ok_or(ErrorCode::MalformedObject)
    }

    fn pop_frame(&self, st: &mut State, out: &mut String) -> Result<(), ErrorCode> {
        let frame = st.frames.pop().ok_or(ErrorCode::MalformedObject)?;
        if frame.wrapped {
            out.push(')');
        }
        st.pos = skip_object(st.code, frame.expr_start).min(st.end);
        st.mode = frame.saved_mode;
        if st.mode == Mode::Plain {
            out.push('\'');
        }
        Ok(())
    }

    /// Offers the object at `pos` to its owning library.
    fn dispatch(&self, st: &State, pos: usize, out: &mut String) -> DecompReply {
        let word = st.code[pos];
        let Some(lib) = self.registry.get(extract_lib(word)) else {
            return DecompReply::Invalid;
        };
        let mut ctx = DecompContext { dec: self, code: st.code, pos, word, out, edit: st.edit };
        lib.decompile(&mut ctx).unwrap_or(DecompReply::Invalid)
    }

    /// Renders a single (possibly synthesized) call word.
    fn render_opcode(&self, st: &State, out: &mut String, word: Word) {
        let reply = {
            let Some(lib) = self.registry.get(extract_lib(word)) else {
                out.push_str(&format!("0x{word:08X}"));
                return;
            };
            let mut ctx =
                DecompContext { dec: self, code: st.code, pos: st.pos, word, out, edit: st.edit };
            lib.decompile(&mut ctx)
        };
        if reply.is_err() {
            out.push_str(&format!("0x{word:08X}"));
        }
    }

    fn info_for(&self, word: Word) -> ObjectInfo {
        self.registry
            .get(extract_lib(word))
            .and_then(|lib| lib.get_info(word))
            .unwrap_or(ObjectInfo::new(TokenInfo::new(0, TokenKind::Function, 0, 20)))
    }

    fn hints_before(&self, st: &mut State, out: &mut String, hints: Hints) {
        if st.no_hints {
            return;
        }
        if st.last_newline {
            if hints.contains(Hints::ADD_INDENT_BEFORE) {
                st.indent += INDENT_STEP;
                out.push_str("  ");
            }
            if hints.contains(Hints::SUB_INDENT_BEFORE) {
                st.indent = st.indent.saturating_sub(INDENT_STEP);
                // Retract one indent step already emitted with the break.
                let spaces = out.len() - out.trim_end_matches(' ').len();
                out.truncate(out.len() - spaces.min(INDENT_STEP));
            }
        } else {
            if hints.contains(Hints::ADD_INDENT_BEFORE) {
                st.indent += INDENT_STEP;
            }
            if hints.contains(Hints::SUB_INDENT_BEFORE) {
                st.indent = st.indent.saturating_sub(INDENT_STEP);
            }
            if hints.contains(Hints::NL_BEFORE) {
                // Drop the separator space the previous object left.
                out.truncate(out.trim_end_matches(' ').len());
                out.push('\n');
                push_indent(out, st.indent);
            }
        }
    }

    fn hints_after(&self, st: &mut State, out: &mut String, hints: Hints) {
        if st.no_hints {
            if st.pos < st.end {
                out.push(' ');
            }
            return;
        }
        let mut hints = hints;
        let line_start = out.rfind('\n').map(|i| i + 1).unwrap_or(0);
        // Width is measured in code points, as token lengths are.
        let width = out[line_start..].chars().count();
        if width > self.options.max_width.unwrap_or(DEFAULT_WIDTH) {
            hints |= Hints::NL_AFTER;
        }
        if hints.contains(Hints::ADD_INDENT_AFTER) {
            st.indent += INDENT_STEP;
        }
        if hints.contains(Hints::SUB_INDENT_AFTER) {
            st.indent = st.indent.saturating_sub(INDENT_STEP);
        }
        if hints.contains(Hints::NL_AFTER) {
            out.push('\n');
            push_indent(out, st.indent);
            st.last_newline = true;
        } else if st.pos < st.end {
            out.push(' ');
        }
    }

}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push(' ');
    }
}

/// Innermost symbolic prolog of a (possibly re-wrapped) subexpression.
fn symb_unwrap(code: &[Word], pos: usize) -> usize {
    let mut p = pos;
    while is_prolog(code[p])
        && extract_lib(code[p]) == SYMB_LIB
        && p + 1 < code.len()
        && is_prolog(code[p + 1])
        && extract_lib(code[p + 1]) == SYMB_LIB
    {
        p += 1;
    }
    p
}

/// Head opcode of a symbolic subtree, if the object at `pos` is one.
fn symb_main_operator(code: &[Word], pos: usize) -> Option<Word> {
    if pos >= code.len() || !is_prolog(code[pos]) || extract_lib(code[pos]) != SYMB_LIB {
        return None;
    }
    let p = symb_unwrap(code, pos);
    if p + 1 >= code.len() {
        return None;
    }
    let head = code[p + 1];
    if is_prolog(head) { None } else { Some(head) }
}

/// True when the first factor of the product at `pos` is sign-negated.
fn first_factor_is_negated(code: &[Word], pos: usize) -> bool {
    let first = symb_unwrap(code, pos) + 2;
    first < code.len() && symb_main_operator(code, first) == Some(arith::cmd::uminus_word())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Heap;
    use crate::libs::register_standard;
    use crate::well_known::REAL_LIB;
    use slate_core::{make_call, make_prolog};

    fn registry() -> LibraryRegistry {
        let mut reg = LibraryRegistry::new();
        register_standard(&mut reg);
        reg
    }

    fn real_words(value: f64) -> [Word; 3] {
        let bits = value.to_bits();
        [make_prolog(REAL_LIB, 2), bits as u32, (bits >> 32) as u32]
    }

    /// Builds SYMB(op, args...) by hand.
    fn symb(op: Word, args: &[&[Word]]) -> Vec<Word> {
        let mut body = vec![op];
        for a in args {
            body.extend_from_slice(a);
        }
        let mut words = vec![make_prolog(SYMB_LIB, body.len() as u16)];
        words.extend(body);
        words
    }

    #[test]
    fn flat_nary_sum_uses_binary_mid() {
        let reg = registry();
        let one = real_words(1.0);
        let two = real_words(2.0);
        let three = real_words(3.0);
        let code = symb(
            make_call(crate::well_known::ARITH_LIB, arith::cmd::ADD),
            &[&one, &two, &three],
        );
        let dec = Decompiler::with_options(&reg, DecompileOptions::editing());
        assert_eq!(dec.decompile(&code).unwrap(), "'1+2+3'");
    }

    #[test]
    fn unknown_word_renders_as_hex() {
        let reg = registry();
        let code = [make_call(40, 9)];
        let dec = Decompiler::with_options(&reg, DecompileOptions::editing());
        assert_eq!(dec.decompile(&code).unwrap(), "0x00280009");
    }

    #[test]
    fn end_without_open_construct_is_malformed() {
        let reg = registry();
        let code = [make_call(crate::well_known::PROG_LIB, crate::libs::prog::cmd::END)];
        let dec = Decompiler::new(&reg);
        assert_eq!(dec.decompile(&code), Err(ErrorCode::MalformedObject));
    }

    #[test]
    fn empty_symbolic_body_is_malformed() {
        let reg = registry();
        let code = [make_prolog(SYMB_LIB, 0)];
        let dec = Decompiler::with_options(&reg, DecompileOptions::editing());
        assert_eq!(dec.decompile(&code), Err(ErrorCode::MalformedObject));
    }

    #[test]
    fn binary_operator_missing_an_operand_is_malformed() {
        let reg = registry();
        let one = real_words(1.0);
        let code = symb(make_call(crate::well_known::ARITH_LIB, arith::cmd::ADD), &[&one]);
        let dec = Decompiler::with_options(&reg, DecompileOptions::editing());
        assert_eq!(dec.decompile(&code), Err(ErrorCode::MalformedObject));
    }

    #[test]
    fn truncated_composite_is_malformed() {
        let reg = registry();
        let code = [make_prolog(crate::well_known::PROG_LIB, 3)];
        let dec = Decompiler::new(&reg);
        assert_eq!(dec.decompile(&code), Err(ErrorCode::MalformedObject));
    }

    #[test]
    fn double_wrapped_expression_still_renders() {
        let reg = registry();
        let three = real_words(3.0);
        let inner = symb(
            make_call(crate::well_known::ARITH_LIB, arith::cmd::UMINUS),
            &[&three],
        );
        // Wrap the whole symbolic in a second symbolic prolog.
        let mut code = vec![make_prolog(SYMB_LIB, inner.len() as u16)];
        code.extend(inner);
        let dec = Decompiler::with_options(&reg, DecompileOptions::editing());
        assert_eq!(dec.decompile(&code).unwrap(), "'-3'");
    }

    #[test]
    fn compiled_program_survives_display_then_recompile() {
        let reg = registry();
        let mut heap = Heap::new();
        let obj = crate::compile::Compiler::new(&reg)
            .compile(&mut heap, ":: 1 2 ;", false)
            .unwrap();
        let text = Decompiler::new(&reg).decompile(heap.object(obj)).unwrap();
        let again = crate::compile::Compiler::new(&reg)
            .compile(&mut heap, &text, false)
            .unwrap();
        assert_eq!(heap.object(again).to_vec(), {
            let mut h2 = Heap::new();
            let o2 = crate::compile::Compiler::new(&reg)
                .compile(&mut h2, ":: 1 2 ;", false)
                .unwrap();
            h2.object(o2).to_vec()
        });
    }
}
