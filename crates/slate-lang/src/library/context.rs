//! Dispatch contexts handed to library operations.
//!
//! Each context exposes exactly the driver state an operation may touch.
//! All heap access goes through indices, so libraries stay valid across
//! arena growth.

use slate_core::{ErrorCode, Span, Word, extract_cmd, extract_lib, skip_object};

use crate::decompile::Decompiler;
use crate::heap::Heap;

/// Read-only view of a token offered to `probe`.
pub struct ProbeContext<'a> {
    text: &'a str,
}

impl<'a> ProbeContext<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// The token text, starting at the character to classify.
    pub fn text(&self) -> &'a str {
        self.text
    }
}

/// Mutable compile-side context: the current token plus emit access to the
/// working region of the heap.
pub struct CompileContext<'a> {
    heap: &'a mut Heap,
    token: &'a str,
    gap: &'a str,
    span: Span,
    in_infix: bool,
    construct: Option<usize>,
}

impl<'a> CompileContext<'a> {
    pub fn new(
        heap: &'a mut Heap,
        token: &'a str,
        gap: &'a str,
        span: Span,
        in_infix: bool,
        construct: Option<usize>,
    ) -> Self {
        Self { heap, token, gap, span, in_infix, construct }
    }

    pub fn token(&self) -> &'a str {
        self.token
    }

    /// The blank run between the previous token and this one. Multi-token
    /// atomics (strings) fold it back into their payload.
    pub fn gap(&self) -> &'a str {
        self.gap
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn in_infix(&self) -> bool {
        self.in_infix
    }

    /// Heap index of the innermost open construct header, if any.
    pub fn construct_start(&self) -> Option<usize> {
        self.construct
    }

    /// The innermost open construct header word, re-read on every call.
    pub fn construct_word(&self) -> Option<Word> {
        self.construct.map(|pos| self.heap.word(pos))
    }

    pub fn cursor(&self) -> usize {
        self.heap.cursor()
    }

    pub fn emit(&mut self, word: Word) -> Result<(), ErrorCode> {
        self.heap.append(word)
    }

    pub fn word(&self, pos: usize) -> Word {
        self.heap.word(pos)
    }

    pub fn set_word(&mut self, pos: usize, word: Word) {
        self.heap.set(pos, word);
    }
}

/// Read-only view of a freshly compiled child inside an open construct.
pub struct ValidateContext<'a> {
    heap: &'a Heap,
    construct_start: usize,
    child_start: usize,
}

impl<'a> ValidateContext<'a> {
    pub fn new(heap: &'a Heap, construct_start: usize, child_start: usize) -> Self {
        Self { heap, construct_start, child_start }
    }

    pub fn construct_word(&self) -> Word {
        self.heap.word(self.construct_start)
    }

    pub fn child_start(&self) -> usize {
        self.child_start
    }

    /// The child object's words, prolog included.
    pub fn child(&self) -> &'a [Word] {
        self.heap.slice(self.child_start, self.heap.skip(self.child_start))
    }
}

/// Decompile-side context: one word (possibly synthesized by the driver)
/// plus append access to the output text.
pub struct DecompContext<'a, 'o> {
    pub(crate) dec: &'a Decompiler<'a>,
    pub(crate) code: &'a [Word],
    pub(crate) pos: usize,
    pub(crate) word: Word,
    pub(crate) out: &'o mut String,
    pub(crate) edit: bool,
}

impl DecompContext<'_, '_> {
    /// The word being rendered. Usually `code[pos]`, but the driver may
    /// synthesize one (e.g. the close form of an open bracket).
    pub fn word(&self) -> Word {
        self.word
    }

    pub fn cmd(&self) -> u16 {
        extract_cmd(self.word)
    }

    pub fn lib(&self) -> u16 {
        extract_lib(self.word)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The whole object starting at the current position, clamped to the
    /// stream; a truncated prolog yields a short slice.
    pub fn object(&self) -> &[Word] {
        if self.pos >= self.code.len() {
            return &[];
        }
        let end = skip_object(self.code, self.pos).min(self.code.len());
        &self.code[self.pos..end]
    }

    /// True when rendering re-compilable text rather than display text.
    pub fn edit(&self) -> bool {
        self.edit
    }

    pub fn push(&mut self, ch: char) {
        self.out.push(ch);
    }

    pub fn push_str(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Recursively renders the object at `pos` into the same output,
    /// with layout hints suppressed.
    pub fn embed(&mut self, pos: usize) -> Result<(), ErrorCode> {
        self.dec.render_embedded(self.code, pos, self.out, self.edit)
    }
}
