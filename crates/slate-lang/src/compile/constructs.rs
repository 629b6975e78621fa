//! Stack of open constructs during compilation.

use slate_core::Span;
use smallvec::SmallVec;

/// One open composite: the heap index of its header word and the span of
/// the token that opened it (for error reporting).
#[derive(Clone, Copy, Debug)]
pub struct OpenConstruct {
    pub start: usize,
    pub open_span: Span,
}

#[derive(Default, Debug)]
pub struct ConstructStack {
    stack: SmallVec<[OpenConstruct; 8]>,
}

impl ConstructStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, start: usize, open_span: Span) {
        self.stack.push(OpenConstruct { start, open_span });
    }

    pub fn pop(&mut self) -> Option<OpenConstruct> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<&OpenConstruct> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut OpenConstruct> {
        self.stack.last_mut()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
