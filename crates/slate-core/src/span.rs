//! Byte positions and spans into source text.

/// A byte offset into the source being compiled.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Pos(u32);

impl Pos {
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    pub const fn offset(self) -> u32 {
        self.0
    }
}

/// A half-open byte range `[start, end)` into the source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Span {
    start: Pos,
    end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub fn of_range(start: usize, end: usize) -> Self {
        Self::new(Pos::new(start as u32), Pos::new(end as u32))
    }

    pub const fn start(self) -> Pos {
        self.start
    }

    pub const fn end(self) -> Pos {
        self.end
    }

    pub const fn len(self) -> u32 {
        self.end.0 - self.start.0
    }

    pub const fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: if self.start <= other.start { self.start } else { other.start },
            end: if self.end >= other.end { self.end } else { other.end },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_len() {
        let s = Span::of_range(3, 9);
        assert_eq!(s.len(), 6);
        assert!(!s.is_empty());
    }

    #[test]
    fn span_merge() {
        let a = Span::of_range(2, 5);
        let b = Span::of_range(4, 10);
        assert_eq!(a.merge(b), Span::of_range(2, 10));
    }
}
