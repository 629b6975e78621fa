//! Formatting hints attached to words by `get_info`.
//!
//! The decompiler consults these before and after rendering each object in
//! plain (non-infix) mode to lay out composites over multiple lines.

/// Bit set of layout directives for one word.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Hints(u8);

impl Hints {
    pub const NONE: Hints = Hints(0);
    /// Break the line before rendering the word.
    pub const NL_BEFORE: Hints = Hints(1 << 0);
    /// Widen the indent by one step before rendering.
    pub const ADD_INDENT_BEFORE: Hints = Hints(1 << 1);
    /// Narrow the indent by one step before rendering.
    pub const SUB_INDENT_BEFORE: Hints = Hints(1 << 2);
    /// Break the line after rendering the word.
    pub const NL_AFTER: Hints = Hints(1 << 3);
    /// Widen the indent by one step after rendering.
    pub const ADD_INDENT_AFTER: Hints = Hints(1 << 4);
    /// Narrow the indent by one step after rendering.
    pub const SUB_INDENT_AFTER: Hints = Hints(1 << 5);

    pub const fn contains(self, other: Hints) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Hints) -> Hints {
        Hints(self.0 | other.0)
    }
}

impl std::ops::BitOr for Hints {
    type Output = Hints;

    fn bitor(self, rhs: Hints) -> Hints {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for Hints {
    fn bitor_assign(&mut self, rhs: Hints) {
        *self = self.union(rhs);
    }
}
