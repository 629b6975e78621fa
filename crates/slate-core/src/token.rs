//! Packed token classification returned by library probes.
//!
//! A probe answers with a single `TokenInfo` word describing how much of the
//! token it claims and how the claimed text behaves inside an expression:
//! its syntactic kind, its argument count and its precedence. Precedence is
//! numerically inverted: a *lower* value binds *tighter*.

/// Argument-count value meaning "any number of arguments".
pub const VARIADIC: u8 = 0xF;

/// Syntactic kind of a probed token or of a compiled opcode.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum TokenKind {
    /// Unclassified word; the decompiler treats it as a bare function.
    Unknown = 0,
    /// Numeric literal operand.
    Number = 1,
    /// Identifier operand.
    Ident = 2,
    /// Recognized, but forbidden inside symbolic expressions.
    NotAllowed = 3,
    /// Unary operator written before its operand.
    Prefix = 4,
    /// Unary operator written after its operand.
    Postfix = 5,
    /// Left-associative binary operator.
    BinaryLeft = 6,
    /// Right-associative binary operator.
    BinaryRight = 7,
    /// Left-associative binary operator reserved for CAS rewriting.
    CasBinaryLeft = 8,
    /// Right-associative binary operator reserved for CAS rewriting.
    CasBinaryRight = 9,
    /// Named function applied to a parenthesized argument list.
    Function = 10,
    /// Function whose arguments the CAS keeps unevaluated.
    CasFunction = 11,
    /// Call through a computed name; the name travels as the last argument.
    CustomFunction = 12,
    OpenBracket = 13,
    CloseBracket = 14,
    Comma = 15,
}

impl TokenKind {
    const ALL: [TokenKind; 16] = [
        TokenKind::Unknown,
        TokenKind::Number,
        TokenKind::Ident,
        TokenKind::NotAllowed,
        TokenKind::Prefix,
        TokenKind::Postfix,
        TokenKind::BinaryLeft,
        TokenKind::BinaryRight,
        TokenKind::CasBinaryLeft,
        TokenKind::CasBinaryRight,
        TokenKind::Function,
        TokenKind::CasFunction,
        TokenKind::CustomFunction,
        TokenKind::OpenBracket,
        TokenKind::CloseBracket,
        TokenKind::Comma,
    ];

    fn from_bits(bits: u32) -> Self {
        Self::ALL[(bits & 0xF) as usize]
    }

    /// True for kinds routed through the infix operator stack. Operand
    /// kinds (numbers, idents, unknowns) stay in the object stream.
    pub fn is_operator(self) -> bool {
        !matches!(
            self,
            TokenKind::Unknown | TokenKind::Number | TokenKind::Ident | TokenKind::NotAllowed
        )
    }

    /// True when a token of this kind leaves the parser expecting an
    /// operand next, which turns a following `-`/`+` into a unary sign.
    pub fn expects_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Prefix
                | TokenKind::BinaryLeft
                | TokenKind::BinaryRight
                | TokenKind::CasBinaryLeft
                | TokenKind::CasBinaryRight
                | TokenKind::OpenBracket
                | TokenKind::Comma
        )
    }

    pub fn is_binary(self) -> bool {
        matches!(
            self,
            TokenKind::BinaryLeft
                | TokenKind::BinaryRight
                | TokenKind::CasBinaryLeft
                | TokenKind::CasBinaryRight
        )
    }

    pub fn is_left_assoc(self) -> bool {
        matches!(self, TokenKind::BinaryLeft | TokenKind::CasBinaryLeft)
    }

    pub fn is_function(self) -> bool {
        matches!(self, TokenKind::Function | TokenKind::CasFunction)
    }
}

/// Packed token descriptor: code-point length (12 bits), kind (4 bits),
/// argument count (4 bits, [`VARIADIC`] = any) and precedence (8 bits).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TokenInfo(u32);

impl TokenInfo {
    pub const fn new(len: usize, kind: TokenKind, nargs: u8, precedence: u8) -> Self {
        Self(
            ((len as u32 & 0xFFF) << 16)
                | ((kind as u32) << 12)
                | ((nargs as u32 & 0xF) << 8)
                | precedence as u32,
        )
    }

    /// Claimed token length in Unicode code points.
    pub const fn len(self) -> usize {
        (self.0 >> 16) as usize & 0xFFF
    }

    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn kind(self) -> TokenKind {
        TokenKind::from_bits(self.0 >> 12)
    }

    /// Fixed argument count, or [`VARIADIC`].
    pub const fn nargs(self) -> u8 {
        (self.0 >> 8) as u8 & 0xF
    }

    pub const fn precedence(self) -> u8 {
        self.0 as u8
    }

    pub fn with_len(self, len: usize) -> Self {
        Self((self.0 & 0x0000_FFFF) | ((len as u32 & 0xFFF) << 16))
    }

    // Shorthand constructors for the common shapes.

    pub const fn number(len: usize) -> Self {
        Self::new(len, TokenKind::Number, 0, 0)
    }

    pub const fn ident(len: usize) -> Self {
        Self::new(len, TokenKind::Ident, 0, 0)
    }

    pub const fn not_allowed(len: usize) -> Self {
        Self::new(len, TokenKind::NotAllowed, 0, 0)
    }

    pub const fn open_bracket(len: usize) -> Self {
        Self::new(len, TokenKind::OpenBracket, 0, 0)
    }

    pub const fn close_bracket(len: usize) -> Self {
        Self::new(len, TokenKind::CloseBracket, 0, 0)
    }

    pub const fn comma() -> Self {
        Self::new(1, TokenKind::Comma, 0, 0)
    }

    pub const fn prefix(len: usize, precedence: u8) -> Self {
        Self::new(len, TokenKind::Prefix, 1, precedence)
    }

    pub const fn postfix(len: usize, precedence: u8) -> Self {
        Self::new(len, TokenKind::Postfix, 1, precedence)
    }

    pub const fn binary_left(len: usize, precedence: u8) -> Self {
        Self::new(len, TokenKind::BinaryLeft, 2, precedence)
    }

    pub const fn binary_right(len: usize, precedence: u8) -> Self {
        Self::new(len, TokenKind::BinaryRight, 2, precedence)
    }

    pub const fn function(len: usize, nargs: u8, precedence: u8) -> Self {
        Self::new(len, TokenKind::Function, nargs, precedence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_round_trip() {
        let info = TokenInfo::new(5, TokenKind::BinaryLeft, 2, 10);
        assert_eq!(info.len(), 5);
        assert_eq!(info.kind(), TokenKind::BinaryLeft);
        assert_eq!(info.nargs(), 2);
        assert_eq!(info.precedence(), 10);
    }

    #[test]
    fn every_kind_survives_packing() {
        for (i, kind) in TokenKind::ALL.iter().enumerate() {
            let info = TokenInfo::new(1, *kind, 0, 0);
            assert_eq!(info.kind(), *kind, "kind index {i}");
        }
    }

    #[test]
    fn with_len_keeps_classification() {
        let info = TokenInfo::function(3, VARIADIC, 2).with_len(1);
        assert_eq!(info.len(), 1);
        assert_eq!(info.kind(), TokenKind::Function);
        assert_eq!(info.nargs(), VARIADIC);
        assert_eq!(info.precedence(), 2);
    }

    #[test]
    fn operand_kinds_are_not_operators() {
        assert!(!TokenKind::Number.is_operator());
        assert!(!TokenKind::Ident.is_operator());
        assert!(TokenKind::Comma.is_operator());
        assert!(TokenKind::Function.is_operator());
    }

    #[test]
    fn binary_and_bracket_kinds_expect_operands() {
        assert!(TokenKind::BinaryLeft.expects_operand());
        assert!(TokenKind::OpenBracket.expects_operand());
        assert!(!TokenKind::CloseBracket.expects_operand());
        assert!(!TokenKind::Postfix.expects_operand());
    }
}
