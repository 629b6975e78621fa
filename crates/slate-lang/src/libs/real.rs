//! Real-number literals.
//!
//! A real occupies three words: the prolog and the 64-bit float split into
//! low and high halves. The probe claims only an unsigned literal; a
//! leading sign in an expression belongs to the arithmetic library so that
//! `3-5` stays a subtraction. In plain mode the literal is parsed with its
//! sign, which is what makes a bare `-5` a number and not an operator.

use slate_core::{ErrorCode, TokenInfo, Word, extract_lib, is_prolog, make_prolog};

use crate::library::{
    CompileContext, CompileReply, DecompContext, DecompReply, Library, LibraryId, ObjectInfo,
    ProbeContext, ProbeReply,
};
use crate::well_known::REAL_LIB;

/// Words in a real object after the prolog.
pub const REAL_SIZE: u16 = 2;

pub fn real_words(value: f64) -> [Word; 3] {
    let bits = value.to_bits();
    [make_prolog(REAL_LIB, REAL_SIZE), bits as Word, (bits >> 32) as Word]
}

/// Reads the float back out of an object slice.
pub fn real_value(object: &[Word]) -> Option<f64> {
    if object.len() < 3 || !is_prolog(object[0]) || extract_lib(object[0]) != REAL_LIB {
        return None;
    }
    Some(f64::from_bits((object[1] as u64) | ((object[2] as u64) << 32)))
}

/// Length in chars of the longest numeric literal prefix, or `None`.
/// Accepts `123`, `1.5`, `.5`, `1e9`, `2.5E-3`; with `signed`, a single
/// leading sign as well.
fn literal_prefix(text: &str, signed: bool) -> Option<usize> {
    let mut chars = text.chars().peekable();
    let mut len = 0usize;

    if signed && matches!(chars.peek(), Some('+' | '-')) {
        chars.next();
        len += 1;
    }
    let mut digits = 0usize;
    while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
        chars.next();
        len += 1;
        digits += 1;
    }
    if chars.peek() == Some(&'.') {
        let mut ahead = chars.clone();
        ahead.next();
        // A bare trailing dot is claimed only after integer digits.
        if digits > 0 || ahead.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            len += 1;
            while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                chars.next();
                len += 1;
                digits += 1;
            }
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(chars.peek(), Some('e' | 'E')) {
        let mut ahead = chars.clone();
        ahead.next();
        let mut exp_len = 1;
        if matches!(ahead.peek(), Some('+' | '-')) {
            ahead.next();
            exp_len += 1;
        }
        let mut exp_digits = 0;
        while ahead.peek().is_some_and(|c| c.is_ascii_digit()) {
            ahead.next();
            exp_len += 1;
            exp_digits += 1;
        }
        if exp_digits > 0 {
            len += exp_len;
        }
    }
    Some(len)
}

fn byte_len(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

pub struct RealLib;

impl Library for RealLib {
    fn id(&self) -> LibraryId {
        LibraryId::new(REAL_LIB)
    }

    fn name(&self) -> &'static str {
        "real"
    }

    fn probe(&self, ctx: &ProbeContext<'_>) -> ProbeReply {
        match literal_prefix(ctx.text(), false) {
            Some(len) => ProbeReply::Match(TokenInfo::number(len)),
            None => ProbeReply::NoMatch,
        }
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode> {
        let token = ctx.token();
        let Some(len) = literal_prefix(token, !ctx.in_infix()) else {
            return Ok(CompileReply::NotMine);
        };
        let bytes = byte_len(token, len);
        let value: f64 = token[..bytes].parse().map_err(|_| ErrorCode::Syntax)?;
        for word in real_words(value) {
            ctx.emit(word)?;
        }
        if len < token.chars().count() {
            if ctx.in_infix() {
                // The driver already truncated the token to the claim.
                return Err(ErrorCode::Syntax);
            }
            Ok(CompileReply::ok_split(len))
        } else {
            Ok(CompileReply::ok())
        }
    }

    fn get_info(&self, word: Word) -> Option<ObjectInfo> {
        if is_prolog(word) && extract_lib(word) == REAL_LIB {
            Some(ObjectInfo::new(TokenInfo::number(1)))
        } else {
            None
        }
    }

    fn decompile(&self, ctx: &mut DecompContext<'_, '_>) -> Result<DecompReply, ErrorCode> {
        let Some(value) = real_value(ctx.object()) else {
            return Ok(DecompReply::Invalid);
        };
        ctx.push_str(&value.to_string());
        Ok(DecompReply::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_probe_rejects_a_leading_sign() {
        let lib = RealLib;
        assert_eq!(lib.probe(&ProbeContext::new("-5")), ProbeReply::NoMatch);
        let ProbeReply::Match(info) = lib.probe(&ProbeContext::new("5.25e2")) else {
            panic!("expected a claim");
        };
        assert_eq!(info.len(), 6);
    }

    #[test]
    fn prefix_stops_at_the_first_non_literal_char() {
        assert_eq!(literal_prefix("1+2", false), Some(1));
        assert_eq!(literal_prefix("2.5E-3)", false), Some(6));
        assert_eq!(literal_prefix("1e", false), Some(1));
        assert_eq!(literal_prefix(".5'", false), Some(2));
        assert_eq!(literal_prefix("-5", true), Some(2));
        assert_eq!(literal_prefix("e3", false), None);
        assert_eq!(literal_prefix("-", true), None);
    }

    #[test]
    fn value_round_trips_through_words() {
        let words = real_words(-2.5);
        assert_eq!(real_value(&words), Some(-2.5));
    }
}
