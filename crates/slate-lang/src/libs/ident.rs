//! Identifier objects: variable and function names.
//!
//! The name is stored as UTF-8, four bytes per word, zero-padded. This
//! library scans last, so anything another library claims first never
//! reaches it.

use slate_core::{ErrorCode, TokenInfo, Word, extract_lib, is_prolog, make_prolog};

use crate::library::{
    CompileContext, CompileReply, DecompContext, DecompReply, Library, LibraryId, ObjectInfo,
    ProbeContext, ProbeReply,
};
use crate::well_known::IDENT_LIB;

fn is_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Chars of the leading identifier run, or `None`.
fn name_prefix(text: &str) -> Option<usize> {
    let mut chars = text.chars();
    if !chars.next().is_some_and(is_start_char) {
        return None;
    }
    Some(1 + chars.take_while(|c| is_name_char(*c)).count())
}

/// Packs UTF-8 bytes four to a word, zero-padded.
pub fn pack_name(name: &str) -> Vec<Word> {
    let bytes = name.as_bytes();
    let mut words = Vec::with_capacity(bytes.len().div_ceil(4));
    for chunk in bytes.chunks(4) {
        let mut word: Word = 0;
        for (i, b) in chunk.iter().enumerate() {
            word |= (*b as Word) << (8 * i);
        }
        words.push(word);
    }
    words
}

/// Reads the name back out of the payload words.
pub fn unpack_name(payload: &[Word]) -> String {
    let mut bytes = Vec::with_capacity(payload.len() * 4);
    for word in payload {
        for i in 0..4 {
            let b = (word >> (8 * i)) as u8;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

pub struct IdentLib;

impl Library for IdentLib {
    fn id(&self) -> LibraryId {
        LibraryId::new(IDENT_LIB)
    }

    fn name(&self) -> &'static str {
        "ident"
    }

    fn probe(&self, ctx: &ProbeContext<'_>) -> ProbeReply {
        match name_prefix(ctx.text()) {
            Some(len) => ProbeReply::Match(TokenInfo::ident(len)),
            None => ProbeReply::NoMatch,
        }
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode> {
        let token = ctx.token();
        let Some(len) = name_prefix(token) else {
            return Ok(CompileReply::NotMine);
        };
        if !ctx.in_infix() && len < token.chars().count() {
            // Plain mode offers whole tokens only.
            return Ok(CompileReply::NotMine);
        }
        let words = pack_name(token);
        ctx.emit(make_prolog(IDENT_LIB, words.len() as u16))?;
        for word in words {
            ctx.emit(word)?;
        }
        Ok(CompileReply::ok())
    }

    fn get_info(&self, word: Word) -> Option<ObjectInfo> {
        if is_prolog(word) && extract_lib(word) == IDENT_LIB {
            Some(ObjectInfo::new(TokenInfo::ident(1)))
        } else {
            None
        }
    }

    fn decompile(&self, ctx: &mut DecompContext<'_, '_>) -> Result<DecompReply, ErrorCode> {
        let object = ctx.object();
        if object.len() < 2 {
            return Ok(DecompReply::Invalid);
        }
        ctx.push_str(&unpack_name(&object[1..]));
        Ok(DecompReply::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_packing() {
        for name in ["A", "Var1", "long_name_here", "αβγ"] {
            assert_eq!(unpack_name(&pack_name(name)), *name);
        }
    }

    #[test]
    fn probe_stops_at_punctuation() {
        let lib = IdentLib;
        let ProbeReply::Match(info) = lib.probe(&ProbeContext::new("Var1+2")) else {
            panic!("expected a claim");
        };
        assert_eq!(info.len(), 4);
    }

    #[test]
    fn digits_do_not_start_a_name() {
        let lib = IdentLib;
        assert_eq!(lib.probe(&ProbeContext::new("1A")), ProbeReply::NoMatch);
    }
}
