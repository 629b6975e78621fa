//! Vector composites.
//!
//! `[ ... ]` in plain mode, real elements only. While the vector is open
//! the construct header doubles as the element counter, bumped through
//! validation; the close freezes the count into a trailing marker word
//! before the driver patches the real size in.

use slate_core::{
    ErrorCode, TokenInfo, TokenKind, Word, extract_lib, extract_size, is_prolog, make_call,
    make_prolog, object_words,
};

use crate::library::{
    CompileContext, CompileReply, DecompContext, DecompReply, Library, LibraryId, ObjectInfo,
    TokenAction, ValidateContext, ValidateReply,
};
use crate::well_known::{REAL_LIB, VECTOR_LIB};

pub struct VectorLib;

impl Library for VectorLib {
    fn id(&self) -> LibraryId {
        LibraryId::new(VECTOR_LIB)
    }

    fn name(&self) -> &'static str {
        "vector"
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode> {
        match ctx.token() {
            "[" => {
                ctx.emit(make_prolog(VECTOR_LIB, 0))?;
                Ok(CompileReply::action(TokenAction::StartConstruct))
            }
            "]" => {
                // Only closes a vector; a stray `]` is not ours to claim.
                let Some(header) = ctx.construct_word() else {
                    return Ok(CompileReply::NotMine);
                };
                if !is_prolog(header) || extract_lib(header) != VECTOR_LIB {
                    return Ok(CompileReply::NotMine);
                }
                let count = extract_size(header);
                ctx.emit(make_call(VECTOR_LIB, count))?;
                Ok(CompileReply::action(TokenAction::EndConstruct))
            }
            _ => Ok(CompileReply::NotMine),
        }
    }

    fn validate(&self, ctx: &ValidateContext<'_>) -> ValidateReply {
        let child = ctx.child();
        let is_real = child
            .first()
            .is_some_and(|w| is_prolog(*w) && extract_lib(*w) == REAL_LIB);
        if is_real {
            ValidateReply::IncArgCount
        } else {
            ValidateReply::Invalid
        }
    }

    fn get_info(&self, word: Word) -> Option<ObjectInfo> {
        let _ = word;
        Some(ObjectInfo::new(TokenInfo::new(1, TokenKind::Unknown, 0, 0)))
    }

    fn decompile(&self, ctx: &mut DecompContext<'_, '_>) -> Result<DecompReply, ErrorCode> {
        if !is_prolog(ctx.word()) {
            // The count marker never appears outside a vector body.
            return Ok(DecompReply::Invalid);
        }
        // Render the whole composite here, element by element through
        // embedded rendering; the last payload word is the count marker.
        let len = ctx.object().len();
        let start = ctx.pos();
        ctx.push('[');
        let mut pos = start + 1;
        while pos < start + len - 1 {
            ctx.push(' ');
            ctx.embed(pos)?;
            pos += object_words(ctx.object()[pos - start]);
        }
        ctx.push_str(" ]");
        Ok(DecompReply::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::Compiler;
    use crate::decompile::{DecompileOptions, Decompiler};
    use crate::heap::Heap;
    use crate::libs::register_standard;
    use crate::library::LibraryRegistry;
    use slate_core::extract_cmd;

    fn registry() -> LibraryRegistry {
        let mut reg = LibraryRegistry::new();
        register_standard(&mut reg);
        reg
    }

    #[test]
    fn element_count_lands_in_the_close_marker() {
        let reg = registry();
        let mut heap = Heap::new();
        let obj = Compiler::new(&reg)
            .compile(&mut heap, "[ 1 2 3 ]", false)
            .unwrap();
        let words = heap.object(obj);
        assert_eq!(extract_cmd(*words.last().unwrap()), 3);
        // prolog + 3 reals + marker
        assert_eq!(extract_size(words[0]), 10);
    }

    #[test]
    fn vectors_round_trip() {
        let reg = registry();
        let mut heap = Heap::new();
        let obj = Compiler::new(&reg)
            .compile(&mut heap, "[ 1 -2.5 3 ]", false)
            .unwrap();
        let dec = Decompiler::with_options(&reg, DecompileOptions::editing());
        assert_eq!(dec.decompile(heap.object(obj)).unwrap(), "[ 1 -2.5 3 ]");
    }

    #[test]
    fn non_real_element_is_rejected() {
        let reg = registry();
        let mut heap = Heap::new();
        let err = Compiler::new(&reg)
            .compile(&mut heap, "[ 1 A ]", false)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Syntax);
    }
}
