//! Program composites.
//!
//! `«`/`::` opens a program, `»`/`;` closes it with an end marker inside
//! the composite. The exit marker is only emitted by the driver after a
//! wrapped top-level compile. Programs accept any child object, and their
//! layout hints indent the body one step.

use slate_core::{
    ErrorCode, Hints, TokenInfo, Word, extract_cmd, extract_lib, is_prolog, make_call, make_prolog,
};

use crate::library::{
    CompileContext, CompileReply, DecompContext, DecompReply, Library, LibraryId, ObjectInfo,
    ProbeContext, ProbeReply, TokenAction,
};
use crate::well_known::PROG_LIB;

pub mod cmd {
    /// Closes the innermost program; lives inside the composite.
    pub const END: u16 = 0;
    /// Stops the outer interpreter loop; follows a wrapped compile.
    pub const EXIT: u16 = 1;
}

pub struct ProgLib;

impl Library for ProgLib {
    fn id(&self) -> LibraryId {
        LibraryId::new(PROG_LIB)
    }

    fn name(&self) -> &'static str {
        "prog"
    }

    fn probe(&self, ctx: &ProbeContext<'_>) -> ProbeReply {
        match ctx.text().chars().next() {
            Some('«' | '»' | ';') => ProbeReply::Match(TokenInfo::not_allowed(1)),
            Some(':') if ctx.text().starts_with("::") => {
                ProbeReply::Match(TokenInfo::not_allowed(2))
            }
            _ => ProbeReply::NoMatch,
        }
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode> {
        match ctx.token() {
            "«" | "::" => {
                ctx.emit(make_prolog(PROG_LIB, 0))?;
                Ok(CompileReply::action(TokenAction::StartConstruct))
            }
            "»" | ";" => {
                // Never closes someone else's construct; with nothing open
                // the driver raises the unbalanced-close error itself.
                if let Some(header) = ctx.construct_word()
                    && !(is_prolog(header) && extract_lib(header) == PROG_LIB)
                {
                    return Ok(CompileReply::NotMine);
                }
                ctx.emit(make_call(PROG_LIB, cmd::END))?;
                Ok(CompileReply::action(TokenAction::EndConstruct))
            }
            _ => Ok(CompileReply::NotMine),
        }
    }

    fn get_info(&self, word: Word) -> Option<ObjectInfo> {
        if is_prolog(word) {
            return Some(ObjectInfo::with_hints(
                TokenInfo::not_allowed(1),
                Hints::NL_AFTER | Hints::ADD_INDENT_AFTER,
            ));
        }
        match extract_cmd(word) {
            cmd::END => Some(ObjectInfo::with_hints(
                TokenInfo::not_allowed(1),
                Hints::NL_BEFORE | Hints::SUB_INDENT_BEFORE | Hints::NL_AFTER,
            )),
            cmd::EXIT => Some(ObjectInfo::new(TokenInfo::not_allowed(1))),
            _ => None,
        }
    }

    fn decompile(&self, ctx: &mut DecompContext<'_, '_>) -> Result<DecompReply, ErrorCode> {
        if is_prolog(ctx.word()) {
            ctx.push('«');
            return Ok(DecompReply::StartConstruct);
        }
        match ctx.cmd() {
            cmd::END => {
                ctx.push('»');
                Ok(DecompReply::EndConstruct)
            }
            // Nothing to show; the marker is machinery, not source.
            cmd::EXIT => Ok(DecompReply::Continue),
            _ => Ok(DecompReply::Invalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::Compiler;
    use crate::heap::Heap;
    use crate::libs::register_standard;
    use crate::library::LibraryRegistry;
    use slate_core::extract_size;

    fn registry() -> LibraryRegistry {
        let mut reg = LibraryRegistry::new();
        register_standard(&mut reg);
        reg
    }

    #[test]
    fn both_spellings_open_and_close() {
        let reg = registry();
        let mut heap = Heap::new();
        let a = Compiler::new(&reg).compile(&mut heap, "« 1 »", false).unwrap();
        let b = Compiler::new(&reg).compile(&mut heap, ":: 1 ;", false).unwrap();
        assert_eq!(heap.object(a).to_vec(), heap.object(b).to_vec());
    }

    #[test]
    fn close_patches_the_size_with_the_marker_inside() {
        let reg = registry();
        let mut heap = Heap::new();
        let obj = Compiler::new(&reg).compile(&mut heap, ":: 1 ;", false).unwrap();
        let words = heap.object(obj);
        // prolog + real(3) + end marker
        assert_eq!(extract_size(words[0]), 4);
        assert_eq!(*words.last().unwrap(), make_call(PROG_LIB, cmd::END));
    }

    #[test]
    fn close_without_open_is_end_without_start() {
        let reg = registry();
        let mut heap = Heap::new();
        let err = Compiler::new(&reg).compile(&mut heap, "1 ;", false).unwrap_err();
        assert_eq!(err.code, ErrorCode::EndWithoutStart);
    }
}
