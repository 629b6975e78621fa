//! List composites.
//!
//! `{ ... }` in plain mode; any object can be an element. Inside an
//! expression the braces belong to the symbolic library instead, so this
//! library never probes.

use slate_core::{
    ErrorCode, TokenInfo, TokenKind, Word, extract_cmd, extract_lib, is_prolog, make_call,
    make_prolog,
};

use crate::library::{
    CompileContext, CompileReply, DecompContext, DecompReply, Library, LibraryId, ObjectInfo,
    TokenAction,
};
use crate::well_known::LIST_LIB;

pub mod cmd {
    /// Closes the innermost list; lives inside the composite.
    pub const END: u16 = 0;
}

pub struct ListLib;

impl Library for ListLib {
    fn id(&self) -> LibraryId {
        LibraryId::new(LIST_LIB)
    }

    fn name(&self) -> &'static str {
        "list"
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode> {
        match ctx.token() {
            "{" => {
                ctx.emit(make_prolog(LIST_LIB, 0))?;
                Ok(CompileReply::action(TokenAction::StartConstruct))
            }
            "}" => {
                // Only closes a list.
                match ctx.construct_word() {
                    Some(header) if is_prolog(header) && extract_lib(header) == LIST_LIB => {}
                    _ => return Ok(CompileReply::NotMine),
                }
                ctx.emit(make_call(LIST_LIB, cmd::END))?;
                Ok(CompileReply::action(TokenAction::EndConstruct))
            }
            _ => Ok(CompileReply::NotMine),
        }
    }

    fn get_info(&self, word: Word) -> Option<ObjectInfo> {
        let _ = word;
        Some(ObjectInfo::new(TokenInfo::new(1, TokenKind::Unknown, 0, 0)))
    }

    fn decompile(&self, ctx: &mut DecompContext<'_, '_>) -> Result<DecompReply, ErrorCode> {
        if is_prolog(ctx.word()) {
            ctx.push('{');
            return Ok(DecompReply::StartConstruct);
        }
        match extract_cmd(ctx.word()) {
            cmd::END => {
                ctx.push('}');
                Ok(DecompReply::EndConstruct)
            }
            _ => Ok(DecompReply::Invalid),
        }
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

    fn registry() -> LibraryRegistry {
        let mut reg = LibraryRegistry::new();
        register_standard(&mut reg);
        reg
    }

    #[test]
    fn lists_nest_and_round_trip() {
        let reg = registry();
        let mut heap = Heap::new();
        let obj = Compiler::new(&reg)
            .compile(&mut heap, "{ 1 { A } \"s\" }", false)
            .unwrap();
        let dec = Decompiler::with_options(&reg, DecompileOptions::editing());
        assert_eq!(dec.decompile(heap.object(obj)).unwrap(), "{ 1 { A } \"s\" }");
    }

    #[test]
    fn unclosed_list_is_start_without_end() {
        let reg = registry();
        let mut heap = Heap::new();
        let err = Compiler::new(&reg).compile(&mut heap, "{ 1 2", false).unwrap_err();
        assert_eq!(err.code, ErrorCode::StartWithoutEnd);
    }
}
