//! String objects.
//!
//! Layout: prolog, byte count, then the text four bytes per word,
//! zero-padded. A string with blanks in it arrives as several tokens; the
//! partial object itself carries the accumulation state, and the library
//! holds the forced-continuation slot until the closing quote shows up.
//! The blank run between continuation tokens is part of the text.

use slate_core::{ErrorCode, TokenInfo, Word, extract_lib, is_prolog, make_prolog};

use crate::library::{
    CompileContext, CompileReply, DecompContext, DecompReply, Library, LibraryId, ObjectInfo,
    ProbeContext, ProbeReply, TokenAction,
};
use crate::well_known::STRING_LIB;

/// Appends text to the partially built string at `start`, packing bytes
/// into the trailing word and keeping the byte count current.
fn append_text(ctx: &mut CompileContext<'_>, start: usize, text: &str) -> Result<(), ErrorCode> {
    let mut count = ctx.word(start + 1) as usize;
    for byte in text.bytes() {
        let idx = start + 2 + count / 4;
        if idx == ctx.cursor() {
            ctx.emit(0)?;
        }
        let word = ctx.word(idx) | ((byte as Word) << (8 * (count % 4)));
        ctx.set_word(idx, word);
        count += 1;
    }
    ctx.set_word(start + 1, count as Word);
    Ok(())
}

pub struct StringLib;

impl Library for StringLib {
    fn id(&self) -> LibraryId {
        LibraryId::new(STRING_LIB)
    }

    fn name(&self) -> &'static str {
        "string"
    }

    fn probe(&self, ctx: &ProbeContext<'_>) -> ProbeReply {
        if ctx.text().starts_with('"') {
            ProbeReply::Match(TokenInfo::not_allowed(1))
        } else {
            ProbeReply::NoMatch
        }
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode> {
        let token = ctx.token();
        if !token.starts_with('"') {
            return Ok(CompileReply::NotMine);
        }
        let rest = &token[1..];
        let start = ctx.cursor();
        match rest.find('"') {
            Some(quote) => {
                // Opens and closes within one token.
                ctx.emit(make_prolog(STRING_LIB, 0))?;
                ctx.emit(0)?;
                append_text(ctx, start, &rest[..quote])?;
                let size = ctx.cursor() - start - 1;
                ctx.set_word(start, make_prolog(STRING_LIB, size as u16));
                let consumed = 2 + rest[..quote].chars().count();
                if consumed < token.chars().count() {
                    Ok(CompileReply::ok_split(consumed))
                } else {
                    Ok(CompileReply::ok())
                }
            }
            None => {
                ctx.emit(make_prolog(STRING_LIB, 0))?;
                ctx.emit(0)?;
                append_text(ctx, start, rest)?;
                Ok(CompileReply::action(TokenAction::NeedMoreStartConstruct))
            }
        }
    }

    fn compile_continue(&self, ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode> {
        let Some(start) = ctx.construct_start() else {
            return Err(ErrorCode::Syntax);
        };
        let gap = ctx.gap();
        let token = ctx.token();
        append_text(ctx, start, gap)?;
        match token.find('"') {
            Some(quote) => {
                append_text(ctx, start, &token[..quote])?;
                let consumed = token[..quote].chars().count() + 1;
                if consumed < token.chars().count() {
                    Ok(CompileReply::action_split(TokenAction::EndConstruct, consumed))
                } else {
                    Ok(CompileReply::action(TokenAction::EndConstruct))
                }
            }
            None => {
                append_text(ctx, start, token)?;
                Ok(CompileReply::action(TokenAction::NeedMore))
            }
        }
    }

    fn get_info(&self, word: Word) -> Option<ObjectInfo> {
        if is_prolog(word) && extract_lib(word) == STRING_LIB {
            Some(ObjectInfo::new(TokenInfo::not_allowed(1)))
        } else {
            None
        }
    }

    fn decompile(&self, ctx: &mut DecompContext<'_, '_>) -> Result<DecompReply, ErrorCode> {
        let object = ctx.object();
        if object.len() < 2 {
            return Ok(DecompReply::Invalid);
        }
        let count = object[1] as usize;
        let mut bytes = Vec::with_capacity(count);
        for i in 0..count {
            let word = object.get(2 + i / 4).copied().unwrap_or(0);
            bytes.push((word >> (8 * (i % 4))) as u8);
        }
        let text = String::from_utf8_lossy(&bytes);
        if ctx.edit() {
            ctx.push('"');
            ctx.push_str(&text);
            ctx.push('"');
        } else {
            ctx.push_str(&text);
        }
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

    fn registry() -> LibraryRegistry {
        let mut reg = LibraryRegistry::new();
        register_standard(&mut reg);
        reg
    }

    #[test]
    fn single_token_string_compiles_whole() {
        let reg = registry();
        let mut heap = Heap::new();
        let obj = Compiler::new(&reg).compile(&mut heap, "\"abc\"", false).unwrap();
        let dec = Decompiler::with_options(&reg, DecompileOptions::editing());
        assert_eq!(dec.decompile(heap.object(obj)).unwrap(), "\"abc\"");
    }

    #[test]
    fn blanks_inside_a_string_are_preserved() {
        let reg = registry();
        let mut heap = Heap::new();
        let obj = Compiler::new(&reg)
            .compile(&mut heap, "\"one  two\"", false)
            .unwrap();
        let dec = Decompiler::new(&reg);
        assert_eq!(dec.decompile(heap.object(obj)).unwrap(), "one  two");
    }

    #[test]
    fn unterminated_string_is_start_without_end() {
        let reg = registry();
        let mut heap = Heap::new();
        let err = Compiler::new(&reg)
            .compile(&mut heap, "\"no end", false)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StartWithoutEnd);
    }

    #[test]
    fn text_after_the_close_is_rescanned() {
        let reg = registry();
        let mut heap = Heap::new();
        let obj = Compiler::new(&reg)
            .compile(&mut heap, ":: \"a\"B ;", true)
            .unwrap();
        let dec = Decompiler::with_options(&reg, DecompileOptions::editing());
        // Wrap mode nests the written program inside the outer one.
        assert_eq!(dec.decompile(heap.object(obj)).unwrap(), "« « \"a\" B » »");
    }
}
