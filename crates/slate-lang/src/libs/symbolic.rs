//! Symbolic expressions: the `'...'` quote, expression brackets and the
//! argument separator.
//!
//! The quote opens a symbolic composite and flips the compiler into infix
//! mode; from then on this library claims the punctuation that shapes the
//! expression tree. Bracket pairs sit on adjacent command numbers so a
//! close form is always `open + 1`.

use slate_core::{
    ErrorCode, TokenInfo, TokenKind, VARIADIC, Word, extract_cmd, is_prolog, make_call,
    make_prolog,
};

use crate::library::{
    CompileContext, CompileReply, DecompContext, DecompReply, Library, LibraryId, ObjectInfo,
    ProbeContext, ProbeReply, TokenAction,
};
use crate::well_known::SYMB_LIB;

/// Precedence of a call through a computed name.
pub const FUNCEVAL_PRECEDENCE: u8 = 2;

/// Brackets bind nothing themselves; they delimit.
const BRACKET_PRECEDENCE: u8 = 31;

pub mod cmd {
    use super::*;

    /// Call through a computed name; the name travels as the last argument.
    pub const FUNCEVAL: u16 = 0;
    pub const COMMA: u16 = 1;
    pub const OPEN_PAREN: u16 = 4;
    pub const CLOSE_PAREN: u16 = 5;
    /// `[ ... ]`, a vector built inside an expression.
    pub const OPEN_IDX: u16 = 6;
    pub const CLOSE_IDX: u16 = 7;
    /// `{ ... }`, a list built inside an expression.
    pub const OPEN_LIST: u16 = 8;
    pub const CLOSE_LIST: u16 = 9;
    /// `⟨ ... }`, a C-list; closed by the plain list close.
    pub const OPEN_CLIST: u16 = 10;
    pub const CLOSE_CLIST: u16 = 11;

    pub const fn funceval_word() -> Word {
        make_call(SYMB_LIB, FUNCEVAL)
    }

    pub const fn open_paren_word() -> Word {
        make_call(SYMB_LIB, OPEN_PAREN)
    }

    pub const fn close_paren_word() -> Word {
        make_call(SYMB_LIB, CLOSE_PAREN)
    }

    pub const fn open_clist_word() -> Word {
        make_call(SYMB_LIB, OPEN_CLIST)
    }

    pub const fn close_list_word() -> Word {
        make_call(SYMB_LIB, CLOSE_LIST)
    }
}

fn bracket_char(command: u16) -> Option<char> {
    Some(match command {
        cmd::OPEN_PAREN => '(',
        cmd::CLOSE_PAREN => ')',
        cmd::OPEN_IDX => '[',
        cmd::CLOSE_IDX => ']',
        cmd::OPEN_LIST => '{',
        cmd::CLOSE_LIST => '}',
        cmd::OPEN_CLIST => '⟨',
        cmd::CLOSE_CLIST => '}',
        _ => return None,
    })
}

fn punct_command(ch: char) -> Option<(u16, TokenInfo)> {
    Some(match ch {
        '(' => (cmd::OPEN_PAREN, bracket_info(TokenKind::OpenBracket)),
        ')' => (cmd::CLOSE_PAREN, bracket_info(TokenKind::CloseBracket)),
        '[' => (cmd::OPEN_IDX, bracket_info(TokenKind::OpenBracket)),
        ']' => (cmd::CLOSE_IDX, bracket_info(TokenKind::CloseBracket)),
        '{' => (cmd::OPEN_LIST, bracket_info(TokenKind::OpenBracket)),
        '}' => (cmd::CLOSE_LIST, bracket_info(TokenKind::CloseBracket)),
        '⟨' => (cmd::OPEN_CLIST, bracket_info(TokenKind::OpenBracket)),
        '⟩' => (cmd::CLOSE_CLIST, bracket_info(TokenKind::CloseBracket)),
        ',' => (cmd::COMMA, TokenInfo::comma()),
        _ => return None,
    })
}

const fn bracket_info(kind: TokenKind) -> TokenInfo {
    TokenInfo::new(1, kind, 0, BRACKET_PRECEDENCE)
}

pub struct SymbolicLib;

impl Library for SymbolicLib {
    fn id(&self) -> LibraryId {
        LibraryId::new(SYMB_LIB)
    }

    fn name(&self) -> &'static str {
        "symbolic"
    }

    fn probe(&self, ctx: &ProbeContext<'_>) -> ProbeReply {
        let Some(first) = ctx.text().chars().next() else {
            return ProbeReply::NoMatch;
        };
        if first == '\'' {
            return ProbeReply::EndExpression { consumed: 1 };
        }
        match punct_command(first) {
            Some((_, info)) => ProbeReply::Match(info),
            None => ProbeReply::NoMatch,
        }
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode> {
        let text = ctx.token();
        if ctx.in_infix() {
            // The driver hands over exactly the probe-claimed punctuation.
            let Some((command, _)) = text.chars().next().and_then(punct_command) else {
                return Ok(CompileReply::NotMine);
            };
            ctx.emit(make_call(SYMB_LIB, command))?;
            return Ok(CompileReply::ok());
        }
        if !text.starts_with('\'') {
            return Ok(CompileReply::NotMine);
        }
        ctx.emit(make_prolog(SYMB_LIB, 0))?;
        if text.chars().count() > 1 {
            Ok(CompileReply::action_split(TokenAction::StartConstructInfix, 1))
        } else {
            Ok(CompileReply::action(TokenAction::StartConstructInfix))
        }
    }

    fn get_info(&self, word: Word) -> Option<ObjectInfo> {
        if is_prolog(word) {
            return Some(ObjectInfo::new(TokenInfo::new(1, TokenKind::Unknown, 0, 0)));
        }
        let token = match extract_cmd(word) {
            cmd::FUNCEVAL => {
                TokenInfo::new(1, TokenKind::CustomFunction, VARIADIC, FUNCEVAL_PRECEDENCE)
            }
            cmd::COMMA => TokenInfo::comma(),
            c => match bracket_char(c)? {
                '(' | '[' | '{' | '⟨' => bracket_info(TokenKind::OpenBracket),
                _ => bracket_info(TokenKind::CloseBracket),
            },
        };
        Some(ObjectInfo::new(token))
    }

    fn decompile(&self, ctx: &mut DecompContext<'_, '_>) -> Result<DecompReply, ErrorCode> {
        let word = ctx.word();
        if is_prolog(word) {
            return Ok(DecompReply::StartConstructInfix);
        }
        match extract_cmd(word) {
            // The driver renders the callee name itself.
            cmd::FUNCEVAL => {}
            cmd::COMMA => ctx.push(','),
            c => match bracket_char(c) {
                Some(ch) => ctx.push(ch),
                None => return Ok(DecompReply::Invalid),
            },
        }
        Ok(DecompReply::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_probe_ends_the_expression() {
        let lib = SymbolicLib;
        assert_eq!(
            lib.probe(&ProbeContext::new("'")),
            ProbeReply::EndExpression { consumed: 1 }
        );
    }

    #[test]
    fn bracket_pairs_sit_on_adjacent_commands() {
        assert_eq!(cmd::OPEN_PAREN + 1, cmd::CLOSE_PAREN);
        assert_eq!(cmd::OPEN_IDX + 1, cmd::CLOSE_IDX);
        assert_eq!(cmd::OPEN_LIST + 1, cmd::CLOSE_LIST);
        assert_eq!(cmd::OPEN_CLIST + 1, cmd::CLOSE_CLIST);
    }

    #[test]
    fn punctuation_probe_classifies_brackets() {
        let lib = SymbolicLib;
        let ProbeReply::Match(info) = lib.probe(&ProbeContext::new("(1+2)")) else {
            panic!("expected a claim");
        };
        assert_eq!(info.len(), 1);
        assert_eq!(info.kind(), TokenKind::OpenBracket);
    }
}
