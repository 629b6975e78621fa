//! Arithmetic operators and elementary functions.
//!
//! In plain mode these are ordinary commands matched against the whole
//! token. In infix mode the probe claims operator symbols and function
//! names character-precisely, and the compiled call words are routed
//! through the operator stack by the driver.

use slate_core::{ErrorCode, TokenInfo, Word, extract_cmd, is_prolog, make_call};

use crate::library::{
    CompileContext, CompileReply, DecompContext, DecompReply, Library, LibraryId, ObjectInfo,
    ProbeContext, ProbeReply,
};
use crate::well_known::ARITH_LIB;

/// Precedence of the unary sign operators.
pub const UNARY_PRECEDENCE: u8 = 4;

const FUNCTION_PRECEDENCE: u8 = 4;
const POW_PRECEDENCE: u8 = 6;
const MULDIV_PRECEDENCE: u8 = 8;
const ADDSUB_PRECEDENCE: u8 = 10;
const COMPARE_PRECEDENCE: u8 = 12;
const FACT_PRECEDENCE: u8 = 3;

pub mod cmd {
    use super::*;

    pub const ADD: u16 = 0;
    pub const SUB: u16 = 1;
    pub const MUL: u16 = 2;
    pub const DIV: u16 = 3;
    pub const POW: u16 = 4;
    pub const EQ: u16 = 5;
    pub const NE: u16 = 6;
    pub const LT: u16 = 7;
    pub const GT: u16 = 8;
    pub const LE: u16 = 9;
    pub const GE: u16 = 10;
    pub const UMINUS: u16 = 11;
    pub const UPLUS: u16 = 12;
    pub const FACT: u16 = 13;
    pub const INV: u16 = 14;
    pub const SIN: u16 = 15;
    pub const COS: u16 = 16;
    pub const TAN: u16 = 17;
    pub const EXP: u16 = 18;
    pub const LN: u16 = 19;
    pub const SQRT: u16 = 20;
    pub const ABS: u16 = 21;
    pub const MIN: u16 = 22;
    pub const MAX: u16 = 23;
    pub const MOD: u16 = 24;

    pub const fn add_word() -> Word {
        make_call(ARITH_LIB, ADD)
    }

    pub const fn sub_word() -> Word {
        make_call(ARITH_LIB, SUB)
    }

    pub const fn mul_word() -> Word {
        make_call(ARITH_LIB, MUL)
    }

    pub const fn div_word() -> Word {
        make_call(ARITH_LIB, DIV)
    }

    pub const fn pow_word() -> Word {
        make_call(ARITH_LIB, POW)
    }

    pub const fn uminus_word() -> Word {
        make_call(ARITH_LIB, UMINUS)
    }

    pub const fn uplus_word() -> Word {
        make_call(ARITH_LIB, UPLUS)
    }

    pub const fn inv_word() -> Word {
        make_call(ARITH_LIB, INV)
    }
}

/// The command table: command number, canonical spelling, classification.
const TABLE: &[(u16, &str, TokenInfo)] = &[
    // Two-character symbols go first so probes claim the longest form.
    (cmd::EQ, "==", TokenInfo::binary_left(2, COMPARE_PRECEDENCE)),
    (cmd::NE, "!=", TokenInfo::binary_left(2, COMPARE_PRECEDENCE)),
    (cmd::LE, "<=", TokenInfo::binary_left(2, COMPARE_PRECEDENCE)),
    (cmd::GE, ">=", TokenInfo::binary_left(2, COMPARE_PRECEDENCE)),
    (cmd::ADD, "+", TokenInfo::binary_left(1, ADDSUB_PRECEDENCE)),
    (cmd::SUB, "-", TokenInfo::binary_left(1, ADDSUB_PRECEDENCE)),
    (cmd::MUL, "*", TokenInfo::binary_left(1, MULDIV_PRECEDENCE)),
    (cmd::DIV, "/", TokenInfo::binary_left(1, MULDIV_PRECEDENCE)),
    (cmd::POW, "^", TokenInfo::binary_right(1, POW_PRECEDENCE)),
    (cmd::LT, "<", TokenInfo::binary_left(1, COMPARE_PRECEDENCE)),
    (cmd::GT, ">", TokenInfo::binary_left(1, COMPARE_PRECEDENCE)),
    (cmd::FACT, "!", TokenInfo::postfix(1, FACT_PRECEDENCE)),
    (cmd::UMINUS, "-", TokenInfo::prefix(1, UNARY_PRECEDENCE)),
    (cmd::UPLUS, "+", TokenInfo::prefix(1, UNARY_PRECEDENCE)),
    (cmd::SIN, "SIN", TokenInfo::function(3, 1, FUNCTION_PRECEDENCE)),
    (cmd::COS, "COS", TokenInfo::function(3, 1, FUNCTION_PRECEDENCE)),
    (cmd::TAN, "TAN", TokenInfo::function(3, 1, FUNCTION_PRECEDENCE)),
    (cmd::EXP, "EXP", TokenInfo::function(3, 1, FUNCTION_PRECEDENCE)),
    (cmd::LN, "LN", TokenInfo::function(2, 1, FUNCTION_PRECEDENCE)),
    (cmd::SQRT, "SQRT", TokenInfo::function(4, 1, FUNCTION_PRECEDENCE)),
    (cmd::ABS, "ABS", TokenInfo::function(3, 1, FUNCTION_PRECEDENCE)),
    (cmd::INV, "INV", TokenInfo::function(3, 1, FUNCTION_PRECEDENCE)),
    (cmd::MIN, "MIN", TokenInfo::function(3, 2, FUNCTION_PRECEDENCE)),
    (cmd::MAX, "MAX", TokenInfo::function(3, 2, FUNCTION_PRECEDENCE)),
    (cmd::MOD, "MOD", TokenInfo::function(3, 2, FUNCTION_PRECEDENCE)),
];

fn by_cmd(command: u16) -> Option<&'static (u16, &'static str, TokenInfo)> {
    TABLE.iter().find(|(c, _, _)| *c == command)
}

/// Exact, case-insensitive match of a whole token.
fn by_name(token: &str) -> Option<&'static (u16, &'static str, TokenInfo)> {
    TABLE
        .iter()
        .find(|(_, name, _)| name.eq_ignore_ascii_case(token))
}

pub struct ArithLib;

impl Library for ArithLib {
    fn id(&self) -> LibraryId {
        LibraryId::new(ARITH_LIB)
    }

    fn name(&self) -> &'static str {
        "arith"
    }

    fn probe(&self, ctx: &ProbeContext<'_>) -> ProbeReply {
        let text = ctx.text();
        for (_, sym, info) in TABLE {
            if !sym.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && text.starts_with(sym)
            {
                return ProbeReply::Match(*info);
            }
        }
        // A leading alphabetic run can be a function name; tie-length
        // claims are resolved by scan order, so a name that is also a
        // valid identifier goes to whichever library comes first.
        let run: String = text.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        if let Some((_, _, info)) = by_name(&run) {
            return ProbeReply::Match(*info);
        }
        ProbeReply::NoMatch
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<CompileReply, ErrorCode> {
        let token = ctx.token();
        let entry = TABLE
            .iter()
            .find(|(_, sym, _)| *sym == token)
            .or_else(|| by_name(token));
        match entry {
            Some((command, _, _)) => {
                ctx.emit(make_call(ARITH_LIB, *command))?;
                Ok(CompileReply::ok())
            }
            None => Ok(CompileReply::NotMine),
        }
    }

    fn get_info(&self, word: Word) -> Option<ObjectInfo> {
        if is_prolog(word) {
            return None;
        }
        by_cmd(extract_cmd(word)).map(|(_, _, info)| ObjectInfo::new(*info))
    }

    fn decompile(&self, ctx: &mut DecompContext<'_, '_>) -> Result<DecompReply, ErrorCode> {
        match by_cmd(ctx.cmd()) {
            Some((_, sym, _)) => {
                ctx.push_str(sym);
                Ok(DecompReply::Continue)
            }
            None => Ok(DecompReply::Invalid),
        }
    }
}
