//! Library ids the drivers and standard libraries agree on.
//!
//! The numeric order matters: it is the scan priority. Numbers resolve
//! before symbolic punctuation, punctuation before operators, operators
//! before identifiers.

pub const IDENT_LIB: u16 = 6;
pub const PROG_LIB: u16 = 8;
pub const LIST_LIB: u16 = 12;
pub const VECTOR_LIB: u16 = 14;
pub const STRING_LIB: u16 = 16;
pub const ARITH_LIB: u16 = 64;
pub const SYMB_LIB: u16 = 72;
pub const REAL_LIB: u16 = 88;
