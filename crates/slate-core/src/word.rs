//! The 32-bit word encoding shared by compiled objects and opcodes.
//!
//! Every compiled entity is a sequence of words. A word is either a
//! *prolog* (bit 31 set) that opens a sized composite object, or a *call*
//! (bit 31 clear) that names a single command of a library. Both carry the
//! owning library id in bits 16..31; the low 16 bits hold the payload size
//! in words (prolog) or the command number (call).

/// A single 32-bit unit of compiled code.
pub type Word = u32;

/// Set on prolog words, clear on call words.
pub const PROLOG_BIT: Word = 1 << 31;

const LIB_SHIFT: u32 = 16;
const LIB_MASK: Word = 0x7FFF;
const LOW_MASK: Word = 0xFFFF;

/// Largest payload size (in words) a prolog can describe.
pub const MAX_OBJECT_SIZE: usize = LOW_MASK as usize;

/// Builds a prolog word introducing a composite of `size` payload words.
pub const fn make_prolog(lib: u16, size: u16) -> Word {
    PROLOG_BIT | ((lib as Word & LIB_MASK) << LIB_SHIFT) | size as Word
}

/// Builds a call word for command `cmd` of library `lib`.
pub const fn make_call(lib: u16, cmd: u16) -> Word {
    ((lib as Word & LIB_MASK) << LIB_SHIFT) | cmd as Word
}

/// True when the word opens a sized composite.
pub const fn is_prolog(word: Word) -> bool {
    word & PROLOG_BIT != 0
}

/// The library id carried in bits 16..31.
pub const fn extract_lib(word: Word) -> u16 {
    ((word >> LIB_SHIFT) & LIB_MASK) as u16
}

/// The payload size of a prolog word, in words.
pub const fn extract_size(word: Word) -> u16 {
    (word & LOW_MASK) as u16
}

/// The command number of a call word.
pub const fn extract_cmd(word: Word) -> u16 {
    (word & LOW_MASK) as u16
}

/// Replaces the low 16 bits of `word` with `size`.
pub const fn with_size(word: Word, size: u16) -> Word {
    (word & !LOW_MASK) | size as Word
}

/// Number of words occupied by the object starting at `word`: a prolog
/// covers itself plus its payload, a call word stands alone.
pub const fn object_words(word: Word) -> usize {
    if is_prolog(word) {
        1 + extract_size(word) as usize
    } else {
        1
    }
}

/// Index just past the object starting at `pos`.
pub fn skip_object(code: &[Word], pos: usize) -> usize {
    pos + object_words(code[pos])
}
