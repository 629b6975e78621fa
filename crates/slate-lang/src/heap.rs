//! The relocatable object heap.
//!
//! Compiled objects live in one growable word arena. Everything that refers
//! into the arena does so by index, so the backing storage is free to move
//! when it grows. The region below `end` holds committed objects tracked by
//! the block registry; the region above it is the compile cursor, abandoned
//! on failure and committed as one block on success.

use slate_core::{ErrorCode, Word, object_words};

/// Handle to a committed object. Indices survive arena growth.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ObjRef {
    start: usize,
}

impl ObjRef {
    pub const fn start(self) -> usize {
        self.start
    }
}

/// Growable word arena with a committed/working split and an optional
/// hard word limit that surfaces as [`ErrorCode::OutOfMemory`].
#[derive(Debug)]
pub struct Heap {
    words: Vec<Word>,
    end: usize,
    blocks: Vec<usize>,
    limit: usize,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Self { words: Vec::new(), end: 0, blocks: Vec::new(), limit: usize::MAX }
    }

    /// Pre-grown arena. Purely a capacity hint; results never depend on it.
    pub fn with_capacity(words: usize) -> Self {
        Self { words: Vec::with_capacity(words), end: 0, blocks: Vec::new(), limit: usize::MAX }
    }

    /// Arena that refuses to grow past `limit` words.
    pub fn with_limit(limit: usize) -> Self {
        Self { words: Vec::new(), end: 0, blocks: Vec::new(), limit }
    }

    /// Current cursor: one past the last written word.
    pub fn cursor(&self) -> usize {
        self.words.len()
    }

    /// End of the committed region.
    pub fn committed_end(&self) -> usize {
        self.end
    }

    pub fn word(&self, pos: usize) -> Word {
        self.words[pos]
    }

    pub fn set(&mut self, pos: usize, word: Word) {
        self.words[pos] = word;
    }

    pub fn slice(&self, start: usize, end: usize) -> &[Word] {
        &self.words[start..end]
    }

    pub fn append(&mut self, word: Word) -> Result<(), ErrorCode> {
        if self.words.len() >= self.limit {
            return Err(ErrorCode::OutOfMemory);
        }
        self.words.push(word);
        Ok(())
    }

    /// Opens a gap of `count` zero words at `pos`, shifting the tail up.
    pub fn insert_blank(&mut self, pos: usize, count: usize) -> Result<(), ErrorCode> {
        if self.words.len() + count > self.limit {
            return Err(ErrorCode::OutOfMemory);
        }
        self.words.splice(pos..pos, std::iter::repeat_n(0, count));
        Ok(())
    }

    /// Rotates `[start, end)` left by `by` words, moving the leading words
    /// to the back of the range.
    pub fn rotate_left(&mut self, start: usize, end: usize, by: usize) {
        self.words[start..end].rotate_left(by);
    }

    /// Drops everything at and above `pos`. Never crosses the committed end.
    pub fn truncate(&mut self, pos: usize) {
        debug_assert!(pos >= self.end);
        self.words.truncate(pos);
    }

    /// Discards the uncommitted tail.
    pub fn abandon(&mut self) {
        self.words.truncate(self.end);
    }

    /// Registers `[start, cursor)` as one committed block.
    pub fn commit(&mut self, start: usize) -> ObjRef {
        debug_assert!(start >= self.end && start < self.words.len());
        self.blocks.push(start);
        self.end = self.words.len();
        ObjRef { start }
    }

    pub fn blocks(&self) -> &[usize] {
        &self.blocks
    }

    /// Index just past the object starting at `pos`.
    pub fn skip(&self, pos: usize) -> usize {
        pos + object_words(self.words[pos])
    }

    /// The words of the object a handle points at, prolog included.
    pub fn object(&self, obj: ObjRef) -> &[Word] {
        &self.words[obj.start..self.skip(obj.start)]
    }

    /// Start positions of the whole objects packed in `[start, end)`.
    pub fn object_starts(&self, start: usize, end: usize) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut pos = start;
        while pos < end {
            starts.push(pos);
            pos = self.skip(pos);
        }
        starts
    }
}
