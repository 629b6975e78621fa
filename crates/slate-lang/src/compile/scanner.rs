//! Blank-delimited token scanner.
//!
//! Tokenization is deliberately dumb: tokens are maximal runs of non-blank
//! characters. Libraries refine the boundaries afterwards through the
//! split-token replies and probe truncation.

use slate_core::Span;

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

/// Yields `(gap, token)` span pairs over the source. The gap is the blank
/// run separating the token from its predecessor.
pub struct Scanner<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Scanner<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn text(&self, span: Span) -> &'s str {
        &self.src[span.start().offset() as usize..span.end().offset() as usize]
    }

    pub fn next_token(&mut self) -> Option<(Span, Span)> {
        let gap_start = self.pos;
        let rest = &self.src[self.pos..];
        let start = self.pos + rest.find(|c| !is_blank(c))?;
        let after = &self.src[start..];
        let end = after
            .find(is_blank)
            .map(|i| start + i)
            .unwrap_or(self.src.len());
        self.pos = end;
        Some((Span::of_range(gap_start, start), Span::of_range(start, end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blanks() {
        let mut sc = Scanner::new("  1\t2\n+ ");
        let toks: Vec<&str> = std::iter::from_fn(|| sc.next_token())
            .map(|(_, t)| Scanner::new("  1\t2\n+ ").text(t))
            .collect();
        assert_eq!(toks, vec!["1", "2", "+"]);
    }

    #[test]
    fn reports_gap_spans() {
        let src = "a  b";
        let mut sc = Scanner::new(src);
        let (gap, tok) = sc.next_token().unwrap();
        assert_eq!(sc.text(gap), "");
        assert_eq!(sc.text(tok), "a");
        let (gap, tok) = sc.next_token().unwrap();
        assert_eq!(sc.text(gap), "  ");
        assert_eq!(sc.text(tok), "b");
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut sc = Scanner::new("   \n\t");
        assert!(sc.next_token().is_none());
    }
}
