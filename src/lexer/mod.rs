use std::fmt;

use miette::Result;

use crate::error;
use crate::lexer::cursor::Cursor;
use crate::symbol::{Span, SrcOffset};

pub mod cursor;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// Mnemonic, register name or label reference
    Ident,
    /// Label definition marker
    Colon,
    /// Decimal or `0x` hex literal, already parsed
    Lit(i32),
    /// Ends a statement
    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Ident => "identifier",
            TokenKind::Colon => "colon",
            TokenKind::Lit(_) => "numeric literal",
            TokenKind::Newline => "end of line",
            TokenKind::Eof => "end of file",
        };
        f.write_str(name)
    }
}

/// Test if a character separates tokens within a line.
pub(crate) fn is_whitespace(c: char) -> bool {
    // Commas are only separators
    matches!(c, ' ' | '\t' | '\r' | ',')
}

/// Test if a character may appear inside an identifier.
pub(crate) fn is_id(c: char) -> bool {
    is_id_start(c) || matches!(c, '0'..='9' | '-')
}

// A leading `-` is a negative literal
fn is_id_start(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_' | '.' | '$' | '@')
}

/// Split source into tokens. Whitespace, commas and comments are dropped; newlines are kept
/// since every statement occupies one line.
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let mut cur = Cursor::new(src);
    let mut toks = Vec::new();
    loop {
        if let Some(tok) = cur.advance_token(src)? {
            toks.push(tok);
            if tok.kind == TokenKind::Eof {
                return Ok(toks);
            }
        }
    }
}

impl Cursor<'_> {
    /// Lex one token. Trivia (whitespace and comments) yields `None`.
    pub fn advance_token(&mut self, src: &str) -> Result<Option<Token>> {
        let start = self.token_start();
        let Some(first_char) = self.bump() else {
            return Ok(Some(Token {
                kind: TokenKind::Eof,
                span: Span::new(SrcOffset(start), 0),
            }));
        };
        let kind = match first_char {
            ';' => {
                self.take_while(|c| c != '\n');
                None
            }
            c if is_whitespace(c) => {
                self.take_while(is_whitespace);
                None
            }
            '\n' => Some(TokenKind::Newline),
            ':' => Some(TokenKind::Colon),
            c if is_id_start(c) => {
                self.take_while(is_id);
                Some(TokenKind::Ident)
            }
            '0'..='9' => {
                self.take_while(is_id);
                Some(self.literal(src, start)?)
            }
            '-' if self.first().is_ascii_digit() => {
                self.take_while(is_id);
                Some(self.literal(src, start)?)
            }
            _ => {
                let span = Span::new(SrcOffset(start), first_char.len_utf8());
                return Err(error::lex_unknown(span, src));
            }
        };
        let len = self.pos_in_token();
        self.reset_pos();
        Ok(kind.map(|kind| Token {
            kind,
            span: Span::new(SrcOffset(start), len),
        }))
    }

    fn literal(&self, src: &str, start: usize) -> Result<TokenKind> {
        let span = Span::new(SrcOffset(start), self.pos_in_token());
        let text = &src[span.offs()..span.end()];
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let parsed = match digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            Some(hex) => i32::from_str_radix(hex, 16),
            None => digits.parse::<i32>(),
        };
        match parsed {
            Ok(val) if negative => Ok(TokenKind::Lit(-val)),
            Ok(val) => Ok(TokenKind::Lit(val)),
            Err(e) => Err(error::lex_invalid_lit(span, src, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().iter().map(|tok| tok.kind).collect()
    }

    #[test]
    fn instruction_line() {
        use TokenKind::*;
        assert_eq!(kinds("ADD A, B"), vec![Ident, Ident, Ident, Eof]);
        assert_eq!(kinds("ldi 0x1A"), vec![Ident, Lit(26), Eof]);
        assert_eq!(kinds("LDI -5"), vec![Ident, Lit(-5), Eof]);
    }

    #[test]
    fn labels_and_comments() {
        use TokenKind::*;
        assert_eq!(
            kinds("loop: DEC ; count down\n  JNZ loop\n"),
            vec![Ident, Colon, Ident, Newline, Ident, Ident, Newline, Eof]
        );
        assert_eq!(kinds("; only a comment"), vec![Eof]);
    }

    #[test]
    fn punctuated_labels() {
        use TokenKind::*;
        assert_eq!(
            kinds("my-label: JMP $tmp.2\n@end:"),
            vec![Ident, Colon, Ident, Ident, Newline, Ident, Colon, Eof]
        );
        let toks = tokenize("my-label:").unwrap();
        assert_eq!(toks[0].span, Span::new(SrcOffset(0), 8));
    }

    #[test]
    fn spans() {
        let toks = tokenize("  JMP end").unwrap();
        assert_eq!(toks[0].span, Span::new(SrcOffset(2), 3));
        assert_eq!(toks[1].span, Span::new(SrcOffset(6), 3));
        assert_eq!(toks[2].span, Span::new(SrcOffset(9), 0));
    }

    #[test]
    fn bad_literals() {
        assert!(tokenize("LDI 12abc").is_err());
        assert!(tokenize("JMP 0x").is_err());
        assert!(tokenize("JMP 0xFFFFFFFFF").is_err());
    }

    #[test]
    fn unknown_char() {
        let err = tokenize("LDI #5").unwrap_err();
        assert_eq!(err.code().unwrap().to_string(), "lex::unknown");
    }

    #[test]
    fn crlf_line_endings() {
        use TokenKind::*;
        assert_eq!(kinds("NOP\r\nHLT\r\n"), vec![Ident, Newline, Ident, Newline, Eof]);
    }
}
