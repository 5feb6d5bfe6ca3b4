use std::{iter::Peekable, vec::IntoIter};

use miette::Result;

use crate::{
    air::{Air, AirStmt, Args, Operand, OperandKind},
    error,
    isa::{Format, Opcode, Register},
    lexer::{tokenize, Token, TokenKind},
    memory::MEMORY_SIZE,
    symbol::Span,
};

/// First pass: transforms the token stream into AIR, assigning every statement and label its
/// final address.
pub struct AsmParser<'a> {
    /// Reference to the source file
    src: &'a str,
    /// Peekable iterator over tokens, terminated by `Eof`
    toks: Peekable<IntoIter<Token>>,
    /// Assembly intermediate representation
    air: Air<'a>,
    /// Address the next statement will occupy
    addr: usize,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str) -> Result<Self> {
        let toks = tokenize(src)?;
        Ok(AsmParser {
            src,
            toks: toks.into_iter().peekable(),
            air: Air::new(src),
            addr: 0,
        })
    }

    fn get_span(&self, span: Span) -> &'a str {
        &self.src[span.offs()..span.end()]
    }

    /// Create AIR out of token stream
    pub fn parse(mut self) -> Result<Air<'a>> {
        while let Some(tok) = self.toks.next() {
            match tok.kind {
                TokenKind::Newline => continue,
                TokenKind::Eof => break,
                TokenKind::Ident => {
                    // Label prefix; the rest of the line is parsed on the next iteration
                    if self.peek_kind() == TokenKind::Colon {
                        self.toks.next();
                        self.define_label(tok)?;
                    } else {
                        self.parse_instr(tok)?;
                    }
                }
                TokenKind::Colon | TokenKind::Lit(_) => {
                    return Err(error::parse_unexpected(
                        self.src,
                        "label or instruction",
                        tok,
                    ))
                }
            }
        }
        // Consume self to return AIR
        Ok(self.air)
    }

    fn peek_kind(&mut self) -> TokenKind {
        self.toks.peek().map_or(TokenKind::Eof, |tok| tok.kind)
    }

    fn define_label(&mut self, tok: Token) -> Result<()> {
        if self.addr >= MEMORY_SIZE {
            return Err(error::parse_too_large(tok.span, self.src));
        }
        let name = self.get_span(tok.span);
        self.air
            .symbols_mut()
            .insert(name, self.addr as u16, tok.span)
            .map_err(|first| error::parse_duplicate_label(tok.span, first.span, self.src))
    }

    /// Process a mnemonic and its operands to form a single statement
    fn parse_instr(&mut self, mnemonic: Token) -> Result<()> {
        let opcode: Opcode = self
            .get_span(mnemonic.span)
            .parse()
            .map_err(|_| error::parse_unknown_mnemonic(mnemonic.span, self.src))?;

        let mut span = mnemonic.span;
        let args = match opcode.format() {
            Format::Implied => Args::None,
            Format::Imm => {
                let operand = self.expect_operand(mnemonic.span)?;
                span = span.join(operand.span);
                Args::Imm(operand)
            }
            Format::Addr => {
                let operand = self.expect_operand(mnemonic.span)?;
                span = span.join(operand.span);
                Args::Addr(operand)
            }
            Format::Reg => {
                let (reg, reg_span) = self.expect_reg(mnemonic.span)?;
                span = span.join(reg_span);
                Args::Reg(reg)
            }
            Format::RegPair => {
                let (to, _) = self.expect_reg(mnemonic.span)?;
                let (from, from_span) = self.expect_reg(mnemonic.span)?;
                span = span.join(from_span);
                Args::RegPair(to, from)
            }
        };
        self.expect_end()?;

        let size = opcode.size() as usize;
        if self.addr + size > MEMORY_SIZE {
            return Err(error::parse_too_large(span, self.src));
        }
        self.air.add_stmt(AirStmt {
            addr: self.addr as u16,
            opcode,
            args,
            span,
        });
        self.addr += size;
        Ok(())
    }

    /// Next token, if it still belongs to the current line.
    fn operand_token(&mut self, stmt: Span, expected: &str) -> Result<Token> {
        self.toks
            .next_if(|tok| !matches!(tok.kind, TokenKind::Newline | TokenKind::Eof))
            .ok_or_else(|| error::parse_eol(stmt, self.src, expected))
    }

    fn expect_reg(&mut self, stmt: Span) -> Result<(Register, Span)> {
        let tok = self.operand_token(stmt, "register")?;
        match tok.kind {
            TokenKind::Ident => self
                .get_span(tok.span)
                .parse()
                .map(|reg| (reg, tok.span))
                .map_err(|_| error::parse_bad_register(tok.span, self.src)),
            _ => Err(error::parse_unexpected(self.src, "register", tok)),
        }
    }

    fn expect_operand(&mut self, stmt: Span) -> Result<Operand> {
        let tok = self.operand_token(stmt, "operand")?;
        let kind = match tok.kind {
            TokenKind::Lit(val) => OperandKind::Lit(val),
            TokenKind::Ident => OperandKind::Name(self.get_span(tok.span).to_owned()),
            _ => return Err(error::parse_unexpected(self.src, "operand", tok)),
        };
        Ok(Operand {
            kind,
            span: tok.span,
        })
    }

    /// Statement must be followed by a newline or the end of file. Neither is consumed.
    fn expect_end(&mut self) -> Result<()> {
        match self.toks.peek() {
            Some(tok) if !matches!(tok.kind, TokenKind::Newline | TokenKind::Eof) => {
                Err(error::parse_unexpected(self.src, "end of line", *tok))
            }
            _ => Ok(()),
        }
    }
}
