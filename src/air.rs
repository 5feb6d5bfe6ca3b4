use miette::Result;

use crate::{
    error,
    isa::{Opcode, Register},
    symbol::{Span, SymbolTable},
};

/// Assembly intermediate representation: statements with their final addresses, plus the label
/// table they reference.
pub struct Air<'a> {
    /// Source the statements were parsed from
    src: &'a str,
    /// Statements in program order
    ast: Vec<AirStmt>,
    /// Label table, complete once parsing has finished
    symbols: SymbolTable,
}

impl<'a> Air<'a> {
    pub fn new(src: &'a str) -> Self {
        Air {
            src,
            ast: Vec::new(),
            symbols: SymbolTable::new(),
        }
    }

    pub fn add_stmt(&mut self, stmt: AirStmt) {
        self.ast.push(stmt)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn get(&self, idx: usize) -> Option<&AirStmt> {
        self.ast.get(idx)
    }

    pub fn len(&self) -> usize {
        self.ast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ast.is_empty()
    }

    /// Size of the emitted image in bytes.
    pub fn size(&self) -> usize {
        self.ast
            .last()
            .map_or(0, |stmt| stmt.addr as usize + stmt.opcode.size() as usize)
    }

    /// Second pass: emit opcode and operand bytes, substituting label addresses.
    ///
    /// Nothing is returned unless every statement encodes.
    pub fn emit(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.size());
        for stmt in &self.ast {
            bytes.push(stmt.opcode as u8);
            match &stmt.args {
                Args::None => {}
                Args::Imm(operand) => {
                    let val = self.resolve(operand, -128..=255)?;
                    // Negative immediates are stored as two's complement
                    bytes.push(val as u8);
                }
                Args::Reg(reg) => bytes.push(*reg as u8),
                Args::RegPair(to, from) => bytes.extend([*to as u8, *from as u8]),
                Args::Addr(operand) => {
                    let addr = self.resolve(operand, 0..=0xFFFF)? as u16;
                    bytes.extend(addr.to_be_bytes());
                }
            }
        }
        Ok(bytes)
    }

    /// Label first, then register name, then literal.
    fn resolve(&self, operand: &Operand, allowed: std::ops::RangeInclusive<i32>) -> Result<i32> {
        let val = match &operand.kind {
            OperandKind::Lit(val) => *val,
            OperandKind::Name(name) => {
                if let Some(addr) = self.symbols.get(name) {
                    addr as i32
                } else if let Ok(reg) = name.parse::<Register>() {
                    reg as i32
                } else {
                    return Err(error::emit_unresolved(operand.span, self.src));
                }
            }
        };
        if !allowed.contains(&val) {
            return Err(error::emit_lit_range(operand.span, self.src, val, allowed));
        }
        Ok(val)
    }
}

impl<'a, 'b> IntoIterator for &'b Air<'a> {
    type Item = &'b AirStmt;
    type IntoIter = std::slice::Iter<'b, AirStmt>;

    fn into_iter(self) -> Self::IntoIter {
        self.ast.iter()
    }
}

/// Single statement, placed at its final address.
#[derive(PartialEq, Eq, Debug)]
pub struct AirStmt {
    pub addr: u16,
    pub opcode: Opcode,
    pub args: Args,
    /// Mnemonic through last operand
    pub span: Span,
}

/// Operands, shaped by the opcode's format.
#[derive(PartialEq, Eq, Debug)]
pub enum Args {
    None,
    Imm(Operand),
    Reg(Register),
    RegPair(Register, Register),
    Addr(Operand),
}

/// Value operand, resolved during emit.
#[derive(PartialEq, Eq, Debug)]
pub struct Operand {
    pub kind: OperandKind,
    pub span: Span,
}

#[derive(PartialEq, Eq, Debug)]
pub enum OperandKind {
    Lit(i32),
    /// Label or register name, as written
    Name(String),
}

#[cfg(test)]
mod tests {
    use crate::parser::AsmParser;

    fn emit(src: &str) -> miette::Result<Vec<u8>> {
        AsmParser::new(src)?.parse()?.emit()
    }

    fn code(src: &str) -> String {
        let err = emit(src).unwrap_err();
        err.code().map(|c| c.to_string()).unwrap_or_default()
    }

    #[test]
    fn emit_each_format() {
        assert_eq!(emit("NOP").unwrap(), [0x00]);
        assert_eq!(emit("LDI 5").unwrap(), [0x03, 0x05]);
        assert_eq!(emit("PUSH C").unwrap(), [0x1C, 0x02]);
        assert_eq!(emit("SUB D, A").unwrap(), [0x07, 0x03, 0x00]);
        assert_eq!(emit("JMP 0x1234").unwrap(), [0x0D, 0x12, 0x34]);
        assert_eq!(emit("HLT").unwrap(), [0xFF]);
    }

    #[test]
    fn emit_label_addresses() {
        let bytes = emit(
            "
            start:  LDI 3
            loop:   DEC
                    JNZ loop
                    CALL sub
                    HLT
            sub:    RET
            ",
        )
        .unwrap();
        assert_eq!(
            bytes,
            [0x03, 0x03, 0x05, 0x0F, 0x00, 0x02, 0x1E, 0x00, 0x0A, 0xFF, 0x1F]
        );
    }

    #[test]
    fn emit_immediates() {
        assert_eq!(emit("LDI -1").unwrap(), [0x03, 0xFF]);
        assert_eq!(emit("LDI -128").unwrap(), [0x03, 0x80]);
        assert_eq!(emit("LDI 0xff").unwrap(), [0x03, 0xFF]);
        // Label used as a value
        assert_eq!(emit("x: LDI x\nLDI x").unwrap(), [0x03, 0x00, 0x03, 0x00]);
    }

    #[test]
    fn register_name_as_value() {
        assert_eq!(emit("LDI c").unwrap(), [0x03, 0x02]);
        // Labels shadow register names
        assert_eq!(emit("NOP\nb: JMP B").unwrap(), [0x00, 0x0D, 0x00, 0x01]);
    }

    #[test]
    fn literal_out_of_range() {
        assert_eq!(code("LDI 256"), "emit::lit_range");
        assert_eq!(code("LDI -129"), "emit::lit_range");
        assert_eq!(code("JMP 65536"), "emit::lit_range");
        assert_eq!(code("JMP -1"), "emit::lit_range");
    }

    #[test]
    fn unresolved_operand() {
        assert_eq!(code("JMP nowhere"), "emit::unresolved_operand");
        let err = emit("LDI value").unwrap_err();
        assert!(err.to_string().contains("value"));
    }

    #[test]
    fn size_tracks_addresses() {
        let air = AsmParser::new("LDI 1\nADD A, B\nHLT").unwrap().parse().unwrap();
        assert_eq!(air.size(), 6);
        assert_eq!(air.emit().unwrap().len(), air.size());
    }
}
