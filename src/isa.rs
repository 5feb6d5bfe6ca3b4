use std::fmt;
use std::str::FromStr;

use crate::flags::{Flag, Flags};

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 4;

/// Opcode byte values. Operand layout is determined by [`Format`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x00,
    Lda = 0x01,
    Ldb = 0x02,
    Ldi = 0x03,
    Inc = 0x04,
    Dec = 0x05,
    Add = 0x06,
    Sub = 0x07,
    Mul = 0x08,
    Sta = 0x09,
    Stb = 0x0A,
    Mov = 0x0B,
    Cmp = 0x0C,
    Jmp = 0x0D,
    Jz = 0x0E,
    Jnz = 0x0F,
    Jc = 0x10,
    Jnc = 0x11,
    Je = 0x12,
    Jne = 0x13,
    Jl = 0x14,
    Jg = 0x15,
    Jb = 0x16,
    Ja = 0x17,
    And = 0x18,
    Or = 0x19,
    Xor = 0x1A,
    Not = 0x1B,
    Push = 0x1C,
    Pop = 0x1D,
    Call = 0x1E,
    Ret = 0x1F,
    Hlt = 0xFF,
}

/// Shape of the operand bytes following an opcode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Format {
    /// No operand bytes.
    Implied,
    /// One 8-bit immediate.
    Imm,
    /// One register index.
    Reg,
    /// Two register indices, destination first.
    RegPair,
    /// One big-endian 16-bit address.
    Addr,
}

impl Format {
    /// Encoded size including the opcode byte.
    pub const fn size(self) -> u16 {
        match self {
            Format::Implied => 1,
            Format::Imm | Format::Reg => 2,
            Format::RegPair | Format::Addr => 3,
        }
    }
}

impl Opcode {
    /// Every opcode in encoding order.
    pub const ALL: [Opcode; 33] = [
        Opcode::Nop,
        Opcode::Lda,
        Opcode::Ldb,
        Opcode::Ldi,
        Opcode::Inc,
        Opcode::Dec,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Sta,
        Opcode::Stb,
        Opcode::Mov,
        Opcode::Cmp,
        Opcode::Jmp,
        Opcode::Jz,
        Opcode::Jnz,
        Opcode::Jc,
        Opcode::Jnc,
        Opcode::Je,
        Opcode::Jne,
        Opcode::Jl,
        Opcode::Jg,
        Opcode::Jb,
        Opcode::Ja,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Not,
        Opcode::Push,
        Opcode::Pop,
        Opcode::Call,
        Opcode::Ret,
        Opcode::Hlt,
    ];

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Lda => "LDA",
            Opcode::Ldb => "LDB",
            Opcode::Ldi => "LDI",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Sta => "STA",
            Opcode::Stb => "STB",
            Opcode::Mov => "MOV",
            Opcode::Cmp => "CMP",
            Opcode::Jmp => "JMP",
            Opcode::Jz => "JZ",
            Opcode::Jnz => "JNZ",
            Opcode::Jc => "JC",
            Opcode::Jnc => "JNC",
            Opcode::Je => "JE",
            Opcode::Jne => "JNE",
            Opcode::Jl => "JL",
            Opcode::Jg => "JG",
            Opcode::Jb => "JB",
            Opcode::Ja => "JA",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Not => "NOT",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Hlt => "HLT",
        }
    }

    pub const fn format(self) -> Format {
        use Opcode::*;
        match self {
            Nop | Inc | Dec | Ret | Hlt => Format::Implied,
            Ldi => Format::Imm,
            Push | Pop | Not => Format::Reg,
            Add | Sub | Mul | Mov | Cmp | And | Or | Xor => Format::RegPair,
            Lda | Ldb | Sta | Stb | Jmp | Jz | Jnz | Jc | Jnc | Je | Jne | Jl | Jg | Jb | Ja
            | Call => Format::Addr,
        }
    }

    /// Encoded size including the opcode byte.
    pub const fn size(self) -> u16 {
        self.format().size()
    }

    pub fn from_byte(byte: u8) -> Option<Opcode> {
        Opcode::ALL.into_iter().find(|op| *op as u8 == byte)
    }
}

impl FromStr for Opcode {
    type Err = ();

    /// Mnemonics are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Represents the CPU registers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
    A = 0,
    B,
    C,
    D,
}

impl Register {
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Register {
    /// The offending index.
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Register::A),
            1 => Ok(Register::B),
            2 => Ok(Register::C),
            3 => Ok(Register::D),
            _ => Err(index),
        }
    }
}

impl FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Register::A),
            "B" => Ok(Register::B),
            "C" => Ok(Register::C),
            "D" => Ok(Register::D),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::A => "A",
            Register::B => "B",
            Register::C => "C",
            Register::D => "D",
        };
        f.write_str(name)
    }
}

/// Two-register operations, all encoded as `op to, from`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Mov,
    Cmp,
    And,
    Or,
    Xor,
}

/// Branch conditions, tested against the flag register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Condition {
    Always,
    Zero,
    NotZero,
    Carry,
    NoCarry,
    /// Same test as [`Condition::Zero`].
    Equal,
    /// Same test as [`Condition::NotZero`].
    NotEqual,
    /// Signed less-than.
    Less,
    /// Signed greater-than.
    Greater,
    /// Unsigned less-than.
    Below,
    /// Unsigned greater-than.
    Above,
}

impl Condition {
    pub fn is_met(self, flags: Flags) -> bool {
        let zf = flags.get(Flag::Zero);
        let cf = flags.get(Flag::Carry);
        let sf = flags.get(Flag::Sign);
        let of = flags.get(Flag::Overflow);
        match self {
            Condition::Always => true,
            Condition::Zero | Condition::Equal => zf,
            Condition::NotZero | Condition::NotEqual => !zf,
            Condition::Carry | Condition::Below => cf,
            Condition::NoCarry => !cf,
            Condition::Less => sf != of,
            Condition::Greater => !zf && sf == of,
            Condition::Above => !cf && !zf,
        }
    }
}

/// A single decoded instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instruction {
    Nop,
    /// Load A from memory
    Lda(u16),
    /// Load B from memory
    Ldb(u16),
    /// Load immediate into A
    Ldi(u8),
    /// Increment A
    Inc,
    /// Decrement A
    Dec,
    Binary {
        op: BinaryOp,
        to: Register,
        from: Register,
    },
    /// Store A to memory
    Sta(u16),
    /// Store B to memory
    Stb(u16),
    Jump {
        cond: Condition,
        addr: u16,
    },
    Not(Register),
    Push(Register),
    Pop(Register),
    Call(u16),
    Ret,
    Hlt,
    /// Byte with no opcode assigned. Executes as a halt.
    Illegal(u8),
}

/// Raised while decoding when a register operand is out of range.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InvalidRegister(pub u8);

impl Instruction {
    /// Decode one instruction, pulling the opcode and then each operand byte from `next`.
    ///
    /// Operand bytes are always consumed in full before a register index is validated.
    pub fn decode(mut next: impl FnMut() -> u8) -> Result<Instruction, InvalidRegister> {
        let byte = next();
        let Some(opcode) = Opcode::from_byte(byte) else {
            return Ok(Instruction::Illegal(byte));
        };

        let instr = match opcode {
            Opcode::Nop => Instruction::Nop,
            Opcode::Lda => Instruction::Lda(address(&mut next)),
            Opcode::Ldb => Instruction::Ldb(address(&mut next)),
            Opcode::Ldi => Instruction::Ldi(next()),
            Opcode::Inc => Instruction::Inc,
            Opcode::Dec => Instruction::Dec,
            Opcode::Add => binary(BinaryOp::Add, &mut next)?,
            Opcode::Sub => binary(BinaryOp::Sub, &mut next)?,
            Opcode::Mul => binary(BinaryOp::Mul, &mut next)?,
            Opcode::Sta => Instruction::Sta(address(&mut next)),
            Opcode::Stb => Instruction::Stb(address(&mut next)),
            Opcode::Mov => binary(BinaryOp::Mov, &mut next)?,
            Opcode::Cmp => binary(BinaryOp::Cmp, &mut next)?,
            Opcode::Jmp => jump(Condition::Always, &mut next),
            Opcode::Jz => jump(Condition::Zero, &mut next),
            Opcode::Jnz => jump(Condition::NotZero, &mut next),
            Opcode::Jc => jump(Condition::Carry, &mut next),
            Opcode::Jnc => jump(Condition::NoCarry, &mut next),
            Opcode::Je => jump(Condition::Equal, &mut next),
            Opcode::Jne => jump(Condition::NotEqual, &mut next),
            Opcode::Jl => jump(Condition::Less, &mut next),
            Opcode::Jg => jump(Condition::Greater, &mut next),
            Opcode::Jb => jump(Condition::Below, &mut next),
            Opcode::Ja => jump(Condition::Above, &mut next),
            Opcode::And => binary(BinaryOp::And, &mut next)?,
            Opcode::Or => binary(BinaryOp::Or, &mut next)?,
            Opcode::Xor => binary(BinaryOp::Xor, &mut next)?,
            Opcode::Not => Instruction::Not(register(next())?),
            Opcode::Push => Instruction::Push(register(next())?),
            Opcode::Pop => Instruction::Pop(register(next())?),
            Opcode::Call => Instruction::Call(address(&mut next)),
            Opcode::Ret => Instruction::Ret,
            Opcode::Hlt => Instruction::Hlt,
        };
        Ok(instr)
    }

    /// Opcode this instruction was decoded from, if it has one.
    pub fn opcode(&self) -> Option<Opcode> {
        let op = match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::Lda(_) => Opcode::Lda,
            Instruction::Ldb(_) => Opcode::Ldb,
            Instruction::Ldi(_) => Opcode::Ldi,
            Instruction::Inc => Opcode::Inc,
            Instruction::Dec => Opcode::Dec,
            Instruction::Binary { op, .. } => match op {
                BinaryOp::Add => Opcode::Add,
                BinaryOp::Sub => Opcode::Sub,
                BinaryOp::Mul => Opcode::Mul,
                BinaryOp::Mov => Opcode::Mov,
                BinaryOp::Cmp => Opcode::Cmp,
                BinaryOp::And => Opcode::And,
                BinaryOp::Or => Opcode::Or,
                BinaryOp::Xor => Opcode::Xor,
            },
            Instruction::Sta(_) => Opcode::Sta,
            Instruction::Stb(_) => Opcode::Stb,
            Instruction::Jump { cond, .. } => match cond {
                Condition::Always => Opcode::Jmp,
                Condition::Zero => Opcode::Jz,
                Condition::NotZero => Opcode::Jnz,
                Condition::Carry => Opcode::Jc,
                Condition::NoCarry => Opcode::Jnc,
                Condition::Equal => Opcode::Je,
                Condition::NotEqual => Opcode::Jne,
                Condition::Less => Opcode::Jl,
                Condition::Greater => Opcode::Jg,
                Condition::Below => Opcode::Jb,
                Condition::Above => Opcode::Ja,
            },
            Instruction::Not(_) => Opcode::Not,
            Instruction::Push(_) => Opcode::Push,
            Instruction::Pop(_) => Opcode::Pop,
            Instruction::Call(_) => Opcode::Call,
            Instruction::Ret => Opcode::Ret,
            Instruction::Hlt => Opcode::Hlt,
            Instruction::Illegal(_) => return None,
        };
        Some(op)
    }
}

fn register(index: u8) -> Result<Register, InvalidRegister> {
    Register::try_from(index).map_err(InvalidRegister)
}

/// Big-endian address operand.
fn address(next: &mut impl FnMut() -> u8) -> u16 {
    let hi = next();
    let lo = next();
    u16::from_be_bytes([hi, lo])
}

fn jump(cond: Condition, next: &mut impl FnMut() -> u8) -> Instruction {
    Instruction::Jump {
        cond,
        addr: address(next),
    }
}

// Both bytes are read before either is validated
fn binary(op: BinaryOp, next: &mut impl FnMut() -> u8) -> Result<Instruction, InvalidRegister> {
    let to = next();
    let from = next();
    Ok(Instruction::Binary {
        op,
        to: register(to)?,
        from: register(from)?,
    })
}

/// Renders in assembler syntax.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode().map_or("???", Opcode::mnemonic);
        match *self {
            Instruction::Illegal(byte) => write!(f, "{op} {byte:#04x}"),
            Instruction::Ldi(val) => write!(f, "{op} {val}"),
            Instruction::Binary { to, from, .. } => write!(f, "{op} {to}, {from}"),
            Instruction::Not(reg) | Instruction::Push(reg) | Instruction::Pop(reg) => {
                write!(f, "{op} {reg}")
            }
            Instruction::Lda(addr)
            | Instruction::Ldb(addr)
            | Instruction::Sta(addr)
            | Instruction::Stb(addr)
            | Instruction::Call(addr)
            | Instruction::Jump { addr, .. } => write!(f, "{op} {addr:#06x}"),
            _ => write!(f, "{op}"),
        }
    }
}
