use std::fmt;

use crate::flags::{self, Flags};
use crate::isa::{BinaryOp, Instruction, InvalidRegister, Register, REGISTER_COUNT};
use crate::memory::{LoadError, Memory};
use crate::output;

/// Stack pointer value after reset. The first push lands one below it.
pub const STACK_TOP: u16 = 0xFFFF;

/// Register file, program counter, stack pointer and flags.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Processor {
    /// 4x 8-bit registers
    pub reg: [u8; REGISTER_COUNT],
    /// Program counter
    pub pc: u16,
    /// Stack pointer, grows downward
    pub sp: u16,
    pub flags: Flags,
    /// Set by HLT or an unassigned opcode
    pub halted: bool,
}

/// Unrecoverable condition raised while executing. Distinct from halting.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fault {
    /// Register operand outside `A..=D`. `pc` is the address of the faulting instruction.
    InvalidRegister { index: u8, pc: u16 },
}

impl std::error::Error for Fault {}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegister { index, pc } => write!(
                f,
                "invalid register index {index} in instruction at {pc:#06x} (only {REGISTER_COUNT} registers exist)"
            ),
        }
    }
}

impl Processor {
    pub fn new() -> Self {
        Processor {
            reg: [0; REGISTER_COUNT],
            pc: 0,
            sp: STACK_TOP,
            flags: Flags::default(),
            halted: false,
        }
    }

    #[inline]
    pub fn reg(&self, reg: Register) -> u8 {
        self.reg[reg.index()]
    }

    #[inline]
    fn reg_mut(&mut self, reg: Register) -> &mut u8 {
        &mut self.reg[reg.index()]
    }

    fn fetch(&mut self, mem: &Memory) -> u8 {
        let byte = mem.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    /// Execute a single instruction. Does nothing once halted.
    pub fn step(&mut self, mem: &mut Memory) -> Result<(), Fault> {
        self.next(mem).map(|_| ())
    }

    /// Execute a single instruction, returning its address and decoded form.
    /// Returns `None` without touching state once halted.
    pub fn next(&mut self, mem: &mut Memory) -> Result<Option<(u16, Instruction)>, Fault> {
        if self.halted {
            return Ok(None);
        }
        let addr = self.pc;
        let instr = Instruction::decode(|| self.fetch(mem))
            .map_err(|InvalidRegister(index)| Fault::InvalidRegister { index, pc: addr })?;
        self.execute(instr, mem);
        Ok(Some((addr, instr)))
    }

    fn execute(&mut self, instr: Instruction, mem: &mut Memory) {
        match instr {
            Instruction::Nop => {}
            Instruction::Lda(addr) => {
                let val = mem.read(addr);
                *self.reg_mut(Register::A) = val;
                self.flags = flags::load(self.flags, val);
            }
            Instruction::Ldb(addr) => {
                *self.reg_mut(Register::B) = mem.read(addr);
            }
            Instruction::Ldi(val) => {
                *self.reg_mut(Register::A) = val;
                self.flags = flags::load(self.flags, val);
            }
            Instruction::Inc => {
                let (res, flags) = flags::inc(self.flags, self.reg(Register::A));
                *self.reg_mut(Register::A) = res;
                self.flags = flags;
            }
            Instruction::Dec => {
                let (res, flags) = flags::dec(self.flags, self.reg(Register::A));
                *self.reg_mut(Register::A) = res;
                self.flags = flags;
            }
            Instruction::Binary { op, to, from } => self.binary(op, to, from),
            Instruction::Sta(addr) => mem.write(addr, self.reg(Register::A)),
            Instruction::Stb(addr) => mem.write(addr, self.reg(Register::B)),
            Instruction::Jump { cond, addr } => {
                // Operand has already been consumed whether or not the branch is taken
                if cond.is_met(self.flags) {
                    self.pc = addr;
                }
            }
            Instruction::Not(reg) => {
                let res = !self.reg(reg);
                *self.reg_mut(reg) = res;
                self.flags = flags::logic(self.flags, res);
            }
            Instruction::Push(reg) => self.push(mem, self.reg(reg)),
            Instruction::Pop(reg) => {
                let val = self.pop(mem);
                *self.reg_mut(reg) = val;
            }
            Instruction::Call(addr) => {
                // High byte ends up at the lower address
                let [hi, lo] = self.pc.to_be_bytes();
                self.push(mem, lo);
                self.push(mem, hi);
                self.pc = addr;
            }
            Instruction::Ret => {
                self.pc = mem.read_word(self.sp);
                self.sp = self.sp.wrapping_add(2);
            }
            Instruction::Hlt | Instruction::Illegal(_) => self.halted = true,
        }
    }

    fn binary(&mut self, op: BinaryOp, to: Register, from: Register) {
        let a = self.reg(to);
        let b = self.reg(from);
        let res = match op {
            BinaryOp::Add => {
                let (res, flags) = flags::add(self.flags, a, b);
                self.flags = flags;
                res
            }
            BinaryOp::Sub => {
                let (res, flags) = flags::sub(self.flags, a, b);
                self.flags = flags;
                res
            }
            BinaryOp::Mul => {
                let (res, flags) = flags::mul(self.flags, a, b);
                self.flags = flags;
                res
            }
            BinaryOp::Cmp => {
                let (_, flags) = flags::sub(self.flags, a, b);
                self.flags = flags;
                return;
            }
            BinaryOp::Mov => b,
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
                let res = match op {
                    BinaryOp::And => a & b,
                    BinaryOp::Or => a | b,
                    _ => a ^ b,
                };
                self.flags = flags::logic(self.flags, res);
                res
            }
        };
        *self.reg_mut(to) = res;
    }

    fn push(&mut self, mem: &mut Memory, val: u8) {
        self.sp = self.sp.wrapping_sub(1);
        mem.write(self.sp, val);
    }

    fn pop(&mut self, mem: &Memory) -> u8 {
        let val = mem.read(self.sp);
        self.sp = self.sp.wrapping_add(1);
        val
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

/// Final machine state report.
impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.reg;
        writeln!(f, "A:{a} B:{b} C:{c} D:{d}")?;
        writeln!(f, "PC: d:{} h:{:#06x}", self.pc, self.pc)?;
        writeln!(f, "SP: d:{} h:{:#06x}", self.sp, self.sp)?;
        write!(f, "{}", self.flags)
    }
}

/// Owns processor state and memory for one program execution.
pub struct RunEnvironment {
    cpu: Processor,
    mem: Memory,
    trace: bool,
}

impl RunEnvironment {
    /// Reset machine with `program` loaded at address 0.
    pub fn from_raw(program: &[u8]) -> Result<RunEnvironment, LoadError> {
        let mut mem = Memory::new();
        mem.load(program)?;
        Ok(RunEnvironment {
            cpu: Processor::new(),
            mem,
            trace: false,
        })
    }

    /// Print every executed instruction to stderr.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn step(&mut self) -> Result<(), Fault> {
        self.cpu.step(&mut self.mem)
    }

    /// Run until halted, returning the number of instructions executed.
    ///
    /// There is no step limit: a program that never halts never returns.
    pub fn run(&mut self) -> Result<u64, Fault> {
        let mut steps = 0;
        while let Some((addr, instr)) = self.cpu.next(&mut self.mem)? {
            steps += 1;
            if self.trace {
                output::trace(addr, &instr, &self.cpu);
            }
        }
        Ok(steps)
    }

    pub fn processor(&self) -> &Processor {
        &self.cpu
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }
}
