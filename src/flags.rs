//! Flag register and the pure functions computing it.
//!
//! Every arithmetic helper takes the current flags and its operands, and returns the 8-bit
//! result alongside the updated flags. Bits a helper does not mention are carried over.

use std::fmt;

/// Bit position of each meaningful flag.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flag {
    Zero = 0b0001,
    Carry = 0b0010,
    Sign = 0b0100,
    Overflow = 0b1000,
}

/// The 8-bit flag register. Only the low four bits are ever set.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Flags(u8);

impl Flags {
    const MASK: u8 = 0b1111;

    pub const fn from_bits(bits: u8) -> Self {
        Flags(bits & Self::MASK)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn get(self, flag: Flag) -> bool {
        self.0 & flag as u8 != 0
    }

    /// Return flags with `flag` set if `cond` holds, cleared otherwise.
    #[must_use]
    pub const fn with(self, flag: Flag, cond: bool) -> Self {
        if cond {
            Flags(self.0 | flag as u8)
        } else {
            Flags(self.0 & !(flag as u8))
        }
    }

    /// Zero and Sign from an 8-bit result.
    #[must_use]
    const fn with_result(self, res: u8) -> Self {
        self.with(Flag::Zero, res == 0)
            .with(Flag::Sign, res & 0x80 != 0)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Z:{} S:{} C:{} O:{}",
            self.get(Flag::Zero) as u8,
            self.get(Flag::Sign) as u8,
            self.get(Flag::Carry) as u8,
            self.get(Flag::Overflow) as u8,
        )
    }
}

pub fn add(flags: Flags, a: u8, b: u8) -> (u8, Flags) {
    let wide = a as u16 + b as u16;
    let res = wide as u8;
    let flags = flags
        .with_result(res)
        .with(Flag::Carry, wide > 0xFF)
        .with(Flag::Overflow, (a ^ res) & (b ^ res) & 0x80 != 0);
    (res, flags)
}

/// Also used by CMP, which discards the result.
pub fn sub(flags: Flags, a: u8, b: u8) -> (u8, Flags) {
    let res = a.wrapping_sub(b);
    let flags = flags
        .with_result(res)
        .with(Flag::Carry, a < b)
        .with(Flag::Overflow, (a ^ b) & (a ^ res) & 0x80 != 0);
    (res, flags)
}

/// Carry is left untouched.
pub fn inc(flags: Flags, val: u8) -> (u8, Flags) {
    let res = val.wrapping_add(1);
    let flags = flags
        .with_result(res)
        .with(Flag::Overflow, val == 0x7F);
    (res, flags)
}

/// Carry is left untouched.
pub fn dec(flags: Flags, val: u8) -> (u8, Flags) {
    let res = val.wrapping_sub(1);
    let flags = flags
        .with_result(res)
        .with(Flag::Overflow, val == 0x80);
    (res, flags)
}

/// Keeps the low byte of the product. Carry reports a non-zero high byte.
pub fn mul(flags: Flags, a: u8, b: u8) -> (u8, Flags) {
    let [hi, lo] = (a as u16 * b as u16).to_be_bytes();
    let flags = flags
        .with_result(lo)
        .with(Flag::Carry, hi != 0)
        .with(Flag::Overflow, false);
    (lo, flags)
}

/// Bitwise operations: Carry and Overflow are cleared.
pub fn logic(flags: Flags, res: u8) -> Flags {
    flags
        .with_result(res)
        .with(Flag::Carry, false)
        .with(Flag::Overflow, false)
}

/// Loads into A only report Zero.
pub fn load(flags: Flags, val: u8) -> Flags {
    flags.with(Flag::Zero, val == 0)
}
