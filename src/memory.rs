use std::fmt;

/// The CPU can address 64KB of memory.
pub const MEMORY_SIZE: usize = 0x10000;

/// Flat byte-addressable memory. Any `u16` is a valid address.
pub struct Memory {
    cells: Box<[u8; MEMORY_SIZE]>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadError {
    /// Image does not fit in the address space.
    TooLarge { len: usize },
}

impl std::error::Error for LoadError {}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { len } => write!(
                f,
                "program image is {len} bytes, memory only holds {MEMORY_SIZE}"
            ),
        }
    }
}

impl Memory {
    /// Zeroed memory.
    pub fn new() -> Self {
        Memory {
            cells: Box::new([0; MEMORY_SIZE]),
        }
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.cells[addr as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, val: u8) {
        self.cells[addr as usize] = val;
    }

    /// Read a big-endian word, wrapping at the top of memory.
    pub fn read_word(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    /// Copy a program image into memory starting at address 0.
    pub fn load(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > MEMORY_SIZE {
            return Err(LoadError::TooLarge { len: program.len() });
        }
        self.cells[..program.len()].copy_from_slice(program);
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let mem = Memory::new();
        assert!((0..=u16::MAX).all(|addr| mem.read(addr) == 0));
    }

    #[test]
    fn load_at_origin() {
        let mut mem = Memory::new();
        mem.load(&[0x03, 0x05, 0xFF]).unwrap();
        assert_eq!(mem.read(0), 0x03);
        assert_eq!(mem.read(1), 0x05);
        assert_eq!(mem.read(2), 0xFF);
        assert_eq!(mem.read(3), 0x00);
    }

    #[test]
    fn load_full_and_oversized() {
        let mut mem = Memory::new();
        assert!(mem.load(&vec![0xAA; MEMORY_SIZE]).is_ok());
        assert_eq!(mem.read(0xFFFF), 0xAA);
        assert_eq!(
            mem.load(&vec![0; MEMORY_SIZE + 1]),
            Err(LoadError::TooLarge {
                len: MEMORY_SIZE + 1
            })
        );
    }

    #[test]
    fn word_is_big_endian_and_wraps() {
        let mut mem = Memory::new();
        mem.write(0x10, 0x12);
        mem.write(0x11, 0x34);
        assert_eq!(mem.read_word(0x10), 0x1234);
        mem.write(0xFFFF, 0xAB);
        mem.write(0x0000, 0xCD);
        assert_eq!(mem.read_word(0xFFFF), 0xABCD);
    }
}
