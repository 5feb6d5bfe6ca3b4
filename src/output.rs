use std::cell::RefCell;
use std::fmt::Display;
use std::path::Path;

use colored::Colorize;

use crate::isa::Instruction;
use crate::runtime::Processor;

thread_local! {
    static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
}

/// Suppress status messages. Returns the previous setting.
pub fn set_minimal(new_value: bool) -> bool {
    IS_MINIMAL.with(|value| value.replace(new_value))
}

pub fn is_minimal() -> bool {
    IS_MINIMAL.with(|value| *value.borrow())
}

#[derive(Clone, Copy, Debug)]
pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

/// Status line with a right-aligned colored verb, e.g. `  Assembling target prog.asm`.
pub fn message(color: MsgColor, left: &str, right: impl Display) {
    if is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

pub fn file_message(color: MsgColor, left: &str, right: &Path) {
    message(color, left, format!("target {}", right.display()));
}

/// One executed instruction and the state it left behind, on stderr.
pub fn trace(addr: u16, instr: &Instruction, cpu: &Processor) {
    let [a, b, c, d] = cpu.reg;
    let line = format!(
        "{:<14} A:{a:02x} B:{b:02x} C:{c:02x} D:{d:02x} SP:{:04x} {}",
        instr.to_string(),
        cpu.sp,
        cpu.flags
    );
    if is_minimal() {
        eprintln!("{addr:04x} {line}");
    } else {
        eprintln!("{} {line}", format!("{addr:04x}").cyan());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toggle() {
        let prev = set_minimal(true);
        assert!(is_minimal());
        set_minimal(prev);
        assert_eq!(is_minimal(), prev);
    }
}
