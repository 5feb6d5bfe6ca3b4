// ISA shared by both halves
pub mod flags;
pub mod isa;

// Assembling
mod lexer;
mod parser;
pub use parser::AsmParser;
mod air;
pub use air::{Air, AirStmt, Args, Operand, OperandKind};
mod symbol;
pub use symbol::{Span, Symbol, SymbolTable};
mod error;

// Running
pub mod memory;
pub use memory::{LoadError, Memory};
mod runtime;
pub use runtime::{Fault, Processor, RunEnvironment, STACK_TOP};

pub mod env;
pub mod output;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 2;

/// Run both assembler passes over `src`, returning the binary image.
pub fn assemble(src: &str) -> miette::Result<Vec<u8>> {
    let air = AsmParser::new(src)?.parse()?;
    air.emit()
}
