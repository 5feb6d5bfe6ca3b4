use std::num::ParseIntError;
use std::ops::RangeInclusive;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::{lexer::Token, symbol::Span};

// Lexer errors

pub fn lex_unknown(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "lex::unknown",
        help = "operands are registers, labels, or decimal and 0x-prefixed hex literals",
        labels = vec![LabeledSpan::at(span, "unknown token")],
        "Encountered an unknown token",
    )
    .with_source_code(src.to_owned())
}

pub fn lex_invalid_lit(span: Span, src: &str, e: ParseIntError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::bad_lit",
        help = "literals look like 26, -5, or 0x1A",
        labels = vec![LabeledSpan::at(span, "incorrect literal")],
        "Encountered an invalid literal: {e}",
    )
    .with_source_code(src.to_owned())
}

// Parser errors

pub fn parse_duplicate_label(span: Span, first: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::duplicate_label",
        help = "labels are only allowed once per file, regardless of case",
        labels = vec![
            LabeledSpan::at(span, "duplicate label"),
            LabeledSpan::at(first, "first defined here"),
        ],
        "Duplicate label"
    )
    .with_source_code(src.to_owned())
}

pub fn parse_unknown_mnemonic(span: Span, src: &str) -> Report {
    let name = &src[span.offs()..span.end()];
    miette!(
        severity = Severity::Error,
        code = "parse::unknown_mnemonic",
        help = "check the list of available instructions in the documentation",
        labels = vec![LabeledSpan::at(span, "unknown mnemonic")],
        "Unknown mnemonic '{name}'",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_unexpected(src: &str, expected: &str, found: Token) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::unexpected_token",
        help = "check the operands for this instruction",
        labels = vec![LabeledSpan::at(found.span, "unexpected token")],
        "Expected {expected}, found {}",
        found.kind
    )
    .with_source_code(src.to_owned())
}

pub fn parse_eol(span: Span, src: &str, expected: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::unexpected_eol",
        help = "you may be missing operands in this statement",
        labels = vec![LabeledSpan::at(span, "statement ends here")],
        "Expected {expected}, found end of line",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_bad_register(span: Span, src: &str) -> Report {
    let name = &src[span.offs()..span.end()];
    miette!(
        severity = Severity::Error,
        code = "parse::bad_register",
        help = "available registers are A, B, C and D",
        labels = vec![LabeledSpan::at(span, "not a register")],
        "Invalid register '{name}'",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_too_large(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::too_large",
        help = "programs must fit in 65536 bytes",
        labels = vec![LabeledSpan::at(span, "does not fit in memory")],
        "Program exceeds the address space",
    )
    .with_source_code(src.to_owned())
}

// Emit errors

pub fn emit_unresolved(span: Span, src: &str) -> Report {
    let name = &src[span.offs()..span.end()];
    miette!(
        severity = Severity::Error,
        code = "emit::unresolved_operand",
        help = "operands must be a defined label, a register, or a numeric literal",
        labels = vec![LabeledSpan::at(span, "unresolved operand")],
        "Invalid operand '{name}'",
    )
    .with_source_code(src.to_owned())
}

pub fn emit_lit_range(span: Span, src: &str, val: i32, allowed: RangeInclusive<i32>) -> Report {
    miette!(
        severity = Severity::Error,
        code = "emit::lit_range",
        help = format!(
            "this operand accepts values from {} to {}",
            allowed.start(),
            allowed.end()
        ),
        labels = vec![LabeledSpan::at(span, "out-of-range value")],
        "Operand value {val} is out of range",
    )
    .with_source_code(src.to_owned())
}
