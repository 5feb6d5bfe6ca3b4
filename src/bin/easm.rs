use std::fs;
use std::path::PathBuf;

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};

use ecpu::output::{self, file_message, message, MsgColor};
use ecpu::AsmParser;

/// Two-pass assembler producing binary images for the ecpu emulator.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// `.asm` source file to assemble
    input: PathBuf,
    /// Destination for the binary image
    output: PathBuf,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
    /// Print the resolved label table
    #[arg(short, long)]
    symbols: bool,
}

fn main() -> Result<()> {
    // Usage errors exit with 1 rather than clap's default of 2
    let args = Args::try_parse().unwrap_or_else(|e| {
        // A failed write to a closed stream leaves nothing to report to; the exit code still does
        let _ = e.print();
        std::process::exit(if e.use_stderr() { 1 } else { 0 })
    });

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ecpu::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;
    output::set_minimal(args.minimal);

    file_message(MsgColor::Green, "Assembling", &args.input);
    let src = fs::read_to_string(&args.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot open input file {}", args.input.display()))?;

    // Both passes finish before anything is written
    let air = AsmParser::new(&src)?.parse()?;
    let bytes = air.emit()?;

    if args.symbols {
        for (name, sym) in air.symbols().iter() {
            println!("{:#06x} {name}", sym.addr);
        }
    }

    fs::write(&args.output, &bytes)
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot write output file {}", args.output.display()))?;

    message(MsgColor::Green, "Finished", format!("emit {} bytes", bytes.len()));
    file_message(MsgColor::Green, "Saved", &args.output);
    if output::is_minimal() {
        println!("{} bytes", bytes.len());
    }
    Ok(())
}
