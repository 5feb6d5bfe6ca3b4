use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};

use ecpu::output::{self, file_message, message, MsgColor};
use ecpu::RunEnvironment;

/// Instruction-set simulator for the ecpu 8-bit CPU.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Binary image, or `.asm` file to assemble and run directly
    program: PathBuf,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
    /// Print every executed instruction to stderr (also `ECPU_TRACE=1`)
    #[arg(short, long)]
    trace: bool,
}

fn main() -> Result<()> {
    // Usage errors exit with 1 rather than clap's default of 2
    let args = Args::try_parse().unwrap_or_else(|e| {
        // A failed write to a closed stream leaves nothing to report to; the exit code still does
        let _ = e.print();
        std::process::exit(if e.use_stderr() { 1 } else { 0 })
    });
    ecpu::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ecpu::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;
    output::set_minimal(args.minimal);

    let image = load_image(&args.program)?;
    let mut program = RunEnvironment::from_raw(&image).into_diagnostic()?;
    program.set_trace(args.trace || ecpu::env::is_trace_enabled());

    message(MsgColor::Green, "Running", format!("{} byte image", image.len()));
    let steps = program
        .run()
        .inspect_err(|_| file_message(MsgColor::Red, "Aborted", &args.program))
        .into_diagnostic()
        .wrap_err("Execution aborted")?;
    message(MsgColor::Cyan, "Halted", format!("after {steps} instructions"));

    println!("{}", program.processor());
    file_message(MsgColor::Green, "Completed", &args.program);
    Ok(())
}

/// Read a raw binary image, assembling first if given source.
fn load_image(path: &Path) -> Result<Vec<u8>> {
    let is_source = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("asm"));

    if is_source {
        file_message(MsgColor::Green, "Assembling", path);
        let src = fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not open program file {}", path.display()))?;
        ecpu::assemble(&src)
    } else {
        file_message(MsgColor::Green, "Loading", path);
        fs::read(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not open program file {}", path.display()))
    }
}
