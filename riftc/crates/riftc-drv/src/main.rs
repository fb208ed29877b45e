//! The `riftc` binary.
//!
//! Usage: `riftc [-d] [script]`. With a script argument the file is
//! evaluated in a fresh environment and the result printed; without one
//! the interactive console starts. `-d` enables debug dumps of the IR
//! before and after each optimization pass.

use anyhow::Context;
use riftc_drv::{initialize, jit::Session, repl};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1).peekable();

    let debug = args.peek().map(|a| a == "-d").unwrap_or(false);
    if debug {
        args.next();
    }

    let script = args.next();
    if args.next().is_some() {
        eprintln!("Only one script can be loaded at a time");
        return ExitCode::from(1);
    }

    initialize(debug);

    match script {
        Some(path) => match run_script(&path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::from(1)
            }
        },
        None => match repl::interactive() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::from(1)
            }
        },
    }
}

fn run_script(path: &str) -> anyhow::Result<()> {
    let source =
        std::fs::read_to_string(path).with_context(|| format!("Unable to open file {}", path))?;
    let mut session = Session::new()?;
    let rendered = session.eval_to_string(&source)?;
    println!("{}", rendered);
    Ok(())
}
