//! The interactive console.
//!
//! One statement per prompt; a trailing `\` continues the input on the
//! next line. `exit` quits, empty input is ignored, and every error is
//! caught and reported at statement granularity.

use crate::jit::Session;
use std::io::{BufRead, Write};

pub fn interactive() -> std::io::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    println!("rift console - type exit to quit");

    let mut session = match Session::new() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(());
        }
    };

    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        loop {
            let line = match lines.next() {
                Some(line) => line?,
                None => return Ok(()),
            };
            match line.strip_suffix('\\') {
                Some(rest) => {
                    input.push_str(rest);
                    input.push('\n');
                }
                None => {
                    input.push_str(&line);
                    break;
                }
            }
        }

        let input = input.trim();
        if input == "exit" {
            return Ok(());
        }
        if input.is_empty() {
            continue;
        }

        match session.eval_to_string(input) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => eprintln!("{}", e),
        }
    }
}
