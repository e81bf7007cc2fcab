//! CLI driver: read a program from a file argument (or stdin if none is
//! given), compile it, and print the resulting assembly to stdout. No REPL —
//! this compiler has nothing useful to do with a single typed line, so there
//! is only the one-shot path.

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let source = match read_input() {
        Ok(source) => source,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match toycc::compile(&source) {
        Ok(lines) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for line in lines {
                if writeln!(out, "{line}").is_err() {
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn read_input() -> io::Result<String> {
    match env::args().nth(1) {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
