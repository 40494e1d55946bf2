//! deconf - Project config files kept in one markdown document

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = deconf::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
