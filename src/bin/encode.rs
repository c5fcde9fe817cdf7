//! Encoder driver: compress a medical image into an MCDC container.

use clap::Parser;
use mcdc::cli::{run_encode, EncodeArgs};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match EncodeArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let is_usage_error = e.use_stderr();
            let _ = e.print();
            return if is_usage_error {
                ExitCode::from(1)
            } else {
                // --help / --version
                ExitCode::SUCCESS
            };
        }
    };

    match run_encode(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            ExitCode::from(2)
        }
    }
}
