//! Evaluation driver: encode → decode → RMSE/PSNR metrics and figures.

use clap::Parser;
use mcdc::cli::{run_evaluate, EvaluateArgs};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match EvaluateArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let is_usage_error = e.use_stderr();
            let _ = e.print();
            return if is_usage_error {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run_evaluate(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            ExitCode::from(2)
        }
    }
}
