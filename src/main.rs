mod cli;
mod logging;

use crate::cli::{Args, Mode};
use anyhow::{Context, Result};
use serde_json::json;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use tool_protocol::config::{load_catalog, load_settings};
use tool_protocol::{render_catalog, Parser, TrailingCallPolicy};
use tracing::error;

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model output from {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read model output from stdin")?;
            Ok(text)
        }
    }
}

fn run(mode: Mode) -> Result<ExitCode> {
    match mode {
        Mode::Render { catalog } => {
            let catalog = load_catalog(&catalog)?;
            print!("{}", render_catalog(&catalog));
            Ok(ExitCode::SUCCESS)
        }
        Mode::Parse {
            catalog,
            input,
            reject_trailing,
        } => {
            let catalog = load_catalog(&catalog)?;
            let mut options = load_settings()?.parse_options();
            if reject_trailing {
                options.trailing_calls = TrailingCallPolicy::Reject;
            }

            let text = read_input(input.as_deref())?;
            match Parser::new(&catalog).with_options(options).parse(&text) {
                Ok(call) => {
                    println!("{}", serde_json::to_string_pretty(&call)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    let report = json!({
                        "error": e.code(),
                        "message": e.to_string(),
                        "fragment": e.fragment,
                        "retryable": e.is_retryable(),
                        "feedback": e.feedback(&catalog),
                    });
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok(ExitCode::from(1))
                }
            }
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::setup_logging(args.verbose);

    match run(args.mode) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
