// File: src/main.rs
//
// Main entry point for the Pebble scripting language. Handles command-line
// argument parsing and dispatches to the appropriate subcommand (run,
// repl, or check).

mod bytecode;
mod dictionary;
mod errors;
mod parser;
mod repl;
mod stack;
mod stdlib;
mod value;
mod vm;

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use vm::Vm;

#[derive(ClapParser)]
#[command(
    name = "pebble",
    about = "Pebble: a small concatenative, stack-oriented scripting language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a Pebble script file
    Run {
        /// Path to the script file
        file: PathBuf,
    },

    /// Launch interactive Pebble REPL
    Repl,

    /// Parse a script without running it
    Check {
        /// Path to the script file
        file: PathBuf,
    },
}

/// Reads `path`, skipping any line that begins with `#!` (a shebang line),
/// matching the reference interpreter's `loadSource`.
fn load_source(path: &PathBuf) -> std::io::Result<String> {
    let raw = fs::read_to_string(path)?;
    let mut source = String::new();
    for line in raw.lines() {
        if line.starts_with("#!") {
            continue;
        }
        source.push_str(line);
        source.push('\n');
    }
    Ok(source)
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file } => {
            let source = match load_source(&file) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{} Failed to read {}: {}", "Error:".red().bold(), file.display(), e);
                    std::process::exit(1);
                }
            };

            let mut vm = Vm::new();
            stdlib::install(&mut vm);

            if vm.eval(&source).is_none() {
                if let Some(error) = vm.get_error_detail() {
                    eprintln!("{}", error);
                }
                std::process::exit(1);
            }
        }

        Commands::Repl => match repl::Repl::new() {
            Ok(mut repl) => {
                if let Err(e) = repl.run() {
                    eprintln!("REPL error: {}", e);
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Failed to start REPL: {}", e);
                std::process::exit(1);
            }
        },

        Commands::Check { file } => {
            let source = match load_source(&file) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{} Failed to read {}: {}", "Error:".red().bold(), file.display(), e);
                    std::process::exit(1);
                }
            };

            match parser::parse(&source) {
                Ok(_) => println!("{}", "OK".green().bold()),
                Err(errors) => {
                    for e in errors {
                        eprintln!("{}", e);
                    }
                    std::process::exit(1);
                }
            }
        }
    }
}
