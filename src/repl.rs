// File: src/repl.rs
//
// Interactive REPL for Pebble. One persistent Vm, a line-accumulation
// buffer for inputs with unbalanced braces, and `:`-prefixed meta-commands.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::vm::Vm;

pub struct Repl {
    vm: Vm,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let editor = DefaultEditor::new()?;
        let mut vm = Vm::new();
        crate::stdlib::install(&mut vm);
        Ok(Repl { vm, editor })
    }

    fn show_banner(&self) {
        println!("{}", "Pebble REPL".bright_cyan().bold());
        println!(
            "  {} Use {}{}{}{}",
            "Welcome!".bright_green(),
            ":".bright_blue(),
            "help".bright_yellow(),
            " for commands or ".bright_blue(),
            ":quit".bright_yellow()
        );
        println!();
    }

    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                "pebble> ".bright_green().to_string()
            } else {
                "   ...> ".bright_blue().to_string()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim()) {
                            continue;
                        } else {
                            break;
                        }
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if is_input_complete(&buffer) {
                        self.eval_input(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (Ctrl+C to interrupt, :quit to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "\nGoodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    eprintln!("{} {}", "Error:".bright_red(), err);
                    break;
                }
            }
        }

        Ok(())
    }

    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":help" | ":h" => {
                self.show_help();
                true
            }
            ":quit" | ":q" => {
                println!("{}", "Goodbye!".bright_cyan());
                false
            }
            ":dump" => {
                println!("{}", self.vm.environment().to_string_dump());
                true
            }
            _ => {
                println!(
                    "{} Unknown command: {}. Type {}{}{}",
                    "Error:".bright_red(),
                    cmd.bright_yellow(),
                    ":".bright_blue(),
                    "help".bright_yellow(),
                    " for available commands.".bright_blue()
                );
                true
            }
        }
    }

    fn show_help(&self) {
        println!();
        println!("{}", "REPL Commands:".bright_cyan().bold());
        println!("  {}{}  Display this help message", ":help".bright_yellow(), " or :h  ".dimmed());
        println!("  {}{}  Exit the REPL", ":quit".bright_yellow(), " or :q  ".dimmed());
        println!("  {}   Print the current stack", ":dump".bright_yellow());
        println!();
        println!("Leave a block's {{ unclosed to continue input on the next line.");
        println!();
    }

    fn eval_input(&mut self, input: &str) {
        match self.vm.eval(input) {
            Some(env) => println!("{}", env.to_string_dump()),
            None => {
                if let Some(error) = self.vm.get_error_detail() {
                    eprintln!("{}", error);
                }
            }
        }
    }
}

/// True once every `{`/`}` opened in `input` has been closed, ignoring
/// braces that appear inside a string or a comment.
fn is_input_complete(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return true;
    }

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut in_comment = false;

    for ch in trimmed.chars() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }

        match ch {
            '\'' => in_string = !in_string,
            '#' if !in_string => in_comment = true,
            '{' if !in_string => depth += 1,
            '}' if !in_string => depth -= 1,
            _ => {}
        }
    }

    depth <= 0
}
