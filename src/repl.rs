use crate::environment::Environment;
use crate::error::LoopError;
use crate::runner::{self, RunOptions};
use crate::value::Value;
use std::io::{self, Write};

/// State kept between REPL lines.
pub struct Session {
    environment: Environment,
    options: RunOptions,
}

impl Session {
    pub fn new(options: RunOptions) -> Self {
        Self {
            environment: Environment::new(),
            options,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn evaluate(&mut self, source: &str) -> Result<Option<Value>, LoopError> {
        runner::evaluate_in(source, &mut self.environment)
    }

    /// One line per binding: `name: kind const|mut = value`.
    pub fn describe_environment(&self) -> String {
        if self.environment.is_empty() {
            return "(no bindings)\n".to_string();
        }

        let mut out = String::new();
        for name in self.environment.names() {
            if let Some(binding) = self.environment.binding(name) {
                out.push_str(&format!(
                    "{}: {} {} = {}\n",
                    name,
                    binding.value.kind(),
                    if binding.constant { "const" } else { "mut" },
                    binding.value
                ));
            }
        }
        out
    }

    fn run_line(&mut self, line: &str) {
        match self.evaluate(line) {
            Ok(Some(value)) => println!("{}", value),
            Ok(None) => {}
            Err(error) => self.options.report(&error, line),
        }
    }
}

pub fn start(options: RunOptions) {
    println!("Loop {}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or 'quit' to leave, ':env' to list bindings");
    println!();

    let mut session = Session::new(options);

    loop {
        print!("loop> ");
        if let Err(error) = io::stdout().flush() {
            log::warn!("failed to flush prompt: {}", error);
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF (Ctrl+D or end of piped input)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                match line {
                    "" => continue,
                    "exit" | "quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    ":env" => print!("{}", session.describe_environment()),
                    _ => session.run_line(line),
                }
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}
