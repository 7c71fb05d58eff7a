use clap::{Arg, ArgAction, Command};
use loop_lang::runner::{self, RunOptions};
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    let matches = Command::new("loop")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interpreter for the Loop expression language")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("eval")
                .short('e')
                .long("eval")
                .value_name("SOURCE")
                .help("Evaluate SOURCE and print its value")
                .conflicts_with("file"),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .conflicts_with_all(["file", "eval"])
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("List the tokens of the input instead of evaluating it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("plain")
                .long("plain")
                .help("Render errors as a plain text context window")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("verbose") {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::init();
    }

    let plain_errors = matches.get_flag("plain");
    let dump = matches.get_flag("tokens");

    if let Some(source) = matches.get_one::<String>("eval") {
        let options = RunOptions {
            filename: Some("<eval>".to_string()),
            plain_errors,
        };
        execute(source, &options, dump);
    } else if let Some(file_path) = matches.get_one::<String>("file") {
        let source = read_file(file_path);
        let options = RunOptions {
            filename: Some(file_path.clone()),
            plain_errors,
        };
        execute(&source, &options, dump);
    } else {
        loop_lang::start_repl(RunOptions {
            filename: None,
            plain_errors,
        });
    }
}

fn read_file(path: &str) -> String {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        process::exit(1);
    }

    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn execute(source: &str, options: &RunOptions, dump: bool) {
    if dump {
        let (listing, error) = runner::dump_tokens(source);
        print!("{}", listing);
        if let Some(error) = error {
            options.report(&error, source);
            process::exit(1);
        }
        return;
    }

    match runner::run(source, options) {
        Ok(Some(value)) => println!("{}", value),
        Ok(None) => {}
        Err(_) => process::exit(1),
    }
}
