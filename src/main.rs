use anyhow::Result;
use argh::FromArgs;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use minish::{ExitCode, evaluate, lexer, parser};

#[derive(FromArgs)]
/// A small command-tree shell: sequences, conditionals, pipes, parallel
/// branches and redirections over external programs and a few builtins.
struct Args {
    /// evaluate a single command line, then exit with its status
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// enable trace logging of the evaluator
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let level = if args.verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Warn
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    if let Some(line) = args.command {
        let status = run_line(&line)?;
        std::process::exit(status);
    }

    repl()
}

/// Lex, parse and evaluate one command line. A blank line evaluates to 0.
fn run_line(line: &str) -> Result<ExitCode> {
    let tokens = lexer::split_into_tokens(line)?;
    match parser::construct_tree(tokens)? {
        Some(tree) => Ok(evaluate(&tree)),
        None => Ok(0),
    }
}

fn repl() -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("minish$ ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                if let Err(err) = run_line(&line) {
                    eprintln!("minish: {err}");
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("minish: {err}");
                break;
            }
        }
    }

    Ok(())
}
