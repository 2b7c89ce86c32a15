use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use ordtree::btree::DEFAULT_CAPACITY;
use ordtree::shell::{Response, Shell, ShellResult};

/// Interactive shell over an in-memory B-tree
#[derive(Debug, Parser)]
#[command(name = "ordtree", version)]
struct Args {
    /// Maximum entries per node
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// CSV file (key,value with header) to load before starting
    #[arg(short, long)]
    load: Option<PathBuf>,

    /// Run the commands in this file instead of reading from the terminal
    #[arg(short, long)]
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> ShellResult<()> {
    let mut shell = Shell::new(args.capacity)?;

    if let Some(path) = &args.load {
        let rows = shell.load_csv(path)?;
        println!("Loaded {} row(s) from {}", rows, path.display());
    }

    match &args.script {
        Some(script) => {
            let input = fs::read_to_string(script)?;
            for outcome in shell.run_line(&input) {
                print!("{}", outcome?.render());
            }
            Ok(())
        }
        None => repl(&mut shell),
    }
}

fn repl(shell: &mut Shell) -> ShellResult<()> {
    let mut editor = DefaultEditor::new()?;

    loop {
        let line = match editor.readline("ordtree> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        if line.trim().is_empty() {
            continue;
        }
        editor.add_history_entry(line.as_str())?;

        for outcome in shell.run_line(&line) {
            match outcome {
                Ok(Response::Exit) => return Ok(()),
                Ok(response) => print!("{}", response.render()),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
    }
}
