// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Interactive SQL shell over the storage engine.
//!
//! Takes the environment directory as its single argument, reads one SQL
//! statement per line, prints the canonical form and the query result.
//! `quit` exits, `test` runs the built-in suites.

use clap::{ArgAction, Parser};
use heap_store::catalog::Catalog;
use heap_store::{exec, selftest, sql};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    prelude::*,
    registry::Registry,
};

/// Interactive SQL shell over the heap storage engine
#[derive(Parser, Debug)]
#[command(name = "heap-sql")]
#[command(about = "Interactive SQL shell over the heap storage engine")]
struct ShellArgs {
    /// Directory holding the database environment (created if missing)
    env_path: PathBuf,

    /// Suppress all output except for errors. This overrides the -v flag.
    #[arg(short, long)]
    quiet: bool,

    /// Turn on verbose output. Supply -v multiple times to increase verbosity.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level_filter = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    // Bridge log crate macros to tracing (the library logs through log::*)
    tracing_log::LogTracer::init().expect("Failed to set log tracer");

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("HEAP_LOG")
        .from_env_lossy()
        .add_directive(
            "rustyline=warn"
                .parse()
                .expect("Failed to parse rustyline directive"),
        );

    let subscriber = Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact(),
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("INTERNAL ERROR: setting default tracing::subscriber failed");
        std::process::exit(1);
    }
}

fn main() -> ExitCode {
    let args = ShellArgs::parse();
    init_tracing(args.quiet, args.verbose);

    let mut catalog = match Catalog::open(&args.env_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if std::io::stdin().is_terminal() {
        interactive(&mut catalog)
    } else {
        piped(&mut catalog)
    }
}

fn interactive(catalog: &mut Catalog) -> ExitCode {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    loop {
        match editor.readline("SQL> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(&line);
                if !run_line(catalog, &line) {
                    return ExitCode::SUCCESS;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
}

fn piped(catalog: &mut Catalog) -> ExitCode {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if !run_line(catalog, &line) {
                    break;
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

/// Handles one input line. Returns `false` when the shell should exit.
fn run_line(catalog: &mut Catalog, line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }
    if line == "quit" {
        return false;
    }
    if line == "test" {
        selftest::run_all(catalog.dir());
        return true;
    }

    match sql::parse::parse(line) {
        Err(e) => println!("invalid SQL: {line}\n{e}"),
        Ok(statements) => {
            for statement in statements {
                println!("{}", sql::unparse::statement(&statement));
                match exec::execute(catalog, &statement) {
                    Ok(result) => println!("{result}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
        }
    }
    true
}
