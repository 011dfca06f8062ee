use anyhow::{Context, Result};
use clap::Parser;
use minilang::{repl, PipelineError, Session};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "minilang", version)]
#[command(about = "Compile and run MiniLang programs on a stack-based virtual machine")]
struct Cli {
    /// Script to run once; starts the REPL when omitted
    script: Option<PathBuf>,

    /// Print the disassembled bytecode before running it
    #[arg(short, long)]
    disassemble: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minilang=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    debug!(?cli, "starting");

    match cli.script {
        Some(path) => run_file(&path, cli.disassemble),
        None => {
            println!("Hello! This is the MiniLang programming language!");
            println!("Feel free to type in commands");
            repl::start(io::stdin().lock(), io::stdout(), cli.disassemble)
                .context("REPL terminated")
        }
    }
}

fn run_file(path: &Path, disassemble: bool) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;

    let mut session = Session::new();
    let outcome = match session.compile(&source) {
        Ok(bytecode) => {
            if disassemble {
                print!("{}", bytecode.instructions);
            }
            session.run(bytecode)
        }
        Err(err) => Err(err),
    };

    if let Err(err) = outcome {
        match err {
            PipelineError::Parse { errors } => {
                eprintln!("Parser errors:");
                for err in errors {
                    eprintln!("\t{}", err);
                }
            }
            PipelineError::Compile { source } => eprintln!("Compilation failed:\n {}", source),
            PipelineError::Runtime { source } => {
                eprintln!("Executing bytecode failed:\n {}", source)
            }
        }
        process::exit(1);
    }

    Ok(())
}
