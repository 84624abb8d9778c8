use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use enkel::ast_printer::AstPrinter;
use enkel::error::EnkelError;
use enkel::lexer::Lexer;
use enkel::report;
use enkel::session::Session;
use enkel::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Enkel language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to enkel.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a file as an Enkel program
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default)
    Repl,

    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its syntax tree
    Parse { filename: PathBuf },
}

/// Exit code for failures found before execution (lex, parse, resolve).
const EXIT_STATIC: i32 = 65;

/// Exit code for failures during execution.
const EXIT_RUNTIME: i32 = 70;

/// Exit code for a script path that does not exist.
const EXIT_NO_INPUT: i32 = 66;

fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let source = fs::read_to_string(filename)
        .with_context(|| format!("Can't find file '{}' script in path", filename.display()))?;

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("enkel.log").context("Failed to create enkel.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("enkel::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "{} [{}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to enkel.log");
    Ok(())
}

fn exit_code(err: &EnkelError) -> i32 {
    if err.is_static() {
        EXIT_STATIC
    } else {
        EXIT_RUNTIME
    }
}

fn run_file(filename: &Path) -> Result<()> {
    let display_name = filename
        .file_name()
        .map_or_else(|| filename.display().to_string(), |n| n.to_string_lossy().into_owned());

    if !filename.exists() {
        eprintln!(
            "{}",
            report::critical(&format!("Can't find file '{}' script in path", display_name))
        );
        std::process::exit(EXIT_NO_INPUT);
    }

    let source = read_file(filename)?;
    let mut session = Session::new();

    info!("Running script: {}", filename.display());
    eprintln!("{}", report::info(&format!("Running script: {}", display_name)));

    if let Err(e) = session.run(&source) {
        debug!("Run failed: {:?}", e);
        eprintln!("{}", report::warning(&e.to_string()));
        std::process::exit(exit_code(&e));
    }

    info!("Program executed successfully");
    Ok(())
}

fn run_prompt() -> Result<()> {
    let mut session = Session::new();

    // each line is its own program; globals persist between them
    session.repl("> ", |e| eprintln!("{}", report::warning(&e.to_string())))?;

    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source = read_file(filename)?;
    let mut tokens: Vec<Token> = Vec::new();
    let mut tokenized = true;

    for token in Lexer::new(&source) {
        match token {
            Ok(token) => tokens.push(token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", report::warning(&e.to_string()));
            }
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?
        );
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC);
        std::process::exit(EXIT_STATIC);
    }

    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;
    let mut session = Session::new();

    match session.parse(&source) {
        Ok(statements) => {
            println!("{}", AstPrinter::print_program(&statements));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", report::warning(&e.to_string()));
            std::process::exit(EXIT_STATIC);
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands.unwrap_or(Commands::Repl) {
        Commands::Run { filename } => run_file(&filename),
        Commands::Repl => run_prompt(),
        Commands::Tokenize { filename, json } => tokenize(&filename, json),
        Commands::Parse { filename } => parse(&filename),
    }
}
