use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing::debug;

use pascalc::{lexer::Lexer, parser, semantic::Semantic, util::tree, Error};

#[derive(Parser)]
#[command(name = "pascalc", version, about = "Front end for a Pascal-like language")]
struct Cli {
    /// Path to the source file.
    source: PathBuf,

    /// Print the token stream before parsing.
    #[arg(long)]
    dump_tokens: bool,

    /// Print the parsed tree before analysis.
    #[arg(long)]
    dump_ast: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let source = fs::read_to_string(&cli.source)
        .map_err(|error| format!("{}: {error}", cli.source.display()))?;

    if cli.dump_tokens {
        dump_tokens(&source).map_err(stage_message)?;
    }

    let (program, mut symbols) = parser::parse(&source).map_err(|e| stage_message(e.into()))?;
    debug!("parsing complete");

    if cli.dump_ast {
        print!("{}", tree::print_block_string(&symbols, &program));
    }

    let fragments = Semantic::new(&mut symbols)
        .analyse(&program)
        .map_err(|e| stage_message(e.into()))?;
    debug!(fragments = fragments.len(), "analysis complete");

    println!("analysed {} fragment(s)", fragments.len());
    for fragment in &fragments {
        println!("  {}", symbols.resolve(fragment.level.name()));
    }
    Ok(())
}

fn dump_tokens(source: &str) -> Result<(), Error> {
    let mut lexer = Lexer::new(source);
    loop {
        let token = lexer.lex()?;
        println!("{token}");
        if token.is_eof() {
            return Ok(());
        }
    }
}

fn stage_message(error: Error) -> String {
    format!("{}: {}", error.stage(), error)
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
