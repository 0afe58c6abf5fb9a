/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into a block tree.
pub mod parser;

/// The semantic analyzer walks the block tree, resolving names and checking
/// types, and drives the translator to lower the program into IR fragments.
pub mod semantic;

/// The translator builds IR nodes, synthesizes labels and tracks the stack
/// of activation levels while the semantic analyzer walks the tree.
pub mod translate;

pub mod ast;
pub mod env;
pub mod ir;
pub mod symbol;
pub mod token;
pub mod types;

pub mod util {
    pub mod tree;
}

use thiserror::Error;

/// A failure from any stage of the pipeline, tagged by the stage it
/// originated from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Lexer(lexer::Error),
    #[error("{0}")]
    Parser(parser::Error),
    #[error("{0}")]
    Semantic(#[from] semantic::Error),
}

impl Error {
    /// The conventional stage prefix for diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Lexer(_) => "LEXER",
            Error::Parser(_) => "PARSER",
            Error::Semantic(_) => "SEMANTIC",
        }
    }
}

impl From<lexer::Error> for Error {
    fn from(error: lexer::Error) -> Error {
        Error::Lexer(error)
    }
}

impl From<parser::Error> for Error {
    fn from(error: parser::Error) -> Error {
        // A lexer failure surfaces through the parser, but it should still
        // be reported under the stage that produced it.
        match error {
            parser::Error::Lexer(inner) => Error::Lexer(inner),
            other => Error::Parser(other),
        }
    }
}

/// Runs the whole front end over a source buffer, returning the lowered
/// fragments together with the symbol table that names them.
pub fn analyse_source(source: &str) -> Result<(Vec<ir::Fragment>, symbol::SymbolTable), Error> {
    let (program, mut symbols) = parser::parse(source)?;
    let fragments = semantic::Semantic::new(&mut symbols).analyse(&program)?;
    Ok((fragments, symbols))
}
