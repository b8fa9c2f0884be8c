//! n-regex: a small grammar language compiled to n-fst transducers.
//!
//! A grammar is a set of named rules over literals, character classes,
//! quantified closures, weighted alternations and rule references. Rules
//! marked with a `$capture` declaration bracket their expansion with
//! `<name>`/`</name>` output tokens.
//!
//! - [`reader`] -- line reader with position tracking
//! - [`ast`] -- the expression tree and its FST compilation
//! - [`grammar`] -- rule collection, reference checking, `build_fst`
//!
//! ```
//! use nregex::Grammar;
//!
//! let grammar = Grammar::from_string("<hello> ::= he*llo").unwrap();
//! let fst = grammar.build_fst("hello").unwrap();
//! let decoder = nfst::Decoder::new(&fst, 8);
//! assert_eq!(decoder.decode_string("heello").unwrap().join(""), "heello");
//! ```

pub mod ast;
pub mod grammar;
pub mod reader;

mod parse;

pub use ast::Ast;
pub use grammar::Grammar;

use reader::Reader;

/// Error type for grammar parsing and compilation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{file}:{line}:{col} {detail}")]
    Syntax {
        file: String,
        line: usize,
        col: usize,
        detail: &'static str,
    },
    #[error("{detail} at rule <{}>", last_rule(.ref_stack))]
    Grammar {
        detail: String,
        ref_stack: Vec<String>,
    },
    #[error(transparent)]
    Build(#[from] nfst_build::BuildError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn last_rule(ref_stack: &[String]) -> &str {
    ref_stack.last().map(String::as_str).unwrap_or("?")
}

/// Syntax error details.
pub(crate) mod detail {
    pub const UNEXPECTED_EOL: &str = "unexpected end of expression";
    pub const UNEXPECTED_EOF: &str = "unexpected end of file";
    pub const UNEXPECTED_CHAR: &str = "unexpected token";
    pub const UNEXPECTED_ARG_NAME: &str = "unexpected argument name";
    pub const EMPTY_EXPR: &str = "expression is empty";
    pub const INVALID_CLOSURE: &str = "invalid closure expression";
    pub const RANGE_OUT_OF_ORDER: &str = "range out of order";
    pub const INTERNAL: &str = "internal error";
}

/// A syntax error at the reader's current position.
pub(crate) fn syntax_error(reader: &Reader, detail: &'static str) -> Error {
    syntax_error_at(reader, reader.position(), detail)
}

/// A syntax error at an explicit column of the reader's current line.
pub(crate) fn syntax_error_at(reader: &Reader, col: usize, detail: &'static str) -> Error {
    Error::Syntax {
        file: reader.filename().to_string(),
        line: reader.line(),
        col,
        detail,
    }
}
