//! Construction side of the n-fst toolchain.
//!
//! A [`MutableFst`] is built arc by arc (typically by the `nregex` grammar
//! compiler), cleaned of disambiguation symbols with
//! [`MutableFst::rm_disambig`], and packed into the compact `nfst` format by
//! [`build`].
//!
//! - [`symbol`] -- the symbol model: literals, reserved symbols,
//!   disambiguation symbols and codepoint ranges
//! - [`symbol_table`] -- bidirectional symbol/id mapping
//! - [`mutable_fst`] -- in-memory weighted transducer under construction
//! - [`builder`] -- normalization and double-array packing

pub mod builder;
pub mod mutable_fst;
pub mod symbol;
pub mod symbol_table;

pub use builder::build;
pub use mutable_fst::{Arc, MutableFst};
pub use symbol::{Reserved, Symbol};
pub use symbol_table::SymbolTable;

/// Error type for FST construction and compaction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("symbol too long: {0}")]
    SymbolTooLong(String),
    #[error("too many input symbols in FST (at most 65536 arc slots per block)")]
    TooManyInputSymbols,
    #[error("multiple arcs with same input symbol in state {0}")]
    DuplicateInputSymbol(usize),
    #[error("special symbol not allowed in FST: {0}")]
    SpecialSymbol(String),
    #[error("key error: {0}")]
    KeyError(String),
}
