//! n-fst: compact finite-state transducer format and decoder.
//!
//! An n-fst file packs a weighted transducer into four parallel arrays plus
//! two symbol tables. Symbol arcs use base-XOR-input addressing so a decoder
//! probe is a single array access; epsilon and range arcs are stored as
//! contiguous per-state runs.
//!
//! - [`records`] -- fixed-layout state and arc records
//! - [`format`] -- binary header parsing and validation
//! - [`fst`] -- the in-memory compact FST, with read/write codec
//! - [`decoder`] -- Viterbi-style beam search over a compact FST

pub mod decoder;
pub mod format;
pub mod fst;
pub mod records;

mod read;
mod write;

pub use decoder::Decoder;
pub use fst::Fst;

/// Output symbol id of `<eps>`. Fixed by the format.
pub const EPSILON_SYMBOL: i32 = 0;

/// Output symbol id of `<alpha>`, the captured-codepoint marker emitted by
/// range arcs. Fixed by the format.
pub const ALPHA_SYMBOL: i32 = 1;

/// Error type for reading and writing n-fst binary data.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("invalid fst header")]
    InvalidHeader,
    #[error("unsupported fst version {0}")]
    UnsupportedVersion(i32),
    #[error("invalid symbol table: {0}")]
    InvalidSymbolTable(String),
    #[error("symbol too long: {0}")]
    SymbolTooLong(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error type for beam decoding.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no active tokens in beam")]
    EmptyBeam,
    #[error("capture symbols and range arcs mismatch")]
    CaptureMismatch,
}
