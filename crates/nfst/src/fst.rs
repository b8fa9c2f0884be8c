// In-memory compact FST.

use hashbrown::HashMap;

use crate::records::{Arc, RangeArc, State};

/// A compact, immutable FST.
///
/// Symbol arcs live in the XOR-addressed `arcs` table: the arc leaving state
/// `s` on input symbol id `x` sits at `arcs[states[s].base ^ x]` iff that
/// slot's `check` equals `s`. Epsilon and range arcs are contiguous
/// per-state runs in their own arrays, delimited by a change of `check`.
///
/// The structure is never mutated after construction, so decoders on
/// different threads may share one `Fst` by reference.
#[derive(Debug, Default)]
pub struct Fst {
    pub states: Vec<State>,
    pub arcs: Vec<Arc>,
    pub epsilon_arcs: Vec<Arc>,
    pub range_arcs: Vec<RangeArc>,
    /// Input symbol text to id. Id 0 is `<eps>`.
    pub input_symbols: HashMap<String, i32>,
    /// Output symbol text by id. Id 0 is `<eps>`, id 1 is `<alpha>`.
    pub output_symbols: Vec<String>,
}
