// Double-array compaction of a mutable FST into the compact n-fst format.
//
// Symbol arcs are packed with base-XOR-input addressing, the table
// compression scheme described in the "Table-Compression Methods" section of
// Aho, Sethi & Ullman, "Compilers: Principles, Techniques, and Tools" (1985):
// the arc leaving state s on input id x lands in slot base[s] ^ x, and the
// slot's check field names s so misses are detected in one probe.

use hashbrown::HashMap;
use tracing::debug;

use nfst::records::{Arc as PackedArc, RangeArc, State};
use nfst::Fst;

use crate::mutable_fst::{Arc, MutableFst};
use crate::symbol::Symbol;
use crate::symbol_table::SymbolTable;
use crate::BuildError;

/// Largest permitted block size. Bounds the input symbol table so the XOR
/// addressing stays within 16-bit block offsets.
const MAX_BLOCK_SIZE: usize = 65536;

/// A block of `block_size` arc slots with at least one empty slot left.
struct BlockInfo {
    id: usize,
    free_arcs: usize,
}

struct Builder {
    states: Vec<State>,
    arcs: Vec<PackedArc>,
    epsilon_arcs: Vec<PackedArc>,
    range_arcs: Vec<RangeArc>,
    free_blocks: Vec<BlockInfo>,
    input_table: SymbolTable,
    output_table: SymbolTable,
    block_size: usize,
}

/// Compact a mutable FST into the n-fst format.
///
/// The input FST is first checked (no disambiguation symbols left, literal
/// symbols at most 255 bytes) and normalized so every state has at most one
/// outgoing arc per non-epsilon input symbol; the packing passes then place
/// symbol arcs into XOR-addressed blocks and epsilon/range arcs into
/// contiguous per-state runs.
pub fn build(fst: &MutableFst) -> Result<Fst, BuildError> {
    check_fst(fst, false)?;
    let fst = normalize(fst);
    if let Err(err) = check_fst(&fst, true) {
        // normalization guarantees the determinism precondition
        panic!("normalized FST failed validation: {err}");
    }

    let mut builder = Builder::new();
    builder.collect_symbols(&fst);
    builder.block_size = compute_block_size(builder.input_table.len());
    if builder.block_size > MAX_BLOCK_SIZE {
        return Err(BuildError::TooManyInputSymbols);
    }

    builder.states = vec![State::empty(); fst.num_states()];
    builder.add_symbol_arcs(&fst);
    builder.add_epsilon_arcs(&fst);
    builder.add_range_arcs(&fst);
    for state in 0..fst.num_states() {
        builder.states[state].final_weight = fst.final_weight(state);
    }

    Ok(builder.finish())
}

/// Block size for a given input symbol table: a power of two, at least 256
/// and at least twice the next power of two above the symbol count, so that
/// `base ^ id` never leaves the block the base sits in.
fn compute_block_size(num_input_symbols: usize) -> usize {
    let bits = (usize::BITS - num_input_symbols.leading_zeros()) as usize;
    (1usize << (bits + 1)).max(256)
}

/// Validate a symbol for the compact format.
fn check_symbol(symbol: &Symbol) -> Result<(), BuildError> {
    match symbol {
        Symbol::Epsilon | Symbol::Reserved(_) | Symbol::Range { .. } => Ok(()),
        Symbol::Disambig(_) => Err(BuildError::SpecialSymbol(symbol.to_string())),
        Symbol::Literal(text) if text.len() > 255 => {
            Err(BuildError::SymbolTooLong(symbol.to_string()))
        }
        Symbol::Literal(_) => Ok(()),
    }
}

/// Validate all arcs of the FST. With `check_determinism`, additionally
/// require at most one outgoing arc per non-epsilon, non-range input symbol
/// per state.
fn check_fst(fst: &MutableFst, check_determinism: bool) -> Result<(), BuildError> {
    for state in 0..fst.num_states() {
        let mut seen = hashbrown::HashSet::new();
        for arc in fst.arcs(state) {
            check_symbol(&arc.input)?;
            check_symbol(&arc.output)?;

            if !check_determinism || arc.input == Symbol::Epsilon || arc.input.is_range() {
                continue;
            }
            if !seen.insert(arc.input.clone()) {
                return Err(BuildError::DuplicateInputSymbol(state));
            }
        }
    }
    Ok(())
}

/// Make the FST input-deterministic: for every state, a non-epsilon input
/// symbol carried by more than one arc is re-routed through a fresh
/// intermediate state reached by a single `sym:eps` arc, with the original
/// arcs re-added from there under epsilon input. Epsilon arcs pass through
/// unchanged, as do single-arc symbols.
fn normalize(src: &MutableFst) -> MutableFst {
    let mut out = MutableFst::new();
    for _ in 1..src.num_states() {
        out.add_state();
    }
    for state in 0..src.num_states() {
        let final_weight = src.final_weight(state);
        if final_weight.is_finite() {
            out.set_final(state, final_weight);
        }
    }

    for state in 0..src.num_states() {
        // group arcs by input symbol, preserving first-seen order
        let mut order: Vec<Symbol> = Vec::new();
        let mut groups: HashMap<Symbol, Vec<&Arc>> = HashMap::new();
        for arc in src.arcs(state) {
            groups
                .entry(arc.input.clone())
                .or_insert_with(|| {
                    order.push(arc.input.clone());
                    Vec::new()
                })
                .push(arc);
        }

        for symbol in order {
            let arcs = &groups[&symbol];
            if symbol == Symbol::Epsilon || arcs.len() == 1 {
                for arc in arcs {
                    out.add_arc(state, (*arc).clone());
                }
                continue;
            }

            let mid = out.add_state();
            out.add_arc(
                state,
                Arc {
                    next_state: mid,
                    input: symbol,
                    output: Symbol::Epsilon,
                    weight: 0.0,
                },
            );
            for arc in arcs {
                out.add_arc(
                    mid,
                    Arc {
                        next_state: arc.next_state,
                        input: Symbol::Epsilon,
                        output: arc.output.clone(),
                        weight: arc.weight,
                    },
                );
            }
        }
    }

    out
}

impl Builder {
    fn new() -> Builder {
        Builder {
            states: Vec::new(),
            arcs: Vec::new(),
            epsilon_arcs: Vec::new(),
            range_arcs: Vec::new(),
            free_blocks: Vec::new(),
            input_table: SymbolTable::new(),
            output_table: SymbolTable::new(),
            block_size: 0,
        }
    }

    /// Intern every arc symbol of the FST into the builder's tables.
    fn collect_symbols(&mut self, fst: &MutableFst) {
        for state in 0..fst.num_states() {
            for arc in fst.arcs(state) {
                self.input_table.insert_or_find(&arc.input);
                self.output_table.insert_or_find(&arc.output);
            }
        }
    }

    /// Append a fresh block of empty slots and register it as free.
    fn add_block(&mut self) -> usize {
        let id = self.arcs.len() / self.block_size;
        self.arcs
            .extend(std::iter::repeat(PackedArc::empty()).take(self.block_size));
        self.free_blocks.push(BlockInfo {
            id,
            free_arcs: self.block_size,
        });
        debug!(block = id, "allocated arc block");
        id
    }

    /// First-fit search for a base that places all of `input_ids` on empty
    /// slots. Falls back to the first slot of a fresh block.
    fn find_base(&mut self, input_ids: &[u32]) -> usize {
        assert!(!input_ids.is_empty(), "find_base on empty symbol list");

        for block in &self.free_blocks {
            if block.free_arcs < input_ids.len() {
                continue;
            }
            let begin = block.id * self.block_size;
            let end = begin + self.block_size;
            for base in begin..end {
                let fits = input_ids
                    .iter()
                    .all(|&id| self.arcs[base ^ id as usize].is_empty());
                if fits {
                    return base;
                }
            }
        }

        // no block can host this state; a fresh block always can
        self.add_block() * self.block_size
    }

    /// Decrement the free count of the block containing `base`, dropping the
    /// block from the free list once it is full.
    fn update_block(&mut self, base: usize, placed: usize) {
        let block_id = base / self.block_size;
        let idx = self
            .free_blocks
            .iter()
            .position(|b| b.id == block_id)
            .expect("placed arcs into a block missing from the free list");

        let block = &mut self.free_blocks[idx];
        assert!(block.free_arcs >= placed, "block free count underflow");
        block.free_arcs -= placed;
        if block.free_arcs == 0 {
            // keep the remaining blocks in insertion order for first-fit
            self.free_blocks.remove(idx);
        }
    }

    /// The non-epsilon, non-range input symbol ids leaving `state`.
    fn symbol_ids_of_state(&self, fst: &MutableFst, state: usize) -> Vec<u32> {
        fst.arcs(state)
            .iter()
            .filter(|arc| arc.input != Symbol::Epsilon && !arc.input.is_range())
            .map(|arc| {
                self.input_table
                    .find(&arc.input)
                    .expect("arc symbol interned during collection")
            })
            .collect()
    }

    /// Pack the symbol arcs of every state into the XOR-addressed table.
    fn add_symbol_arcs(&mut self, fst: &MutableFst) {
        for state in 0..fst.num_states() {
            let input_ids = self.symbol_ids_of_state(fst, state);
            if input_ids.is_empty() {
                continue;
            }

            let base = self.find_base(&input_ids);
            for arc in fst.arcs(state) {
                if arc.input == Symbol::Epsilon || arc.input.is_range() {
                    continue;
                }
                let id = self
                    .input_table
                    .find(&arc.input)
                    .expect("arc symbol interned during collection");
                let slot = base ^ id as usize;
                let output_symbol = self.output_id(&arc.output);
                assert!(self.arcs[slot].is_empty(), "base placement collided");
                self.arcs[slot] = PackedArc {
                    target_state: arc.next_state as i32,
                    output_symbol,
                    weight: arc.weight,
                    check: state as i32,
                };
            }

            self.update_block(base, input_ids.len());
            self.states[state].base = base as i32;
        }
    }

    /// Append every state's epsilon arcs as one contiguous run.
    fn add_epsilon_arcs(&mut self, fst: &MutableFst) {
        for state in 0..fst.num_states() {
            let epsilon_base = self.epsilon_arcs.len();
            let mut has_arcs = false;
            for arc in fst.arcs(state) {
                if arc.input != Symbol::Epsilon {
                    continue;
                }
                has_arcs = true;
                let output_symbol = self.output_id(&arc.output);
                self.epsilon_arcs.push(PackedArc {
                    target_state: arc.next_state as i32,
                    output_symbol,
                    weight: arc.weight,
                    check: state as i32,
                });
            }
            if has_arcs {
                self.states[state].epsilon_base = epsilon_base as i32;
            }
        }
    }

    /// Append every state's range arcs as one contiguous run.
    fn add_range_arcs(&mut self, fst: &MutableFst) {
        for state in 0..fst.num_states() {
            let range_base = self.range_arcs.len();
            let mut has_arcs = false;
            for arc in fst.arcs(state) {
                let Symbol::Range { begin, end } = arc.input else {
                    continue;
                };
                has_arcs = true;
                let output_symbol = self.output_id(&arc.output);
                self.range_arcs.push(RangeArc {
                    begin: begin as i32,
                    end: end as i32,
                    target_state: arc.next_state as i32,
                    output_symbol,
                    weight: arc.weight,
                    check: state as i32,
                });
            }
            if has_arcs {
                self.states[state].range_base = range_base as i32;
            }
        }
    }

    fn output_id(&self, symbol: &Symbol) -> i32 {
        self.output_table
            .find(symbol)
            .expect("arc symbol interned during collection") as i32
    }

    /// Emit the compact FST, rendering symbol tables to text: literals as
    /// raw text, markers in escaped form.
    fn finish(self) -> Fst {
        let output_symbols: Vec<String> = self.output_table.iter().map(symbol_text).collect();

        let mut input_symbols = hashbrown::HashMap::with_capacity(self.input_table.len());
        for (id, symbol) in self.input_table.iter().enumerate() {
            input_symbols.insert(symbol_text(symbol), id as i32);
        }

        debug!(
            states = self.states.len(),
            arcs = self.arcs.len(),
            epsilon_arcs = self.epsilon_arcs.len(),
            range_arcs = self.range_arcs.len(),
            "compacted fst"
        );

        Fst {
            states: self.states,
            arcs: self.arcs,
            epsilon_arcs: self.epsilon_arcs,
            range_arcs: self.range_arcs,
            input_symbols,
            output_symbols,
        }
    }
}

fn symbol_text(symbol: &Symbol) -> String {
    match symbol {
        Symbol::Literal(text) => text.clone(),
        marker => marker.escaped(),
    }
}
