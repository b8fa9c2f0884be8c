// Beam decoder: Viterbi-style search over a compact FST.

use std::collections::VecDeque;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use tracing::{debug, trace};

use crate::fst::Fst;
use crate::{DecodeError, ALPHA_SYMBOL, EPSILON_SYMBOL};

/// One node in the decoding lattice.
///
/// Tokens form a DAG through `prev` indices into the search arena. A pruned
/// token stays in the arena because surviving tokens may still reach it
/// through their back-pointers; the whole arena is dropped when the decode
/// call returns.
#[derive(Debug, Clone, Copy)]
struct Token {
    state: i32,
    output: i32,
    cost: f32,
    prev: Option<u32>,
    capture: Option<char>,
}

/// Beam decoder over a compact FST.
///
/// The decoder borrows the FST immutably, so any number of decoders may
/// share one FST, including across threads. Each `decode_string` call uses
/// its own token arena and beam.
pub struct Decoder<'a> {
    fst: &'a Fst,
    beam_size: usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder with the given beam width. `beam_size` must be at
    /// least 1.
    pub fn new(fst: &'a Fst, beam_size: usize) -> Decoder<'a> {
        assert!(beam_size > 0, "beam_size must be positive");
        Decoder { fst, beam_size }
    }

    /// Decode an input string, consuming it codepoint by codepoint, and
    /// return the output symbols of the best accepting path.
    pub fn decode_string(&self, input: &str) -> Result<Vec<String>, DecodeError> {
        let inputs: Vec<String> = input.chars().map(String::from).collect();
        self.decode(&inputs)
    }

    /// Decode a pre-split input sequence. Each element is matched as one
    /// input symbol; single-codepoint elements additionally match range arcs.
    pub fn decode(&self, inputs: &[String]) -> Result<Vec<String>, DecodeError> {
        let mut search = Search::new(self.fst, self.beam_size);

        for (i, symbol) in inputs.iter().enumerate() {
            let symbol_id = self.fst.input_symbols.get(symbol.as_str()).copied();
            trace!(step = i, symbol = %symbol, id = ?symbol_id, "decode step");

            search.prune();
            search.epsilon_closure();
            search.step(symbol, symbol_id)?;
        }

        search.prune();
        search.epsilon_closure();
        search.add_final_weights();
        if search.beam.is_empty() {
            return Err(DecodeError::EmptyBeam);
        }

        search.best_path()
    }
}

/// Search state for one decode call: the token arena and the active beam.
struct Search<'a> {
    fst: &'a Fst,
    beam_size: usize,
    tokens: Vec<Token>,
    /// state id -> index of the best token at that state
    beam: HashMap<i32, u32>,
}

/// Insert a candidate token into a beam, keeping the lower-cost token when
/// the target state is already occupied.
fn propose(beam: &mut HashMap<i32, u32>, tokens: &mut Vec<Token>, candidate: Token) -> bool {
    match beam.entry(candidate.state) {
        Entry::Occupied(mut entry) => {
            if tokens[*entry.get() as usize].cost > candidate.cost {
                let idx = tokens.len() as u32;
                tokens.push(candidate);
                entry.insert(idx);
            }
            false
        }
        Entry::Vacant(entry) => {
            let idx = tokens.len() as u32;
            tokens.push(candidate);
            entry.insert(idx);
            true
        }
    }
}

impl<'a> Search<'a> {
    fn new(fst: &'a Fst, beam_size: usize) -> Search<'a> {
        let root = Token {
            state: 0,
            output: EPSILON_SYMBOL,
            cost: 0.0,
            prev: None,
            capture: None,
        };
        let mut beam = HashMap::new();
        beam.insert(0, 0);
        Search {
            fst,
            beam_size,
            tokens: vec![root],
            beam,
        }
    }

    /// Prune the beam down to roughly `beam_size` tokens by cost. The cutoff
    /// is the beam_size-th smallest cost; ties at the cutoff survive, which
    /// keeps pruning deterministic regardless of beam iteration order.
    fn prune(&mut self) {
        if self.beam.len() < self.beam_size {
            return;
        }

        let mut costs: Vec<f32> = self
            .beam
            .values()
            .map(|&idx| self.tokens[idx as usize].cost)
            .collect();
        costs.sort_by(f32::total_cmp);
        let threshold = costs[self.beam_size - 1];

        let tokens = &self.tokens;
        self.beam
            .retain(|_, idx| tokens[*idx as usize].cost <= threshold);
        debug!(beam = self.beam.len(), threshold, "pruned beam");
    }

    /// Expand the beam along epsilon arcs with a BFS relaxation.
    ///
    /// A state entering the beam is enqueued once; a cost improvement on an
    /// already-present state replaces its token without re-enqueueing.
    /// Terminates because every replacement strictly decreases cost.
    fn epsilon_closure(&mut self) {
        let fst = self.fst;
        let mut queue: VecDeque<i32> = self.beam.keys().copied().collect();

        while let Some(state) = queue.pop_front() {
            let base = fst.states[state as usize].epsilon_base;
            if base < 0 {
                continue;
            }

            let from_idx = self.beam[&state];
            let from_cost = self.tokens[from_idx as usize].cost;
            for arc in &fst.epsilon_arcs[base as usize..] {
                if arc.check != state {
                    break;
                }

                let candidate = Token {
                    state: arc.target_state,
                    output: arc.output_symbol,
                    cost: from_cost + arc.weight,
                    prev: Some(from_idx),
                    capture: None,
                };
                if propose(&mut self.beam, &mut self.tokens, candidate) {
                    queue.push_back(arc.target_state);
                }
            }
        }
    }

    /// Consume one input symbol: propagate every beam token along its
    /// matching symbol arc (one O(1) probe) and matching range arcs, into a
    /// fresh beam.
    fn step(&mut self, symbol: &str, symbol_id: Option<i32>) -> Result<(), DecodeError> {
        let fst = self.fst;
        let mut next_beam: HashMap<i32, u32> = HashMap::new();

        let mut chars = symbol.chars();
        let codepoint = match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        };

        for (&state, &from_idx) in &self.beam {
            let from_cost = self.tokens[from_idx as usize].cost;
            let record = &fst.states[state as usize];

            if let Some(id) = symbol_id {
                if record.base >= 0 {
                    let slot = (record.base ^ id) as usize;
                    if slot < fst.arcs.len() && fst.arcs[slot].check == state {
                        let arc = &fst.arcs[slot];
                        propose(
                            &mut next_beam,
                            &mut self.tokens,
                            Token {
                                state: arc.target_state,
                                output: arc.output_symbol,
                                cost: from_cost + arc.weight,
                                prev: Some(from_idx),
                                capture: None,
                            },
                        );
                    }
                }
            }

            // range arcs only match single-codepoint inputs
            if let Some(c) = codepoint {
                if record.range_base >= 0 {
                    for arc in &fst.range_arcs[record.range_base as usize..] {
                        if arc.check != state {
                            break;
                        }
                        let cp = c as i32;
                        if cp < arc.begin || cp > arc.end {
                            continue;
                        }
                        propose(
                            &mut next_beam,
                            &mut self.tokens,
                            Token {
                                state: arc.target_state,
                                output: arc.output_symbol,
                                cost: from_cost + arc.weight,
                                prev: Some(from_idx),
                                capture: Some(c),
                            },
                        );
                    }
                }
            }
        }

        self.beam = next_beam;
        if self.beam.is_empty() {
            return Err(DecodeError::EmptyBeam);
        }
        Ok(())
    }

    /// Fold final weights into the beam: tokens at final states absorb the
    /// final weight, tokens at non-final states are dropped.
    fn add_final_weights(&mut self) {
        let fst = self.fst;
        let tokens = &mut self.tokens;
        self.beam.retain(|&state, idx| {
            let final_weight = fst.states[state as usize].final_weight;
            if final_weight.is_infinite() {
                return false;
            }
            tokens[*idx as usize].cost += final_weight;
            true
        });
    }

    /// Backtrace the minimum-cost token and materialize its output string
    /// list, substituting captured codepoints for `<alpha>` outputs.
    fn best_path(&self) -> Result<Vec<String>, DecodeError> {
        let best = self
            .beam
            .values()
            .min_by(|&&a, &&b| {
                self.tokens[a as usize]
                    .cost
                    .total_cmp(&self.tokens[b as usize].cost)
            })
            .copied();
        let Some(best) = best else {
            return Err(DecodeError::EmptyBeam);
        };

        let mut output_ids = Vec::new();
        let mut captured = VecDeque::new();
        let mut cursor = Some(best);
        while let Some(idx) = cursor {
            let token = &self.tokens[idx as usize];
            if token.output != EPSILON_SYMBOL {
                output_ids.push(token.output);
            }
            if let Some(c) = token.capture {
                captured.push_back(c);
            }
            cursor = token.prev;
        }
        output_ids.reverse();
        let mut captured: VecDeque<char> = captured.into_iter().rev().collect();

        let mut symbols = Vec::with_capacity(output_ids.len());
        for id in output_ids {
            if id == ALPHA_SYMBOL {
                let c = captured.pop_front().ok_or(DecodeError::CaptureMismatch)?;
                symbols.push(String::from(c));
            } else {
                symbols.push(self.fst.output_symbols[id as usize].clone());
            }
        }

        Ok(symbols)
    }
}
