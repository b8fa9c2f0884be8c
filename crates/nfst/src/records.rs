// Fixed-layout records of the n-fst binary format.

use bytemuck::{Pod, Zeroable};

/// Per-state record (16 bytes).
///
/// `base` addresses the symbol arc table (`arcs[base ^ input_id]`),
/// `epsilon_base`/`range_base` index the first arc of the state's contiguous
/// run in the epsilon/range arrays. `-1` means the state has no arcs of that
/// kind. A `final_weight` of `+inf` marks a non-final state.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct State {
    pub base: i32,
    pub epsilon_base: i32,
    pub range_base: i32,
    pub final_weight: f32,
}

impl State {
    /// A state with no arcs and a non-final weight.
    pub fn empty() -> Self {
        State {
            base: -1,
            epsilon_base: -1,
            range_base: -1,
            final_weight: f32::INFINITY,
        }
    }
}

/// Packed arc record (16 bytes), used for both symbol and epsilon arcs.
///
/// `check` holds the source state id, or `-1` for an empty slot in the
/// XOR-addressed symbol table.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Arc {
    pub target_state: i32,
    pub output_symbol: i32,
    pub weight: f32,
    pub check: i32,
}

impl Arc {
    /// An unoccupied slot in the symbol arc table.
    pub fn empty() -> Self {
        Arc {
            target_state: -1,
            output_symbol: 0,
            weight: 0.0,
            check: -1,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.check == -1
    }
}

/// Range arc record (24 bytes). Matches any codepoint in `[begin, end]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RangeArc {
    pub begin: i32,
    pub end: i32,
    pub target_state: i32,
    pub output_symbol: i32,
    pub weight: f32,
    pub check: i32,
}

const _: () = assert!(std::mem::size_of::<State>() == 16);
const _: () = assert!(std::mem::size_of::<Arc>() == 16);
const _: () = assert!(std::mem::size_of::<RangeArc>() == 24);
