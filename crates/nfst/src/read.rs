// Reading the n-fst binary format.

use std::io::Read;

use bytemuck::Pod;
use hashbrown::HashMap;

use crate::format::{Header, HEADER_SIZE};
use crate::fst::Fst;
use crate::records::{Arc, RangeArc, State};
use crate::FstError;

/// Read `n` fixed-layout records from the stream.
fn read_array<T: Pod, R: Read>(reader: &mut R, n: usize) -> Result<Vec<T>, FstError> {
    let mut buf = vec![0u8; n * std::mem::size_of::<T>()];
    reader.read_exact(&mut buf)?;
    Ok(bytemuck::pod_collect_to_vec(&buf))
}

/// Read `n` symbol records. Each record is `{ len: u8, bytes: [u8; len+1] }`
/// where the final byte must be zero.
fn read_symbols<R: Read>(reader: &mut R, n: usize) -> Result<Vec<String>, FstError> {
    let mut symbols = Vec::with_capacity(n);
    for i in 0..n {
        let mut len = [0u8; 1];
        reader.read_exact(&mut len)?;
        let len = len[0] as usize;

        let mut bytes = vec![0u8; len + 1];
        reader.read_exact(&mut bytes)?;
        if bytes[len] != 0 {
            return Err(FstError::InvalidSymbolTable(
                "zero-terminated string expected".to_string(),
            ));
        }

        let symbol = std::str::from_utf8(&bytes[..len])
            .map_err(|_| FstError::InvalidSymbolTable(format!("invalid UTF-8 in symbol {i}")))?;
        symbols.push(symbol.to_string());
    }

    Ok(symbols)
}

impl Fst {
    /// Read a compact FST from a stream of n-fst binary data.
    ///
    /// Validates the magic text, format version and symbol-record
    /// termination; a truncated stream surfaces as an I/O error.
    pub fn read<R: Read>(reader: &mut R) -> Result<Fst, FstError> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header_bytes)?;
        let header: Header = bytemuck::pod_read_unaligned(&header_bytes);
        header.validate()?;

        let states: Vec<State> = read_array(reader, header.num_states as usize)?;
        let arcs: Vec<Arc> = read_array(reader, header.num_arcs as usize)?;
        let epsilon_arcs: Vec<Arc> = read_array(reader, header.num_epsilon_arcs as usize)?;
        let range_arcs: Vec<RangeArc> = read_array(reader, header.num_range_arcs as usize)?;

        let input_list = read_symbols(reader, header.num_input_symbols as usize)?;
        let mut input_symbols = HashMap::with_capacity(input_list.len());
        for (id, symbol) in input_list.into_iter().enumerate() {
            input_symbols.insert(symbol, id as i32);
        }

        let output_symbols = read_symbols(reader, header.num_output_symbols as usize)?;

        Ok(Fst {
            states,
            arcs,
            epsilon_arcs,
            range_arcs,
            input_symbols,
            output_symbols,
        })
    }
}
