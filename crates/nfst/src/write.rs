// Writing the n-fst binary format.

use std::io::Write;

use crate::format::{Header, MAGIC, VERSION};
use crate::fst::Fst;
use crate::FstError;

/// Write one symbol record: `{ len: u8, bytes: [u8; len+1] }`, zero-terminated.
fn write_symbol<W: Write>(writer: &mut W, symbol: &str) -> Result<(), FstError> {
    if symbol.len() > 255 {
        // the builder checks this before packing
        return Err(FstError::SymbolTooLong(symbol.to_string()));
    }
    writer.write_all(&[symbol.len() as u8])?;
    writer.write_all(symbol.as_bytes())?;
    writer.write_all(&[0])?;
    Ok(())
}

impl Fst {
    /// Materialize the input symbol map as a dense id-ordered list. Ids with
    /// no entry are filled with `<eps>`.
    fn input_symbol_list(&self) -> Vec<String> {
        let max_id = self.input_symbols.values().copied().max().unwrap_or(-1);
        let mut symbols = vec!["<eps>".to_string(); (max_id + 1) as usize];
        for (symbol, &id) in &self.input_symbols {
            symbols[id as usize] = symbol.clone();
        }
        symbols
    }

    /// Write the compact FST to a stream in n-fst binary form.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), FstError> {
        let header = Header {
            magic: *MAGIC,
            version: VERSION,
            num_states: self.states.len() as i32,
            num_arcs: self.arcs.len() as i32,
            num_epsilon_arcs: self.epsilon_arcs.len() as i32,
            num_range_arcs: self.range_arcs.len() as i32,
            num_output_symbols: self.output_symbols.len() as i32,
            num_input_symbols: self.input_symbols.len() as i32,
        };
        writer.write_all(bytemuck::bytes_of(&header))?;
        writer.write_all(bytemuck::cast_slice(&self.states))?;
        writer.write_all(bytemuck::cast_slice(&self.arcs))?;
        writer.write_all(bytemuck::cast_slice(&self.epsilon_arcs))?;
        writer.write_all(bytemuck::cast_slice(&self.range_arcs))?;

        for symbol in self.input_symbol_list() {
            write_symbol(writer, &symbol)?;
        }
        for symbol in &self.output_symbols {
            write_symbol(writer, symbol)?;
        }

        Ok(())
    }
}
