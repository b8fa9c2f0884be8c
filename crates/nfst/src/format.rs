// n-fst binary header: layout, parsing, validation.

use bytemuck::{Pod, Zeroable};

use crate::FstError;

/// Magic text at the start of every n-fst file, trailing spaces included.
pub const MAGIC: &[u8; 8] = b"[nfst]  ";

/// The only supported format version.
pub const VERSION: i32 = 1;

/// Size of the binary header in bytes: 8 magic bytes plus seven
/// little-endian `i32` fields.
pub const HEADER_SIZE: usize = 36;

/// File header. Counts describe the array and symbol-record sections that
/// follow, in file order.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Header {
    pub magic: [u8; 8],
    pub version: i32,
    pub num_states: i32,
    pub num_arcs: i32,
    pub num_epsilon_arcs: i32,
    pub num_range_arcs: i32,
    pub num_output_symbols: i32,
    pub num_input_symbols: i32,
}

const _: () = assert!(std::mem::size_of::<Header>() == HEADER_SIZE);

impl Header {
    /// Validate the magic text and version of a parsed header.
    pub fn validate(&self) -> Result<(), FstError> {
        if &self.magic != MAGIC {
            return Err(FstError::InvalidHeader);
        }
        if self.version != VERSION {
            return Err(FstError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header() -> Header {
        Header {
            magic: *MAGIC,
            version: VERSION,
            num_states: 2,
            num_arcs: 256,
            num_epsilon_arcs: 1,
            num_range_arcs: 0,
            num_output_symbols: 9,
            num_input_symbols: 9,
        }
    }

    #[test]
    fn accept_valid_header() {
        assert!(make_header().validate().is_ok());
    }

    #[test]
    fn reject_bad_magic() {
        let mut header = make_header();
        header.magic[0] = b'x';
        assert!(matches!(header.validate(), Err(FstError::InvalidHeader)));
    }

    #[test]
    fn reject_bad_version() {
        let mut header = make_header();
        header.version = 2;
        assert!(matches!(
            header.validate(),
            Err(FstError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn header_round_trips_through_bytes() {
        let header = make_header();
        let bytes = bytemuck::bytes_of(&header);
        assert_eq!(bytes.len(), HEADER_SIZE);
        let parsed: Header = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(parsed, header);
    }
}
