use std::io::Cursor;

use byteorder::{ReadBytesExt, LittleEndian};

pub const TRAILER_SIZE: usize = 8;

/// The CRC32 and ISIZE fields that close every gzip member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberTrailer {
    pub crc32: u32,

    /// Uncompressed size modulo 2^32
    pub isize: u32
}

impl MemberTrailer {
    /// Attempts to read a trailer from exactly [TRAILER_SIZE] bytes.
    /// Returns None for any other length
    pub fn from_bytes(data: impl AsRef<[u8]>) -> Option<Self> {
        let data = data.as_ref();
        if data.len() != TRAILER_SIZE {
            return None;
        }

        let mut cursor = Cursor::new(data);

        let crc32 = cursor.read_u32::<LittleEndian>().ok()?;
        let isize = cursor.read_u32::<LittleEndian>().ok()?;

        Some(Self {
            crc32,
            isize
        })
    }

    /// Whether this trailer describes the given output
    pub fn matches(&self, crc32: u32, size: u64) -> bool {
        self.crc32 == crc32 && self.isize == size as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let trailer = MemberTrailer::from_bytes([0xe6, 0xc6, 0xe6, 0xeb, 0x0d, 0, 0, 0]).unwrap();

        assert_eq!(trailer.crc32, 0xebe6c6e6);
        assert_eq!(trailer.isize, 13);
        assert!(trailer.matches(0xebe6c6e6, 13));
    }

    #[test]
    fn isize_wraps_at_four_gib() {
        let trailer = MemberTrailer { crc32: 0, isize: 5 };
        assert!(trailer.matches(0, (1 << 32) + 5));
        assert!(!trailer.matches(0, 5 + 1));
    }

    #[test]
    fn requires_exact_length() {
        assert!(MemberTrailer::from_bytes([0u8; 7]).is_none());
        assert!(MemberTrailer::from_bytes([0u8; 9]).is_none());
    }
}
