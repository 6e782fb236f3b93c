use std::{io::Cursor, time::{Duration, SystemTime}};

use byteorder::{ReadBytesExt, LittleEndian};

use super::{CompressionMethod, OperatingSystem};

pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
pub const HEADER_CONSTANT_SIZE: usize = 8;

pub const FLAG_TEXT: u8 = 0x01;
pub const FLAG_HCRC: u8 = 0x02;
pub const FLAG_EXTRA: u8 = 0x04;
pub const FLAG_NAME: u8 = 0x08;
pub const FLAG_COMMENT: u8 = 0x10;
pub const FLAG_RESERVED: u8 = 0xe0;

/// Represents the result of reading a gzip member header
///
/// The magic bytes are not part of this structure, and are not
/// counted in "header_size"
#[derive(Debug, Clone)]
pub struct MemberHeader {
    pub compression_method: CompressionMethod,

    pub flags: u8,

    pub mtime: u32,

    pub extra_flags: u8,
    pub os: OperatingSystem,

    pub extra_field: Option<Vec<u8>>,

    pub filename: Option<String>,

    #[cfg(feature = "gzip-comments")]
    pub comment: Option<String>,

    pub header_crc16: Option<u16>,

    pub header_size: usize
}

impl MemberHeader {
    /// Attempts to read a member header from the provided byte
    /// buffer, which must start right after the magic bytes.
    /// Returns None if there isn't enough data
    pub fn from_bytes(data: impl AsRef<[u8]>) -> Option<Self> {
        let data = data.as_ref();
        if data.len() < HEADER_CONSTANT_SIZE {
            return None;
        }

        let mut cursor = Cursor::new(data);

        let compression_method = cursor.read_u8().ok()?;
        let flags = cursor.read_u8().ok()?;
        let mtime = cursor.read_u32::<LittleEndian>().ok()?;
        let extra_flags = cursor.read_u8().ok()?;
        let os = cursor.read_u8().ok()?;

        let mut offset = HEADER_CONSTANT_SIZE;

        let extra_field = if flags & FLAG_EXTRA != 0 {
            let mut cursor = Cursor::new(data.get(offset..)?);
            let extra_length = cursor.read_u16::<LittleEndian>().ok()? as usize;

            let extra_start = offset + 2;
            let extra_end = extra_start + extra_length;
            let extra = data.get(extra_start..extra_end)?.to_vec();
            offset = extra_end;

            Some(extra)
        } else {
            None
        };

        let filename = if flags & FLAG_NAME != 0 {
            let (name, next) = read_zero_terminated(data, offset)?;
            offset = next;

            Some(latin1_to_string(name))
        } else {
            None
        };

        #[cfg(feature = "gzip-comments")]
        let comment = if flags & FLAG_COMMENT != 0 {
            let (comment, next) = read_zero_terminated(data, offset)?;
            offset = next;

            Some(latin1_to_string(comment))
        } else {
            None
        };

        #[cfg(not(feature = "gzip-comments"))]
        if flags & FLAG_COMMENT != 0 {
            let (_, next) = read_zero_terminated(data, offset)?;
            offset = next;
        }

        let header_crc16 = if flags & FLAG_HCRC != 0 {
            let mut cursor = Cursor::new(data.get(offset..)?);
            let crc = cursor.read_u16::<LittleEndian>().ok()?;
            offset += 2;

            Some(crc)
        } else {
            None
        };

        Some(Self {
            compression_method: CompressionMethod::from_id(compression_method),
            flags,
            mtime,
            extra_flags,
            os: OperatingSystem::from_id(os),
            extra_field,
            filename,

            #[cfg(feature = "gzip-comments")]
            comment,

            header_crc16,

            header_size: offset
        })
    }

    /// Whether the compressor flagged the payload as probably text.
    /// This is only a hint, output is never transformed
    pub fn is_text(&self) -> bool {
        self.flags & FLAG_TEXT != 0
    }

    pub fn has_reserved_flags(&self) -> bool {
        self.flags & FLAG_RESERVED != 0
    }

    /// Modification time of the original file, if the compressor recorded one
    pub fn modification_time(&self) -> Option<SystemTime> {
        if self.mtime == 0 {
            return None;
        }

        SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(self.mtime as u64))
    }
}

/// Returns the bytes before the next zero byte, and the offset right after it
fn read_zero_terminated(data: &[u8], offset: usize) -> Option<(&[u8], usize)> {
    let rest = data.get(offset..)?;
    let length = rest.iter().position(|b| *b == 0)?;

    Some((&rest[..length], offset + length + 1))
}

// RFC 1952 mandates ISO 8859-1, which maps 1:1 onto the first 256 code points
fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}
