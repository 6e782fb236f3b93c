use thiserror::Error;

use crate::decompress::{Decompressor, deflate::DeflateDecompressor};

/// Provides utilities for processing gzip member headers
pub mod member_header;

/// Provides utilities for processing gzip member trailers
pub mod trailer;

#[derive(Error, Debug)]
pub enum DecompressorCreationError {
    #[error("unknown compression method: {0}")]
    UnknownMethod(u8)
}

/// Represents a gzip compression method (the CM header byte).
/// See [CompressionMethod::create_decompressor]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionMethod {
    Deflate,

    Unknown(u8)
}

impl CompressionMethod {
    /// Turns a CM byte into a [CompressionMethod] variant. Only 8 (deflate)
    /// is defined by RFC 1952, 0-7 are reserved
    pub fn from_id(id: u8) -> Self {
        match id {
            8 => Self::Deflate,
            _ => Self::Unknown(id)
        }
    }

    /// Tries to create a [Decompressor] for this [CompressionMethod]
    ///
    /// Returns error if it is [CompressionMethod::Unknown]
    pub fn create_decompressor(&self) -> Result<Box<dyn Decompressor>, DecompressorCreationError> {
        match self {
            Self::Deflate => Ok(Box::new(DeflateDecompressor::new())),

            Self::Unknown(id) => Err(DecompressorCreationError::UnknownMethod(*id))
        }
    }
}

/// The file system on which compression took place (the OS header byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingSystem {
    Fat,
    Amiga,
    Vms,
    Unix,
    VmCms,
    AtariTos,
    Hpfs,
    Macintosh,
    ZSystem,
    CpM,
    Tops20,
    Ntfs,
    Qdos,
    AcornRiscos,

    Unknown(u8)
}

impl OperatingSystem {
    pub fn from_id(id: u8) -> Self {
        match id {
            0 => Self::Fat,
            1 => Self::Amiga,
            2 => Self::Vms,
            3 => Self::Unix,
            4 => Self::VmCms,
            5 => Self::AtariTos,
            6 => Self::Hpfs,
            7 => Self::Macintosh,
            8 => Self::ZSystem,
            9 => Self::CpM,
            10 => Self::Tops20,
            11 => Self::Ntfs,
            12 => Self::Qdos,
            13 => Self::AcornRiscos,
            _ => Self::Unknown(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_deflate_is_supported() {
        assert_eq!(CompressionMethod::from_id(8), CompressionMethod::Deflate);
        assert!(CompressionMethod::Deflate.create_decompressor().is_ok());

        let reserved = CompressionMethod::from_id(7);
        assert!(matches!(
            reserved.create_decompressor(),
            Err(DecompressorCreationError::UnknownMethod(7))
        ));
    }

    #[test]
    fn maps_os_bytes() {
        assert_eq!(OperatingSystem::from_id(3), OperatingSystem::Unix);
        assert_eq!(OperatingSystem::from_id(11), OperatingSystem::Ntfs);
        assert_eq!(OperatingSystem::from_id(255), OperatingSystem::Unknown(255));
    }
}
