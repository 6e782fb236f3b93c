use log::{debug, trace};
use thiserror::Error;

use crate::decompress::{Decompressor, DecompressionError};

use self::structures::{member_header::{MemberHeader, GZIP_MAGIC, HEADER_CONSTANT_SIZE}, trailer::{MemberTrailer, TRAILER_SIZE}, DecompressorCreationError};

/// Provides utilities for working with gzip structures
pub mod structures;

#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("failed to decompress: {0}")]
    Decompression(#[from] DecompressionError),

    #[error("could not create decompressor: {0}")]
    DecompressorInit(#[from] DecompressorCreationError),

    #[error("member header has an invalid signature")]
    InvalidSignature,

    #[error("member header has reserved flag bits set: {0:#04x}")]
    ReservedFlags(u8),

    #[error("member header checksum is {expected:#06x} but the header hashes to {computed:#06x}")]
    HeaderChecksum { expected: u16, computed: u16 },

    #[error("trailer checksum is {expected:#010x} but the output hashes to {computed:#010x}")]
    Checksum { expected: u32, computed: u32 },

    #[error("trailer records {expected} bytes but {actual} were decompressed (mod 2^32)")]
    SizeMismatch { expected: u32, actual: u32 },

    #[error("data ended before the end of the member")]
    Truncated,

    #[error("the stream has already been finished")]
    AlreadyFinished,

    #[error("error within callback: {0}")]
    FromDecodeCallback(#[from] anyhow::Error)
}

struct MemberData {
    header: MemberHeader,
    decompressor: Box<dyn Decompressor>,
    hasher: crc32fast::Hasher,
    compressed_size: u64,
    decompressed_size: u64
}

impl std::fmt::Debug for MemberData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberData")
            .field("decompressor", &self.decompressor)
            .field("compressed_size", &self.compressed_size)
            .field("decompressed_size", &self.decompressed_size)
            .finish()
    }
}

#[derive(Debug)]
enum GzipDecoderState {
    MemberHeader,
    MemberData(MemberData),
    MemberTrailer(MemberData),
    Finished
}

/// A chunk of decoded gzip data
#[derive(Debug)]
pub enum GzipDecodedData<'a> {
    /// The header of a member, fired once per member
    MemberHeader(&'a MemberHeader),

    /// Decompressed member bytes
    MemberData(&'a [u8])
}

/// The result of a fully decoded and verified member
#[derive(Debug, Clone)]
pub struct MemberSummary {
    pub header: MemberHeader,
    pub trailer: MemberTrailer,

    /// Size of the DEFLATE payload, without header and trailer
    pub compressed_size: u64,
    pub decompressed_size: u64
}

/// Every member of a finished gzip stream, in order
#[derive(Debug, Clone, Default)]
pub struct GzipSummary {
    pub members: Vec<MemberSummary>
}

impl GzipSummary {
    pub fn decompressed_size(&self) -> u64 {
        self.members.iter().map(|m| m.decompressed_size).sum()
    }

    pub fn compressed_size(&self) -> u64 {
        self.members.iter().map(|m| m.compressed_size).sum()
    }
}

/// A stream unpacker for gzip files. Concatenated members are decoded
/// into one output, and zero padding after a member is skipped
pub struct GzipUnpacker<'a> {
    decoder_state: GzipDecoderState,
    position: usize,
    members: Vec<MemberSummary>,

    #[allow(clippy::type_complexity)]
    on_decode: Option<Box<dyn FnMut(GzipDecodedData) -> anyhow::Result<()> + 'a>>
}

impl std::fmt::Debug for GzipUnpacker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipUnpacker")
            .field("decoder_state", &self.decoder_state)
            .field("position", &self.position)
            .field("members", &self.members.len())
            .finish()
    }
}

impl Default for GzipUnpacker<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> GzipUnpacker<'a> {
    pub fn new() -> Self {
        Self {
            decoder_state: GzipDecoderState::MemberHeader,
            position: 0,
            members: Vec::new(),

            on_decode: None
        }
    }

    /// Sets the decode callback. The passed closure will be invoked
    /// when new data is decoded from bytes passed to [GzipUnpacker::update]
    /// or [GzipUnpacker::finish]
    pub fn set_callback(&mut self, on_decode: impl FnMut(GzipDecodedData) -> anyhow::Result<()> + 'a) {
        self.on_decode = Some(Box::new(on_decode));
    }

    /// Amount of input bytes consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Update this GzipUnpacker with new bytes. The callback may or
    /// may not be fired, depending on the content. The callback may
    /// be fired multiple times.
    ///
    /// The return value is how much the caller should advance the input buffer.
    /// 0 means that there wasn't enough data in the buffer and the caller should
    /// provide more. Whatever is left once the input is exhausted has to be
    /// passed to [GzipUnpacker::finish]
    pub fn update(&mut self, data: impl AsRef<[u8]>) -> Result<usize, DecoderError> {
        let data = data.as_ref();

        let mut buf_offset = 0;
        loop {
            let (advanced, moved_on) = self.update_internal(&data[buf_offset..])?;
            buf_offset += advanced;
            self.position += advanced;

            if advanced == 0 && !moved_on {
                return Ok(buf_offset);
            }
        }
    }

    /// Feeds the rest of the input and checks that the stream ended on a
    /// member boundary. "remaining" must be everything the caller has not
    /// advanced past yet, and no more data may follow it
    pub fn finish(&mut self, remaining: impl AsRef<[u8]>) -> Result<GzipSummary, DecoderError> {
        let remaining = remaining.as_ref();

        let advanced = self.update(remaining)?;
        let rest = &remaining[advanced..];

        match std::mem::replace(&mut self.decoder_state, GzipDecoderState::Finished) {
            GzipDecoderState::MemberHeader if !self.members.is_empty() => {
                if !rest.is_empty() {
                    let prefix = &rest[..std::cmp::min(rest.len(), GZIP_MAGIC.len())];
                    if !GZIP_MAGIC.starts_with(prefix) {
                        return Err(DecoderError::InvalidSignature);
                    }

                    return Err(DecoderError::Truncated);
                }
            },

            GzipDecoderState::MemberHeader |
            GzipDecoderState::MemberData(..) |
            GzipDecoderState::MemberTrailer(..) => return Err(DecoderError::Truncated),

            GzipDecoderState::Finished => return Err(DecoderError::AlreadyFinished)
        }

        let summary = GzipSummary {
            members: std::mem::take(&mut self.members)
        };

        debug!(
            "stream finished: {} member(s), {} bytes decompressed",
            summary.members.len(), summary.decompressed_size()
        );

        Ok(summary)
    }

    /// Returns how many bytes were consumed, and whether the decoder
    /// moved on to another state
    fn update_internal(&mut self, data: &[u8]) -> Result<(usize, bool), DecoderError> {
        match &mut self.decoder_state {
            GzipDecoderState::MemberHeader => {
                if !self.members.is_empty() {
                    let padding = data.iter().take_while(|b| **b == 0).count();
                    if padding > 0 {
                        trace!("skipping {} bytes of zero padding", padding);
                        return Ok((padding, false));
                    }
                }

                if data.len() < GZIP_MAGIC.len() + HEADER_CONSTANT_SIZE {
                    return Ok((0, false));
                }

                if data[..GZIP_MAGIC.len()] != GZIP_MAGIC {
                    return Err(DecoderError::InvalidSignature);
                }

                let Some(header) = MemberHeader::from_bytes(&data[GZIP_MAGIC.len()..]) else {
                    return Ok((0, false));
                };
                let header_end = GZIP_MAGIC.len() + header.header_size;

                if header.has_reserved_flags() {
                    return Err(DecoderError::ReservedFlags(header.flags));
                }

                if let Some(expected) = header.header_crc16 {
                    // Covers every header byte before the CRC16 itself
                    let computed = crc32fast::hash(&data[..(header_end - 2)]) as u16;
                    if computed != expected {
                        return Err(DecoderError::HeaderChecksum { expected, computed });
                    }
                }

                let decompressor = header.compression_method.create_decompressor()?;

                debug!(
                    "member {} header: name {:?}, mtime {}, os {:?}, text {}, {} header bytes",
                    self.members.len(), header.filename, header.mtime, header.os, header.is_text(), header_end
                );

                if let Some(on_decode) = &mut self.on_decode {
                    (on_decode)(GzipDecodedData::MemberHeader(&header))?;
                }

                self.decoder_state = GzipDecoderState::MemberData(MemberData {
                    header,
                    decompressor,
                    hasher: crc32fast::Hasher::new(),
                    compressed_size: 0,
                    decompressed_size: 0
                });

                Ok((header_end, true))
            },

            GzipDecoderState::MemberData(member) => {
                let mut consumed = 0;
                let finished = loop {
                    let decompressed = member.decompressor.update(&data[consumed..])?;
                    consumed += decompressed.consumed;

                    if !decompressed.output.is_empty() {
                        trace!("inflated {} bytes into {}", decompressed.consumed, decompressed.output.len());

                        member.hasher.update(decompressed.output);
                        member.decompressed_size += decompressed.output.len() as u64;

                        if let Some(on_decode) = &mut self.on_decode {
                            (on_decode)(GzipDecodedData::MemberData(decompressed.output))?;
                        }
                    }

                    if decompressed.finished {
                        break true;
                    }

                    if decompressed.is_idle() {
                        break false;
                    }
                };
                member.compressed_size += consumed as u64;

                if finished {
                    if let GzipDecoderState::MemberData(member) = std::mem::replace(&mut self.decoder_state, GzipDecoderState::Finished) {
                        self.decoder_state = GzipDecoderState::MemberTrailer(member);
                    }
                }

                Ok((consumed, finished))
            },

            GzipDecoderState::MemberTrailer(member) => {
                if data.len() < TRAILER_SIZE {
                    return Ok((0, false));
                }

                let Some(trailer) = MemberTrailer::from_bytes(&data[..TRAILER_SIZE]) else {
                    return Ok((0, false));
                };

                let computed = member.hasher.clone().finalize();
                if trailer.crc32 != computed {
                    return Err(DecoderError::Checksum { expected: trailer.crc32, computed });
                }

                if !trailer.matches(computed, member.decompressed_size) {
                    return Err(DecoderError::SizeMismatch {
                        expected: trailer.isize,
                        actual: member.decompressed_size as u32
                    });
                }

                debug!(
                    "member {} verified: {} compressed bytes, {} decompressed bytes, crc32 {:#010x}",
                    self.members.len(), member.compressed_size, member.decompressed_size, computed
                );

                if let GzipDecoderState::MemberTrailer(member) = std::mem::replace(&mut self.decoder_state, GzipDecoderState::MemberHeader) {
                    self.members.push(MemberSummary {
                        header: member.header,
                        trailer,
                        compressed_size: member.compressed_size,
                        decompressed_size: member.decompressed_size
                    });
                }

                Ok((TRAILER_SIZE, true))
            },

            GzipDecoderState::Finished => Err(DecoderError::AlreadyFinished)
        }
    }
}
