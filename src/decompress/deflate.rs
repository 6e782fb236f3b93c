use std::fmt::Debug;

use flate2::{Decompress, FlushDecompress, Status};

use super::{Decompressed, Decompressor, DecompressionError};

const OUTPUT_CHUNK_SIZE: usize = 32 * 1024;

/// Raw (headerless) DEFLATE decoder, as found inside gzip members
pub struct DeflateDecompressor {
    stream: Decompress,
    buffer: Vec<u8>,
    finished: bool
}

impl Debug for DeflateDecompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateDecompressor")
            .field("total_in", &self.stream.total_in())
            .field("total_out", &self.stream.total_out())
            .field("finished", &self.finished)
            .finish()
    }
}

impl Default for DeflateDecompressor {
    /// Identical to [DeflateDecompressor::new]
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor for DeflateDecompressor {
    fn update(&mut self, data: &[u8]) -> Result<Decompressed<'_>, DecompressionError> {
        self.buffer.clear();

        if self.finished {
            return Ok(Decompressed { consumed: 0, output: &self.buffer, finished: true });
        }

        let total_in = self.stream.total_in();
        let status = self.stream.decompress_vec(data, &mut self.buffer, FlushDecompress::None)
            .map_err(|e| DecompressionError::Corrupt(format!("{e} (after {total_in} input bytes)")))?;

        self.finished = status == Status::StreamEnd;

        Ok(Decompressed {
            consumed: (self.stream.total_in() - total_in) as usize,
            output: &self.buffer,
            finished: self.finished
        })
    }
}

impl DeflateDecompressor {
    /// Creates a new DeflateDecompressor without a zlib wrapper
    pub fn new() -> Self {
        Self {
            stream: Decompress::new(false),
            buffer: Vec::with_capacity(OUTPUT_CHUNK_SIZE),
            finished: false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::DeflateEncoder, Compression};

    use super::*;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// Returns the output, the consumed byte count and whether the end was reached
    fn inflate_all(decompressor: &mut DeflateDecompressor, data: &[u8]) -> (Vec<u8>, usize, bool) {
        let mut out = Vec::new();
        let mut offset = 0;
        loop {
            let decompressed = decompressor.update(&data[offset..]).unwrap();
            offset += decompressed.consumed;
            out.extend_from_slice(decompressed.output);

            if decompressed.finished || decompressed.is_idle() {
                return (out, offset, decompressed.finished);
            }
        }
    }

    #[test]
    fn inflates_raw_deflate_past_one_output_chunk() {
        let text = b"<html><body>hello hello hello hello</body></html>".repeat(2048);
        let compressed = deflate(&text);

        let mut decompressor = DeflateDecompressor::new();
        let (out, consumed, finished) = inflate_all(&mut decompressor, &compressed);

        assert!(out == text);
        assert_eq!(consumed, compressed.len());
        assert!(finished);
    }

    #[test]
    fn stops_at_end_of_stream() {
        let mut data = deflate(b"Hello, world!");
        let end = data.len();
        data.extend_from_slice(&[0xaa; 8]);

        let mut decompressor = DeflateDecompressor::new();
        let (out, consumed, finished) = inflate_all(&mut decompressor, &data);

        assert_eq!(out, b"Hello, world!");
        assert_eq!(consumed, end);
        assert!(finished);
    }

    #[test]
    fn unterminated_stream_is_not_finished() {
        // A non-final stored block, so the stream never ends
        let mut data = vec![0x00, 0x0d, 0x00, 0xf2, 0xff];
        data.extend_from_slice(b"Hello, world!");

        let mut decompressor = DeflateDecompressor::new();
        let (out, consumed, finished) = inflate_all(&mut decompressor, &data);

        assert_eq!(out, b"Hello, world!");
        assert_eq!(consumed, data.len());
        assert!(!finished);
    }

    #[test]
    fn rejects_invalid_block_type() {
        // BFINAL=1, BTYPE=11 (reserved)
        let mut decompressor = DeflateDecompressor::new();
        assert!(matches!(decompressor.update(&[0x07, 0x00]), Err(DecompressionError::Corrupt(_))));
    }
}
