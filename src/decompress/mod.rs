use thiserror::Error;

/// Provides a raw DEFLATE [Decompressor] backed by [flate2::Decompress]
#[cfg(feature = "deflate")]
pub mod deflate;

#[derive(Error, Debug)]
pub enum DecompressionError {
    #[error("corrupt compressed data: {0}")]
    Corrupt(String)
}

/// The outcome of a single [Decompressor::update] call
#[derive(Debug)]
pub struct Decompressed<'a> {
    /// How many input bytes were used. Bytes past the end of the
    /// compressed stream are never consumed
    pub consumed: usize,

    pub output: &'a [u8],

    /// Set once the end-of-stream marker has been decoded and all of
    /// its output has been returned
    pub finished: bool
}

impl Decompressed<'_> {
    /// Whether the call neither consumed input nor produced output,
    /// meaning the decompressor needs more data
    pub fn is_idle(&self) -> bool {
        self.consumed == 0 && self.output.is_empty()
    }
}

pub trait Decompressor: std::fmt::Debug + Send + Sync {
    /// Feeds compressed bytes. The output may be limited by an internal
    /// buffer, so callers keep calling (with the unconsumed rest, or an
    /// empty slice) until the call is idle or finished
    fn update(&mut self, data: &[u8]) -> Result<Decompressed<'_>, DecompressionError>;
}
