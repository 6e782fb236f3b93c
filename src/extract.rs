use std::{fs::{File, OpenOptions}, io::{self, BufWriter, Read, Write}, path::{Path, PathBuf}};

use log::{debug, trace};
use thiserror::Error;

use crate::gzip::{DecoderError, GzipDecodedData, GzipSummary, GzipUnpacker};

pub const DEFAULT_INPUT: &str = "index.htm.gz";
pub const DEFAULT_OUTPUT: &str = "index.html";
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Coarse classification of an [ExtractError]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidFormat,
    Io
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("input file {0} does not exist")]
    NotFound(PathBuf),

    #[error("{path} is not a valid gzip file: {source}")]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: DecoderError
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error
    }
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(..) => ErrorKind::NotFound,
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::Io { .. } => ErrorKind::Io
        }
    }
}

/// Where to read from and write to. The defaults are the fixed
/// index.htm.gz -> index.html pair in the working directory
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,

    /// How many bytes are read from the input at once
    pub chunk_size: usize
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            chunk_size: DEFAULT_CHUNK_SIZE
        }
    }
}

/// The line printed once an extraction succeeded
pub fn success_message(input_path: impl AsRef<Path>, output_path: impl AsRef<Path>) -> String {
    format!(
        "Successfully extracted {} to {}",
        input_path.as_ref().display(),
        output_path.as_ref().display()
    )
}

/// Decompresses the gzip file at "input_path" into "output_path",
/// creating or truncating the output. Concatenated members are
/// written one after another
pub fn extract(input_path: impl AsRef<Path>, output_path: impl AsRef<Path>) -> Result<GzipSummary, ExtractError> {
    extract_with(&ExtractConfig {
        input_path: input_path.as_ref().to_path_buf(),
        output_path: output_path.as_ref().to_path_buf(),
        ..Default::default()
    })
}

/// Same as [extract], with an explicit [ExtractConfig]
///
/// The input is opened first, so a missing input never creates the output.
/// The output is not written atomically: on failure it may be left partially
/// written
pub fn extract_with(config: &ExtractConfig) -> Result<GzipSummary, ExtractError> {
    let input_path = config.input_path.as_path();
    let output_path = config.output_path.as_path();

    let mut input = File::open(input_path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ExtractError::NotFound(input_path.to_path_buf()),
        _ => io_error(input_path, source)
    })?;

    let output = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output_path)
        .map_err(|source| io_error(output_path, source))?;
    let mut writer = BufWriter::new(output);

    debug!("extracting {} to {}", input_path.display(), output_path.display());

    let summary = {
        let mut unpacker = GzipUnpacker::new();
        unpacker.set_callback(|data| {
            if let GzipDecodedData::MemberData(bytes) = data {
                writer.write_all(bytes)?;
            }

            Ok(())
        });

        let mut chunk = vec![0u8; config.chunk_size.max(1)];
        let mut buffer = Vec::with_capacity(chunk.len() * 2);
        loop {
            let read = match input.read(&mut chunk) {
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error(input_path, e))
            };

            if read == 0 {
                break;
            }

            trace!("read {} bytes from {}", read, input_path.display());

            buffer.extend_from_slice(&chunk[..read]);
            let advanced = unpacker.update(&buffer)
                .map_err(|e| decoder_error(e, input_path, output_path))?;
            buffer.drain(..advanced);
        }

        unpacker.finish(&buffer)
            .map_err(|e| decoder_error(e, input_path, output_path))?
    };

    writer.flush().map_err(|source| io_error(output_path, source))?;

    Ok(summary)
}

fn io_error(path: &Path, source: io::Error) -> ExtractError {
    ExtractError::Io {
        path: path.to_path_buf(),
        source
    }
}

// Write failures surface from inside the decode callback as anyhow errors
fn decoder_error(err: DecoderError, input_path: &Path, output_path: &Path) -> ExtractError {
    let err = match err {
        DecoderError::FromDecodeCallback(err) => match err.downcast::<io::Error>() {
            Ok(source) => return io_error(output_path, source),
            Err(err) => DecoderError::FromDecodeCallback(err)
        },
        err => err
    };

    ExtractError::InvalidFormat {
        path: input_path.to_path_buf(),
        source: err
    }
}
