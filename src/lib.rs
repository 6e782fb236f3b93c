/// Provides utilities for decompressing data
pub mod decompress;

/// Provides utilities for stream unpacking gzip files
#[cfg(feature = "gzip")]
pub mod gzip;

/// Provides the file-to-file extraction used by the extract-gz tool
#[cfg(feature = "gzip")]
pub mod extract;

/// Provides log output formatting
pub mod logger;
