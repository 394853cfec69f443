//! Error types for `InfinityKit`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `InfinityKit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Container Format Errors ====================
    /// The signature at the start of a resource did not match.
    #[error("invalid {format} signature: found {found:?}")]
    InvalidSignature {
        /// The format that was being parsed.
        format: &'static str,
        /// The four signature bytes that were found.
        found: [u8; 4],
    },

    /// The version tag of a resource is not supported.
    #[error("unsupported {format} version: {version:?}")]
    UnsupportedVersion {
        /// The format that was being parsed.
        format: &'static str,
        /// The version string as found in the file.
        version: String,
    },

    /// A read or copy would run past the end of the buffer.
    #[error("out of bounds: {len} bytes at offset {offset} exceed buffer of {size} bytes")]
    OutOfBounds {
        /// Requested start offset.
        offset: usize,
        /// Requested length.
        len: usize,
        /// Size of the buffer.
        size: usize,
    },

    /// Header counts disagree with the data that follows.
    #[error("invalid {format}: {message}")]
    InvalidFormat {
        /// The format that was being parsed.
        format: &'static str,
        /// Description of what is invalid.
        message: String,
    },

    // ==================== Compression Errors ====================
    /// Zlib decompression failed.
    #[error("Zlib decompression failed: {message}")]
    ZlibDecompressionFailed {
        /// The error message.
        message: String,
    },

    /// Zlib compression failed.
    #[error("Zlib compression failed: {message}")]
    ZlibCompressionFailed {
        /// The error message.
        message: String,
    },

    // ==================== Image Errors ====================
    /// Failed to open or decode an image file.
    #[error("failed to decode image {path}: {message}")]
    ImageDecodeFailed {
        /// The image path.
        path: PathBuf,
        /// The decoder error message.
        message: String,
    },

    /// Failed to encode PNG image.
    #[error("failed to encode PNG: {message}")]
    PngEncodeFailed {
        /// The encoding error message.
        message: String,
    },

    /// Pixel buffer size does not match the declared dimensions.
    #[error("pixel buffer holds {actual} pixels, expected {width}x{height}")]
    PixelCountMismatch {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Number of pixels actually present.
        actual: usize,
    },

    /// The texture atlas page format is not DXT1 or DXT5.
    #[error("unsupported PVRZ pixel format: {format}")]
    UnsupportedPvrzFormat {
        /// Raw PVR pixel format identifier.
        format: u64,
    },

    /// A PVRZ page referenced by a data block could not be found.
    #[error("PVRZ page {page} not found: {path}")]
    PvrzPageNotFound {
        /// Page number.
        page: u32,
        /// Expected file path.
        path: PathBuf,
    },

    // ==================== Script Errors ====================
    /// The script text could not be parsed.
    #[error("script syntax error at line {line}: {message}")]
    ScriptSyntax {
        /// 1-based source line.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// A function name has no signature in TRIGGER/ACTION definitions.
    #[error("unknown script function: {0}")]
    UnknownFunction(String),

    /// The compiled bytecode stream is malformed.
    #[error("invalid BCS bytecode: {0}")]
    InvalidBytecode(String),

    // ==================== IDS Errors ====================
    /// A required IDS table is missing from the cache.
    #[error("IDS table not loaded: {0}")]
    IdsTableMissing(String),

    // ==================== Plugin / Config Errors ====================
    /// No plugin handles this resource type.
    #[error("unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    /// The resource could not be found in the game directory.
    #[error("resource not found: {0}")]
    ResourceNotFound(PathBuf),

    /// The operation is not available for this resource type.
    #[error("{operation} is not supported for {resource_type}")]
    UnsupportedOperation {
        /// Operation name (extract/upscale/assemble).
        operation: &'static str,
        /// Resource type extension.
        resource_type: &'static str,
    },

    /// Configuration could not be parsed or is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metadata JSON error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

impl Error {
    /// Shorthand for [`Error::InvalidFormat`].
    pub(crate) fn invalid(format: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidFormat {
            format,
            message: message.into(),
        }
    }
}

/// A specialized Result type for `InfinityKit` operations.
pub type Result<T> = std::result::Result<T, Error>;
