//! Error types for header parsing, packet decoding, and configuration-array
//! derivation.

/// Errors produced while decoding a bitstream or deriving its configuration
/// arrays.
#[derive(Debug, thiserror::Error)]
pub enum BitstreamError {
    /// A length-prefixed or tag-length-value header field did not match its
    /// expected shape.
    #[error("malformed header at byte offset {offset}: {detail}")]
    MalformedHeader {
        /// Byte offset at which parsing failed.
        offset: usize,
        /// Human-readable description of what was expected.
        detail: String,
    },

    /// No `0xAA995566` sync word was found anywhere in the buffer.
    #[error("no sync word found in bitstream")]
    NoSyncFound,

    /// A TYPE2 packet appeared before any TYPE1 packet had set an implicit
    /// target register.
    #[error("orphan TYPE2 packet at byte offset {offset}: no prior TYPE1 register")]
    OrphanType2 {
        /// Byte offset of the orphan TYPE2 word.
        offset: usize,
    },

    /// The bitstream is compressed, encrypted, or uses per-frame CRC, and
    /// the caller asked for an operation that requires none of those.
    #[error("unsupported bitstream: {reason}")]
    UnsupportedBitstream {
        /// Which unsupported property was detected.
        reason: &'static str,
    },

    /// A structural invariant of the configuration-array derivation was
    /// violated: non-zero end-of-row padding, a duplicate FAR write where a
    /// single write was required, or an FDRI payload whose length was not a
    /// multiple of the frame size.
    #[error("integrity violation: {detail}")]
    IntegrityViolation {
        /// Human-readable description of the violated invariant.
        detail: String,
    },

    /// A FAR value failed to decode or re-encode.
    #[error(transparent)]
    Architecture(#[from] usbit_arch::ArchError),

    /// The FAR incrementer failed to advance a FAR (unknown IDCODE, a row or
    /// column past the device table's bounds, or a reserved block type).
    #[error(transparent)]
    Table(#[from] usbit_tables::TableError),

    /// The gzip transport wrapper (`.gz` bitstreams) could not be
    /// decompressed.
    #[error("failed to decompress gzip-wrapped bitstream")]
    GzipDecompress(#[source] std::io::Error),
}
