//! Error types for the state checker and differ.

/// Errors produced while checking a bitstream against expected values, or
/// diffing two bitstreams.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Failure parsing or deriving configuration arrays from a bitstream.
    #[error(transparent)]
    Bitstream(#[from] usbit_bitstream::BitstreamError),

    /// Failure resolving a resource name to bit positions.
    #[error(transparent)]
    Locate(#[from] usbit_locate::LocateError),

    /// Failure looking up a device or architecture table.
    #[error(transparent)]
    Table(#[from] usbit_tables::TableError),

    /// A structural invariant the checker or differ depends on was
    /// violated: a missing or duplicate FAR write, mismatched FAR/IDCODE
    /// sets between two bitstreams, or malformed BRAM `INIT_XX` fragments.
    #[error("integrity violation: {detail}")]
    IntegrityViolation {
        /// Human-readable description of the violated invariant.
        detail: String,
    },

    /// The state checker found a LUT/FF/BRAM bit disagreement.
    #[error("mismatch at {location}: expected {expected}, observed {observed}")]
    ExpectedMismatch {
        /// Resource name and, for multi-part resources, which part.
        location: String,
        /// Expected value, rendered the same way as `observed`.
        expected: String,
        /// Observed value read from the bitstream.
        observed: String,
    },
}
