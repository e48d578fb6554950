//! Error types for device/architecture table loading and lookup.

use std::path::PathBuf;

/// Errors produced while loading or querying a device or architecture table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The table file could not be read from disk.
    #[error("failed to read table file {path}")]
    TableReadIo {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The table file's contents did not deserialize into the expected schema.
    #[error("failed to parse table file {path}")]
    TableLoad {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// Neither an explicit path nor the documented environment variable
    /// named a table file to load.
    #[error("no table path given and environment variable {0} is not set")]
    MissingEnvVar(&'static str),

    /// JSON text did not parse, with no file path context available yet
    /// (callers loading from a path see [`TableError::TableLoad`] instead).
    #[error("invalid table JSON")]
    InvalidJson(#[source] serde_json::Error),

    /// The `idcode` string in a device record was not valid hex.
    #[error("invalid IDCODE string {0:?}")]
    InvalidIdcode(String),

    /// The FAR incrementer has no row-major data cached for this IDCODE.
    #[error("no row-major data for IDCODE {0:#010x}")]
    UnknownIdcode(u32),

    /// A FAR's row index has no corresponding row in the device table.
    #[error("IDCODE {idcode:#010x} has no row {row}")]
    RowOutOfRange {
        /// The offending IDCODE.
        idcode: u32,
        /// The out-of-range row index.
        row: u32,
    },

    /// A FAR's column index has no corresponding column in its row.
    #[error("IDCODE {idcode:#010x} row has no column {col}")]
    ColOutOfRange {
        /// The offending IDCODE.
        idcode: u32,
        /// The out-of-range column index.
        col: u32,
    },

    /// A device table's `rowMajors` keys were not the contiguous range
    /// `0..N` this codebase assumes.
    #[error("IDCODE {0:#010x} has non-contiguous row-major indices")]
    NonContiguousRows(u32),

    /// A FAR's block type was a reserved encoding the incrementer does not
    /// know how to carry across.
    #[error("cannot increment FAR with reserved block type {0}")]
    UnsupportedBlockType(u8),

    /// An architecture table has no entry for this tile type.
    #[error("architecture table has no entry for tile type {0:?}")]
    MissingTileType(String),

    /// A tile type's architecture table entry has no data for this Y-offset.
    #[error("tile type {tile_type:?} has no entry for Y-offset {y_ofst}")]
    MissingYOfst {
        /// The tile type queried.
        tile_type: String,
        /// The out-of-range Y-offset.
        y_ofst: u32,
    },

    /// A tile type / Y-offset has no entry for this BEL name.
    #[error("tile type {tile_type:?} Y-offset {y_ofst} has no BEL {bel:?}")]
    MissingBel {
        /// The tile type queried.
        tile_type: String,
        /// The Y-offset queried.
        y_ofst: u32,
        /// The BEL name that was not found.
        bel: String,
    },

    /// A LUT/BRAM BEL's `minor` and `frame_ofst` arrays had mismatched
    /// lengths, or the wrong length for the resource kind.
    #[error("tile type {tile_type:?} BEL {bel:?} expected {expected} offsets, found {found}")]
    WrongOffsetCount {
        /// The tile type queried.
        tile_type: String,
        /// The BEL name queried.
        bel: String,
        /// The expected array length for this resource kind.
        expected: usize,
        /// The array length actually present.
        found: usize,
    },
}
