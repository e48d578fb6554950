//! Error types for resource-name parsing and bit location.

/// Errors produced while parsing a resource name or resolving its bit
/// positions against a device/architecture table pair.
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    /// A resource name did not match either the `SLICE_X*Y*/bel` or
    /// `RAMB*_X*Y*` pattern, or its BEL suffix was not one this crate
    /// knows how to locate.
    #[error("{0:?} is not a recognized resource name")]
    InvalidResourceName(String),

    /// No SLR, row-major, or column-major could be resolved for the given
    /// coordinates.
    #[error("could not resolve a location for {0}")]
    ResourceNotFound(String),

    /// A resource was recognized but names a kind this crate does not
    /// support (e.g. a BRAM size tag other than 18).
    #[error("unsupported resource: {0}")]
    UnsupportedResource(String),

    /// Failure looking up the device or architecture table.
    #[error(transparent)]
    Table(#[from] usbit_tables::TableError),

    /// Failure packing a computed Frame Address Register value.
    #[error(transparent)]
    Arch(#[from] usbit_arch::ArchError),
}
