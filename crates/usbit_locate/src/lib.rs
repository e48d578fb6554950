//! Resolves logical resource names (`SLICE_X*Y*/bel`, `RAMB18_X*Y*`) into
//! the exact frame addresses and frame-bit offsets that carry their
//! initialization values, plus the small `Lut`/`Bram` value types used to
//! assemble or compare those bits once read.

#![warn(missing_docs)]

pub mod bram;
pub mod error;
pub mod locate;
pub mod lut;
pub mod name;

pub use bram::Bram;
pub use error::LocateError;
pub use locate::{BitLocator, BramLocation, Loc, LutLocation, RegLocation};
pub use lut::Lut;
pub use name::{BelKind, RambName, SliceName};
