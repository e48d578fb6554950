//! Consumes a parsed [`usbit_bitstream::Bitstream`] and a
//! [`usbit_locate::BitLocator`] to verify configuration bits against
//! expected values, and to diff two bitstreams at bit granularity.

#![warn(missing_docs)]

mod checker;
mod differ;
mod error;
mod frame_map;

pub use checker::{BramExpectation, CheckReport, ExpectedValues, StateChecker};
pub use differ::{diff, BitDiff, Polarity};
pub use error::CheckError;
pub use frame_map::FrameMap;
