//! Device/architecture table schema, loading, and Frame Address Register
//! auto-increment for Xilinx UltraScale / UltraScale+ parts.
//!
//! Device and architecture tables are reference data produced once per
//! FPGA family/device by an external pipeline (out of scope for this
//! crate family); this crate only deserializes and queries them.

#![warn(missing_docs)]

pub mod arch_table;
pub mod device;
pub mod error;
pub mod incrementer;
pub mod loader;

pub use arch_table::ArchitectureTable;
pub use device::{DeviceTable, RowMajor, SlrRecord};
pub use error::TableError;
pub use incrementer::FarIncrementer;
pub use loader::{load_architecture_table, load_device_table, ARCH_DB_ENV, DEVICE_DB_ENV};
