//! Parsing and decoding of Xilinx UltraScale/UltraScale+ `.bit` bitstream
//! files: header metadata, the TYPE1/TYPE2 configuration packet stream, and
//! the configuration-frame arrays derived from it.
#![warn(missing_docs)]

mod bitstream;
mod codec;
mod config_frame;
mod error;
mod header;
mod packet;
mod sync;

pub use bitstream::{
    decompress_gzip, read_bitstream_file, Bitstream, FarWrites, IndividualConfigurationArrays,
    RawConfigurationArrays, NUM_END_OF_ROW_PADDING_FRAMES,
};
pub use config_frame::ConfigFrame;
pub use error::BitstreamError;
pub use header::Header;
pub use packet::{HeaderType, Opcode, Packet, Register, CMD_DESYNC};
pub use sync::{find_all_syncs, next_sync_at_or_after, SYNC_WORD};
