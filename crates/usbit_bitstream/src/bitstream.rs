//! The top-level parsed bitstream: header, ordered packet list, and its
//! lazily derived configuration-array views.

use crate::codec::decode_section;
use crate::config_frame::ConfigFrame;
use crate::error::BitstreamError;
use crate::header::Header;
use crate::packet::{Opcode, Packet, Register};
use crate::sync::{find_all_syncs, next_sync_at_or_after};
use std::cell::OnceCell;
use std::io::Read;
use usbit_arch::Architecture;
use usbit_tables::FarIncrementer;

/// Number of all-zero padding frames inserted at every row boundary in an
/// uncompressed, non-per-frame-CRC bitstream.
pub const NUM_END_OF_ROW_PADDING_FRAMES: usize = 2;

/// One IDCODE's ordered writes, grouped by the base FAR each write
/// targeted, in first-insertion order.
#[derive(Debug, Default)]
pub struct FarWrites<'a> {
    /// The base FAR these writes were issued against.
    pub far: u32,
    /// `(byte_offset, payload)` pairs, in the order they appeared.
    pub writes: Vec<(usize, &'a [u8])>,
}

/// Per-IDCODE, per-base-FAR raw FDRI writes, preserving bitstream order.
#[derive(Debug, Default)]
pub struct RawConfigurationArrays<'a> {
    per_idcode: Vec<(u32, Vec<FarWrites<'a>>)>,
}

impl<'a> RawConfigurationArrays<'a> {
    /// IDCODEs present, in first-insertion order.
    pub fn idcodes(&self) -> impl Iterator<Item = u32> + '_ {
        self.per_idcode.iter().map(|(idcode, _)| *idcode)
    }

    /// The ordered FAR groups for one IDCODE, if present.
    pub fn groups_for(&self, idcode: u32) -> Option<&[FarWrites<'a>]> {
        self.per_idcode
            .iter()
            .find(|(id, _)| *id == idcode)
            .map(|(_, groups)| groups.as_slice())
    }

    fn group_mut(&mut self, idcode: u32, far: u32) -> &mut FarWrites<'a> {
        let idcode_groups = match self.per_idcode.iter().position(|(id, _)| *id == idcode) {
            Some(idx) => &mut self.per_idcode[idx].1,
            None => {
                self.per_idcode.push((idcode, Vec::new()));
                &mut self.per_idcode.last_mut().unwrap().1
            }
        };
        match idcode_groups.iter().position(|g| g.far == far) {
            Some(idx) => &mut idcode_groups[idx],
            None => {
                idcode_groups.push(FarWrites { far, writes: Vec::new() });
                idcode_groups.last_mut().unwrap()
            }
        }
    }
}

/// Per-IDCODE, ordered list of individual [`ConfigFrame`]s after FAR
/// auto-increment expansion.
#[derive(Debug, Default)]
pub struct IndividualConfigurationArrays<'a> {
    per_idcode: Vec<(u32, Vec<ConfigFrame<'a>>)>,
}

impl<'a> IndividualConfigurationArrays<'a> {
    /// IDCODEs present, in first-insertion order.
    pub fn idcodes(&self) -> impl Iterator<Item = u32> + '_ {
        self.per_idcode.iter().map(|(idcode, _)| *idcode)
    }

    /// The ordered frames for one IDCODE, if present.
    pub fn frames_for(&self, idcode: u32) -> Option<&[ConfigFrame<'a>]> {
        self.per_idcode
            .iter()
            .find(|(id, _)| *id == idcode)
            .map(|(_, frames)| frames.as_slice())
    }

    /// Every `(idcode, frame)` pair, in bitstream order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &ConfigFrame<'a>)> {
        self.per_idcode
            .iter()
            .flat_map(|(idcode, frames)| frames.iter().map(move |f| (*idcode, f)))
    }
}

/// A fully parsed bitstream. Borrows its byte buffer; packets and frames it
/// derives cannot outlive that buffer.
pub struct Bitstream<'a> {
    bytes: &'a [u8],
    header: Header,
    packets: Vec<Packet<'a>>,
    idcodes_cache: OnceCell<Vec<u32>>,
    crc_enabled_cache: OnceCell<bool>,
    raw_arrays_cache: OnceCell<RawConfigurationArrays<'a>>,
}

impl<'a> Bitstream<'a> {
    /// Parses `bytes` (already decompressed, if it was gzip-wrapped) into a
    /// `Bitstream`.
    pub fn parse(bytes: &'a [u8]) -> Result<Bitstream<'a>, BitstreamError> {
        let header = Header::parse(bytes)?;
        let syncs = find_all_syncs(bytes);
        if next_sync_at_or_after(&syncs, header.body_offset).is_none() {
            return Err(BitstreamError::NoSyncFound);
        }

        let mut packets = Vec::new();
        let mut cursor = header.body_offset;
        while let Some(sync_offset) = next_sync_at_or_after(&syncs, cursor) {
            let (section_packets, end) = decode_section(bytes, sync_offset)?;
            packets.extend(section_packets);
            cursor = end;
            if cursor >= bytes.len() {
                break;
            }
        }

        Ok(Bitstream {
            bytes,
            header,
            packets,
            idcodes_cache: OnceCell::new(),
            crc_enabled_cache: OnceCell::new(),
            raw_arrays_cache: OnceCell::new(),
        })
    }

    /// The parsed header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The full ordered, NOOP-filtered packet list.
    pub fn packets(&self) -> &[Packet<'a>] {
        &self.packets
    }

    /// `true` iff the `ENCRYPT` header option is set.
    pub fn is_encrypted(&self) -> bool {
        self.header.is_encrypted()
    }

    /// `true` iff the `COMPRESS` header option is set.
    pub fn is_compressed(&self) -> bool {
        self.header.is_compressed()
    }

    /// `true` iff the `PARTIAL` header option is set.
    pub fn is_partial(&self) -> bool {
        self.header.is_partial()
    }

    /// `true` iff any `WRITE` to the `CRC` register appears in the packet
    /// list.
    pub fn is_crc_enabled(&self) -> bool {
        *self.crc_enabled_cache.get_or_init(|| {
            self.packets
                .iter()
                .any(|p| p.register == Register::Crc && p.opcode == Opcode::Write)
        })
    }

    /// `true` iff every `FDRI` write carries exactly one frame and is
    /// immediately followed (before the next `FDRI` write) by a `CRC`
    /// write, including after the last `FDRI` write.
    pub fn is_per_frame_crc(&self, arch: Architecture) -> bool {
        let frame_bytes = 4 * arch.frame_size_words();
        let mut saw_fdri = false;
        let mut awaiting_crc = false;
        for packet in &self.packets {
            if packet.register == Register::Fdri && packet.opcode == Opcode::Write {
                if awaiting_crc {
                    // A second FDRI write arrived before its CRC.
                    return false;
                }
                if packet.payload.is_empty() {
                    continue;
                }
                if packet.payload.len() != frame_bytes {
                    return false;
                }
                saw_fdri = true;
                awaiting_crc = true;
            } else if packet.register == Register::Crc && packet.opcode == Opcode::Write {
                awaiting_crc = false;
            }
        }
        saw_fdri && !awaiting_crc
    }

    /// The `UserID` header option, if present.
    pub fn user_id(&self) -> Option<&str> {
        self.header.user_id()
    }

    /// The `Version` header option, if present.
    pub fn version(&self) -> Option<&str> {
        self.header.version()
    }

    /// The distinct IDCODEs written in this bitstream, in first-appearance
    /// order.
    pub fn get_idcodes(&self) -> &[u32] {
        self.idcodes_cache.get_or_init(|| {
            let mut seen = Vec::new();
            for packet in &self.packets {
                if packet.register == Register::Idcode && packet.opcode == Opcode::Write {
                    if let Some(value) = packet.single_word() {
                        if !seen.contains(&value) {
                            seen.push(value);
                        }
                    }
                }
            }
            seen
        })
    }

    /// Builds (or returns the cached) [`RawConfigurationArrays`], rejecting
    /// compressed or per-frame-CRC bitstreams and any FDRI payload whose
    /// length is not a whole number of frames.
    pub fn get_raw_configuration_arrays(
        &self,
        arch: Architecture,
    ) -> Result<&RawConfigurationArrays<'a>, BitstreamError> {
        if let Some(cached) = self.raw_arrays_cache.get() {
            return Ok(cached);
        }
        let computed = self.compute_raw_configuration_arrays(arch)?;
        Ok(self.raw_arrays_cache.get_or_init(|| computed))
    }

    fn compute_raw_configuration_arrays(
        &self,
        arch: Architecture,
    ) -> Result<RawConfigurationArrays<'a>, BitstreamError> {
        if self.is_compressed() {
            return Err(BitstreamError::UnsupportedBitstream { reason: "compressed" });
        }
        if self.is_per_frame_crc(arch) {
            return Err(BitstreamError::UnsupportedBitstream {
                reason: "per-frame CRC",
            });
        }

        let frame_bytes = 4 * arch.frame_size_words();
        let mut result = RawConfigurationArrays::default();
        let mut current_idcode: Option<u32> = None;
        let mut current_far: Option<u32> = None;

        for packet in &self.packets {
            match (packet.register, packet.opcode) {
                (Register::Idcode, Opcode::Write) => {
                    current_idcode = packet.single_word();
                }
                (Register::Far, Opcode::Write) => {
                    current_far = packet.single_word();
                }
                (Register::Fdri, Opcode::Write) => {
                    if packet.payload.is_empty() {
                        continue;
                    }
                    if packet.payload.len() % frame_bytes != 0 {
                        return Err(BitstreamError::IntegrityViolation {
                            detail: format!(
                                "FDRI write at offset {} has {} bytes, not a multiple of the {frame_bytes}-byte frame size",
                                packet.offset,
                                packet.payload.len()
                            ),
                        });
                    }
                    let idcode = current_idcode.ok_or_else(|| BitstreamError::IntegrityViolation {
                        detail: format!("FDRI write at offset {} with no prior IDCODE write", packet.offset),
                    })?;
                    let far = current_far.ok_or_else(|| BitstreamError::IntegrityViolation {
                        detail: format!("FDRI write at offset {} with no prior FAR write", packet.offset),
                    })?;
                    result
                        .group_mut(idcode, far)
                        .writes
                        .push((packet.offset, packet.payload));
                }
                _ => {}
            }
        }

        Ok(result)
    }

    /// Builds [`IndividualConfigurationArrays`] by splitting every raw FDRI
    /// payload into frames and assigning each one a FAR via `incrementer`,
    /// consuming and validating the two all-zero end-of-row padding frames
    /// at every row boundary.
    pub fn get_per_far_configuration_arrays(
        &self,
        arch: Architecture,
        incrementer: &FarIncrementer,
    ) -> Result<IndividualConfigurationArrays<'a>, BitstreamError> {
        let raw = self.get_raw_configuration_arrays(arch)?;
        let frame_bytes = 4 * arch.frame_size_words();
        let mut result = IndividualConfigurationArrays::default();

        for idcode in raw.idcodes() {
            let groups = raw.groups_for(idcode).unwrap_or(&[]);
            let mut frames = Vec::new();
            for group in groups {
                let mut far = usbit_arch::FrameAddress::from_int(arch, group.far);
                for &(write_offset, payload) in &group.writes {
                    let mut chunks = payload.chunks_exact(frame_bytes).enumerate();
                    while let Some((idx, chunk)) = chunks.next() {
                        let frame_offset = write_offset + idx * frame_bytes;
                        frames.push(ConfigFrame::new(frame_offset, chunk, far, arch)?);

                        let was_last_of_row = incrementer.is_last_far_of_row(idcode, &far)?;
                        far = incrementer.increment(idcode, &far)?;

                        if was_last_of_row {
                            for _ in 0..NUM_END_OF_ROW_PADDING_FRAMES {
                                match chunks.next() {
                                    Some((_, pad_chunk)) => {
                                        if pad_chunk.iter().any(|&b| b != 0) {
                                            return Err(BitstreamError::IntegrityViolation {
                                                detail: format!(
                                                    "non-zero end-of-row padding frame near offset {frame_offset}"
                                                ),
                                            });
                                        }
                                    }
                                    None => break,
                                }
                                far = incrementer.increment(idcode, &far)?;
                            }
                        }
                    }
                }
            }
            result.per_idcode.push((idcode, frames));
        }

        Ok(result)
    }
}

/// Reads a bitstream file from disk, transparently decompressing it first
/// if `path` ends in `.gz`.
pub fn read_bitstream_file(path: &std::path::Path) -> Result<Vec<u8>, BitstreamError> {
    let raw = std::fs::read(path).map_err(BitstreamError::GzipDecompress)?;
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        decompress_gzip(&raw)
    } else {
        Ok(raw)
    }
}

/// Decompresses a gzip-wrapped buffer in memory.
pub fn decompress_gzip(bytes: &[u8]) -> Result<Vec<u8>, BitstreamError> {
    let mut decoder = flate2::read::GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(BitstreamError::GzipDecompress)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAGIC: &[u8] = &[0x0f, 0xf0, 0x0f, 0xf0, 0x0f, 0xf0, 0x0f, 0xf0, 0x00];

    fn be(word: u32) -> [u8; 4] {
        word.to_be_bytes()
    }

    fn type1(opcode: u32, register: u32, word_count: u32) -> u32 {
        (1 << 29) | (opcode << 27) | (register << 13) | word_count
    }

    fn lv(tag: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(tag.len() as u16).to_be_bytes());
        out.extend_from_slice(tag);
        out
    }

    fn header_bytes(body: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend(lv(MAGIC));
        buf.extend(lv(b"a"));

        let mut f3 = b"top".to_vec();
        f3.push(0);
        buf.extend_from_slice(&(f3.len() as u16).to_be_bytes());
        buf.extend_from_slice(&f3);

        for (tag, value) in [(b'b', "xcku025"), (b'c', "2020/01/01"), (b'd', "00:00:00")] {
            buf.push(tag);
            let mut v = value.as_bytes().to_vec();
            v.push(0);
            buf.extend_from_slice(&(v.len() as u16).to_be_bytes());
            buf.extend_from_slice(&v);
        }

        buf.push(b'e');
        buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        buf.extend_from_slice(body);
        buf
    }

    fn body_with_idcode_and_desync(idcode: u32) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&be(0xAA995566));
        body.extend_from_slice(&be(type1(2, 12, 1))); // WRITE IDCODE
        body.extend_from_slice(&be(idcode));
        body.extend_from_slice(&be(type1(2, 4, 1))); // WRITE CMD DESYNC
        body.extend_from_slice(&be(crate::packet::CMD_DESYNC));
        body
    }

    #[test]
    fn parses_idcode_and_header_flags() {
        let body = body_with_idcode_and_desync(0x04A62093);
        let bytes = header_bytes(&body);
        let bitstream = Bitstream::parse(&bytes).unwrap();
        assert_eq!(bitstream.get_idcodes(), &[0x04A62093]);
        assert!(!bitstream.is_compressed());
        assert!(!bitstream.is_crc_enabled());
    }

    #[test]
    fn no_sync_found_errors() {
        let bytes = header_bytes(&[1, 2, 3]);
        let err = Bitstream::parse(&bytes).unwrap_err();
        assert!(matches!(err, BitstreamError::NoSyncFound));
    }

    #[test]
    fn raw_configuration_arrays_groups_by_far() {
        let mut body = Vec::new();
        body.extend_from_slice(&be(0xAA995566));
        body.extend_from_slice(&be(type1(2, 12, 1))); // IDCODE
        body.extend_from_slice(&be(0x04A62093));
        body.extend_from_slice(&be(type1(2, 1, 1))); // FAR
        body.extend_from_slice(&be(0x00000000));
        body.extend_from_slice(&be(type1(2, 2, 123))); // FDRI, 1 UltraScale frame
        body.extend_from_slice(&[0u8; 4 * 123]);
        body.extend_from_slice(&be(type1(2, 4, 1))); // CMD DESYNC
        body.extend_from_slice(&be(crate::packet::CMD_DESYNC));

        let bytes = header_bytes(&body);
        let bitstream = Bitstream::parse(&bytes).unwrap();
        let raw = bitstream
            .get_raw_configuration_arrays(Architecture::UltraScale)
            .unwrap();
        let groups = raw.groups_for(0x04A62093).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].far, 0);
        assert_eq!(groups[0].writes[0].1.len(), 4 * 123);
    }
}
