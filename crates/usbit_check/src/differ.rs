//! Bit-granular diff between two parsed bitstreams for the same part
//! (§4.7).

use crate::error::CheckError;
use usbit_arch::FrameAddress;
use usbit_bitstream::IndividualConfigurationArrays;

/// The polarity of one disagreeing frame bit: whether the baseline had it
/// clear and the modified bitstream set it, or the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Baseline bit was `0`, modified bit is `1`.
    Set,
    /// Baseline bit was `1`, modified bit is `0`.
    Cleared,
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Polarity::Set => "+",
            Polarity::Cleared => "-",
        })
    }
}

/// One disagreeing configuration bit between a baseline and a modified
/// bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitDiff {
    /// IDCODE of the SLR the disagreeing frame belongs to.
    pub idcode: u32,
    /// FAR of the disagreeing frame.
    pub far: FrameAddress,
    /// Bit index within the frame.
    pub frame_offset: usize,
    /// Which direction the bit flipped.
    pub polarity: Polarity,
}

/// Diffs two [`IndividualConfigurationArrays`] built from bitstreams of the
/// same part, at bit granularity (§4.7).
///
/// Both inputs are expected to describe the same device: equal IDCODE
/// sets, equal FAR key sets per IDCODE, equal write counts per FAR, and
/// equal byte offsets for corresponding frames. Any mismatch here means the
/// two bitstreams were not a one-bit-logical-change pair, and is reported
/// as [`CheckError::IntegrityViolation`] rather than a diff result.
pub fn diff(
    baseline: &IndividualConfigurationArrays<'_>,
    modified: &IndividualConfigurationArrays<'_>,
) -> Result<Vec<BitDiff>, CheckError> {
    let mut baseline_idcodes: Vec<u32> = baseline.idcodes().collect();
    let mut modified_idcodes: Vec<u32> = modified.idcodes().collect();
    baseline_idcodes.sort_unstable();
    modified_idcodes.sort_unstable();
    if baseline_idcodes != modified_idcodes {
        return Err(CheckError::IntegrityViolation {
            detail: format!(
                "IDCODE sets differ: baseline {baseline_idcodes:?}, modified {modified_idcodes:?}"
            ),
        });
    }

    let mut diffs = Vec::new();
    for idcode in baseline_idcodes {
        let base_frames = baseline.frames_for(idcode).unwrap_or(&[]);
        let mod_frames = modified.frames_for(idcode).unwrap_or(&[]);
        if base_frames.len() != mod_frames.len() {
            return Err(CheckError::IntegrityViolation {
                detail: format!(
                    "IDCODE {idcode:#010x}: {} frames in baseline, {} in modified",
                    base_frames.len(),
                    mod_frames.len()
                ),
            });
        }

        for (base_frame, mod_frame) in base_frames.iter().zip(mod_frames.iter()) {
            if base_frame.far != mod_frame.far {
                return Err(CheckError::IntegrityViolation {
                    detail: format!(
                        "IDCODE {idcode:#010x}: frame order mismatch, baseline FAR {} vs modified FAR {}",
                        base_frame.far.to_hex(),
                        mod_frame.far.to_hex()
                    ),
                });
            }
            if base_frame.offset != mod_frame.offset {
                return Err(CheckError::IntegrityViolation {
                    detail: format!(
                        "IDCODE {idcode:#010x}, FAR {}: byte offset differs ({} vs {})",
                        base_frame.far.to_hex(),
                        base_frame.offset,
                        mod_frame.offset
                    ),
                });
            }
            if base_frame.words == mod_frame.words {
                continue;
            }
            for bit_offset in 0..base_frame.bit_len() {
                let base_bit = base_frame.bit(bit_offset)?;
                let mod_bit = mod_frame.bit(bit_offset)?;
                if base_bit == mod_bit {
                    continue;
                }
                let polarity = if mod_bit { Polarity::Set } else { Polarity::Cleared };
                diffs.push(BitDiff {
                    idcode,
                    far: base_frame.far,
                    frame_offset: bit_offset,
                    polarity,
                });
            }
        }
    }

    if let Some(first) = diffs.first() {
        if diffs.iter().any(|d| d.idcode != first.idcode) {
            return Err(CheckError::IntegrityViolation {
                detail: "disagreeing frames span more than one IDCODE".to_string(),
            });
        }
    }

    Ok(diffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use usbit_arch::Architecture;
    use usbit_bitstream::Bitstream;
    use usbit_tables::{DeviceTable, FarIncrementer};

    fn toy_device() -> DeviceTable {
        serde_json::from_str(
            r#"{
                "part": "test", "device": "test", "license": "test",
                "num_brams": 0, "num_dsps": 0, "num_regs": 0, "num_luts": 0,
                "num_slices": 0, "num_slrs": 1,
                "tile_site_pairs": [],
                "slrs": {
                    "SLR0": {
                        "idcode": "0x04000093",
                        "slr_idx": 0, "config_order_idx": 0,
                        "min_clock_region_row_idx": 0, "max_clock_region_row_idx": 0,
                        "min_clock_region_col_idx": 0, "max_clock_region_col_idx": 0,
                        "min_far_row_idx": 0, "max_far_row_idx": 0,
                        "rowMajors": {
                            "0": {
                                "bram_content_colMajors": [2], "bram_content_parity_colMajors": [2],
                                "bram_reg_colMajors": [2], "clb_colMajors": [0, 1],
                                "dsp_colMajors": [], "clb_tileTypes": ["CLEL_L", "CLEM"],
                                "num_minors_per_bram_content_colMajor": [128],
                                "num_minors_per_std_colMajor": [1, 1]
                            }
                        }
                    }
                }
            }"#,
        )
        .unwrap()
    }

    fn type1(opcode: u32, register: u32, word_count: u32) -> u32 {
        (1 << 29) | (opcode << 27) | (register << 13) | word_count
    }

    fn be(word: u32) -> [u8; 4] {
        word.to_be_bytes()
    }

    fn lv(tag: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(tag.len() as u16).to_be_bytes());
        out.extend_from_slice(tag);
        out
    }

    fn header_bytes(body: &[u8]) -> Vec<u8> {
        const MAGIC: &[u8] = &[0x0f, 0xf0, 0x0f, 0xf0, 0x0f, 0xf0, 0x0f, 0xf0, 0x00];
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

    fn single_far_bitstream(idcode: u32, frame_words: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&be(0xAA995566));
        body.extend_from_slice(&be(type1(2, 12, 1)));
        body.extend_from_slice(&be(idcode));
        body.extend_from_slice(&be(type1(2, 1, 1)));
        body.extend_from_slice(&be(0x00000000));
        body.extend_from_slice(&be(type1(2, 2, Architecture::UltraScale.frame_size_words() as u32)));
        body.extend_from_slice(frame_words);
        body.extend_from_slice(&be(type1(2, 4, 1)));
        body.extend_from_slice(&be(usbit_bitstream::CMD_DESYNC));
        header_bytes(&body)
    }

    #[test]
    fn identical_bitstreams_diff_empty() {
        let device = toy_device();
        let incrementer = FarIncrementer::from_device_table(&device).unwrap();
        let words = vec![0u8; 4 * Architecture::UltraScale.frame_size_words()];
        let bytes = single_far_bitstream(0x04000093, &words);
        let a = Bitstream::parse(&bytes).unwrap();
        let b = Bitstream::parse(&bytes).unwrap();
        let arrays_a = a
            .get_per_far_configuration_arrays(Architecture::UltraScale, &incrementer)
            .unwrap();
        let arrays_b = b
            .get_per_far_configuration_arrays(Architecture::UltraScale, &incrementer)
            .unwrap();
        let diffs = diff(&arrays_a, &arrays_b).unwrap();
        assert!(diffs.is_empty());
    }

    #[test]
    fn single_bit_flip_reports_one_diff_with_polarity() {
        let device = toy_device();
        let incrementer = FarIncrementer::from_device_table(&device).unwrap();
        let base_words = vec![0u8; 4 * Architecture::UltraScale.frame_size_words()];
        let mut mod_words = base_words.clone();
        mod_words[3] |= 0b0000_0001; // flip bit 0 of word 0 (LSB, big-endian byte layout)

        let base_bytes = single_far_bitstream(0x04000093, &base_words);
        let mod_bytes = single_far_bitstream(0x04000093, &mod_words);
        let base = Bitstream::parse(&base_bytes).unwrap();
        let modified = Bitstream::parse(&mod_bytes).unwrap();
        let arrays_base = base
            .get_per_far_configuration_arrays(Architecture::UltraScale, &incrementer)
            .unwrap();
        let arrays_mod = modified
            .get_per_far_configuration_arrays(Architecture::UltraScale, &incrementer)
            .unwrap();

        let diffs = diff(&arrays_base, &arrays_mod).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].idcode, 0x04000093);
        assert_eq!(diffs[0].frame_offset, 0);
        assert_eq!(diffs[0].polarity, Polarity::Set);
    }

    #[test]
    fn mismatched_idcode_sets_rejected() {
        let device = toy_device();
        let incrementer = FarIncrementer::from_device_table(&device).unwrap();
        let words = vec![0u8; 4 * Architecture::UltraScale.frame_size_words()];
        let bytes_a = single_far_bitstream(0x04000093, &words);
        let bytes_b = single_far_bitstream(0x04000099, &words);
        let a = Bitstream::parse(&bytes_a).unwrap();
        let b = Bitstream::parse(&bytes_b).unwrap();
        let arrays_a = a
            .get_per_far_configuration_arrays(Architecture::UltraScale, &incrementer)
            .unwrap();
        let arrays_b = b
            .get_per_far_configuration_arrays(Architecture::UltraScale, &incrementer)
            .unwrap();
        let err = diff(&arrays_a, &arrays_b).unwrap_err();
        assert!(matches!(err, CheckError::IntegrityViolation { .. }));
    }
}
