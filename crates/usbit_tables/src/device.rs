//! Device table schema: per-device, per-SLR column-major layout.
//!
//! This is reference data produced once per FPGA device by an external
//! pipeline (out of scope for this crate, see the crate-level docs); this
//! module only deserializes it and offers read-only lookups.

use crate::error::TableError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Per-row column-major layout for one super-logic-region.
#[derive(Debug, Clone, Deserialize)]
pub struct RowMajor {
    /// Physical column majors carrying BRAM memory-content frames, in
    /// logical (X-coordinate) order.
    #[serde(rename = "bram_content_colMajors")]
    pub bram_content_col_majors: Vec<u32>,
    /// Physical column majors carrying BRAM parity frames, in logical order.
    #[serde(rename = "bram_content_parity_colMajors")]
    pub bram_content_parity_col_majors: Vec<u32>,
    /// Physical column majors carrying BRAM register configuration.
    #[serde(rename = "bram_reg_colMajors")]
    pub bram_reg_col_majors: Vec<u32>,
    /// Physical column majors carrying CLB (logic) configuration, in
    /// logical (X-coordinate) order.
    #[serde(rename = "clb_colMajors")]
    pub clb_col_majors: Vec<u32>,
    /// Physical column majors carrying DSP configuration.
    #[serde(rename = "dsp_colMajors")]
    pub dsp_col_majors: Vec<u32>,
    /// Tile-type label for each entry of `clb_col_majors`, same length and
    /// order.
    #[serde(rename = "clb_tileTypes")]
    pub clb_tile_types: Vec<String>,
    /// Minor-frame count for each entry of `bram_content_col_majors`.
    #[serde(rename = "num_minors_per_bram_content_colMajor")]
    pub num_minors_per_bram_content_col_major: Vec<u32>,
    /// Minor-frame count for each entry of `clb_col_majors`.
    #[serde(rename = "num_minors_per_std_colMajor")]
    pub num_minors_per_std_col_major: Vec<u32>,
    /// Lowest DSP Y-offset present in this row, if any DSP columns exist.
    #[serde(default)]
    pub min_dsp_y_ofst: Option<u32>,
    /// Highest DSP Y-offset present in this row, if any DSP columns exist.
    #[serde(default)]
    pub max_dsp_y_ofst: Option<u32>,
}

impl RowMajor {
    /// Physical column major and tile type for the `logical_col`-th CLB
    /// column in this row (the X coordinate of a `SLICE_X*Y*` name indexes
    /// this list directly).
    pub fn clb_column(&self, logical_col: u32) -> Option<(u32, &str)> {
        let idx = logical_col as usize;
        let major = *self.clb_col_majors.get(idx)?;
        let tile_type = self.clb_tile_types.get(idx)?.as_str();
        Some((major, tile_type))
    }

    /// Physical column major for the `logical_col`-th 18-Kib BRAM column in
    /// this row.
    pub fn bram_content_column(&self, logical_col: u32) -> Option<u32> {
        self.bram_content_col_majors.get(logical_col as usize).copied()
    }
}

/// One super-logic-region's layout within a device.
#[derive(Debug, Clone, Deserialize)]
pub struct SlrRecord {
    /// Hex-encoded IDCODE, e.g. `"0x0428e093"`.
    pub idcode: String,
    /// Geometric stacking index (bottom die is typically 0).
    pub slr_idx: u32,
    /// Position of this SLR in bitstream configuration order.
    pub config_order_idx: u32,
    /// Lowest clock-region row index visible in this SLR.
    pub min_clock_region_row_idx: u32,
    /// Highest clock-region row index visible in this SLR.
    pub max_clock_region_row_idx: u32,
    /// Lowest clock-region column index visible in this SLR.
    pub min_clock_region_col_idx: u32,
    /// Highest clock-region column index visible in this SLR.
    pub max_clock_region_col_idx: u32,
    /// Lowest FAR-addressable row index in this SLR.
    pub min_far_row_idx: u32,
    /// Highest FAR-addressable row index in this SLR.
    pub max_far_row_idx: u32,
    /// Per-row column-major layout, keyed by FAR row index.
    #[serde(rename = "rowMajors")]
    pub row_majors: BTreeMap<u32, RowMajor>,
}

impl SlrRecord {
    /// Parses [`SlrRecord::idcode`] into its 32-bit integer value.
    pub fn idcode_value(&self) -> Result<u32, TableError> {
        let digits = self
            .idcode
            .strip_prefix("0x")
            .or_else(|| self.idcode.strip_prefix("0X"))
            .unwrap_or(&self.idcode);
        u32::from_str_radix(digits, 16).map_err(|_| TableError::InvalidIdcode(self.idcode.clone()))
    }

    /// Number of FAR-addressable rows in this SLR.
    pub fn num_far_rows(&self) -> u32 {
        self.max_far_row_idx - self.min_far_row_idx + 1
    }
}

/// One device's full table: identity, resource counts, and per-SLR layout.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceTable {
    /// FPGA part string, e.g. `"xcku025-ffva1156-1-c"`.
    pub part: String,
    /// Device family name, e.g. `"xcku025"`.
    pub device: String,
    /// Vendor license string carried through from the source tooling.
    pub license: String,
    /// Total 36-Kib BRAM count across the device.
    pub num_brams: u32,
    /// Total DSP slice count across the device.
    pub num_dsps: u32,
    /// Total flip-flop count across the device.
    pub num_regs: u32,
    /// Total 6-input LUT count across the device.
    pub num_luts: u32,
    /// Total SLICE count across the device.
    pub num_slices: u32,
    /// Number of super-logic regions.
    pub num_slrs: u32,
    /// `(tile_type, site_type)` pairs observed in this device.
    pub tile_site_pairs: Vec<(String, String)>,
    /// Per-SLR layout, keyed by SLR name (e.g. `"SLR0"`).
    pub slrs: BTreeMap<String, SlrRecord>,
}

impl DeviceTable {
    /// Looks up an SLR record by name.
    pub fn slr(&self, name: &str) -> Option<&SlrRecord> {
        self.slrs.get(name)
    }

    /// Returns every SLR record in ascending configuration order (the order
    /// SLRs appear as distinct sections in a concatenated multi-SLR
    /// bitstream).
    pub fn slrs_in_config_order(&self) -> Vec<(&str, &SlrRecord)> {
        let mut out: Vec<(&str, &SlrRecord)> =
            self.slrs.iter().map(|(name, rec)| (name.as_str(), rec)).collect();
        out.sort_by_key(|(_, rec)| rec.config_order_idx);
        out
    }

    /// Finds the SLR whose IDCODE matches, if any.
    pub fn slr_for_idcode(&self, idcode: u32) -> Option<(&str, &SlrRecord)> {
        self.slrs
            .iter()
            .find(|(_, rec)| rec.idcode_value().ok() == Some(idcode))
            .map(|(name, rec)| (name.as_str(), rec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_table() -> DeviceTable {
        serde_json::from_str(
            r#"{
                "part": "xcku025-ffva1156-1-c",
                "device": "xcku025",
                "license": "test",
                "num_brams": 1, "num_dsps": 1, "num_regs": 1, "num_luts": 1,
                "num_slices": 1, "num_slrs": 1,
                "tile_site_pairs": [["CLEL_L", "SLICEL"]],
                "slrs": {
                    "SLR0": {
                        "idcode": "0x0428e093",
                        "slr_idx": 0,
                        "config_order_idx": 0,
                        "min_clock_region_row_idx": 0,
                        "max_clock_region_row_idx": 0,
                        "min_clock_region_col_idx": 0,
                        "max_clock_region_col_idx": 0,
                        "min_far_row_idx": 0,
                        "max_far_row_idx": 1,
                        "rowMajors": {
                            "0": {
                                "bram_content_colMajors": [2],
                                "bram_content_parity_colMajors": [2],
                                "bram_reg_colMajors": [2],
                                "clb_colMajors": [0, 1],
                                "dsp_colMajors": [],
                                "clb_tileTypes": ["CLEL_L", "CLEM"],
                                "num_minors_per_bram_content_colMajor": [128],
                                "num_minors_per_std_colMajor": [1, 1]
                            },
                            "1": {
                                "bram_content_colMajors": [2],
                                "bram_content_parity_colMajors": [2],
                                "bram_reg_colMajors": [2],
                                "clb_colMajors": [0, 1],
                                "dsp_colMajors": [],
                                "clb_tileTypes": ["CLEL_L", "CLEM"],
                                "num_minors_per_bram_content_colMajor": [128],
                                "num_minors_per_std_colMajor": [1, 1]
                            }
                        }
                    }
                }
            }"#,
        )
        .expect("toy device table parses")
    }

    #[test]
    fn parses_idcode_hex() {
        let table = toy_table();
        let slr = table.slr("SLR0").unwrap();
        assert_eq!(slr.idcode_value().unwrap(), 0x0428e093);
    }

    #[test]
    fn clb_column_lookup() {
        let table = toy_table();
        let slr = table.slr("SLR0").unwrap();
        let row = slr.row_majors.get(&0).unwrap();
        assert_eq!(row.clb_column(1), Some((1, "CLEM")));
        assert_eq!(row.clb_column(5), None);
    }

    #[test]
    fn slr_for_idcode_found() {
        let table = toy_table();
        let (name, _) = table.slr_for_idcode(0x0428e093).unwrap();
        assert_eq!(name, "SLR0");
    }
}
