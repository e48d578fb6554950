//! FAR auto-increment, built from a [`DeviceTable`].

use crate::device::DeviceTable;
use crate::error::TableError;
use std::collections::HashMap;
use usbit_arch::{BlockType, FrameAddress};

struct RowMinors {
    std_minors: Vec<u32>,
    bram_minors: Vec<u32>,
}

/// Caches, per IDCODE and row, how many minor frames each column holds, and
/// increments a FAR through minor → column → row → block-type carries.
pub struct FarIncrementer {
    rows_by_idcode: HashMap<u32, Vec<RowMinors>>,
}

impl FarIncrementer {
    /// Builds an incrementer from every SLR in `device`.
    pub fn from_device_table(device: &DeviceTable) -> Result<Self, TableError> {
        let mut rows_by_idcode = HashMap::new();
        for slr in device.slrs.values() {
            let idcode = slr.idcode_value()?;
            let mut rows = Vec::with_capacity(slr.row_majors.len());
            for (expected_idx, (&row_idx, row)) in slr.row_majors.iter().enumerate() {
                if row_idx != expected_idx as u32 {
                    return Err(TableError::NonContiguousRows(idcode));
                }
                rows.push(RowMinors {
                    std_minors: row.num_minors_per_std_col_major.clone(),
                    bram_minors: row.num_minors_per_bram_content_col_major.clone(),
                });
            }
            rows_by_idcode.insert(idcode, rows);
        }
        Ok(FarIncrementer { rows_by_idcode })
    }

    fn cols_for(&self, idcode: u32, far: &FrameAddress) -> Result<&[u32], TableError> {
        let rows = self
            .rows_by_idcode
            .get(&idcode)
            .ok_or(TableError::UnknownIdcode(idcode))?;
        let row = rows
            .get(far.row() as usize)
            .ok_or(TableError::RowOutOfRange {
                idcode,
                row: far.row(),
            })?;
        match far.block_type() {
            BlockType::ClbIoClk => Ok(&row.std_minors),
            BlockType::BramContent => Ok(&row.bram_minors),
            BlockType::Reserved(v) => Err(TableError::UnsupportedBlockType(v)),
        }
    }

    /// Returns `true` iff `far` is the last FAR of its row: its column is
    /// the row's last column, and its minor is that column's last minor.
    pub fn is_last_far_of_row(&self, idcode: u32, far: &FrameAddress) -> Result<bool, TableError> {
        let cols = self.cols_for(idcode, far)?;
        let last_col = cols.len() as u32 - 1;
        if far.col() != last_col {
            return Ok(false);
        }
        let minors_in_col = cols[far.col() as usize];
        Ok(far.minor() + 1 == minors_in_col)
    }

    /// Computes the next FAR after `far`, carrying minor → column → row →
    /// block-type in that order. Reserved bits are preserved unchanged.
    pub fn increment(&self, idcode: u32, far: &FrameAddress) -> Result<FrameAddress, TableError> {
        let cols = self.cols_for(idcode, far)?;
        let minors_in_col = *cols
            .get(far.col() as usize)
            .ok_or(TableError::ColOutOfRange {
                idcode,
                col: far.col(),
            })?;

        let mut minor = far.minor() + 1;
        let mut col = far.col();
        let mut row = far.row();
        let mut block_type = far.block_type();

        if minor == minors_in_col {
            minor = 0;
            col += 1;
            if col as usize == cols.len() {
                col = 0;
                let num_rows = self.rows_by_idcode[&idcode].len() as u32;
                row += 1;
                if row == num_rows {
                    row = 0;
                    block_type = block_type.toggled();
                }
            }
        }

        Ok(far.with_fields(block_type, row, col, minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usbit_arch::Architecture;

    fn toy_device_two_rows() -> DeviceTable {
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
                        "min_clock_region_row_idx": 0, "max_clock_region_row_idx": 1,
                        "min_clock_region_col_idx": 0, "max_clock_region_col_idx": 2,
                        "min_far_row_idx": 0, "max_far_row_idx": 1,
                        "rowMajors": {
                            "0": {
                                "bram_content_colMajors": [2], "bram_content_parity_colMajors": [2],
                                "bram_reg_colMajors": [2], "clb_colMajors": [0, 1, 2],
                                "dsp_colMajors": [], "clb_tileTypes": ["CLEL_L", "CLEM", "CLEL_R"],
                                "num_minors_per_bram_content_colMajor": [128],
                                "num_minors_per_std_colMajor": [4, 12, 58]
                            },
                            "1": {
                                "bram_content_colMajors": [2], "bram_content_parity_colMajors": [2],
                                "bram_reg_colMajors": [2], "clb_colMajors": [0, 1, 2],
                                "dsp_colMajors": [], "clb_tileTypes": ["CLEL_L", "CLEM", "CLEL_R"],
                                "num_minors_per_bram_content_colMajor": [128],
                                "num_minors_per_std_colMajor": [4, 12, 58]
                            }
                        }
                    }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn increments_across_row_boundary() {
        // Toy device: a row with column minor counts [4, 12, 58], 2 rows.
        let device = toy_device_two_rows();
        let incr = FarIncrementer::from_device_table(&device).unwrap();
        let idcode = 0x04000093;

        let far = FrameAddress::from_fields(
            Architecture::UltraScalePlus,
            0,
            BlockType::ClbIoClk,
            0,
            2,
            57,
        )
        .unwrap();
        let next = incr.increment(idcode, &far).unwrap();
        assert_eq!(next.block_type(), BlockType::ClbIoClk);
        assert_eq!(next.row(), 1);
        assert_eq!(next.col(), 0);
        assert_eq!(next.minor(), 0);

        let far2 = FrameAddress::from_fields(
            Architecture::UltraScalePlus,
            0,
            BlockType::ClbIoClk,
            1,
            2,
            57,
        )
        .unwrap();
        let next2 = incr.increment(idcode, &far2).unwrap();
        assert_eq!(next2.block_type(), BlockType::BramContent);
        assert_eq!(next2.row(), 0);
        assert_eq!(next2.col(), 0);
        assert_eq!(next2.minor(), 0);
    }

    #[test]
    fn is_last_far_of_row_detects_boundary() {
        let device = toy_device_two_rows();
        let incr = FarIncrementer::from_device_table(&device).unwrap();
        let idcode = 0x04000093;
        let far = FrameAddress::from_fields(
            Architecture::UltraScalePlus,
            0,
            BlockType::ClbIoClk,
            0,
            2,
            57,
        )
        .unwrap();
        assert!(incr.is_last_far_of_row(idcode, &far).unwrap());

        let not_last = FrameAddress::from_fields(
            Architecture::UltraScalePlus,
            0,
            BlockType::ClbIoClk,
            0,
            1,
            11,
        )
        .unwrap();
        assert!(!incr.is_last_far_of_row(idcode, &not_last).unwrap());
    }

    #[test]
    fn full_cycle_returns_to_start() {
        let device = toy_device_two_rows();
        let incr = FarIncrementer::from_device_table(&device).unwrap();
        let idcode = 0x04000093;
        let start = FrameAddress::from_fields(
            Architecture::UltraScalePlus,
            0,
            BlockType::ClbIoClk,
            0,
            0,
            0,
        )
        .unwrap();
        let total_minors_one_block: u32 = [4u32, 12, 58].iter().sum::<u32>() * 2;
        let total = total_minors_one_block * 2; // both block types, 2 rows each
        let mut cur = start;
        for _ in 0..total {
            cur = incr.increment(idcode, &cur).unwrap();
        }
        assert_eq!(cur, start);
    }
}
