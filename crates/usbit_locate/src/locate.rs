//! Resolves `SLICE_X*Y*/bel` and `RAMB18_X*Y*` resource names into
//! `(SLR, FAR, frame_offset)` triples.
//!
//! The BEL name passed to the architecture table is the slice suffix
//! verbatim (`"AFF"`, `"AFF2"`, `"A6LUT"`). The logic-location collaborator
//! that builds architecture tables represents flip-flops as `<letter>Q` /
//! `<letter>Q2`; that normalization happens before the table is built, so
//! this crate never sees it.

use crate::error::LocateError;
use crate::name::{parse_ramb_name, parse_slice_name, BelKind};
use usbit_arch::{Architecture, BlockType, FrameAddress};
use usbit_tables::{ArchitectureTable, DeviceTable};

/// The fixed tile-type label used for 18-Kib BRAM lookups in the
/// architecture table; unlike CLB columns, BRAM columns carry no per-column
/// tile-type variation.
const BRAM_TILE_TYPE: &str = "BRAM";

/// The fixed BEL name used for 18-Kib BRAM lookups in the architecture
/// table (there is exactly one BRAM18 primitive per Y-offset).
const BRAM_BEL: &str = "RAMB18";

/// A single flip-flop's location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegLocation {
    /// The SLR name this resource lives in.
    pub slr: String,
    /// The frame address carrying this bit.
    pub far: FrameAddress,
    /// The bit offset within that frame.
    pub frame_offset: u32,
}

/// A 6-input LUT's 64 truth-table bit locations, in truth-table bit order
/// (index `0` is the output for all-zero inputs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LutLocation {
    /// The SLR name this resource lives in.
    pub slr: String,
    /// 64 frame addresses, one per truth-table bit.
    pub fars: Vec<FrameAddress>,
    /// 64 frame offsets, index-aligned with `fars`.
    pub frame_offsets: Vec<u32>,
}

/// An 18-Kib BRAM's memory-content and parity bit locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BramLocation {
    /// The SLR name this resource lives in.
    pub slr: String,
    /// 16384 memory-content frame addresses, ordered low-address-first.
    pub mem_fars: Vec<FrameAddress>,
    /// 16384 memory-content frame offsets, index-aligned with `mem_fars`.
    pub mem_frame_offsets: Vec<u32>,
    /// 2048 parity frame addresses.
    pub parity_fars: Vec<FrameAddress>,
    /// 2048 parity frame offsets, index-aligned with `parity_fars`.
    pub parity_frame_offsets: Vec<u32>,
}

/// The closed set of resource kinds this crate can locate, per the
/// two-level tagged union in the design notes: a slice-hosted BEL (register
/// or LUT) or a BRAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loc {
    /// A flip-flop.
    Reg(RegLocation),
    /// A 6-input LUT.
    Lut(LutLocation),
    /// An 18-Kib BRAM.
    Bram(BramLocation),
}

/// Resolves resource names against a device table and architecture table.
pub struct BitLocator<'a> {
    arch: Architecture,
    device: &'a DeviceTable,
    arch_table: &'a ArchitectureTable,
}

struct ResolvedColumn<'r> {
    slr: &'r str,
    relative_row: u32,
    column: u32,
    tile_type: &'r str,
    y_offset: u32,
}

impl<'a> BitLocator<'a> {
    /// Builds a locator over the given device and architecture tables.
    pub fn new(arch: Architecture, device: &'a DeviceTable, arch_table: &'a ArchitectureTable) -> Self {
        BitLocator {
            arch,
            device,
            arch_table,
        }
    }

    /// Dispatches a resource name to `locate_reg`, `locate_lut`, or
    /// `locate_bram` based on its shape.
    pub fn locate(&self, name: &str) -> Result<Loc, LocateError> {
        if name.starts_with("RAMB") {
            return self.locate_bram(name).map(Loc::Bram);
        }
        let parsed = parse_slice_name(name)?;
        match parsed.kind {
            BelKind::Reg => self.locate_reg(name).map(Loc::Reg),
            BelKind::Lut => self.locate_lut(name).map(Loc::Lut),
        }
    }

    /// Resolves the SLR, relative row major, column major, tile type, and
    /// Y-offset for a CLB-hosted resource at logical `(x, y)`.
    fn resolve_clb_column(&self, x: u32, y: u32) -> Result<ResolvedColumn<'_>, LocateError> {
        let n = Architecture::num_clb_per_column();
        let (slr_name, slr) = self.find_slr(y, n).ok_or_else(|| {
            LocateError::ResourceNotFound(format!("no SLR contains CLB row Y={y}"))
        })?;

        let absolute_row_major = y / n;
        let relative_row = absolute_row_major - slr.min_clock_region_row_idx;
        let row = slr.row_majors.get(&relative_row).ok_or_else(|| {
            LocateError::ResourceNotFound(format!(
                "SLR {slr_name} has no row-major layout for row {relative_row}"
            ))
        })?;
        let (column, tile_type) = row.clb_column(x).ok_or_else(|| {
            LocateError::ResourceNotFound(format!(
                "SLR {slr_name} row {relative_row} has no CLB column {x}"
            ))
        })?;

        Ok(ResolvedColumn {
            slr: slr_name,
            relative_row,
            column,
            tile_type,
            y_offset: y % n,
        })
    }

    /// Resolves the SLR, relative row major, column major, and Y-offset for
    /// an 18-Kib BRAM column at logical `(x, y)`.
    fn resolve_bram_column(&self, x: u32, y: u32) -> Result<ResolvedColumn<'_>, LocateError> {
        let n = Architecture::num_18k_bram_per_column();
        let (slr_name, slr) = self.find_slr(y, n).ok_or_else(|| {
            LocateError::ResourceNotFound(format!("no SLR contains BRAM row Y={y}"))
        })?;

        let absolute_row_major = y / n;
        let relative_row = absolute_row_major - slr.min_clock_region_row_idx;
        let row = slr.row_majors.get(&relative_row).ok_or_else(|| {
            LocateError::ResourceNotFound(format!(
                "SLR {slr_name} has no row-major layout for row {relative_row}"
            ))
        })?;
        let column = row.bram_content_column(x).ok_or_else(|| {
            LocateError::ResourceNotFound(format!(
                "SLR {slr_name} row {relative_row} has no BRAM column {x}"
            ))
        })?;

        Ok(ResolvedColumn {
            slr: slr_name,
            relative_row,
            column,
            tile_type: BRAM_TILE_TYPE,
            y_offset: y % n,
        })
    }

    /// Finds the SLR whose clock-region row range, scaled by `entities_per_col`,
    /// contains absolute Y-coordinate `y`.
    fn find_slr(
        &self,
        y: u32,
        entities_per_col: u32,
    ) -> Option<(&str, &usbit_tables::SlrRecord)> {
        self.device.slrs.iter().find_map(|(name, slr)| {
            let lo = slr.min_clock_region_row_idx * entities_per_col;
            let hi = (slr.max_clock_region_row_idx + 1) * entities_per_col - 1;
            if y >= lo && y <= hi {
                Some((name.as_str(), slr))
            } else {
                None
            }
        })
    }

    fn far_for(&self, col: &ResolvedColumn<'_>, block_type: BlockType, minor: u32) -> Result<FrameAddress, LocateError> {
        Ok(FrameAddress::from_fields(
            self.arch,
            0,
            block_type,
            col.relative_row,
            col.column,
            minor,
        )?)
    }

    /// Locates a flip-flop's `(SLR, FAR, frame_offset)`.
    pub fn locate_reg(&self, name: &str) -> Result<RegLocation, LocateError> {
        let parsed = parse_slice_name(name)?;
        if parsed.kind != BelKind::Reg {
            return Err(LocateError::InvalidResourceName(name.to_string()));
        }
        let col = self.resolve_clb_column(parsed.x, parsed.y)?;
        let (minor, frame_offset) =
            self.arch_table
                .reg_loc(col.tile_type, col.y_offset, &parsed.bel)?;
        let far = self.far_for(&col, BlockType::ClbIoClk, minor)?;

        Ok(RegLocation {
            slr: col.slr.to_string(),
            far,
            frame_offset,
        })
    }

    /// Locates a LUT's 64 `(FAR, frame_offset)` pairs, in truth-table bit
    /// order.
    pub fn locate_lut(&self, name: &str) -> Result<LutLocation, LocateError> {
        let parsed = parse_slice_name(name)?;
        if parsed.kind != BelKind::Lut {
            return Err(LocateError::InvalidResourceName(name.to_string()));
        }
        let col = self.resolve_clb_column(parsed.x, parsed.y)?;
        let pairs = self
            .arch_table
            .lut_loc(col.tile_type, col.y_offset, &parsed.bel)?;

        let mut fars = Vec::with_capacity(pairs.len());
        let mut frame_offsets = Vec::with_capacity(pairs.len());
        for &(minor, frame_offset) in pairs {
            fars.push(self.far_for(&col, BlockType::ClbIoClk, minor)?);
            frame_offsets.push(frame_offset);
        }

        Ok(LutLocation {
            slr: col.slr.to_string(),
            fars,
            frame_offsets,
        })
    }

    /// Locates an 18-Kib BRAM's memory-content and parity bit positions.
    ///
    /// Only the 18-Kib size tag is supported; any other size (e.g. a 36-Kib
    /// `RAMB36`) fails with [`LocateError::UnsupportedResource`].
    pub fn locate_bram(&self, name: &str) -> Result<BramLocation, LocateError> {
        let parsed = parse_ramb_name(name)?;
        if parsed.size != 18 {
            return Err(LocateError::UnsupportedResource(format!(
                "RAMB{} is not supported, only RAMB18",
                parsed.size
            )));
        }
        let col = self.resolve_bram_column(parsed.x, parsed.y)?;

        let mem_pairs = self
            .arch_table
            .bram_mem_loc(col.tile_type, col.y_offset, BRAM_BEL)?;
        let parity_pairs =
            self.arch_table
                .bram_mem_parity_loc(col.tile_type, col.y_offset, BRAM_BEL)?;

        let mut mem_fars = Vec::with_capacity(mem_pairs.len());
        let mut mem_frame_offsets = Vec::with_capacity(mem_pairs.len());
        for &(minor, frame_offset) in mem_pairs {
            mem_fars.push(self.far_for(&col, BlockType::BramContent, minor)?);
            mem_frame_offsets.push(frame_offset);
        }

        let mut parity_fars = Vec::with_capacity(parity_pairs.len());
        let mut parity_frame_offsets = Vec::with_capacity(parity_pairs.len());
        for &(minor, frame_offset) in parity_pairs {
            parity_fars.push(self.far_for(&col, BlockType::BramContent, minor)?);
            parity_frame_offsets.push(frame_offset);
        }

        Ok(BramLocation {
            slr: col.slr.to_string(),
            mem_fars,
            mem_frame_offsets,
            parity_fars,
            parity_frame_offsets,
        })
    }
}
