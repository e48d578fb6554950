//! Architecture table schema: per-tile-type bit encodings.
//!
//! The raw JSON shape nests BEL name inside Y-offset inside loc-kind inside
//! tile type, with the `minor` and `frame_ofst` arrays carried in separate
//! parallel maps. Rather than expose that shape directly this module zips
//! the two arrays together once, at load time, into a flat read-only map so
//! every other crate only ever sees `&[(minor, frame_ofst)]` slices.

use crate::error::TableError;
use serde::Deserialize;
use std::collections::HashMap;

/// Expected fan-out of a register (flip-flop) bit.
pub const REG_BITS: usize = 1;
/// Expected fan-out of a LUT's truth table.
pub const LUT_BITS: usize = 64;
/// Expected fan-out of a BRAM's memory content.
pub const BRAM_MEM_BITS: usize = 16384;
/// Expected fan-out of a BRAM's parity content.
pub const BRAM_PARITY_BITS: usize = 2048;

#[derive(Debug, Deserialize)]
struct RawArrayBels {
    minor: HashMap<String, Vec<u32>>,
    frame_ofst: HashMap<String, Vec<u32>>,
}

#[derive(Debug, Deserialize)]
struct RawScalarBels {
    minor: HashMap<String, u32>,
    frame_ofst: HashMap<String, u32>,
}

#[derive(Debug, Deserialize)]
struct RawYOfstMap<T> {
    #[serde(rename = "Y_ofst")]
    y_ofst: HashMap<String, T>,
}

#[derive(Debug, Deserialize)]
struct RawTileEntry {
    #[serde(rename = "RegLoc", default)]
    reg_loc: Option<RawYOfstMap<RawScalarBels>>,
    #[serde(rename = "LutLoc", default)]
    lut_loc: Option<RawYOfstMap<RawArrayBels>>,
    #[serde(rename = "BramMemLoc", default)]
    bram_mem_loc: Option<RawYOfstMap<RawArrayBels>>,
    #[serde(rename = "BramMemParityLoc", default)]
    bram_mem_parity_loc: Option<RawYOfstMap<RawArrayBels>>,
}

/// Raw, directly-deserialized architecture table, keyed by tile type.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawArchitectureTable(HashMap<String, RawTileEntry>);

type ScalarLocMap = HashMap<u32, HashMap<String, (u32, u32)>>;
type ArrayLocMap = HashMap<u32, HashMap<String, Vec<(u32, u32)>>>;

#[derive(Debug, Default)]
struct TileEntry {
    reg: ScalarLocMap,
    lut: ArrayLocMap,
    bram_mem: ArrayLocMap,
    bram_mem_parity: ArrayLocMap,
}

/// Flat, read-only architecture table: for a tile type, Y-offset, and BEL
/// name, the `(minor, frame_offset)` pairs making up that BEL's bits.
#[derive(Debug, Default)]
pub struct ArchitectureTable {
    tiles: HashMap<String, TileEntry>,
}

fn parse_y_ofst(raw: &str) -> Option<u32> {
    raw.parse().ok()
}

fn zip_array_bels(
    tile_type: &str,
    bels: RawArrayBels,
    expected_len: usize,
) -> Result<HashMap<String, Vec<(u32, u32)>>, TableError> {
    let mut out = HashMap::with_capacity(bels.minor.len());
    for (bel, minors) in bels.minor {
        let ofsts = bels.frame_ofst.get(&bel).cloned().unwrap_or_default();
        if minors.len() != expected_len || ofsts.len() != expected_len {
            return Err(TableError::WrongOffsetCount {
                tile_type: tile_type.to_string(),
                bel: bel.clone(),
                expected: expected_len,
                found: minors.len().max(ofsts.len()),
            });
        }
        let pairs = minors.into_iter().zip(ofsts).collect();
        out.insert(bel, pairs);
    }
    Ok(out)
}

fn zip_array_loc(
    tile_type: &str,
    raw: Option<RawYOfstMap<RawArrayBels>>,
    expected_len: usize,
) -> Result<ArrayLocMap, TableError> {
    let mut out = HashMap::new();
    let Some(raw) = raw else { return Ok(out) };
    for (y_str, bels) in raw.y_ofst {
        let y = parse_y_ofst(&y_str).ok_or_else(|| TableError::MissingYOfst {
            tile_type: tile_type.to_string(),
            y_ofst: 0,
        })?;
        out.insert(y, zip_array_bels(tile_type, bels, expected_len)?);
    }
    Ok(out)
}

fn zip_scalar_loc(
    tile_type: &str,
    raw: Option<RawYOfstMap<RawScalarBels>>,
) -> Result<ScalarLocMap, TableError> {
    let mut out = HashMap::new();
    let Some(raw) = raw else { return Ok(out) };
    for (y_str, bels) in raw.y_ofst {
        let y = parse_y_ofst(&y_str).ok_or_else(|| TableError::MissingYOfst {
            tile_type: tile_type.to_string(),
            y_ofst: 0,
        })?;
        let mut per_bel = HashMap::with_capacity(bels.minor.len());
        for (bel, minor) in bels.minor {
            let ofst = *bels.frame_ofst.get(&bel).unwrap_or(&0);
            per_bel.insert(bel, (minor, ofst));
        }
        out.insert(y, per_bel);
    }
    Ok(out)
}

impl ArchitectureTable {
    /// Parses an architecture table from its JSON text representation.
    pub fn from_json(text: &str) -> Result<Self, TableError> {
        let raw: RawArchitectureTable =
            serde_json::from_str(text).map_err(TableError::InvalidJson)?;
        Self::from_raw(raw)
    }

    pub(crate) fn from_raw(raw: RawArchitectureTable) -> Result<Self, TableError> {
        let mut tiles = HashMap::with_capacity(raw.0.len());
        for (tile_type, entry) in raw.0 {
            let built = TileEntry {
                reg: zip_scalar_loc(&tile_type, entry.reg_loc)?,
                lut: zip_array_loc(&tile_type, entry.lut_loc, LUT_BITS)?,
                bram_mem: zip_array_loc(&tile_type, entry.bram_mem_loc, BRAM_MEM_BITS)?,
                bram_mem_parity: zip_array_loc(
                    &tile_type,
                    entry.bram_mem_parity_loc,
                    BRAM_PARITY_BITS,
                )?,
            };
            tiles.insert(tile_type, built);
        }
        Ok(ArchitectureTable { tiles })
    }

    fn tile(&self, tile_type: &str) -> Result<&TileEntry, TableError> {
        self.tiles
            .get(tile_type)
            .ok_or_else(|| TableError::MissingTileType(tile_type.to_string()))
    }

    /// Looks up a register (flip-flop) BEL's single `(minor, frame_offset)`.
    pub fn reg_loc(&self, tile_type: &str, y_ofst: u32, bel: &str) -> Result<(u32, u32), TableError> {
        let tile = self.tile(tile_type)?;
        let by_bel = tile.reg.get(&y_ofst).ok_or_else(|| TableError::MissingYOfst {
            tile_type: tile_type.to_string(),
            y_ofst,
        })?;
        by_bel.get(bel).copied().ok_or_else(|| TableError::MissingBel {
            tile_type: tile_type.to_string(),
            y_ofst,
            bel: bel.to_string(),
        })
    }

    /// Looks up a LUT BEL's 64 `(minor, frame_offset)` pairs, in truth-table
    /// bit order (index 0 is the truth-table entry for all-zero inputs).
    pub fn lut_loc(&self, tile_type: &str, y_ofst: u32, bel: &str) -> Result<&[(u32, u32)], TableError> {
        let tile = self.tile(tile_type)?;
        let by_bel = tile.lut.get(&y_ofst).ok_or_else(|| TableError::MissingYOfst {
            tile_type: tile_type.to_string(),
            y_ofst,
        })?;
        by_bel
            .get(bel)
            .map(Vec::as_slice)
            .ok_or_else(|| TableError::MissingBel {
                tile_type: tile_type.to_string(),
                y_ofst,
                bel: bel.to_string(),
            })
    }

    /// Looks up an 18-Kib BRAM's 16384 memory-content `(minor, frame_offset)`
    /// pairs, ordered low-address-first.
    pub fn bram_mem_loc(
        &self,
        tile_type: &str,
        y_ofst: u32,
        bel: &str,
    ) -> Result<&[(u32, u32)], TableError> {
        let tile = self.tile(tile_type)?;
        let by_bel = tile.bram_mem.get(&y_ofst).ok_or_else(|| TableError::MissingYOfst {
            tile_type: tile_type.to_string(),
            y_ofst,
        })?;
        by_bel
            .get(bel)
            .map(Vec::as_slice)
            .ok_or_else(|| TableError::MissingBel {
                tile_type: tile_type.to_string(),
                y_ofst,
                bel: bel.to_string(),
            })
    }

    /// Looks up an 18-Kib BRAM's 2048 parity `(minor, frame_offset)` pairs.
    pub fn bram_mem_parity_loc(
        &self,
        tile_type: &str,
        y_ofst: u32,
        bel: &str,
    ) -> Result<&[(u32, u32)], TableError> {
        let tile = self.tile(tile_type)?;
        let by_bel =
            tile.bram_mem_parity
                .get(&y_ofst)
                .ok_or_else(|| TableError::MissingYOfst {
                    tile_type: tile_type.to_string(),
                    y_ofst,
                })?;
        by_bel
            .get(bel)
            .map(Vec::as_slice)
            .ok_or_else(|| TableError::MissingBel {
                tile_type: tile_type.to_string(),
                y_ofst,
                bel: bel.to_string(),
            })
    }
}
