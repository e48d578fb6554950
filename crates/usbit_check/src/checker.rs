//! State checker: compares a parsed bitstream's configuration bits against
//! an expected-values record for LUTs, flip-flops, and BRAMs.

use crate::error::CheckError;
use crate::frame_map::FrameMap;
use usbit_bitstream::ConfigFrame;
use usbit_locate::{BitLocator, Bram, Lut};

/// One BRAM's expected memory and parity content, as `INIT_XX`/`INITP_XX`
/// fragment maps (the shape they appear in as Verilog/VHDL attributes).
#[derive(Debug, Clone, Default)]
pub struct BramExpectation {
    /// The `RAMB18_X*Y*` resource name.
    pub resource: String,
    /// `(key, hex value)` pairs, e.g. `("INIT_00", "0x...")`.
    pub mem_fragments: Vec<(String, String)>,
    /// `(key, hex value)` pairs, e.g. `("INITP_00", "0x...")`.
    pub parity_fragments: Vec<(String, String)>,
}

/// Expected values for every resource to check, keyed by resource name.
#[derive(Debug, Clone, Default)]
pub struct ExpectedValues {
    /// `(SLICE_X*Y*/<letter>6LUT, expected INIT hex)` pairs.
    pub luts: Vec<(String, String)>,
    /// `(SLICE_X*Y*/<letter>FF[2], expected bit)` pairs.
    pub ffs: Vec<(String, bool)>,
    /// Expected BRAM contents.
    pub brams: Vec<BramExpectation>,
}

/// The outcome of [`StateChecker::check_all`]: pass/fail plus, on failure,
/// a diagnostic describing the first mismatch encountered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// `true` iff every expectation matched.
    pub passed: bool,
    /// The first mismatch's diagnostic message, if any.
    pub diagnostic: Option<String>,
}

/// Checks a bitstream's configuration bits against expected resource
/// values, via a bit locator and a pre-built frame map.
pub struct StateChecker<'t, 'f> {
    locator: &'t BitLocator<'t>,
    frames: FrameMap<'f>,
}

impl<'t, 'f> StateChecker<'t, 'f> {
    /// Builds a checker over `locator`'s tables and `frames`' configuration
    /// writes.
    pub fn new(locator: &'t BitLocator<'t>, frames: FrameMap<'f>) -> Self {
        StateChecker { locator, frames }
    }

    fn frame_for(&self, resource: &str, slr: &str, far: &usbit_arch::FrameAddress) -> Result<&ConfigFrame<'f>, CheckError> {
        self.frames.get(slr, far).ok_or_else(|| CheckError::IntegrityViolation {
            detail: format!(
                "{resource}: no configuration write found for FAR {} in SLR {slr}",
                far.to_hex()
            ),
        })
    }

    /// Checks one LUT's 64-bit truth table against `expected_hex`
    /// (§4.6 step 2).
    pub fn check_lut(&self, resource: &str, expected_hex: &str) -> Result<(), CheckError> {
        let loc = self.locator.locate_lut(resource)?;
        let mut observed = Lut::zero();
        for (i, (far, &offset)) in loc.fars.iter().zip(&loc.frame_offsets).enumerate() {
            let frame = self.frame_for(resource, &loc.slr, far)?;
            let bit = frame.bit(offset as usize)?;
            observed.set_bit(i, bit);
        }
        let expected = Lut::from_hex_str(expected_hex).ok_or_else(|| CheckError::IntegrityViolation {
            detail: format!("{resource}: {expected_hex:?} is not a valid LUT INIT"),
        })?;
        if observed != expected {
            return Err(CheckError::ExpectedMismatch {
                location: resource.to_string(),
                expected: expected.to_hex(),
                observed: observed.to_hex(),
            });
        }
        Ok(())
    }

    /// Checks one flip-flop's captured state against `expected_bit`,
    /// inverting the raw bit read from the frame first (§4.6 step 3): this
    /// inversion is specific to CLB register capture and does not apply to
    /// block RAM, distributed RAM, or SRL captures.
    pub fn check_ff(&self, resource: &str, expected_bit: bool) -> Result<(), CheckError> {
        let loc = self.locator.locate_reg(resource)?;
        let frame = self.frame_for(resource, &loc.slr, &loc.far)?;
        let raw = frame.bit(loc.frame_offset as usize)?;
        let observed = !raw;
        if observed != expected_bit {
            return Err(CheckError::ExpectedMismatch {
                location: resource.to_string(),
                expected: expected_bit.to_string(),
                observed: observed.to_string(),
            });
        }
        Ok(())
    }

    /// Checks one BRAM's memory content and parity against reassembled
    /// `INIT_XX`/`INITP_XX` fragments (§4.6 step 4).
    pub fn check_bram(&self, expectation: &BramExpectation) -> Result<(), CheckError> {
        let resource = expectation.resource.as_str();
        let loc = self.locator.locate_bram(resource)?;

        let mut observed_mem = Vec::with_capacity(loc.mem_fars.len());
        for (far, &offset) in loc.mem_fars.iter().zip(&loc.mem_frame_offsets) {
            let frame = self.frame_for(resource, &loc.slr, far)?;
            observed_mem.push(frame.bit(offset as usize)?);
        }
        let mut observed_parity = Vec::with_capacity(loc.parity_fars.len());
        for (far, &offset) in loc.parity_fars.iter().zip(&loc.parity_frame_offsets) {
            let frame = self.frame_for(resource, &loc.slr, far)?;
            observed_parity.push(frame.bit(offset as usize)?);
        }
        let observed = Bram::from_bits(observed_mem, observed_parity).ok_or_else(|| {
            CheckError::IntegrityViolation {
                detail: format!("{resource}: located bit count did not match a full BRAM"),
            }
        })?;

        let fragment_pairs = |fragments: &[(String, String)]| {
            fragments.iter().map(|(k, v)| (k.as_str(), v.as_str()))
        };
        let expected_mem = Bram::mem_from_init_fragments(fragment_pairs(&expectation.mem_fragments))
            .ok_or_else(|| CheckError::IntegrityViolation {
                detail: format!("{resource}: malformed INIT_XX fragments"),
            })?;
        let expected_parity =
            Bram::parity_from_init_fragments(fragment_pairs(&expectation.parity_fragments))
                .ok_or_else(|| CheckError::IntegrityViolation {
                    detail: format!("{resource}: malformed INITP_XX fragments"),
                })?;
        let expected = Bram::from_bits(expected_mem, expected_parity).expect("lengths validated above");

        if observed.mem_to_hex() != expected.mem_to_hex() {
            return Err(CheckError::ExpectedMismatch {
                location: format!("{resource} (memory)"),
                expected: expected.mem_to_hex(),
                observed: observed.mem_to_hex(),
            });
        }
        if observed.parity_to_hex() != expected.parity_to_hex() {
            return Err(CheckError::ExpectedMismatch {
                location: format!("{resource} (parity)"),
                expected: expected.parity_to_hex(),
                observed: observed.parity_to_hex(),
            });
        }
        Ok(())
    }

    /// Runs every expectation in order, stopping and returning the first
    /// [`CheckError::ExpectedMismatch`] (or other failure) encountered, for
    /// callers that prefer `?`-propagation over a [`CheckReport`].
    pub fn check_all_strict(&self, expected: &ExpectedValues) -> Result<(), CheckError> {
        for (resource, hex) in &expected.luts {
            self.check_lut(resource, hex)?;
        }
        for (resource, bit) in &expected.ffs {
            self.check_ff(resource, *bit)?;
        }
        for bram in &expected.brams {
            self.check_bram(bram)?;
        }
        Ok(())
    }

    /// Runs every expectation, returning pass/fail with a diagnostic for
    /// the first mismatch (§4.6 step 5) instead of propagating an error.
    pub fn check_all(&self, expected: &ExpectedValues) -> CheckReport {
        match self.check_all_strict(expected) {
            Ok(()) => CheckReport {
                passed: true,
                diagnostic: None,
            },
            Err(err) => CheckReport {
                passed: false,
                diagnostic: Some(err.to_string()),
            },
        }
    }
}
