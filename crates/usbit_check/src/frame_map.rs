//! `(SLR, FAR) -> ConfigFrame` lookup, built once per bitstream and shared
//! by every resource check.

use crate::error::CheckError;
use std::collections::HashMap;
use usbit_arch::FrameAddress;
use usbit_bitstream::{ConfigFrame, IndividualConfigurationArrays};
use usbit_tables::DeviceTable;

/// Maps every `(SLR name, FAR)` pair written in a bitstream to the single
/// [`ConfigFrame`] that wrote it.
///
/// Built from [`IndividualConfigurationArrays`], so it asserts exactly one
/// write per FAR as it goes (§4.6 step 1): a second write to the same
/// `(slr, far)` is an [`CheckError::IntegrityViolation`], not a silent
/// overwrite.
pub struct FrameMap<'a> {
    by_slr_far: HashMap<(String, FrameAddress), ConfigFrame<'a>>,
}

impl<'a> FrameMap<'a> {
    /// Builds a frame map from `arrays`, resolving each IDCODE to its SLR
    /// name via `device`.
    pub fn build(
        arrays: &IndividualConfigurationArrays<'a>,
        device: &DeviceTable,
    ) -> Result<Self, CheckError> {
        let mut by_slr_far = HashMap::new();
        for idcode in arrays.idcodes() {
            let (slr_name, _) = device.slr_for_idcode(idcode).ok_or_else(|| {
                CheckError::IntegrityViolation {
                    detail: format!("no SLR in the device table has IDCODE {idcode:#010x}"),
                }
            })?;
            for frame in arrays.frames_for(idcode).unwrap_or(&[]) {
                let key = (slr_name.to_string(), frame.far);
                if by_slr_far.insert(key, *frame).is_some() {
                    return Err(CheckError::IntegrityViolation {
                        detail: format!(
                            "duplicate write to FAR {} in SLR {slr_name}",
                            frame.far.to_hex()
                        ),
                    });
                }
            }
        }
        Ok(FrameMap { by_slr_far })
    }

    /// Looks up the frame written to `(slr, far)`, if any.
    pub fn get(&self, slr: &str, far: &FrameAddress) -> Option<&ConfigFrame<'a>> {
        self.by_slr_far.get(&(slr.to_string(), *far))
    }
}
