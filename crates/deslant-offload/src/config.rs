use serde::{Deserialize, Serialize};

use deslant_engine::{InputError, Optimizer, SearchParams, ShearCandidates};

/// Construction contract of an [`OffloadEngine`](crate::OffloadEngine).
///
/// Device buffers are sized once for `width x height` and reused for every
/// image; larger images are down-scaled to fit, smaller ones zero-padded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadConfig {
    pub width: usize,
    pub height: usize,
    /// Invocations per workgroup of the column kernel. Power of two.
    pub workgroup_size: u32,
    pub search: SearchParams,
    /// Accept a CPU (software) adapter when no GPU is present.
    pub allow_software_adapter: bool,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 128,
            workgroup_size: 64,
            search: SearchParams::default(),
            allow_software_adapter: false,
        }
    }
}

const MAX_WORKGROUP_SIZE: u32 = 256;
const MAX_CANDIDATES: usize = u16::MAX as usize;

impl OffloadConfig {
    pub fn with_resolution(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.width == 0 || self.height == 0 {
            return Err(InputError::Config(format!(
                "offload resolution must be non-zero (got {}x{})",
                self.width, self.height
            )));
        }
        if !self.workgroup_size.is_power_of_two() || self.workgroup_size > MAX_WORKGROUP_SIZE {
            return Err(InputError::Config(format!(
                "workgroup size must be a power of two no larger than {MAX_WORKGROUP_SIZE} (got {})",
                self.workgroup_size
            )));
        }
        self.search.validate()?;
        if self.search.optimizer != Optimizer::Grid {
            return Err(InputError::UnsupportedOptimizer {
                engine: "offload",
                optimizer: self.search.optimizer.name(),
            });
        }
        if self.search.steps > MAX_CANDIDATES {
            return Err(InputError::CandidateCount {
                count: self.search.steps,
            });
        }
        // A column scores at most H^2 and at most W*H foreground pixels survive
        // the shear, so one candidate totals at most W*H^2 on the device.
        let bound = (self.width as u64)
            .checked_mul(self.height as u64)
            .and_then(|v| v.checked_mul(self.height as u64));
        if !matches!(bound, Some(b) if b <= u32::MAX as u64) {
            return Err(InputError::Config(format!(
                "resolution {}x{} can overflow the 32-bit device accumulators",
                self.width, self.height
            )));
        }
        Ok(())
    }

    pub fn candidates(&self) -> Result<ShearCandidates, InputError> {
        self.search.candidates()
    }

    /// Columns the column kernel covers: the widest sheared canvas rounded up
    /// to whole workgroups.
    pub fn canvas_width(&self, candidates: &ShearCandidates) -> usize {
        let extra = (candidates.max_abs() * self.height as f32).ceil() as usize;
        let wg = self.workgroup_size as usize;
        (self.width + extra).div_ceil(wg) * wg
    }
}
