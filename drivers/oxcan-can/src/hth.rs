//! Transmit-handle routing.
//!
//! A hardware transmit handle (HTH) names a transmit object without saying
//! which controller owns it. The driver builds this table once at init by
//! walking every configured controller's object run; transmit then resolves
//! a handle to its owning controller and object in O(1).

use oxcan_driver_api::CanError;

use crate::config::{ControllerConfig, HTH_COUNT, HardwareObject, ObjectKind};

#[derive(Debug, Clone, Copy)]
struct HthEntry {
    controller: u8,
    hoh: &'static HardwareObject,
}

/// Fixed-size HTH → (controller, hardware object) table.
#[derive(Debug)]
pub struct HthMap {
    entries: [Option<HthEntry>; HTH_COUNT],
}

impl HthMap {
    /// An empty table; every lookup fails until controllers are recorded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [None; HTH_COUNT],
        }
    }

    /// Drops all recorded routes.
    pub fn clear(&mut self) {
        self.entries = [None; HTH_COUNT];
    }

    /// Records every transmit object in the controller's run, keyed by
    /// object id.
    pub fn record_controller(
        &mut self,
        controller: u8,
        config: &'static ControllerConfig,
    ) -> Result<(), CanError> {
        for hoh in config.object_run() {
            if hoh.kind != ObjectKind::Transmit {
                continue;
            }
            let Some(slot) = self.entries.get_mut(hoh.object_id as usize) else {
                return Err(CanError::ParamHandle);
            };
            *slot = Some(HthEntry { controller, hoh });
        }
        Ok(())
    }

    /// Resolves a transmit handle to its owning controller and object.
    ///
    /// Fails if the handle is out of range or unrecorded, if the recorded
    /// object's id disagrees with the handle, or if the object is not a
    /// transmit object.
    pub fn resolve(&self, hth: u8) -> Result<(u8, &'static HardwareObject), CanError> {
        let entry = self
            .entries
            .get(hth as usize)
            .copied()
            .flatten()
            .ok_or(CanError::ParamHandle)?;
        if entry.hoh.object_id != hth || entry.hoh.kind != ObjectKind::Transmit {
            return Err(CanError::ParamHandle);
        }
        Ok((entry.controller, entry.hoh))
    }
}

impl Default for HthMap {
    fn default() -> Self {
        Self::new()
    }
}
