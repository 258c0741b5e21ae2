//! Per-controller bookkeeping.
//!
//! Each controller carries an operating state, an interrupt-disable
//! nesting counter, and the single-mailbox pending-transmit marker. The
//! state machine here is pure bookkeeping; the driver decides what to do
//! with the hardware on each transition.

use oxcan_driver_api::{CanError, ControllerState, ModeTransition, PduHandle};

/// Mutable record for one controller.
#[derive(Debug, Clone, Copy)]
pub struct CanUnit {
    state: ControllerState,
    lock_cnt: u8,
    pending: Option<PduHandle>,
}

impl CanUnit {
    /// A unit that has never been initialized.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ControllerState::Uninit,
            lock_cnt: 0,
            pending: None,
        }
    }

    /// Current operating state.
    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Whether the controller has left [`ControllerState::Uninit`].
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state != ControllerState::Uninit
    }

    /// Resets the unit to the just-initialized baseline: stopped, no
    /// interrupt nesting, empty mailbox.
    pub fn reset(&mut self) {
        self.state = ControllerState::Stopped;
        self.lock_cnt = 0;
        self.pending = None;
    }

    /// Applies a requested mode transition.
    ///
    /// `Start` and `Stop` are accepted from any initialized state;
    /// `Sleep` only from `Stopped`, `Wakeup` only from `Sleep`. A rejected
    /// request leaves the state unchanged.
    pub fn request(&mut self, transition: ModeTransition) -> Result<(), CanError> {
        match transition {
            ModeTransition::Start => {
                self.state = ControllerState::Started;
                if self.lock_cnt == 0 {
                    // Counter already at rest; going on-line re-arms the
                    // interrupt path (no-op at the counter level).
                    self.enable_interrupts();
                }
                Ok(())
            }
            ModeTransition::Wakeup => {
                if self.state != ControllerState::Sleep {
                    return Err(CanError::Transition);
                }
                self.state = ControllerState::Stopped;
                Ok(())
            }
            ModeTransition::Sleep => {
                if self.state != ControllerState::Stopped {
                    return Err(CanError::Transition);
                }
                self.state = ControllerState::Sleep;
                Ok(())
            }
            ModeTransition::Stop => {
                self.state = ControllerState::Stopped;
                Ok(())
            }
        }
    }

    /// Increments the interrupt-disable nesting counter.
    pub fn disable_interrupts(&mut self) {
        self.lock_cnt = self.lock_cnt.saturating_add(1);
    }

    /// Decrements the nesting counter; the last decrement pins it at 0 and
    /// further calls are no-ops.
    pub fn enable_interrupts(&mut self) {
        if self.lock_cnt > 1 {
            self.lock_cnt -= 1;
        } else {
            self.lock_cnt = 0;
        }
    }

    /// Current interrupt-disable nesting depth.
    #[must_use]
    pub fn irq_nesting(&self) -> u8 {
        self.lock_cnt
    }

    /// The handle of the frame occupying the mailbox, if any.
    #[must_use]
    pub fn pending(&self) -> Option<PduHandle> {
        self.pending
    }

    /// Marks the mailbox occupied by `handle`.
    pub fn set_pending(&mut self, handle: PduHandle) {
        self.pending = Some(handle);
    }

    /// Clears and returns the pending-transmit marker.
    pub fn take_pending(&mut self) -> Option<PduHandle> {
        self.pending.take()
    }
}

impl Default for CanUnit {
    fn default() -> Self {
        Self::new()
    }
}
