//! The CAN controller contract.
//!
//! Types exchanged between a CAN controller driver and the dispatch layer
//! above it: outgoing frames, controller operating states, the mode
//! transitions a caller may request, and the error taxonomy every
//! operation reports from. The [`CanDevice`] trait collects the
//! operations available once a driver is initialized.

use core::fmt;

/// Maximum classic-CAN payload length in bytes.
pub const MAX_DLC: usize = 8;

/// Opaque caller-supplied handle stored with a pending frame and returned
/// on transmit confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduHandle(pub u16);

/// An outgoing CAN frame.
#[derive(Debug, Clone, Copy)]
pub struct CanPdu<'a> {
    /// Frame identifier.
    pub id: u32,
    /// Payload, at most [`MAX_DLC`] bytes.
    pub data: &'a [u8],
    /// Confirmation handle reported back when the device finishes sending.
    pub handle: PduHandle,
}

/// Per-controller operating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Controller has not been initialized.
    Uninit,
    /// Initialized but offline; no traffic flows.
    Stopped,
    /// On-line; frames may be transmitted.
    Started,
    /// Low-power state; only a wakeup may leave it.
    Sleep,
}

/// A caller-requested controller mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    /// Go on-line (allowed from any initialized state).
    Start,
    /// Leave [`ControllerState::Sleep`] for `Stopped`.
    Wakeup,
    /// Enter [`ControllerState::Sleep`] from `Stopped`.
    Sleep,
    /// Go offline (allowed from any initialized state).
    Stop,
}

/// Outcome of a transmit call that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// The frame was written to the mailbox and the send command issued.
    Accepted,
    /// The mailbox still holds an unconfirmed frame; retry after the
    /// pending confirmation arrives. Not an error.
    Busy,
}

/// CAN driver errors, reported to the caller alongside a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanError {
    /// Operation invoked before the driver or controller reached the
    /// required state.
    Uninit,
    /// Requested state change violates the transition table.
    Transition,
    /// Payload longer than [`MAX_DLC`] bytes.
    ParamDlc,
    /// Controller id out of range or not configured.
    ParamController,
    /// Transmit handle out of range, inconsistent with its table entry,
    /// or not a transmit object.
    ParamHandle,
    /// No matching backing device was found at init; the driver is inert.
    DeviceNotFound,
}

impl fmt::Display for CanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninit => f.write_str("driver or controller not initialized"),
            Self::Transition => f.write_str("invalid state transition"),
            Self::ParamDlc => f.write_str("payload length exceeds 8 bytes"),
            Self::ParamController => f.write_str("controller id out of range"),
            Self::ParamHandle => f.write_str("invalid transmit handle"),
            Self::DeviceNotFound => f.write_str("no matching CAN device found"),
        }
    }
}

/// Per-controller traffic counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CanStatistics {
    /// Frames transmitted and confirmed.
    pub tx_success: u32,
    /// Frames received.
    pub rx_success: u32,
    /// Transmit errors observed.
    pub tx_errors: u32,
    /// Receive errors observed.
    pub rx_errors: u32,
    /// Bus-off events observed.
    pub bus_off: u32,
}

/// Operations a CAN controller driver exposes once initialized.
///
/// Initialization itself is driver-specific (it needs the driver's own
/// configuration types) and stays out of this trait; everything the upper
/// dispatch layer calls afterwards goes through here.
pub trait CanDevice {
    /// Requests a controller mode change per the transition table.
    fn set_controller_mode(
        &mut self,
        controller: u8,
        transition: ModeTransition,
    ) -> Result<(), CanError>;

    /// Validates and transmits a frame through the hardware transmit
    /// handle `hth`.
    fn transmit(&mut self, hth: u8, pdu: &CanPdu<'_>) -> Result<TxStatus, CanError>;

    /// Increments the controller's interrupt-disable nesting counter.
    ///
    /// Only the 0 → 1 edge masks the hardware; deeper calls just nest.
    fn disable_controller_interrupts(&mut self, controller: u8) -> Result<(), CanError>;

    /// Decrements the nesting counter; the 1 → 0 edge unmasks the hardware.
    /// A call with the counter already at 0 is a no-op.
    fn enable_controller_interrupts(&mut self, controller: u8) -> Result<(), CanError>;

    /// Clears and returns the controller's pending-transmit marker.
    ///
    /// Called by the interrupt path when the device confirms a send; the
    /// returned handle identifies the confirmed frame to the caller.
    fn confirm_transmission(&mut self, controller: u8) -> Option<PduHandle>;

    /// Wakeup-source poll. The virtual device never wakes anyone.
    fn check_wakeup(&mut self, _controller: u8) {}

    /// Periodic transmit housekeeping; nothing to do for this device.
    fn main_function_write(&mut self) {}

    /// Periodic receive housekeeping; nothing to do for this device.
    fn main_function_read(&mut self) {}

    /// Periodic bus-off polling; nothing to do for this device.
    fn main_function_bus_off(&mut self) {}

    /// Periodic wakeup polling; nothing to do for this device.
    fn main_function_wakeup(&mut self) {}

    /// Periodic error polling; nothing to do for this device.
    fn main_function_error(&mut self) {}

    /// Returns the controller's traffic counters.
    fn statistics(&self, controller: u8) -> Result<CanStatistics, CanError>;
}
