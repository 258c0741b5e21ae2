//! Driver for the QEMU `pci-ascan` virtual CAN controller.
//!
//! The adapter exposes up to five CAN buses through one memory-mapped
//! register window with a single transmit mailbox. The driver keeps a
//! per-controller state machine, routes transmit handles to their hardware
//! objects through a table built once at init, and claims the mailbox under
//! a disabled-interrupt critical section.
//!
//! Module map:
//!
//! - [`regs`] — the register window and command set.
//! - [`config`] — static, caller-supplied controller/object tables.
//! - [`hth`] — the transmit-handle routing table.
//! - [`unit`] — per-controller state machine and interrupt nesting.
//! - [`driver`] — [`AscanCan`], tying it all together.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod driver;
pub mod hth;
pub mod regs;
pub mod unit;

pub use config::{CONTROLLER_COUNT, CanConfig, ControllerConfig, HTH_COUNT, HardwareObject, ObjectKind};
pub use driver::AscanCan;
