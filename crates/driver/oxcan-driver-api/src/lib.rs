//! Driver-model API for the oxcan workspace.
//!
//! This crate defines everything a CAN controller driver and its host
//! environment agree on, without either depending on the other's internals:
//!
//! - **Addresses and resources** — [`VirtAddr`], [`PhysAddr`], [`MmioRegion`].
//! - **PCI identity** — [`PciDeviceId`], [`PciDeviceInfo`] and friends, used
//!   to match a driver against devices the (external) enumerator found.
//! - **Host services** — the [`KernelServices`] trait the host implements so
//!   drivers can map registers and hook interrupt lines.
//! - **Interrupt masking** — the [`IrqMask`] scoped guard for register bursts
//!   that must not be torn by an ISR.
//! - **Logging** — leveled `klog!`-family macros with a pluggable sink.
//! - **The CAN contract** — frame, state, and error types plus the
//!   [`CanDevice`] trait consumed by the upper dispatch layer.

#![cfg_attr(not(test), no_std)]

pub mod addr;
pub mod can;
pub mod error;
pub mod irq;
pub mod log;
pub mod pci;
pub mod resource;
pub mod services;

pub use addr::{PhysAddr, VirtAddr};
pub use can::{
    CanDevice, CanError, CanPdu, CanStatistics, ControllerState, ModeTransition, PduHandle,
    TxStatus,
};
pub use error::DriverError;
pub use irq::IrqMask;
pub use pci::{PciAddress, PciBar, PciDeviceId, PciDeviceInfo};
pub use resource::MmioRegion;
pub use services::KernelServices;
