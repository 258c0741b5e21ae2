//! Host service contracts for drivers.
//!
//! Drivers use [`KernelServices`] to reach host infrastructure (interrupt
//! routing, MMIO mapping, PCI plumbing) without depending on the host
//! directly. The host implements the trait once and passes it to every
//! driver at init time; tests substitute a fake backed by plain memory.

use crate::error::DriverError;
use crate::pci::PciAddress;
use crate::resource::MmioRegion;

/// Trait providing host services to drivers.
pub trait KernelServices: Send + Sync {
    /// Registers an interrupt handler for the given line.
    ///
    /// The handler is invoked with the line number on every interrupt from
    /// the device until the driver unregisters or the process ends.
    fn register_irq_handler(&self, line: u8, handler: fn(u8)) -> Result<(), DriverError>;

    /// Maps a physical MMIO region into the driver's address space.
    fn map_mmio(&self, phys_base: u64, size: u64) -> Result<MmioRegion, DriverError>;

    /// Enables the device's memory/IO decoding and bus access.
    ///
    /// Must be called before touching any BAR-mapped register.
    fn enable_pci_resources(&self, address: PciAddress) -> Result<(), DriverError>;
}
