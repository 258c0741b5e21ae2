//! Hardware resource claims handed to drivers.

use crate::addr::{PhysAddr, VirtAddr};

/// A mapped MMIO region.
///
/// Produced by [`KernelServices::map_mmio`](crate::services::KernelServices::map_mmio);
/// describes where a device's register window lives in the host's address
/// space.
#[derive(Debug, Clone, Copy)]
pub struct MmioRegion {
    phys_base: PhysAddr,
    virt_base: VirtAddr,
    size: u64,
}

impl MmioRegion {
    /// Creates a new MMIO region descriptor.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `virt_base` is a live mapping of the
    /// physical region `[phys_base, phys_base + size)` and stays valid for
    /// the lifetime of the descriptor, and that no other driver claims the
    /// same region.
    #[must_use]
    pub const unsafe fn new(phys_base: PhysAddr, virt_base: VirtAddr, size: u64) -> Self {
        Self {
            phys_base,
            virt_base,
            size,
        }
    }

    /// Returns the physical base address.
    #[must_use]
    pub const fn phys_base(&self) -> PhysAddr {
        self.phys_base
    }

    /// Returns the virtual base address of the mapping.
    #[must_use]
    pub const fn virt_base(&self) -> VirtAddr {
        self.virt_base
    }

    /// Returns the region size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}
