//! PCI bus types for device matching.
//!
//! Enumeration itself lives in the host; drivers receive a slice of
//! [`PciDeviceInfo`] describing what the host found and match against it
//! with [`PciDeviceId`].

/// PCI bus/device/function address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciAddress {
    /// Bus number (0-255).
    pub bus: u8,
    /// Device number (0-31).
    pub device: u8,
    /// Function number (0-7).
    pub function: u8,
}

impl core::fmt::Display for PciAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02x}:{:02x}.{}", self.bus, self.device, self.function)
    }
}

/// Wildcard value for PCI ID matching: matches any vendor/device ID.
pub const PCI_ANY_ID: u16 = 0xFFFF;

/// PCI device ID for driver-to-device matching.
#[derive(Debug, Clone, Copy)]
pub struct PciDeviceId {
    /// Vendor ID (`PCI_ANY_ID` = wildcard).
    pub vendor: u16,
    /// Device ID (`PCI_ANY_ID` = wildcard).
    pub device: u16,
}

impl PciDeviceId {
    /// Creates an ID entry matching a specific vendor/device pair.
    #[must_use]
    pub const fn new(vendor: u16, device: u16) -> Self {
        Self { vendor, device }
    }

    /// Returns `true` if this ID entry matches the given device info.
    #[must_use]
    pub fn matches(&self, info: &PciDeviceInfo) -> bool {
        (self.vendor == PCI_ANY_ID || self.vendor == info.vendor_id)
            && (self.device == PCI_ANY_ID || self.device == info.device_id)
    }
}

/// Decoded PCI Base Address Register.
#[derive(Debug, Clone, Copy)]
pub enum PciBar {
    /// Memory-mapped BAR.
    Memory {
        /// Base physical address.
        base: u64,
        /// Size in bytes.
        size: u64,
    },
    /// I/O port BAR.
    Io {
        /// Base I/O port address.
        base: u32,
        /// Size in bytes.
        size: u32,
    },
    /// BAR slot is unused or consumed by the upper half of a 64-bit BAR.
    Unused,
}

/// Information about a discovered PCI device, as reported by the host's
/// enumerator.
#[derive(Debug, Clone, Copy)]
pub struct PciDeviceInfo {
    /// Bus/device/function address.
    pub address: PciAddress,
    /// Vendor ID.
    pub vendor_id: u16,
    /// Device ID.
    pub device_id: u16,
    /// Interrupt line (IRQ number configured by firmware).
    pub interrupt_line: u8,
    /// Base Address Registers.
    pub bars: [PciBar; 6],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_device_info(vendor: u16, device: u16) -> PciDeviceInfo {
        PciDeviceInfo {
            address: PciAddress {
                bus: 0,
                device: 3,
                function: 0,
            },
            vendor_id: vendor,
            device_id: device,
            interrupt_line: 10,
            bars: [PciBar::Unused; 6],
        }
    }

    #[test]
    fn exact_match() {
        let id = PciDeviceId::new(0xCAAC, 0x0001);
        assert!(id.matches(&make_device_info(0xCAAC, 0x0001)));
    }

    #[test]
    fn vendor_mismatch() {
        let id = PciDeviceId::new(0xCAAC, 0x0001);
        assert!(!id.matches(&make_device_info(0x8086, 0x0001)));
    }

    #[test]
    fn device_mismatch() {
        let id = PciDeviceId::new(0xCAAC, 0x0001);
        assert!(!id.matches(&make_device_info(0xCAAC, 0x0002)));
    }

    #[test]
    fn wildcard_device() {
        let id = PciDeviceId::new(0xCAAC, PCI_ANY_ID);
        assert!(id.matches(&make_device_info(0xCAAC, 0x7777)));
    }

    #[test]
    fn address_display() {
        let info = make_device_info(0xCAAC, 0x0001);
        assert_eq!(format!("{}", info.address), "00:03.0");
    }
}
