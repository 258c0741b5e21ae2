//! Register interface of the `pci-ascan` adapter.
//!
//! The device presents a 32-byte window of 32-bit write-only registers in
//! BAR 1. All controllers share the window; the `busid` register selects
//! which bus a command applies to. Opening a channel and sending a frame
//! are multi-register sequences, so callers mask interrupts around them.

use oxcan_driver_api::VirtAddr;
use oxcan_mmio::register_block;

register_block! {
    /// The adapter's register window.
    pub AscanRegs {
        /// Bus-name latch; takes the backend name one byte per write.
        [0x00; u32; wo] bus_name,
        /// Bus (controller) index a following command applies to.
        [0x04; u32; wo] busid,
        /// Port index; mirrors the bus index on this device.
        [0x08; u32; wo] port,
        /// Frame identifier of the mailbox frame.
        [0x0C; u32; wo] canid,
        /// Payload length of the mailbox frame, `0..=8`.
        [0x10; u32; wo] candlc,
        /// Payload bytes 0..4, packed little-endian.
        [0x14; u32; wo] candl,
        /// Payload bytes 4..8, packed little-endian.
        [0x18; u32; wo] candh,
        /// Command register; writing executes the command immediately.
        [0x1C; u32; wo] cmd,
    }
}

/// Command: reset the device state and the bus-name latch.
pub const CMD_RESET: u32 = 0;
/// Command: open the channel named by the latch on the selected bus.
pub const CMD_OPEN: u32 = 1;
/// Command: send the frame currently latched in the mailbox registers.
pub const CMD_TX: u32 = 2;

/// Backend name written byte-by-byte into the latch before `CMD_OPEN`.
pub const BUS_NAME: &str = "socket";

/// Size of the register window in bytes.
pub const REG_WINDOW_SIZE: u64 = 0x20;

/// PCI vendor id of the adapter.
pub const ASCAN_VENDOR_ID: u16 = 0xCAAC;
/// PCI device id of the adapter.
pub const ASCAN_DEVICE_ID: u16 = 0x0001;
