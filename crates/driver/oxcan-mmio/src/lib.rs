//! Typed MMIO register block abstractions.
//!
//! Re-exports the [`register_block!`] macro from `oxcan-mmio-macros`. The
//! macro expands a declarative register layout into a struct whose volatile
//! accessors are all safe; the single `unsafe` point is the constructor,
//! which asserts that the base address really is a mapped register block.
//!
//! # Example
//!
//! ```ignore
//! use oxcan_mmio::register_block;
//!
//! register_block! {
//!     /// Virtual CAN adapter registers.
//!     pub AscanRegs {
//!         /// Target bus index.
//!         [0x04; u32; wo] busid,
//!         /// Command register.
//!         [0x1C; u32; wo] cmd,
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]

pub use oxcan_mmio_macros::register_block;
