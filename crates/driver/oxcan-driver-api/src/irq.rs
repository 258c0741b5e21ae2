//! CPU interrupt masking.
//!
//! Register bursts that must reach the device untorn (the open-channel
//! sequence, the transmit burst) run with maskable interrupts disabled.
//! [`IrqMask`] is a scoped guard: construction disables interrupts, drop
//! restores whatever the mask was before — including on early returns out
//! of the critical section.

/// Scoped interrupt-disable guard.
///
/// ```ignore
/// let _irq = IrqMask::save();
/// // ... register burst, no ISR can interleave ...
/// // prior mask restored when `_irq` drops
/// ```
pub struct IrqMask {
    was_enabled: bool,
}

impl IrqMask {
    /// Disables maskable interrupts, remembering the prior state.
    #[must_use]
    pub fn save() -> Self {
        let was_enabled = hw::are_enabled();
        if was_enabled {
            hw::disable();
        }
        Self { was_enabled }
    }
}

impl Drop for IrqMask {
    fn drop(&mut self) {
        if self.was_enabled {
            // SAFETY: interrupts were enabled when this guard was taken, so
            // the surrounding context is one where enabling them is sound.
            unsafe { hw::enable() };
        }
    }
}

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
mod hw {
    //! Bare-metal x86_64: CLI/STI and the RFLAGS interrupt flag.

    /// RFLAGS bit 9: maskable interrupts enabled.
    const INTERRUPT_FLAG: u64 = 1 << 9;

    pub fn are_enabled() -> bool {
        let rflags: u64;
        // SAFETY: reading RFLAGS has no side effects.
        unsafe {
            core::arch::asm!("pushfq; pop {}", out(reg) rflags, options(preserves_flags));
        }
        rflags & INTERRUPT_FLAG != 0
    }

    pub fn disable() {
        // SAFETY: CLI only masks maskable interrupts.
        unsafe {
            core::arch::asm!("cli", options(nomem, nostack, preserves_flags));
        }
    }

    /// # Safety
    ///
    /// The caller must ensure enabling interrupts is sound in the current
    /// context (IDT configured, not inside another critical section).
    pub unsafe fn enable() {
        unsafe {
            core::arch::asm!("sti", options(nomem, nostack, preserves_flags));
        }
    }
}

#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
mod hw {
    //! Hosted stand-in: the process has no interrupt mask to manipulate, so
    //! the guard degenerates to a no-op and tests can run the critical
    //! sections directly.

    pub fn are_enabled() -> bool {
        false
    }

    pub fn disable() {}

    pub unsafe fn enable() {}
}
