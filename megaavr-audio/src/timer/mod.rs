//! TCA0 timer/PWM driver.
//!
//! [`PwmTimer`] is the hardware contract the output driver needs: program
//! and arm the overflow interrupt, disarm it, acknowledge an overflow, and
//! load a compare value. [`Tca0`] implements it for the ATmega4809 on top of
//! a [`RegisterBus`], so the register program can be exercised against an
//! in-memory register file in tests.

pub mod registers;
mod tca0;

#[cfg(test)]
pub(crate) mod mock;

pub use tca0::Tca0;

use crate::config::OutputSettings;

/// Byte-wide access to memory-mapped I/O.
pub trait RegisterBus {
    fn write8(&mut self, address: u16, value: u8);

    /// 16-bit write through the TEMP latch: low byte first, then high byte.
    #[inline(always)]
    fn write16(&mut self, address: u16, value: u16) {
        self.write8(address, value as u8);
        self.write8(address + 1, (value >> 8) as u8);
    }
}

/// Volatile stores straight to the data space.
pub struct VolatileBus {
    _private: (),
}

impl VolatileBus {
    /// # Safety
    ///
    /// Only sound on an ATmega4809-compatible device, and the caller must own
    /// TCA0, PORTMUX.TCAROUTEA and the output pins of PORTB.
    pub const unsafe fn new() -> Self {
        VolatileBus { _private: () }
    }
}

impl RegisterBus for VolatileBus {
    #[inline(always)]
    fn write8(&mut self, address: u16, value: u8) {
        // SAFETY: see `VolatileBus::new`.
        unsafe { core::ptr::write_volatile(address as usize as *mut u8, value) }
    }
}

/// A timer whose overflow drives audio output.
pub trait PwmTimer {
    /// Resolved configuration the timer runs with.
    fn settings(&self) -> &OutputSettings;

    /// Program the full register set and arm the overflow interrupt.
    fn start(&mut self);

    /// Disarm the interrupt, halt the timer, release the outputs to a low level.
    fn stop(&mut self);

    /// Clear the pending overflow flag.
    fn acknowledge_overflow(&mut self);

    /// Load the compare value of output `channel`; takes effect next PWM cycle.
    /// Values above the period are clamped to it.
    fn set_compare(&mut self, channel: usize, value: u16);
}
