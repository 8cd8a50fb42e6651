//! ATmega4809 TCA0 driver in single (16-bit) mode.
//!
//! Every register the output depends on is written in full on
//! [`start`](PwmTimer::start); nothing is read back or modified in place.
//! Stopping and restarting therefore lands in exactly the state a first
//! start from reset produces.
//!
//! # Start sequence
//!
//! | Step | Register | Value |
//! |------|----------|-------|
//! | 1 | PORTB.OUTCLR / DIRSET | output pins low, then outputs |
//! | 2 | PORTMUX.TCAROUTEA | WO0..WO2 on PORTB |
//! | 3 | CTRLA | 0 (halted while reprogramming) |
//! | 4 | CTRLD | 0 (single mode) |
//! | 5 | CTRLB | waveform mode + CMPnEN |
//! | 6 | PER | derived period |
//! | 7 | CMPn, CMPnBUF | idle (silence) level |
//! | 8 | CNT | 0 |
//! | 9 | INTFLAGS | clear OVF |
//! | 10 | INTCTRL | OVF |
//! | 11 | CTRLA | CLKSEL + ENABLE |

use crate::config::{AudioConfig, OutputSettings};
use crate::constants::MAX_CHANNELS;

use super::registers as reg;
use super::{PwmTimer, RegisterBus};

/// TCA0 in single mode, generating PWM on up to two PORTB pins and the
/// audio tick on overflow.
pub struct Tca0<B> {
    bus: B,
    settings: OutputSettings,
    /// Buffered compare register per output channel.
    compare_buffers: [u16; MAX_CHANNELS],
}

impl<B: RegisterBus> Tca0<B> {
    /// Driver for the build-time configuration `C`.
    pub fn new<C: AudioConfig>(bus: B) -> Self {
        Self::with_settings(bus, C::SETTINGS)
    }

    /// Driver for already-resolved settings.
    pub fn with_settings(bus: B, settings: OutputSettings) -> Self {
        let mut compare_buffers = [0; MAX_CHANNELS];
        for (slot, pin) in compare_buffers.iter_mut().zip(settings.pins().iter()) {
            if let Some(pin) = pin {
                *slot = pin.compare_buffer();
            }
        }
        Tca0 {
            bus,
            settings,
            compare_buffers,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Release the register bus.
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: RegisterBus> PwmTimer for Tca0<B> {
    fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    fn start(&mut self) {
        let s = &self.settings;
        let port_mask = s.port_mask();

        self.bus.write8(reg::PORTB_OUTCLR, port_mask);
        self.bus.write8(reg::PORTB_DIRSET, port_mask);
        self.bus
            .write8(reg::PORTMUX_TCAROUTEA, reg::PORTMUX_TCA0_PORTB);

        self.bus.write8(reg::TCA0_CTRLA, 0);
        self.bus.write8(reg::TCA0_CTRLD, 0);
        self.bus.write8(reg::TCA0_CTRLB, s.ctrlb());
        self.bus.write16(reg::TCA0_PER, s.period());

        let idle = s.scaler().idle_level();
        for pin in s.pins().iter().flatten() {
            self.bus.write16(pin.compare(), idle);
            self.bus.write16(pin.compare_buffer(), idle);
        }

        self.bus.write16(reg::TCA0_CNT, 0);
        self.bus.write8(reg::TCA0_INTFLAGS, reg::INT_OVF);
        self.bus.write8(reg::TCA0_INTCTRL, reg::INT_OVF);
        self.bus.write8(reg::TCA0_CTRLA, s.ctrla());

        debug!(
            "TCA0 start: CTRLB {=u8:#x} PER {} idle {}",
            s.ctrlb(),
            s.period(),
            idle
        );
    }

    fn stop(&mut self) {
        self.bus.write8(reg::TCA0_INTCTRL, 0);
        self.bus.write8(reg::TCA0_CTRLA, 0);
        // compare outputs off: pins fall back to their PORT value
        self.bus.write8(reg::TCA0_CTRLB, 0);
        self.bus.write8(reg::PORTB_OUTCLR, self.settings.port_mask());

        debug!("TCA0 stop");
    }

    #[inline(always)]
    fn acknowledge_overflow(&mut self) {
        self.bus.write8(reg::TCA0_INTFLAGS, reg::INT_OVF);
    }

    #[inline(always)]
    fn set_compare(&mut self, channel: usize, value: u16) {
        if let Some(&address) = self.compare_buffers.get(channel) {
            if address != 0 {
                self.bus.write16(address, value.min(self.settings.period()));
            }
        }
    }
}
