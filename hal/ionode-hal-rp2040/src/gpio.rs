//! Register-level pin port
//!
//! Pins are driven directly through SIO (levels and output enables),
//! IO_BANK0 (function select) and PADS_BANK0 (pulls, input enable). Edge
//! detection itself runs in per-pin async tasks; the port only arms and
//! disarms them through [`EdgeArm`].
//!
//! The RP2040 has no open-drain pad mode, so open-drain pins are emulated
//! by toggling the output enable with the output latch held low.

use embassy_rp::pac;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use ionode_hal::{PhysicalPin, PinDirection, PinPort};

/// Maximum number of GPIO pins on RP2040
pub const GPIO_COUNT: usize = 30;

/// Per-pin "detect the next edge" signals
///
/// The port raises a pin's signal when the core arms edge detection; the
/// pin's edge task waits on it before listening for the next edge.
pub struct EdgeArm {
    signals: [Signal<CriticalSectionRawMutex, ()>; GPIO_COUNT],
}

impl Default for EdgeArm {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeArm {
    pub const fn new() -> Self {
        Self {
            signals: [const { Signal::new() }; GPIO_COUNT],
        }
    }

    pub fn arm(&self, index: u8) {
        if let Some(signal) = self.signals.get(usize::from(index)) {
            signal.signal(());
        }
    }

    pub fn disarm(&self, index: u8) {
        if let Some(signal) = self.signals.get(usize::from(index)) {
            signal.reset();
        }
    }

    /// Wait until the pin is armed; consumes the arming
    pub async fn wait(&self, index: u8) {
        if let Some(signal) = self.signals.get(usize::from(index)) {
            signal.wait().await;
        }
    }
}

/// RP2040 implementation of [`PinPort`] for bank 0
pub struct Rp2040Port {
    arm: &'static EdgeArm,
    open_drain: u32,
}

impl Rp2040Port {
    pub fn new(arm: &'static EdgeArm) -> Self {
        Self { arm, open_drain: 0 }
    }

    fn set_output_enable(mask: u32, enabled: bool) {
        let oe = pac::SIO.gpio_oe(0);
        match enabled {
            true => oe.value_set().write_value(mask),
            false => oe.value_clr().write_value(mask),
        }
    }
}

impl PinPort for Rp2040Port {
    fn select_function(&mut self, pin: &PhysicalPin) {
        pac::IO_BANK0
            .gpio(pin.mux.register as usize)
            .ctrl()
            .write(|w| w.set_funcsel(pin.mux.function));
        pac::PADS_BANK0.gpio(usize::from(pin.index)).modify(|w| {
            w.set_ie(true);
            w.set_od(false);
            w.set_pue(false);
            w.set_pde(false);
        });
    }

    fn set_direction(&mut self, pin: &PhysicalPin, direction: PinDirection) {
        Self::set_output_enable(pin.mask(), direction == PinDirection::Output);
    }

    fn set_pullup(&mut self, pin: &PhysicalPin, enabled: bool) {
        pac::PADS_BANK0.gpio(usize::from(pin.index)).modify(|w| {
            w.set_pue(enabled);
            w.set_pde(false);
        });
    }

    fn set_open_drain(&mut self, pin: &PhysicalPin) {
        self.open_drain |= pin.mask();
        pac::SIO.gpio_out(0).value_clr().write_value(pin.mask());
    }

    fn set_level(&mut self, pin: &PhysicalPin, high: bool) {
        let mask = pin.mask();
        if self.open_drain & mask != 0 {
            Self::set_output_enable(mask, !high);
            return;
        }

        let out = pac::SIO.gpio_out(0);
        match high {
            true => out.value_set().write_value(mask),
            false => out.value_clr().write_value(mask),
        }
    }

    fn level(&self, pin: &PhysicalPin) -> bool {
        pac::SIO.gpio_in(0).read() & pin.mask() != 0
    }

    fn arm_edge(&mut self, pin: &PhysicalPin) {
        self.arm.arm(pin.index);
    }

    fn disarm_edge(&mut self, pin: &PhysicalPin) {
        self.arm.disarm(pin.index);
    }
}
