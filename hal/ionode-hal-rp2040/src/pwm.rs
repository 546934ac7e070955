//! PWM generator over the RP2040 PWM slices
//!
//! Every GPIO is hard-wired to one slice output: slice `(pin / 2) % 8`,
//! output A for even pins and B for odd ones. All bound slices share one
//! period, so the eight slices act as a single generator with up to eight
//! channels. Two channels on pins that map to the same slice output share
//! one compare register, so the later channel's duty wins.

use embassy_rp::{clocks, pac};
use ionode_hal::{PhysicalPin, PwmChannelSetup, PwmGenerator, DEFAULT_PERIOD_US, MAX_DUTY};

/// Channels this generator hands out
pub const PWM_CHANNELS: usize = 8;

/// IO_BANK0 function number routing a pad to its PWM slice
const FUNCSEL_PWM: u8 = 4;

#[derive(Debug, Clone, Copy)]
struct Route {
    slice: usize,
    output_b: bool,
}

impl Route {
    fn of(pin: &PhysicalPin) -> Self {
        Self {
            slice: usize::from(pin.index / 2) % 8,
            output_b: pin.index % 2 == 1,
        }
    }
}

/// Clock divider and wrap value for one period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timing {
    div: u8,
    top: u16,
}

impl Timing {
    /// Smallest integer divider that fits the period into 16 bits
    fn for_period(sys_hz: u32, period_us: u32) -> Self {
        let ticks = (u64::from(sys_hz) * u64::from(period_us) / 1_000_000).max(2);
        let div = ticks.div_ceil(1 << 16).clamp(1, 255);
        let top = (ticks / div).clamp(2, 1 << 16) - 1;
        Self {
            div: div as u8,
            top: top as u16,
        }
    }

    /// Compare value for a 16-bit duty
    fn compare(&self, duty: u16) -> u16 {
        let wrap = u32::from(self.top) + 1;
        (u32::from(duty) * wrap / (u32::from(MAX_DUTY) + 1)) as u16
    }
}

pub struct Rp2040Pwm {
    routes: [Option<Route>; PWM_CHANNELS],
    duties: [u16; PWM_CHANNELS],
    period_us: u32,
}

impl Default for Rp2040Pwm {
    fn default() -> Self {
        Self::new()
    }
}

impl Rp2040Pwm {
    pub fn new() -> Self {
        Self {
            routes: [None; PWM_CHANNELS],
            duties: [0; PWM_CHANNELS],
            period_us: DEFAULT_PERIOD_US,
        }
    }

    fn timing(&self) -> Timing {
        Timing::for_period(clocks::clk_sys_freq(), self.period_us)
    }
}

impl PwmGenerator for Rp2040Pwm {
    fn channel_budget(&self) -> u8 {
        PWM_CHANNELS as u8
    }

    fn init(&mut self, period_us: u32, channels: &[PwmChannelSetup<'_>]) {
        self.period_us = period_us;
        for (channel, setup) in channels.iter().take(PWM_CHANNELS).enumerate() {
            pac::IO_BANK0
                .gpio(usize::from(setup.pin.index))
                .ctrl()
                .write(|w| w.set_funcsel(FUNCSEL_PWM));
            self.routes[channel] = Some(Route::of(setup.pin));
            self.duties[channel] = setup.duty;
        }
        self.start();
    }

    fn duty(&self, channel: u8) -> u16 {
        self.duties.get(usize::from(channel)).copied().unwrap_or(0)
    }

    fn set_duty(&mut self, channel: u8, duty: u16) {
        if let Some(slot) = self.duties.get_mut(usize::from(channel)) {
            *slot = duty;
        }
    }

    fn start(&mut self) {
        let timing = self.timing();
        let mut enabled = 0u8;

        for (route, duty) in self.routes.iter().zip(self.duties) {
            let Some(route) = route else {
                continue;
            };
            let slice = pac::PWM.ch(route.slice);
            let compare = timing.compare(duty);
            slice.cc().modify(|w| match route.output_b {
                true => w.set_b(compare),
                false => w.set_a(compare),
            });
            enabled |= 1 << route.slice;
        }

        for index in 0..8 {
            if enabled & (1 << index) == 0 {
                continue;
            }
            let slice = pac::PWM.ch(index);
            slice.csr().write(|w| w.set_en(false));
            slice.div().write(|w| {
                w.set_int(timing.div);
                w.set_frac(0);
            });
            slice.top().write(|w| w.set_top(timing.top));
            slice.ctr().write(|w| w.set_ctr(0));
            slice.csr().write(|w| w.set_en(true));
        }
    }

    fn period_us(&self) -> u32 {
        self.period_us
    }

    fn set_period_us(&mut self, period_us: u32) {
        self.period_us = period_us;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_fits_sixteen_bits() {
        let timing = Timing::for_period(125_000_000, 3000);
        assert_eq!(timing.div, 6);
        assert_eq!(timing.top, 62_499);

        let fast = Timing::for_period(125_000_000, 100);
        assert_eq!(fast.div, 1);
        assert_eq!(fast.top, 12_499);
    }

    #[test]
    fn test_compare_scales_duty() {
        let timing = Timing { div: 1, top: 999 };
        assert_eq!(timing.compare(0), 0);
        assert_eq!(timing.compare(MAX_DUTY), 999);
        assert_eq!(timing.compare(32_768), 500);
    }
}
