//! PWM ramp engine
//!
//! Moves a duty value between two bounds in geometric steps of 15%,
//! producing a triangle wave. Steps happen once every `delay` ticks.

use crate::config::PwmConfig;

/// Smallest duty the up leg starts from, so that a 15% step always
/// makes progress in integer arithmetic
pub const RAMP_FLOOR: u16 = 16;

const STEP_NUMERATOR: u32 = 115;
const STEP_DENOMINATOR: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampDirection {
    #[default]
    Up,
    Down,
}

impl RampDirection {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Compute one ramp step
///
/// Returns the new duty and the direction for the following step.
pub fn ramp_step(duty: u16, direction: RampDirection, min: u16, max: u16) -> (u16, RampDirection) {
    let mut duty = u32::from(duty);
    let (min, max, floor) = (u32::from(min), u32::from(max), u32::from(RAMP_FLOOR));

    match direction {
        RampDirection::Up => {
            duty = duty.max(min).max(floor);
            duty = duty * STEP_NUMERATOR / STEP_DENOMINATOR;
            if duty >= max {
                return (max as u16, RampDirection::Down);
            }
            (duty as u16, RampDirection::Up)
        }
        RampDirection::Down => {
            duty = duty.min(max);
            duty = duty * STEP_DENOMINATOR / STEP_NUMERATOR;
            if duty <= min {
                duty = min;
            } else if duty >= floor {
                return (duty as u16, RampDirection::Down);
            }
            (duty.max(floor) as u16, RampDirection::Up)
        }
    }
}

/// Live ramp state of one PWM pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmRamp {
    min: u16,
    max: u16,
    delay: u8,
    elapsed: u16,
    direction: RampDirection,
}

impl PwmRamp {
    pub fn new(config: &PwmConfig) -> Self {
        Self {
            min: config.min_duty,
            max: config.max_duty,
            delay: config.delay,
            elapsed: 0,
            direction: RampDirection::Up,
        }
    }

    /// Replace bounds and delay; the ramp restarts upwards
    pub fn restart(&mut self, config: &PwmConfig) {
        *self = Self::new(config);
    }

    pub fn min(&self) -> u16 {
        self.min
    }

    pub fn max(&self) -> u16 {
        self.max
    }

    pub fn delay(&self) -> u8 {
        self.delay
    }

    pub fn direction(&self) -> RampDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: RampDirection) {
        self.direction = direction;
    }

    /// Count one tick; true when a step is due
    pub fn tick(&mut self) -> bool {
        if self.delay == 0 {
            return false;
        }
        self.elapsed += 1;
        if self.elapsed > u16::from(self.delay) {
            self.elapsed = 0;
            return true;
        }
        false
    }

    /// Advance the duty one step
    pub fn step(&mut self, duty: u16) -> u16 {
        let (duty, direction) = ramp_step(duty, self.direction, self.min, self.max);
        self.direction = direction;
        duty
    }
}
