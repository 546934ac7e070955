//! Per-pin runtime state
//!
//! A [`PinSlot`] pairs a pin's active configuration with its transient
//! state. Both are set together, so the runtime variant always matches the
//! configured mode.

use crate::config::{PinConfig, PinMode};
use crate::ramp::PwmRamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterState {
    pub count: u32,
    /// Time left before edge detection is re-armed
    pub debounce_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerState {
    /// Time left before the output flips; 0 when stopped
    pub remaining_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmState {
    /// Generator channel, assigned at boot
    pub channel: Option<u8>,
    pub ramp: PwmRamp,
}

/// Transient per-mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRuntime {
    /// Modes without transient state
    Idle,
    Counter(CounterState),
    Timer(TimerState),
    Pwm(PwmState),
}

impl PinRuntime {
    fn for_config(config: &PinConfig) -> Self {
        match config {
            PinConfig::Counter(_) => Self::Counter(CounterState::default()),
            PinConfig::Timer(_) => Self::Timer(TimerState::default()),
            PinConfig::Pwm(pwm) => Self::Pwm(PwmState {
                channel: None,
                ramp: PwmRamp::new(pwm),
            }),
            _ => Self::Idle,
        }
    }
}

/// Active configuration and runtime state of one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinSlot {
    config: PinConfig,
    runtime: PinRuntime,
}

impl Default for PinSlot {
    fn default() -> Self {
        Self::new(PinConfig::Disabled)
    }
}

impl PinSlot {
    pub fn new(config: PinConfig) -> Self {
        Self {
            runtime: PinRuntime::for_config(&config),
            config,
        }
    }

    pub fn mode(&self) -> PinMode {
        self.config.mode()
    }

    pub fn config(&self) -> &PinConfig {
        &self.config
    }

    pub fn runtime(&self) -> &PinRuntime {
        &self.runtime
    }

    /// Clear the transient state, keeping the configuration
    pub fn reset(&mut self) {
        let channel = match self.runtime {
            PinRuntime::Pwm(state) => state.channel,
            _ => None,
        };
        self.runtime = PinRuntime::for_config(&self.config);
        if let PinRuntime::Pwm(state) = &mut self.runtime {
            state.channel = channel;
        }
    }

    /// Configuration and mutable runtime state together
    pub fn parts_mut(&mut self) -> (&PinConfig, &mut PinRuntime) {
        (&self.config, &mut self.runtime)
    }
}

/// Subtract one tick from a countdown, flooring at zero
///
/// Returns true on the tick the countdown reaches zero.
pub fn count_down(remaining: &mut u32, tick_ms: u32) -> bool {
    if *remaining == 0 {
        return false;
    }
    *remaining = remaining.saturating_sub(tick_ms);
    *remaining == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CounterConfig, PwmConfig};

    #[test]
    fn test_runtime_follows_mode() {
        let slot = PinSlot::new(PinConfig::Counter(CounterConfig::default()));
        assert!(matches!(slot.runtime(), PinRuntime::Counter(_)));

        let slot = PinSlot::new(PinConfig::Disabled);
        assert_eq!(*slot.runtime(), PinRuntime::Idle);
    }

    #[test]
    fn test_reset_keeps_pwm_channel() {
        let mut slot = PinSlot::new(PinConfig::Pwm(PwmConfig::default()));
        if let (_, PinRuntime::Pwm(state)) = slot.parts_mut() {
            state.channel = Some(2);
            state.ramp.set_direction(crate::ramp::RampDirection::Down);
        }
        slot.reset();
        match slot.runtime() {
            PinRuntime::Pwm(state) => {
                assert_eq!(state.channel, Some(2));
                assert_eq!(state.ramp.direction(), crate::ramp::RampDirection::Up);
            }
            other => panic!("unexpected runtime {other:?}"),
        }
    }

    #[test]
    fn test_count_down_floors_at_zero() {
        let mut remaining = 25;
        assert!(!count_down(&mut remaining, 10));
        assert!(!count_down(&mut remaining, 10));
        assert!(count_down(&mut remaining, 10));
        assert_eq!(remaining, 0);
        assert!(!count_down(&mut remaining, 10));
    }
}
