//! Backend dispatch contract
//!
//! A backend is one physical realization of pins: the chip's own pads or
//! an external port expander. Every backend implements [`IoBackend`]; the
//! dispatcher in [`crate::io`] picks the backend from a validated address.

pub mod expander;
pub mod native;

use crate::config::{PinConfig, PinMode, PwmConfig};
use crate::error::IoError;
use crate::ramp::RampDirection;
use crate::registry::{PinId, PinRegistry};

pub use expander::Pcf8574;
pub use native::NativeBackend;

/// Backend identifier (first index of every pin address)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BackendId {
    /// On-chip pins
    Native = 0,
    /// I2C port expander
    Expander = 1,
}

impl BackendId {
    pub const ALL: [BackendId; 2] = [Self::Native, Self::Expander];

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: i64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|backend| i64::from(backend.as_u8()) == index)
    }
}

/// Static description of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BackendInfo {
    pub name: &'static str,
    pub pins: usize,
    /// Hardware answered at init
    pub detected: bool,
}

/// Operator trigger request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerAction {
    Off,
    #[default]
    On,
    /// Force a pwm ramp downwards
    Down,
    /// Force a pwm ramp upwards
    Up,
}

impl TriggerAction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "off" => Some(Self::Off),
            "on" => Some(Self::On),
            "down" => Some(Self::Down),
            "up" => Some(Self::Up),
            _ => None,
        }
    }

    pub(crate) fn ramp_direction(self) -> Option<RampDirection> {
        match self {
            Self::Up => Some(RampDirection::Up),
            Self::Down => Some(RampDirection::Down),
            Self::On | Self::Off => None,
        }
    }
}

/// Live PWM figures of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmLive {
    pub channel: u8,
    pub frequency_hz: u32,
    pub duty: u16,
    /// Live ramp bounds (may differ from the configured ones)
    pub ramp: PwmConfig,
    pub direction: RampDirection,
}

/// Transient figures reported by [`IoBackend::pin_info`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LiveState {
    #[default]
    None,
    Counter { count: u32, debounce_ms: u32 },
    Timer { remaining_ms: u32 },
    /// `None` when the pin got no generator channel
    Pwm(Option<PwmLive>),
}

/// Snapshot of one pin for dumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinSnapshot {
    /// Operator-visible pin number
    pub pin: u8,
    pub name: &'static str,
    pub config: PinConfig,
    /// Pad level, when it can be read
    pub level: Option<bool>,
    pub live: LiveState,
}

/// One physical realization of pins
///
/// Operations on a pin act on its active configuration, loaded with
/// [`IoBackend::load_config`] before [`IoBackend::init`].
pub trait IoBackend {
    fn info(&self) -> BackendInfo;

    fn registry(&self) -> &PinRegistry;

    /// Whether `mode` is possible on `pin` at all
    fn supports(&self, pin: PinId, mode: PinMode) -> bool;

    /// Install a pin's active configuration
    ///
    /// A configuration the pin cannot run is replaced by
    /// [`PinConfig::Disabled`].
    fn load_config(&mut self, pin: PinId, config: PinConfig);

    /// Bring up the hardware and initialize every pin
    fn init(&mut self) -> Result<(), IoError>;

    /// Advance one scheduler tick
    fn periodic(&mut self, tick_ms: u32);

    /// Run the mode's initialization routine for one pin
    fn init_pin_mode(&mut self, pin: PinId) -> Result<(), IoError>;

    fn pin_info(&self, pin: PinId) -> PinSnapshot;

    fn read_pin(&mut self, pin: PinId) -> Result<u32, IoError>;

    fn write_pin(&mut self, pin: PinId, value: u32) -> Result<(), IoError>;

    fn trigger_pin(&mut self, pin: PinId, action: TriggerAction) -> Result<(), IoError>;

    /// Replace a pwm pin's live ramp bounds and restart the ramp
    fn set_pwm_ramp(&mut self, pin: PinId, _ramp: PwmConfig) -> Result<(), IoError> {
        Err(self.invalid_for_mode(pin))
    }

    /// Change the PWM generator period
    fn set_pwm_period(&mut self, _period_us: u32) -> Result<(), IoError> {
        Err(IoError::Unsupported(PinMode::Pwm))
    }

    /// Take the "a counter registered an edge" flag
    fn take_fired(&mut self) -> bool {
        false
    }

    /// Error for an operation the pin's mode does not support
    fn invalid_for_mode(&self, pin: PinId) -> IoError {
        mode_error(self.pin_info(pin).config.mode())
    }
}

/// Error for an operation `mode` does not support
pub(crate) fn mode_error(mode: PinMode) -> IoError {
    match mode {
        PinMode::Disabled => IoError::Disabled,
        mode => IoError::InvalidForMode(mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_ids() {
        assert_eq!(BackendId::from_index(0), Some(BackendId::Native));
        assert_eq!(BackendId::from_index(1), Some(BackendId::Expander));
        assert_eq!(BackendId::from_index(-1), None);
        assert_eq!(BackendId::from_index(2), None);
    }

    #[test]
    fn test_trigger_action_names() {
        assert_eq!(TriggerAction::from_name("off"), Some(TriggerAction::Off));
        assert_eq!(TriggerAction::from_name("up"), Some(TriggerAction::Up));
        assert_eq!(TriggerAction::from_name("toggle"), None);
        assert_eq!(TriggerAction::default(), TriggerAction::On);
    }
}
