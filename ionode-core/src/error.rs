//! Error types for pin operations

use core::fmt;

use crate::config::PinMode;

/// Configurable parameter that failed a range check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parameter {
    Debounce,
    TimerDelay,
    MinDuty,
    MaxDuty,
    RampDelay,
    Duty,
    Period,
    Value,
}

impl Parameter {
    /// Operator-facing name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Debounce => "debounce",
            Self::TimerDelay => "delay",
            Self::MinDuty => "min duty",
            Self::MaxDuty => "max duty",
            Self::RampDelay => "ramp delay",
            Self::Duty => "duty",
            Self::Period => "period",
            Self::Value => "value",
        }
    }
}

/// Pin operation errors
///
/// Every failing operation reports one of these; nothing in the core
/// panics on bad operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Backend index does not name a detected backend
    InvalidBackend,
    /// Pin index is not in the backend's registry
    InvalidPin,
    /// Pin is disabled
    Disabled,
    /// Operation is not meaningful in the pin's current mode
    InvalidForMode(PinMode),
    /// Mode is not supported by this pin or backend
    Unsupported(PinMode),
    /// Parameter outside its permitted range
    OutOfRange(Parameter),
    /// Unknown mode name
    InvalidModeName,
    /// Unknown flag name
    InvalidFlag,
    /// Unknown trigger action
    InvalidAction,
    /// Bus direction is not "sda" or "scl"
    InvalidBusRole,
    /// Timer direction is not "up" or "down"
    InvalidDirection,
    /// PWM pin did not get a hardware channel at boot
    NoPwmChannel,
    /// Bus transfer to an external device failed
    Bus,
    /// Config store could not stage or persist
    Persistence,
    /// Mode table has no initialization routine for a mode
    MissingModeHandler(PinMode),
    /// Required argument missing
    Usage,
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBackend => f.write_str("invalid io"),
            Self::InvalidPin => f.write_str("invalid pin"),
            Self::Disabled => f.write_str("pin is disabled"),
            Self::InvalidForMode(mode) => {
                write!(f, "operation not supported in mode {}", mode.name())
            }
            Self::Unsupported(mode) => write!(f, "mode {} not supported on this pin", mode.name()),
            Self::OutOfRange(param) => write!(f, "{} out of range", param.name()),
            Self::InvalidModeName => f.write_str("invalid mode"),
            Self::InvalidFlag => f.write_str("unknown flag"),
            Self::InvalidAction => f.write_str("unknown trigger action"),
            Self::InvalidBusRole => f.write_str("bus mode requires sda or scl"),
            Self::InvalidDirection => f.write_str("timer direction must be up or down"),
            Self::NoPwmChannel => f.write_str("no pwm channel available"),
            Self::Bus => f.write_str("bus transfer failed"),
            Self::Persistence => f.write_str("cannot set config"),
            Self::MissingModeHandler(mode) => write!(f, "no handler for mode {}", mode.name()),
            Self::Usage => f.write_str("missing arguments"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_parameter() {
        let text = format!("{}", IoError::OutOfRange(Parameter::MaxDuty));
        assert_eq!(text, "max duty out of range");
        let text = format!("{}", IoError::InvalidForMode(PinMode::Input));
        assert_eq!(text, "operation not supported in mode input");
    }
}
