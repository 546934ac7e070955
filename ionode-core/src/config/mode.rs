//! Pin modes and per-mode configuration records
//!
//! Each mode carries its own parameter record; [`PinConfig`] is the tagged
//! union of them. Constructors taking operator input validate ranges, so a
//! `PinConfig` that exists is always within bounds.

use crate::error::{IoError, Parameter};

/// Shortest accepted timer delay (one tick)
pub const MIN_TIMER_DELAY_MS: u32 = 10;

/// Longest accepted counter debounce window
pub const MAX_DEBOUNCE_MS: u32 = 60_000;

/// Largest ramp delay (ticks per ramp step)
pub const MAX_RAMP_DELAY: u8 = 100;

/// Operating role of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PinMode {
    #[default]
    Disabled = 0,
    Input = 1,
    Counter = 2,
    Output = 3,
    Timer = 4,
    Pwm = 5,
    Bus = 6,
}

impl PinMode {
    /// Number of modes
    pub const COUNT: usize = 7;

    /// All modes in discriminant order
    pub const ALL: [PinMode; Self::COUNT] = [
        Self::Disabled,
        Self::Input,
        Self::Counter,
        Self::Output,
        Self::Timer,
        Self::Pwm,
        Self::Bus,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Input => "input",
            Self::Counter => "counter",
            Self::Output => "output",
            Self::Timer => "timer",
            Self::Pwm => "pwm",
            Self::Bus => "bus",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.name() == name)
    }

    /// Persisted discriminant
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// Position in mode-indexed tables
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Timer pulse polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerDirection {
    /// Idle low, pulse high
    #[default]
    Up,
    /// Idle high, pulse low
    Down,
}

impl TimerDirection {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }

    /// Output level while the pulse is running
    pub const fn active_level(self) -> bool {
        matches!(self, Self::Up)
    }

    /// Output level while the timer is stopped
    pub const fn idle_level(self) -> bool {
        !self.active_level()
    }
}

/// Line a bus-reserved pin carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusRole {
    #[default]
    Data,
    Clock,
}

impl BusRole {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Data => "sda",
            Self::Clock => "scl",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sda" => Some(Self::Data),
            "scl" => Some(Self::Clock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputConfig {
    pub pullup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterConfig {
    /// Suppression window after a counted edge
    pub debounce_ms: u32,
    /// Zero the count after each read
    pub reset_on_get: bool,
    pub pullup: bool,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            reset_on_get: false,
            pullup: false,
        }
    }
}

impl CounterConfig {
    pub fn new(reset_on_get: bool, debounce_ms: i64) -> Result<Self, IoError> {
        let debounce_ms = u32::try_from(debounce_ms)
            .ok()
            .filter(|ms| *ms <= MAX_DEBOUNCE_MS)
            .ok_or(IoError::OutOfRange(Parameter::Debounce))?;
        Ok(Self {
            debounce_ms,
            reset_on_get,
            pullup: false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputConfig {
    /// Level driven at init
    pub startup_state: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    pub direction: TimerDirection,
    /// Pulse length
    pub delay_ms: u32,
    /// Re-arm after every flip
    pub repeat: bool,
    /// Start the pulse at init
    pub autotrigger: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            direction: TimerDirection::Up,
            delay_ms: 1000,
            repeat: false,
            autotrigger: false,
        }
    }
}

impl TimerConfig {
    pub fn new(
        direction: TimerDirection,
        delay_ms: i64,
        repeat: bool,
        autotrigger: bool,
    ) -> Result<Self, IoError> {
        let delay_ms = u32::try_from(delay_ms)
            .ok()
            .filter(|ms| *ms >= MIN_TIMER_DELAY_MS)
            .ok_or(IoError::OutOfRange(Parameter::TimerDelay))?;
        Ok(Self {
            direction,
            delay_ms,
            repeat,
            autotrigger,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmConfig {
    pub min_duty: u16,
    pub max_duty: u16,
    /// Ticks per ramp step; 0 disables the ramp
    pub delay: u8,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            min_duty: 0,
            max_duty: u16::MAX,
            delay: 0,
        }
    }
}

impl PwmConfig {
    pub fn new(min_duty: i64, max_duty: i64, delay: i64) -> Result<Self, IoError> {
        let min_duty =
            u16::try_from(min_duty).map_err(|_| IoError::OutOfRange(Parameter::MinDuty))?;
        let max_duty =
            u16::try_from(max_duty).map_err(|_| IoError::OutOfRange(Parameter::MaxDuty))?;
        let delay = u8::try_from(delay)
            .ok()
            .filter(|delay| *delay <= MAX_RAMP_DELAY)
            .ok_or(IoError::OutOfRange(Parameter::RampDelay))?;
        Ok(Self {
            min_duty,
            max_duty,
            delay,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    pub role: BusRole,
}

/// Per-pin persisted configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinConfig {
    #[default]
    Disabled,
    Input(InputConfig),
    Counter(CounterConfig),
    Output(OutputConfig),
    Timer(TimerConfig),
    Pwm(PwmConfig),
    Bus(BusConfig),
}

impl PinConfig {
    pub const fn mode(&self) -> PinMode {
        match self {
            Self::Disabled => PinMode::Disabled,
            Self::Input(_) => PinMode::Input,
            Self::Counter(_) => PinMode::Counter,
            Self::Output(_) => PinMode::Output,
            Self::Timer(_) => PinMode::Timer,
            Self::Pwm(_) => PinMode::Pwm,
            Self::Bus(_) => PinMode::Bus,
        }
    }

    /// Default record for a mode
    pub fn for_mode(mode: PinMode) -> Self {
        match mode {
            PinMode::Disabled => Self::Disabled,
            PinMode::Input => Self::Input(InputConfig::default()),
            PinMode::Counter => Self::Counter(CounterConfig::default()),
            PinMode::Output => Self::Output(OutputConfig::default()),
            PinMode::Timer => Self::Timer(TimerConfig::default()),
            PinMode::Pwm => Self::Pwm(PwmConfig::default()),
            PinMode::Bus => Self::Bus(BusConfig::default()),
        }
    }

    /// Set or clear a flag
    ///
    /// Fails with [`IoError::InvalidFlag`] when the flag has no meaning in
    /// this mode; the record is unchanged in that case.
    pub fn set_flag(&mut self, flag: PinFlag, value: bool) -> Result<(), IoError> {
        let target = match (flag, self) {
            (PinFlag::Autostart, Self::Timer(timer)) => &mut timer.autotrigger,
            (PinFlag::Repeat, Self::Timer(timer)) => &mut timer.repeat,
            (PinFlag::Pullup, Self::Input(input)) => &mut input.pullup,
            (PinFlag::Pullup, Self::Counter(counter)) => &mut counter.pullup,
            (PinFlag::ResetOnRead, Self::Counter(counter)) => &mut counter.reset_on_get,
            _ => return Err(IoError::InvalidFlag),
        };
        *target = value;
        Ok(())
    }
}

/// Operator-settable boolean option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinFlag {
    Autostart,
    Repeat,
    Pullup,
    ResetOnRead,
}

impl PinFlag {
    pub const ALL: [PinFlag; 4] = [
        Self::Autostart,
        Self::Repeat,
        Self::Pullup,
        Self::ResetOnRead,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Autostart => "autostart",
            Self::Repeat => "repeat",
            Self::Pullup => "pullup",
            Self::ResetOnRead => "reset-on-read",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }
}
