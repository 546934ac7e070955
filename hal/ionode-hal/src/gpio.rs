//! GPIO pin abstractions
//!
//! Describes the physical pins of a chip and the register-level operations
//! the pin-mode core needs from them. Chip-specific HALs implement
//! [`PinPort`]; the core never touches registers directly.

/// Pin multiplexer setting
///
/// Selects which peripheral function drives a pad. The meaning of
/// `register` is chip-specific (IO_MUX offset, CTRL register index, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MuxSelect {
    /// Multiplexer register (chip-specific address or index)
    pub register: u32,
    /// Function number that routes the pad to plain GPIO
    pub function: u8,
}

impl MuxSelect {
    /// Create a multiplexer setting
    pub const fn new(register: u32, function: u8) -> Self {
        Self { register, function }
    }
}

/// Immutable description of one physical pin
///
/// Instances live in a static board table and are never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhysicalPin {
    /// Operator-visible name (e.g. "gpio4")
    pub name: &'static str,
    /// Bit index in the port registers
    pub index: u8,
    /// Pin is driven through a separate register block
    ///
    /// Such a pin has no multiplexer, no edge interrupt and no PWM route,
    /// so it can only be used as a plain input or output.
    pub special: bool,
    /// Multiplexer setting for the GPIO function
    pub mux: MuxSelect,
}

impl PhysicalPin {
    /// Describe a regular multiplexed pin
    pub const fn new(name: &'static str, index: u8, mux: MuxSelect) -> Self {
        Self {
            name,
            index,
            special: false,
            mux,
        }
    }

    /// Describe the special-register pin
    pub const fn special(name: &'static str, index: u8) -> Self {
        Self {
            name,
            index,
            special: true,
            mux: MuxSelect::new(0, 0),
        }
    }

    /// Register mask for this pin
    pub const fn mask(&self) -> u32 {
        1 << self.index
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinDirection {
    Input,
    Output,
}

/// Register-level access to the on-chip pins
///
/// All operations are non-blocking memory-mapped register accesses. The
/// implementation picks the register sequence from the descriptor (the
/// special-register pin uses a different block than the others).
pub trait PinPort {
    /// Route the pad to its GPIO function and disable the default pull-up
    fn select_function(&mut self, pin: &PhysicalPin);

    /// Set the pin direction
    fn set_direction(&mut self, pin: &PhysicalPin, direction: PinDirection);

    /// Enable or disable the internal pull-up
    fn set_pullup(&mut self, pin: &PhysicalPin, enabled: bool);

    /// Switch the output driver to open-drain
    fn set_open_drain(&mut self, pin: &PhysicalPin);

    /// Drive the output level
    fn set_level(&mut self, pin: &PhysicalPin, high: bool);

    /// Read the current pad level
    fn level(&self, pin: &PhysicalPin) -> bool;

    /// Enable any-edge change detection for the pin
    fn arm_edge(&mut self, pin: &PhysicalPin);

    /// Disable change detection for the pin
    fn disarm_edge(&mut self, pin: &PhysicalPin);
}
