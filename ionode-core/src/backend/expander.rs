//! PCF8574 port expander backend
//!
//! Eight quasi-bidirectional pins behind one I2C address. Writing a byte
//! sets the output latch; a latch bit of 1 is a weak pull-up, so a pin is
//! read as an input by releasing it high. Only disabled, input and output
//! modes exist on this device.

use ionode_hal::{I2cBus, MuxSelect, PhysicalPin};

use super::{mode_error, BackendInfo, IoBackend, LiveState, PinSnapshot, TriggerAction};
use crate::config::{PinConfig, PinMode};
use crate::error::IoError;
use crate::modes::{ModeTrait, ModeTraits};
use crate::registry::{PinId, PinRegistry, PinSlots};
use crate::runtime::PinSlot;

/// Pins on one expander
pub const EXPANDER_PIN_COUNT: usize = 8;

/// Address with A0..A2 tied low
pub const DEFAULT_ADDRESS: u8 = 0x20;

static EXPANDER_PINS: [PhysicalPin; EXPANDER_PIN_COUNT] = [
    PhysicalPin::new("p0", 0, MuxSelect::new(0, 0)),
    PhysicalPin::new("p1", 1, MuxSelect::new(0, 0)),
    PhysicalPin::new("p2", 2, MuxSelect::new(0, 0)),
    PhysicalPin::new("p3", 3, MuxSelect::new(0, 0)),
    PhysicalPin::new("p4", 4, MuxSelect::new(0, 0)),
    PhysicalPin::new("p5", 5, MuxSelect::new(0, 0)),
    PhysicalPin::new("p6", 6, MuxSelect::new(0, 0)),
    PhysicalPin::new("p7", 7, MuxSelect::new(0, 0)),
];

pub struct Pcf8574<B> {
    bus: B,
    address: u8,
    registry: PinRegistry,
    slots: PinSlots<PinSlot, EXPANDER_PIN_COUNT>,
    modes: ModeTraits<Pcf8574<B>>,
    latch: u8,
    inputs: u8,
    detected: bool,
}

impl<B: I2cBus> Pcf8574<B> {
    pub fn new(bus: B, address: u8) -> Result<Self, IoError> {
        let registry = PinRegistry::new(&EXPANDER_PINS, EXPANDER_PIN_COUNT)
            .map_err(|_| IoError::InvalidPin)?;
        let modes = ModeTraits::build(&[
            ModeTrait::new(PinMode::Disabled, Self::release),
            ModeTrait::new(PinMode::Input, Self::release),
            ModeTrait::new(PinMode::Output, Self::init_output),
            ModeTrait::new(PinMode::Counter, Self::unsupported),
            ModeTrait::new(PinMode::Timer, Self::unsupported),
            ModeTrait::new(PinMode::Pwm, Self::unsupported),
            ModeTrait::new(PinMode::Bus, Self::unsupported),
        ])?;

        Ok(Self {
            bus,
            address,
            slots: PinSlots::new(&registry, |_| PinSlot::default()),
            registry,
            modes,
            latch: 0xff,
            inputs: 0xff,
            detected: false,
        })
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn release(&mut self, id: PinId) -> Result<(), IoError> {
        self.set_latch(id, true)
    }

    fn init_output(&mut self, id: PinId) -> Result<(), IoError> {
        let startup = match self.slots.get(id).config() {
            PinConfig::Output(output) => output.startup_state,
            _ => false,
        };
        self.set_latch(id, startup)
    }

    fn unsupported(&mut self, id: PinId) -> Result<(), IoError> {
        Err(IoError::Unsupported(self.slots.get(id).mode()))
    }

    fn set_latch(&mut self, id: PinId, high: bool) -> Result<(), IoError> {
        let mask = self.registry.get(id).mask() as u8;
        let latch = match high {
            true => self.latch | mask,
            false => self.latch & !mask,
        };
        if !self.detected {
            return Err(IoError::Bus);
        }
        self.bus
            .write(self.address, &[latch])
            .map_err(|_| IoError::Bus)?;
        self.latch = latch;
        Ok(())
    }

    fn refresh_inputs(&mut self) -> Result<u8, IoError> {
        let mut buf = [0u8; 1];
        self.bus
            .read(self.address, &mut buf)
            .map_err(|_| IoError::Bus)?;
        self.inputs = buf[0];
        Ok(buf[0])
    }

    fn bit(value: u8, pin: &PhysicalPin) -> bool {
        value & (pin.mask() as u8) != 0
    }
}

impl<B: I2cBus> IoBackend for Pcf8574<B> {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "pcf8574",
            pins: self.registry.len(),
            detected: self.detected,
        }
    }

    fn registry(&self) -> &PinRegistry {
        &self.registry
    }

    fn supports(&self, _id: PinId, mode: PinMode) -> bool {
        matches!(mode, PinMode::Disabled | PinMode::Input | PinMode::Output)
    }

    fn load_config(&mut self, id: PinId, config: PinConfig) {
        let config = match self.supports(id, config.mode()) {
            true => config,
            false => {
                io_warn!(
                    "pcf8574 {}: mode {} not possible, disabling",
                    self.registry.get(id).name,
                    config.mode().name()
                );
                PinConfig::Disabled
            }
        };
        *self.slots.get_mut(id) = PinSlot::new(config);
    }

    fn init(&mut self) -> Result<(), IoError> {
        self.detected = self.refresh_inputs().is_ok();
        if !self.detected {
            io_warn!("pcf8574 at {=u8:#x} not detected", self.address);
            return Ok(());
        }

        for id in self.registry.ids() {
            if let Err(error) = self.init_pin_mode(id) {
                io_warn!("pcf8574 {}: init failed: {}", self.registry.get(id).name, error);
            }
        }
        io_info!("pcf8574 at {=u8:#x} latch {=u8:#x}", self.address, self.latch);
        Ok(())
    }

    fn periodic(&mut self, _tick_ms: u32) {
        if self.detected && self.refresh_inputs().is_err() {
            io_debug!("pcf8574: input refresh failed");
        }
    }

    fn init_pin_mode(&mut self, id: PinId) -> Result<(), IoError> {
        let init = self.modes.get(self.slots.get(id).mode())?;
        init(self, id)
    }

    fn pin_info(&self, id: PinId) -> PinSnapshot {
        let pin = self.registry.get(id);
        let config = *self.slots.get(id).config();
        let level = match config {
            _ if !self.detected => None,
            PinConfig::Output(_) => Some(Self::bit(self.latch, pin)),
            _ => Some(Self::bit(self.inputs, pin)),
        };

        PinSnapshot {
            pin: pin.index,
            name: pin.name,
            config,
            level,
            live: LiveState::None,
        }
    }

    fn read_pin(&mut self, id: PinId) -> Result<u32, IoError> {
        let pin = self.registry.get(id);
        match self.slots.get(id).mode() {
            _ if !self.detected => Err(IoError::Bus),
            PinMode::Input => Ok(u32::from(Self::bit(self.inputs, pin))),
            PinMode::Output => Ok(u32::from(Self::bit(self.latch, pin))),
            mode => Err(mode_error(mode)),
        }
    }

    fn write_pin(&mut self, id: PinId, value: u32) -> Result<(), IoError> {
        match self.slots.get(id).mode() {
            PinMode::Output => self.set_latch(id, value != 0),
            mode => Err(mode_error(mode)),
        }
    }

    fn trigger_pin(&mut self, id: PinId, action: TriggerAction) -> Result<(), IoError> {
        match (self.slots.get(id).mode(), action) {
            (PinMode::Output, TriggerAction::On | TriggerAction::Off) => {
                self.set_latch(id, action == TriggerAction::On)
            }
            (mode, _) => Err(mode_error(mode)),
        }
    }
}
