//! Host-side HAL doubles for tests

use ionode_hal::{
    AnalogInput, I2cBus, MuxSelect, PhysicalPin, PinDirection, PinPort, PwmChannelSetup,
    PwmGenerator, DEFAULT_PERIOD_US,
};

use crate::config::store::{ConfigStore, Key, MemoryStore, StoreError};

/// Eleven-pin test board with one special-register pin
pub static BOARD: [PhysicalPin; 11] = [
    PhysicalPin::new("gpio0", 0, MuxSelect::new(0x34, 0)),
    PhysicalPin::new("gpio1", 1, MuxSelect::new(0x18, 3)),
    PhysicalPin::new("gpio2", 2, MuxSelect::new(0x38, 0)),
    PhysicalPin::new("gpio3", 3, MuxSelect::new(0x14, 3)),
    PhysicalPin::new("gpio4", 4, MuxSelect::new(0x3c, 0)),
    PhysicalPin::new("gpio5", 5, MuxSelect::new(0x40, 0)),
    PhysicalPin::new("gpio12", 12, MuxSelect::new(0x04, 3)),
    PhysicalPin::new("gpio13", 13, MuxSelect::new(0x08, 3)),
    PhysicalPin::new("gpio14", 14, MuxSelect::new(0x0c, 3)),
    PhysicalPin::new("gpio15", 15, MuxSelect::new(0x10, 3)),
    PhysicalPin::special("gpio16", 16),
];

/// Register-level pin port backed by bitmasks
#[derive(Debug, Default)]
pub struct MockPort {
    pub levels: u32,
    pub outputs: u32,
    pub pullups: u32,
    pub open_drain: u32,
    pub selected: u32,
    pub armed: u32,
    pub arm_calls: [u32; 32],
}

impl MockPort {
    /// Drive an input pad from outside
    pub fn set_input(&mut self, index: u8, high: bool) {
        if high {
            self.levels |= 1 << index;
        } else {
            self.levels &= !(1 << index);
        }
    }

    pub fn is_high(&self, index: u8) -> bool {
        self.levels & (1 << index) != 0
    }

    pub fn is_armed(&self, index: u8) -> bool {
        self.armed & (1 << index) != 0
    }
}

impl PinPort for MockPort {
    fn select_function(&mut self, pin: &PhysicalPin) {
        self.selected |= pin.mask();
    }

    fn set_direction(&mut self, pin: &PhysicalPin, direction: PinDirection) {
        match direction {
            PinDirection::Output => self.outputs |= pin.mask(),
            PinDirection::Input => self.outputs &= !pin.mask(),
        }
    }

    fn set_pullup(&mut self, pin: &PhysicalPin, enabled: bool) {
        if enabled {
            self.pullups |= pin.mask();
        } else {
            self.pullups &= !pin.mask();
        }
    }

    fn set_open_drain(&mut self, pin: &PhysicalPin) {
        self.open_drain |= pin.mask();
    }

    fn set_level(&mut self, pin: &PhysicalPin, high: bool) {
        self.set_input(pin.index, high);
    }

    fn level(&self, pin: &PhysicalPin) -> bool {
        self.is_high(pin.index)
    }

    fn arm_edge(&mut self, pin: &PhysicalPin) {
        self.armed |= pin.mask();
        self.arm_calls[usize::from(pin.index)] += 1;
    }

    fn disarm_edge(&mut self, pin: &PhysicalPin) {
        self.armed &= !pin.mask();
    }
}

/// PWM generator that records duties and restarts
#[derive(Debug)]
pub struct MockPwm {
    pub budget: u8,
    pub period_us: u32,
    pub bound: Vec<u8>,
    pub duties: [u16; 8],
    pub applied: [u16; 8],
    pub starts: u32,
}

impl MockPwm {
    pub fn new(budget: u8) -> Self {
        Self {
            budget,
            period_us: DEFAULT_PERIOD_US,
            bound: Vec::new(),
            duties: [0; 8],
            applied: [0; 8],
            starts: 0,
        }
    }
}

impl PwmGenerator for MockPwm {
    fn channel_budget(&self) -> u8 {
        self.budget
    }

    fn init(&mut self, period_us: u32, channels: &[PwmChannelSetup<'_>]) {
        self.period_us = period_us;
        for (channel, setup) in channels.iter().enumerate() {
            self.bound.push(setup.pin.index);
            self.duties[channel] = setup.duty;
        }
        self.start();
    }

    fn duty(&self, channel: u8) -> u16 {
        self.duties[usize::from(channel)]
    }

    fn set_duty(&mut self, channel: u8, duty: u16) {
        self.duties[usize::from(channel)] = duty;
    }

    fn start(&mut self) {
        self.applied = self.duties;
        self.starts += 1;
    }

    fn period_us(&self) -> u32 {
        self.period_us
    }

    fn set_period_us(&mut self, period_us: u32) {
        self.period_us = period_us;
    }
}

/// Single PCF8574-style device on a bus
#[derive(Debug, Default)]
pub struct MockI2c {
    pub present: bool,
    /// Levels applied to the device's pins from outside
    pub pins: u8,
    /// Last byte written
    pub latch: Option<u8>,
    pub writes: u32,
}

impl MockI2c {
    pub fn present() -> Self {
        Self {
            present: true,
            pins: 0xff,
            ..Self::default()
        }
    }
}

impl I2cBus for MockI2c {
    type Error = ();

    fn write(&mut self, _address: u8, data: &[u8]) -> Result<(), ()> {
        if !self.present {
            return Err(());
        }
        self.latch = data.last().copied();
        self.writes += 1;
        Ok(())
    }

    fn read(&mut self, _address: u8, buf: &mut [u8]) -> Result<(), ()> {
        if !self.present {
            return Err(());
        }
        // quasi-bidirectional: a low latch bit pulls the pin low
        let latch = self.latch.unwrap_or(0xff);
        buf.fill(self.pins & latch);
        Ok(())
    }
}

/// Analog input with a fixed reading
#[derive(Debug, Default)]
pub struct MockAnalog {
    pub raw: u16,
}

impl AnalogInput for MockAnalog {
    fn read_raw(&mut self) -> u16 {
        self.raw
    }
}

/// Store whose flush can be made to fail
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryStore<64>,
    pub fail_flush: bool,
}

impl ConfigStore for FailingStore {
    fn get_int(&self, key: &Key<'_>) -> Option<i32> {
        self.inner.get_int(key)
    }

    fn get_string(&self, key: &Key<'_>) -> Option<&str> {
        self.inner.get_string(key)
    }

    fn set_int(&mut self, key: &Key<'_>, value: i32) -> Result<(), StoreError> {
        self.inner.set_int(key, value)
    }

    fn set_string(&mut self, key: &Key<'_>, value: &str) -> Result<(), StoreError> {
        self.inner.set_string(key, value)
    }

    fn delete(&mut self, key: &Key<'_>, wildcard: bool) -> usize {
        self.inner.delete(key, wildcard)
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        match self.fail_flush {
            true => Err(StoreError::Io),
            false => self.inner.flush(),
        }
    }

    fn discard(&mut self) {
        self.inner.discard();
    }
}
