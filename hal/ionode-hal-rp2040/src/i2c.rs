//! Blocking I2C bus adapter
//!
//! Wraps any `embedded-hal` 1.0 I2C master (on the node, the embassy-rp
//! blocking driver) behind [`ionode_hal::I2cBus`].

use embedded_hal::i2c::I2c;
use ionode_hal::I2cBus;

pub struct BlockingI2c<T> {
    bus: T,
}

impl<T: I2c> BlockingI2c<T> {
    pub fn new(bus: T) -> Self {
        Self { bus }
    }

    pub fn into_inner(self) -> T {
        self.bus
    }
}

impl<T: I2c> I2cBus for BlockingI2c<T> {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.bus.write(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.bus.read(address, buf)
    }
}
