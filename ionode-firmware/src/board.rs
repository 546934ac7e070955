//! Raspberry Pi Pico board description
//!
//! GPIO0/1 carry the console UART, GPIO4/5 the expander I2C bus and GPIO26
//! the analog input; GPIO23/24/29 are wired to power sensing on the board.
//! Everything else is handed to the native backend.

use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use ionode_core::backend::expander::Pcf8574;
use ionode_core::backend::native::NativeBackend;
use ionode_core::Io;
use ionode_hal::{MuxSelect, PhysicalPin};
use ionode_hal_rp2040::{BlockingI2c, Rp2040Port, Rp2040Pwm};

/// IO_BANK0 function number for SIO (software-controlled GPIO)
const FUNCSEL_SIO: u8 = 5;

const fn gpio(name: &'static str, index: u8) -> PhysicalPin {
    PhysicalPin::new(name, index, MuxSelect::new(index as u32, FUNCSEL_SIO))
}

pub static PICO_PINS: [PhysicalPin; 20] = [
    gpio("gpio2", 2),
    gpio("gpio3", 3),
    gpio("gpio6", 6),
    gpio("gpio7", 7),
    gpio("gpio8", 8),
    gpio("gpio9", 9),
    gpio("gpio10", 10),
    gpio("gpio11", 11),
    gpio("gpio12", 12),
    gpio("gpio13", 13),
    gpio("gpio14", 14),
    gpio("gpio15", 15),
    gpio("gpio16", 16),
    gpio("gpio17", 17),
    gpio("gpio18", 18),
    gpio("gpio19", 19),
    gpio("gpio20", 20),
    gpio("gpio21", 21),
    gpio("gpio22", 22),
    // on-board LED
    gpio("gpio25", 25),
];

pub type NativePins = NativeBackend<'static, Rp2040Port, Rp2040Pwm>;
pub type Expander = Pcf8574<BlockingI2c<I2c<'static, I2C0, Blocking>>>;
pub type NodeIo = Io<NativePins, Expander>;
