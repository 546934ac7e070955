//! ionode - I/O node firmware
//!
//! Main firmware binary for the Raspberry Pi Pico. Pin modes are loaded
//! from flash at boot; the node is then operated from a line-based console
//! on UART0 (115200 baud).

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel as AdcChannel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ionode_core::backend::expander::{Pcf8574, DEFAULT_ADDRESS};
use ionode_core::backend::native::{NativeBackend, MAX_NATIVE_PINS};
use ionode_core::config::PinConfig;
use ionode_core::{BackendId, Io, PinRegistry};
use ionode_hal_rp2040::{BlockingI2c, ConfigFlash, PinBank, Rp2040Analog, Rp2040Port, Rp2040Pwm};

use crate::board::NodeIo;
use crate::channels::{ARM, EDGES};
use crate::config::ConfigPersistence;
use crate::tasks::Node;

mod board;
mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Move board pins into the bank under their GPIO numbers
macro_rules! park_pins {
    ($bank:ident, $($index:literal => $pin:expr),* $(,)?) => {
        $( unwrap!($bank.insert($index, $pin.into())); )*
    };
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ionode firmware starting...");

    let p = embassy_rp::init(Default::default());

    let mut persistence = ConfigPersistence::new(ConfigFlash::new(p.FLASH, p.DMA_CH0));
    let store = persistence.load_or_default().await;

    let registry = unwrap!(PinRegistry::new(&board::PICO_PINS, MAX_NATIVE_PINS));
    let native = unwrap!(NativeBackend::new(
        registry,
        Rp2040Port::new(&ARM),
        Rp2040Pwm::new(),
        &EDGES,
    ));

    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, I2cConfig::default());
    let expander = unwrap!(Pcf8574::new(BlockingI2c::new(i2c), DEFAULT_ADDRESS));

    let mut io: NodeIo = Io::new(native, Some(expander));
    if let Err(e) = io.init(&store) {
        error!("I/O init failed: {:?}", e);
    }

    let mut bank = PinBank::new();
    park_pins!(bank,
        2 => p.PIN_2, 3 => p.PIN_3, 6 => p.PIN_6, 7 => p.PIN_7,
        8 => p.PIN_8, 9 => p.PIN_9, 10 => p.PIN_10, 11 => p.PIN_11,
        12 => p.PIN_12, 13 => p.PIN_13, 14 => p.PIN_14, 15 => p.PIN_15,
        16 => p.PIN_16, 17 => p.PIN_17, 18 => p.PIN_18, 19 => p.PIN_19,
        20 => p.PIN_20, 21 => p.PIN_21, 22 => p.PIN_22, 25 => p.PIN_25,
    );
    spawn_edge_tasks(&spawner, &io, &mut bank);

    let adc = Adc::new_blocking(p.ADC, AdcConfig::default());
    let analog = Rp2040Analog::new(adc, AdcChannel::new_pin(p.PIN_26, Pull::None));

    let tx_buf = TX_BUF.init([0u8; 1024]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let (tx, rx) = uart.into_buffered(Irqs, tx_buf, rx_buf).split();

    let node = Node {
        io,
        store,
        analog,
        persistence,
        tx,
    };

    spawner.spawn(unwrap!(tasks::console_rx_task(rx)));
    spawner.spawn(unwrap!(tasks::io_task(node)));

    info!("All tasks spawned, node running");
}

/// Start edge detection on every native counter pin
fn spawn_edge_tasks(spawner: &Spawner, io: &NodeIo, bank: &mut PinBank) {
    for address in io.addresses() {
        if address.backend() != BackendId::Native {
            continue;
        }
        let Ok(snapshot) = io.pin_info(address) else {
            continue;
        };
        let PinConfig::Counter(counter) = snapshot.config else {
            continue;
        };

        let index = address.number();
        let pin = match bank.take(index) {
            Ok(pin) => pin,
            Err(e) => {
                warn!("Counter gpio{} has no pin: {:?}", index, e);
                continue;
            }
        };
        let pull = match counter.pullup {
            true => Pull::Up,
            false => Pull::None,
        };

        match tasks::edge_task(Input::new(pin, pull), index) {
            Ok(token) => spawner.spawn(token),
            Err(_) => warn!("No edge task left for counter gpio{}", index),
        }
    }
}
