//! Console UART receive task
//!
//! Assembles bytes into lines and hands them to the I/O task.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use crate::channels::{Line, LINES};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

#[embassy_executor::task]
pub async fn console_rx_task(mut rx: BufferedUartRx) {
    info!("Console RX task started");

    let mut line = Line::new();
    let mut overflow = false;
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
        };

        for &byte in &buf[..n] {
            match byte {
                b'\r' | b'\n' => {
                    if overflow {
                        warn!("Console line longer than {} bytes dropped", line.capacity());
                    } else if !line.is_empty() {
                        LINES.send(core::mem::take(&mut line)).await;
                    }
                    line.clear();
                    overflow = false;
                }
                BACKSPACE | DELETE => {
                    line.pop();
                }
                byte if byte.is_ascii() && !byte.is_ascii_control() => {
                    if line.push(char::from(byte)).is_err() {
                        overflow = true;
                    }
                }
                _ => {}
            }
        }
    }
}
