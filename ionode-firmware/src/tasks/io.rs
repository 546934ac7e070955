//! I/O task
//!
//! Sole owner of the pin-mode core. Runs the 10 ms scheduler tick and
//! executes console lines in between, so neither needs a lock.

use cortex_m::peripheral::SCB;
use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::BufferedUartTx;
use embassy_time::{Duration, Ticker};
use embedded_io_async::Write;
use heapless::String;

use ionode_core::command::{execute, AppAction};
use ionode_core::TICK_MS;
use ionode_hal_rp2040::Rp2040Analog;

use crate::board::NodeIo;
use crate::channels::LINES;
use crate::config::{ConfigPersistence, NodeStore};

/// Room for one full dump
const REPLY_LEN: usize = 8192;

/// Everything the I/O task owns
pub struct Node {
    pub io: NodeIo,
    pub store: NodeStore,
    pub analog: Rp2040Analog<'static>,
    pub persistence: ConfigPersistence<'static>,
    pub tx: BufferedUartTx,
}

#[embassy_executor::task]
pub async fn io_task(mut node: Node) {
    info!("I/O task started");

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(TICK_MS)));
    let mut reply: String<REPLY_LEN> = String::new();
    let mut associated = false;

    loop {
        let line = match select(ticker.next(), LINES.receive()).await {
            Either::First(()) => {
                node.io.periodic(&mut node.analog);
                continue;
            }
            Either::Second(line) => line,
        };

        if !associated {
            associated = true;
            node.io.trigger_association();
        }

        reply.clear();
        let action = execute(
            &mut node.io,
            &mut node.store,
            &mut node.persistence,
            &line,
            &mut reply,
        )
        .await;
        if reply.len() == reply.capacity() {
            warn!("Reply to '{}' truncated", line.as_str());
        }

        send(&mut node.tx, &reply).await;

        match action {
            AppAction::Normal | AppAction::Error => {}
            AppAction::Disconnect => {
                debug!("Console session closed");
                associated = false;
            }
            AppAction::Reset => {
                info!("Reset requested");
                node.tx.flush().await.ok();
                SCB::sys_reset();
            }
        }
    }
}

/// Write a reply with CRLF line endings
async fn send(tx: &mut BufferedUartTx, text: &str) {
    for chunk in text.split_inclusive('\n') {
        let (body, newline) = match chunk.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (chunk, false),
        };
        let mut result = tx.write_all(body.as_bytes()).await;
        if newline && result.is_ok() {
            result = tx.write_all(b"\r\n").await;
        }
        if let Err(e) = result {
            warn!("UART write error: {:?}", e);
            return;
        }
    }
}
