//! Edge detection tasks
//!
//! One task per counter pin. A task waits until the core arms its pin,
//! then posts edges into the mailbox until one is counted; the core
//! re-arms the pin once the debounce window has passed. At most eight
//! counter pins get a task.

use defmt::*;
use embassy_rp::gpio::Input;

use crate::channels::{ARM, EDGES};

#[embassy_executor::task(pool_size = 8)]
pub async fn edge_task(mut input: Input<'static>, index: u8) {
    debug!("Edge task on gpio{} started", index);
    let mask = 1u32 << index;

    loop {
        ARM.wait(index).await;
        loop {
            input.wait_for_any_edge().await;
            if EDGES.post(mask) != 0 {
                // drop an arming that raced the counted edge
                ARM.disarm(index);
                break;
            }
        }
    }
}
