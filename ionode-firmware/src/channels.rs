//! Inter-task communication
//!
//! Console lines flow from the UART receive task to the I/O task; edge
//! counts flow from the edge tasks to the core through the mailbox.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use ionode_core::EdgeMailbox;
use ionode_hal_rp2040::EdgeArm;

/// Longest console line accepted
pub const LINE_LEN: usize = 128;

/// Lines buffered ahead of the I/O task
const LINE_CHANNEL_SIZE: usize = 4;

pub type Line = String<LINE_LEN>;

/// Complete console lines, terminator stripped
pub static LINES: Channel<CriticalSectionRawMutex, Line, LINE_CHANNEL_SIZE> = Channel::new();

/// Counter edges posted by the edge tasks
pub static EDGES: EdgeMailbox = EdgeMailbox::new();

/// Per-pin arming of the edge tasks
pub static ARM: EdgeArm = EdgeArm::new();
