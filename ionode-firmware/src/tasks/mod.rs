//! Embassy tasks

pub mod console;
pub mod edge;
pub mod io;

pub use console::console_rx_task;
pub use edge::edge_task;
pub use io::{io_task, Node};
