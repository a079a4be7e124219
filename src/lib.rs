//! # oa-tc6
//!
//! OPEN Alliance TC6 10BASE-T1x MAC-PHY serial interface engine.
//!
//! This crate turns a half-duplex SPI byte stream into register control
//! transactions and a credit-flow-controlled Ethernet frame transport.
//!
//! ## Architecture
//!
//! - **Control Plane**: single-register reads and writes, optionally
//!   protected by value complements
//! - **Data Plane**: frames cut into 64-byte chunks, each with a 32-bit
//!   header (host to MAC-PHY) or footer (MAC-PHY to host)
//! - **Scheduler**: [`Tc6::thread`] decides what the next SPI exchange
//!   carries and bounds the work done per call
//!
//! Frames flow through a fixed pool of buffers allocated when the link is
//! created:
//!
//! ```text
//! app -> TX pool -> Encoder -> SPI -> Decoder -> RX pool -> app
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use oa_tc6::{Tc6, Tc6Config};
//! use oa_tc6::control::regs;
//!
//! let config = Tc6Config::from_json(&std::fs::read_to_string("tc6.json")?)?;
//! let mut tc6 = Tc6::new(spidev, config)?;
//! tc6.set_protected_spi(true)?;
//!
//! tc6.send(0, &ethernet_frame)?;
//! loop {
//!     irq.wait();
//!     tc6.thread()?;
//!     while let Some(frame) = tc6.try_recv()? {
//!         stack.input(frame.payload);
//!     }
//! }
//! ```

pub mod codec;
pub mod config;
pub mod control;
pub mod credits;
pub mod error;
pub mod pool;
pub mod protocol;
pub mod transport;

mod scheduler;
mod tc6;

pub use config::Tc6Config;
pub use credits::{LinkState, Tc6Stats};
pub use error::{Result, Tc6Error, TransportError};
pub use pool::{FrameBuffer, FrameId, FrameState};
pub use protocol::Frame;
pub use tc6::Tc6;
pub use transport::SpiTransport;
