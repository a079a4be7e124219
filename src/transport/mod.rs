//! Transport module - the SPI bus underneath the protocol engine.
//!
//! The engine only needs one primitive: a blocking full-duplex exchange
//! over a byte buffer. Platform drivers (spidev, HAL peripherals, test
//! doubles) implement [`SpiTransport`].

mod spi;

pub use spi::SpiTransport;
