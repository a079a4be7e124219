//! Full-duplex SPI exchange contract.
//!
//! # Example
//!
//! ```
//! use oa_tc6::transport::SpiTransport;
//! use oa_tc6::TransportError;
//!
//! /// Bus with MISO stuck low.
//! struct Silent;
//!
//! impl SpiTransport for Silent {
//!     fn exchange(&mut self, buf: &mut [u8], _cs_change: bool) -> Result<(), TransportError> {
//!         buf.fill(0);
//!         Ok(())
//!     }
//! }
//!
//! let mut buf = [0xFFu8; 8];
//! Silent.exchange(&mut buf, true).unwrap();
//! assert_eq!(buf, [0u8; 8]);
//! ```

use crate::error::TransportError;

/// Synchronous full-duplex SPI byte exchange.
///
/// Implementations clock out `buf` and overwrite it in place with the bytes
/// clocked in. The call blocks until the whole buffer has been shifted;
/// timeouts, if any, belong to the implementation.
pub trait SpiTransport {
    /// Exchange `buf.len()` bytes.
    ///
    /// `cs_change` asks the transport to release chip-select when the
    /// exchange ends. Every control and data transaction is issued as one
    /// exchange with `cs_change` set.
    fn exchange(&mut self, buf: &mut [u8], cs_change: bool) -> Result<(), TransportError>;
}

impl<T: SpiTransport + ?Sized> SpiTransport for &mut T {
    #[inline]
    fn exchange(&mut self, buf: &mut [u8], cs_change: bool) -> Result<(), TransportError> {
        (**self).exchange(buf, cs_change)
    }
}

impl<T: SpiTransport + ?Sized> SpiTransport for Box<T> {
    #[inline]
    fn exchange(&mut self, buf: &mut [u8], cs_change: bool) -> Result<(), TransportError> {
        (**self).exchange(buf, cs_change)
    }
}
