//! Single-register control transaction codec.
//!
//! Each transaction is one full-duplex SPI exchange. The MAC-PHY shifts its
//! reply out one word late, so the echoed header lands in the second word
//! and the register value follows it:
//!
//! ```text
//! unprotected (12 bytes)
//!   TX  [header][value or 0][0]
//!   RX  [ignored][echoed header][value]
//! protected (16 bytes)
//!   TX  [header][value][!value][0]
//!   RX  [ignored][echoed header][value][!value]
//! ```

use crate::control::RegAddr;
use crate::error::{Result, Tc6Error};
use crate::protocol::{read_be32, write_be32, CtrlHeader, CTRL_HEADER_SIZE, REG_SIZE};

/// Size of the control scratch buffer: header, echo slot, value, complement.
pub const CTRL_BUF_SIZE: usize = 2 * CTRL_HEADER_SIZE + 2 * REG_SIZE;

/// Offset of the echoed header in the received exchange.
pub const ECHO_OFFSET: usize = CTRL_HEADER_SIZE;

/// Offset of the register value in the received exchange.
pub const VALUE_OFFSET: usize = 2 * CTRL_HEADER_SIZE;

/// Exchange length of one control transaction.
#[inline]
pub const fn exchange_len(protected: bool) -> usize {
    if protected {
        CTRL_BUF_SIZE
    } else {
        2 * CTRL_HEADER_SIZE + REG_SIZE
    }
}

/// Direction of a control transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOp {
    /// Read the register.
    Read,
    /// Write the value to the register.
    Write(u32),
}

/// One staged register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTransaction {
    /// Target register.
    pub addr: RegAddr,
    /// Read or write.
    pub op: ControlOp,
}

impl ControlTransaction {
    /// Stage a register read.
    pub fn read(addr: RegAddr) -> Self {
        Self {
            addr,
            op: ControlOp::Read,
        }
    }

    /// Stage a register write.
    pub fn write(addr: RegAddr, value: u32) -> Self {
        Self {
            addr,
            op: ControlOp::Write(value),
        }
    }

    /// Check if this is a write.
    #[inline]
    pub fn is_write(&self) -> bool {
        matches!(self.op, ControlOp::Write(_))
    }

    /// Control header for this access.
    pub fn header(&self) -> CtrlHeader {
        CtrlHeader::single(self.is_write(), self.addr.mms(), self.addr.offset())
    }

    /// Build the outgoing exchange into `buf` and return its length.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`exchange_len`].
    pub fn encode(&self, buf: &mut [u8], protected: bool) -> usize {
        let len = exchange_len(protected);
        let buf = &mut buf[..len];
        buf.fill(0);
        write_be32(buf, 0, self.header().to_word());
        if let ControlOp::Write(value) = self.op {
            write_be32(buf, CTRL_HEADER_SIZE, value);
            if protected {
                write_be32(buf, CTRL_HEADER_SIZE + REG_SIZE, !value);
            }
        }
        len
    }

    /// Check the received exchange and extract the register value.
    ///
    /// For writes the returned value is the one echoed back by the MAC-PHY.
    pub fn decode(&self, buf: &[u8], protected: bool) -> Result<u32> {
        let sent = self.header().to_word();
        let echoed = read_be32(buf, ECHO_OFFSET);
        if echoed != sent {
            return Err(Tc6Error::ControlEcho { sent, echoed });
        }
        let value = read_be32(buf, VALUE_OFFSET);
        if protected {
            let complement = read_be32(buf, VALUE_OFFSET + REG_SIZE);
            if complement != !value {
                return Err(Tc6Error::Integrity {
                    addr: self.addr.raw(),
                    value,
                    complement,
                });
            }
        }
        Ok(value)
    }
}
