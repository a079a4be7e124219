//! Register addressing and the standard TC6 register map.

use std::fmt;

/// Packed register address: memory map selector in bits 19:16, offset in
/// bits 15:0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegAddr(u32);

impl RegAddr {
    /// Address `offset` within memory map `mms` (truncated to 4 bits).
    pub const fn new(mms: u8, offset: u16) -> Self {
        Self((((mms & 0xF) as u32) << 16) | offset as u32)
    }

    /// Wrap an already packed address. Bits above 19 are dropped.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & 0x000F_FFFF)
    }

    /// Packed 32-bit form.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Memory map selector.
    #[inline]
    pub const fn mms(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Offset within the memory map.
    #[inline]
    pub const fn offset(self) -> u16 {
        self.0 as u16
    }
}

impl From<u32> for RegAddr {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for RegAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:#06x}", self.mms(), self.offset())
    }
}

/// Standard registers of memory map 0, common to every TC6 MAC-PHY.
pub mod regs {
    use super::RegAddr;

    /// Identification and version.
    pub const IDVER: RegAddr = RegAddr::new(0, 0x00);
    /// PHY identification.
    pub const PHYID: RegAddr = RegAddr::new(0, 0x01);
    /// Standard capabilities.
    pub const STDCAP: RegAddr = RegAddr::new(0, 0x02);
    /// Reset control and status.
    pub const RESET: RegAddr = RegAddr::new(0, 0x03);
    /// Configuration 0.
    pub const CONFIG0: RegAddr = RegAddr::new(0, 0x04);
    /// Status 0 (write 1 to clear).
    pub const STATUS0: RegAddr = RegAddr::new(0, 0x08);
    /// Status 1 (write 1 to clear).
    pub const STATUS1: RegAddr = RegAddr::new(0, 0x09);
    /// Buffer status: TX credits and RX chunks available.
    pub const BUFSTS: RegAddr = RegAddr::new(0, 0x0B);
    /// Interrupt mask 0.
    pub const IMASK0: RegAddr = RegAddr::new(0, 0x0C);
    /// Interrupt mask 1.
    pub const IMASK1: RegAddr = RegAddr::new(0, 0x0D);

    /// RESET: software reset.
    pub const RESET_SWRESET: u32 = 1 << 0;

    /// CONFIG0: configuration synchronised.
    pub const CONFIG0_SYNC: u32 = 1 << 15;
    /// CONFIG0: protected control transactions.
    pub const CONFIG0_PROTE: u32 = 1 << 5;

    /// STATUS0: reset complete.
    pub const STATUS0_RESETC: u32 = 1 << 6;
    /// STATUS0: header error.
    pub const STATUS0_HDRE: u32 = 1 << 5;
    /// STATUS0: loss of frame error.
    pub const STATUS0_LOFE: u32 = 1 << 4;
    /// STATUS0: receive buffer overflow.
    pub const STATUS0_RXBOE: u32 = 1 << 3;
    /// STATUS0: transmit buffer underflow.
    pub const STATUS0_TXBUE: u32 = 1 << 2;
    /// STATUS0: transmit buffer overflow.
    pub const STATUS0_TXBOE: u32 = 1 << 1;
    /// STATUS0: transmit protocol error.
    pub const STATUS0_TXPE: u32 = 1 << 0;

    /// BUFSTS: transmit credits shift.
    pub const BUFSTS_TXC_SHIFT: u32 = 8;
    /// BUFSTS: receive chunks available shift.
    pub const BUFSTS_RCA_SHIFT: u32 = 0;
    /// BUFSTS: field mask (unshifted).
    pub const BUFSTS_MASK: u32 = 0xFF;
}
