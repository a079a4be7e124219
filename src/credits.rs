//! Link-level flow control and transfer status.
//!
//! The MAC-PHY reports its buffer state in every received footer:
//! - `TXC`: chunks the host may still transmit
//! - `RCA`: chunks the MAC-PHY has waiting for the host
//!
//! [`LinkState`] holds the most recent values together with the two
//! control-transaction flags, the latched status bits and the error
//! counters. Only the scheduler and the decoder write to it.

use serde::Serialize;

use crate::control::regs;
use crate::protocol::{check_parity, DataFooter, MAX_CREDIT};

/// Wire anomaly and traffic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tc6Stats {
    /// Footers reporting a rejected TX header (HDRB).
    pub hdr_bad: u64,
    /// Footers with a parity error.
    pub ftr_parity: u64,
    /// Transitions of SYNC from set to clear.
    pub sync_lost: u64,
    /// Frames the MAC-PHY flagged for dropping (FD).
    pub fd_count: u64,
    /// Frame ends seen with no frame being received.
    pub invalid_ev: u64,
    /// Frame starts seen while another frame was half received.
    pub invalid_sv: u64,
    /// Frames discarded for exceeding the frame buffer.
    pub rx_overflow: u64,
    /// Frames received completely.
    pub rx_frames: u64,
    /// Frames transmitted.
    pub tx_frames: u64,
    /// SPI exchanges performed (control and data).
    pub exchanges: u64,
}

/// Credits, control flags and latched status of one link.
#[derive(Debug, Default)]
pub struct LinkState {
    data_tx_credit: u8,
    data_rx_credit: u8,
    ctrl_tx_credit: bool,
    ctrl_rx_credit: bool,
    exst: bool,
    hdrb: bool,
    sync: bool,
    flags_valid: bool,
    pub(crate) stats: Tc6Stats,
}

impl LinkState {
    /// Create a link with no credits and no status seen yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks the host may transmit.
    #[inline]
    pub fn data_tx_credit(&self) -> u8 {
        self.data_tx_credit
    }

    /// Chunks the MAC-PHY has ready for the host.
    #[inline]
    pub fn data_rx_credit(&self) -> u8 {
        self.data_rx_credit
    }

    /// A control write is outstanding.
    #[inline]
    pub fn ctrl_tx_credit(&self) -> bool {
        self.ctrl_tx_credit
    }

    /// A control read is outstanding.
    #[inline]
    pub fn ctrl_rx_credit(&self) -> bool {
        self.ctrl_rx_credit
    }

    /// Either control flag is set.
    #[inline]
    pub fn ctrl_outstanding(&self) -> bool {
        self.ctrl_tx_credit || self.ctrl_rx_credit
    }

    /// Extended status was reported since the last clear.
    #[inline]
    pub fn exst(&self) -> bool {
        self.exst
    }

    /// A TX header was rejected since the last clear.
    #[inline]
    pub fn hdrb(&self) -> bool {
        self.hdrb
    }

    /// SYNC as reported by the most recent footer.
    #[inline]
    pub fn sync(&self) -> bool {
        self.sync
    }

    /// At least one footer has been received.
    #[inline]
    pub fn flags_valid(&self) -> bool {
        self.flags_valid
    }

    /// Error and traffic counters.
    #[inline]
    pub fn stats(&self) -> &Tc6Stats {
        &self.stats
    }

    /// Latch the status bits of one received footer.
    pub(crate) fn latch_footer(&mut self, word: u32, footer: &DataFooter) {
        if !check_parity(word) {
            self.stats.ftr_parity += 1;
            tracing::warn!(footer = format_args!("{word:#010x}"), "footer parity error");
        }
        if footer.hdrb {
            self.stats.hdr_bad += 1;
            tracing::warn!("MAC-PHY rejected a data header");
        }
        if self.flags_valid && self.sync && !footer.sync {
            self.stats.sync_lost += 1;
            tracing::warn!("MAC-PHY lost configuration sync");
        }
        self.exst |= footer.exst;
        self.hdrb |= footer.hdrb;
        self.sync = footer.sync;
        self.flags_valid = true;
    }

    /// Take the credits reported by the last footer of an exchange.
    pub(crate) fn update_credits(&mut self, footer: &DataFooter) {
        self.data_tx_credit = footer.txc;
        self.data_rx_credit = footer.rca;
    }

    /// Take the credits reported by the BUFSTS register.
    pub(crate) fn update_credits_from_bufsts(&mut self, value: u32) {
        let field = |shift: u32| {
            let credit = (value >> shift) & regs::BUFSTS_MASK;
            credit.min(MAX_CREDIT) as u8
        };
        self.data_tx_credit = field(regs::BUFSTS_TXC_SHIFT);
        self.data_rx_credit = field(regs::BUFSTS_RCA_SHIFT);
    }

    /// Mark a control transaction outstanding.
    pub(crate) fn begin_control(&mut self, write: bool) {
        if write {
            self.ctrl_tx_credit = true;
        } else {
            self.ctrl_rx_credit = true;
        }
    }

    /// Clear both control flags.
    pub(crate) fn end_control(&mut self) {
        self.ctrl_tx_credit = false;
        self.ctrl_rx_credit = false;
    }

    /// Reset the sticky EXST/HDRB latches.
    pub(crate) fn clear_status_latches(&mut self) {
        self.exst = false;
        self.hdrb = false;
    }
}
