//! Transfer scheduler.
//!
//! [`Tc6::thread`] is the engine's only entry point that moves data. It is
//! meant to be called from the host's own loop, typically whenever the
//! MAC-PHY raises its interrupt line and whenever a frame was queued, and
//! performs a bounded amount of work per call:
//!
//! 1. An outstanding control transaction gets one exchange of its own and
//!    the call returns.
//! 2. Without usable credits, BUFSTS is read to learn them.
//! 3. Up to `max_iterations` data exchanges follow, each carrying as many
//!    queued frames as TX credit allows plus empty chunks for RX credit.

use crate::codec::{chunks_for, Encoder};
use crate::control::regs;
use crate::error::Result;
use crate::tc6::Tc6;
use crate::transport::SpiTransport;

impl<T: SpiTransport> Tc6<T> {
    /// Run one scheduler pass.
    ///
    /// Returns the first error hit. A failed SPI exchange leaves the frames
    /// it carried queued and the credits unchanged, so calling again retries.
    pub fn thread(&mut self) -> Result<()> {
        // 1. Control transactions never share an exchange with data
        if self.link.ctrl_outstanding() {
            return self.service_control();
        }

        // 2. Poll credits when no footer can tell us anything new
        if !self.link.flags_valid() || (self.link.data_rx_credit() == 0 && self.tx_blocked()) {
            self.refresh_credits()?;
        }

        // 3. Data exchanges, bounded per call
        for iteration in 0..self.config.max_iterations {
            let tx_credit = self.link.data_tx_credit();
            let rx_credit = self.link.data_rx_credit();
            let want_tx = self.pool.has_tx_ready() && !self.tx_blocked();
            let want_rx = rx_credit > 0 && self.pool.rx_can_accept();
            if !want_tx && !want_rx {
                break;
            }

            let out = Encoder::encode(
                &self.pool,
                &mut self.data_buf,
                tx_credit,
                rx_credit,
                self.config.max_chunks_per_xfer,
                &mut self.drained,
            );
            if out.chunks() == 0 {
                break;
            }

            self.spi.exchange(&mut self.data_buf[..out.len], true)?;
            self.link.stats.exchanges += 1;

            for index in self.drained.drain(..) {
                self.pool.release_tx(index);
                self.link.stats.tx_frames += 1;
            }

            self.decoder
                .decode(&mut self.pool, &mut self.link, &self.data_buf[..out.len])?;

            tracing::debug!(
                iteration,
                data_chunks = out.data_chunks,
                empty_chunks = out.empty_chunks,
                frames = out.frames,
                tx_credit = self.link.data_tx_credit(),
                rx_credit = self.link.data_rx_credit(),
                "data exchange"
            );
        }
        Ok(())
    }

    /// Check if the oldest queued frame cannot go out with the current TX
    /// credit (or nothing is queued).
    fn tx_blocked(&self) -> bool {
        match self.pool.next_tx_ready(None) {
            Some(index) => {
                chunks_for(self.pool.tx(index).len()) > self.link.data_tx_credit() as usize
            }
            None => true,
        }
    }

    /// Learn TX and RX credits from the BUFSTS register.
    fn refresh_credits(&mut self) -> Result<()> {
        let bufsts = self.reg_read(regs::BUFSTS)?;
        self.link.update_credits_from_bufsts(bufsts);
        tracing::debug!(
            tx_credit = self.link.data_tx_credit(),
            rx_credit = self.link.data_rx_credit(),
            "credits refreshed from BUFSTS"
        );
        Ok(())
    }
}
