//! The per-link TC6 descriptor.
//!
//! [`Tc6`] owns everything one MAC-PHY link needs: the SPI transport, both
//! frame pools, the control and data scratch buffers and the flow-control
//! state. All buffers are allocated in [`Tc6::new`].
//!
//! Register access comes in two forms:
//! - `reg_read` / `reg_write` / `reg_update` perform the exchange at once
//! - `queue_reg_read` / `queue_reg_write` stage one transaction for the
//!   next [`thread`](Tc6::thread) call, with `take_reg_read` collecting a
//!   staged read's value
//!
//! # Example
//!
//! ```ignore
//! use oa_tc6::{Tc6, Tc6Config};
//! use oa_tc6::control::regs;
//!
//! let mut tc6 = Tc6::new(spi, Tc6Config::default())?;
//! let id = tc6.reg_read(regs::IDVER)?;
//!
//! tc6.send(0, &frame)?;
//! loop {
//!     tc6.thread()?;
//!     while let Some(frame) = tc6.try_recv()? {
//!         stack.input(frame.payload);
//!     }
//! }
//! ```

use crate::codec::Decoder;
use crate::config::Tc6Config;
use crate::control::{regs, ControlTransaction, RegAddr, CTRL_BUF_SIZE};
use crate::credits::{LinkState, Tc6Stats};
use crate::error::{Result, Tc6Error};
use crate::pool::{FrameBuffer, FrameId, FramePool};
use crate::protocol::Frame;
use crate::transport::SpiTransport;

/// One TC6 MAC-PHY link.
pub struct Tc6<T> {
    pub(crate) spi: T,
    pub(crate) config: Tc6Config,
    pub(crate) pool: FramePool,
    pub(crate) link: LinkState,
    pub(crate) decoder: Decoder,
    pub(crate) protected_spi: bool,
    /// Staged control transaction.
    pub(crate) pending: Option<ControlTransaction>,
    /// Value of the last completed staged read.
    pub(crate) read_value: Option<u32>,
    pub(crate) ctrl_buf: [u8; CTRL_BUF_SIZE],
    pub(crate) data_buf: Box<[u8]>,
    /// TX pool slots written by the current data exchange.
    pub(crate) drained: Vec<usize>,
}

impl<T: SpiTransport> Tc6<T> {
    /// Create a link over `spi`, allocating every buffer up front.
    pub fn new(spi: T, config: Tc6Config) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            tx_buffers = config.tx_buffers,
            rx_buffers = config.rx_buffers,
            max_frame_size = config.max_frame_size,
            "TC6 link created"
        );
        Ok(Self {
            spi,
            pool: FramePool::new(config.tx_buffers, config.rx_buffers, config.max_frame_size),
            link: LinkState::new(),
            decoder: Decoder::new(),
            protected_spi: config.protected_spi,
            pending: None,
            read_value: None,
            ctrl_buf: [0u8; CTRL_BUF_SIZE],
            data_buf: vec![0u8; config.data_buffer_len()].into_boxed_slice(),
            drained: Vec::with_capacity(config.tx_buffers),
            config,
        })
    }

    /// Link configuration.
    #[inline]
    pub fn config(&self) -> &Tc6Config {
        &self.config
    }

    /// Credits, control flags and latched status.
    #[inline]
    pub fn link(&self) -> &LinkState {
        &self.link
    }

    /// Error and traffic counters.
    #[inline]
    pub fn stats(&self) -> &Tc6Stats {
        self.link.stats()
    }

    /// Frame buffer pools.
    #[inline]
    pub fn pool(&self) -> &FramePool {
        &self.pool
    }

    /// The SPI transport.
    #[inline]
    pub fn transport(&self) -> &T {
        &self.spi
    }

    /// The SPI transport, mutably.
    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.spi
    }

    /// Give back the SPI transport.
    pub fn into_transport(self) -> T {
        self.spi
    }

    /// Check if control transactions carry value complements.
    #[inline]
    pub fn protected_spi(&self) -> bool {
        self.protected_spi
    }

    // ------------------------------------------------------------------
    // Frame buffers
    // ------------------------------------------------------------------

    /// Claim a free TX buffer. See [`FramePool::get_tx_frame`].
    pub fn get_tx_frame(&mut self) -> Result<&mut FrameBuffer> {
        self.pool.get_tx_frame()
    }

    /// Queue a filled TX buffer. See [`FramePool::put_tx_frame`].
    pub fn put_tx_frame(&mut self, id: FrameId) -> Result<()> {
        self.pool.put_tx_frame(id)
    }

    /// Take the oldest received frame. See [`FramePool::get_rx_frame`].
    pub fn get_rx_frame(&mut self) -> Result<&FrameBuffer> {
        self.pool.get_rx_frame()
    }

    /// Take the oldest received frame with a matching tag.
    pub fn get_rx_frame_matching(&mut self, vs: u8, mask: u8) -> Result<&FrameBuffer> {
        self.pool.get_rx_frame_matching(vs, mask)
    }

    /// Return a received frame's buffer. See [`FramePool::put_rx_frame`].
    pub fn put_rx_frame(&mut self, id: FrameId) -> Result<()> {
        self.pool.put_rx_frame(id)
    }

    /// Copy `frame` into a TX buffer tagged `vs` and queue it.
    pub fn send(&mut self, vs: u8, frame: &[u8]) -> Result<FrameId> {
        let max = self.config.max_frame_size;
        if frame.is_empty() || frame.len() > max {
            return Err(Tc6Error::InvalidLength {
                len: frame.len(),
                max,
            });
        }
        let buf = self.pool.get_tx_frame()?;
        buf.fill(frame)?;
        buf.set_vs(vs);
        let id = buf.id();
        self.pool.put_tx_frame(id)?;
        Ok(id)
    }

    /// Take the oldest received frame as an owned [`Frame`], returning its
    /// buffer to the pool.
    pub fn try_recv(&mut self) -> Result<Option<Frame>> {
        let (frame, id) = match self.pool.get_rx_frame() {
            Ok(buf) => (Frame::from_buffer(buf), buf.id()),
            Err(Tc6Error::NoFrameAvailable) => return Ok(None),
            Err(e) => return Err(e),
        };
        self.pool.put_rx_frame(id)?;
        Ok(Some(frame))
    }

    // ------------------------------------------------------------------
    // Control plane
    // ------------------------------------------------------------------

    /// Mark a control transaction outstanding, refusing a second one.
    fn claim_control(&mut self, txn: &ControlTransaction) -> Result<()> {
        if self.pending.is_some() || self.link.ctrl_outstanding() {
            return Err(Tc6Error::ControlBusy);
        }
        self.link.begin_control(txn.is_write());
        Ok(())
    }

    /// Stage a register read for the next `thread()` call.
    pub fn queue_reg_read(&mut self, addr: RegAddr) -> Result<()> {
        let txn = ControlTransaction::read(addr);
        self.claim_control(&txn)?;
        self.pending = Some(txn);
        Ok(())
    }

    /// Stage a register write for the next `thread()` call.
    pub fn queue_reg_write(&mut self, addr: RegAddr, value: u32) -> Result<()> {
        let txn = ControlTransaction::write(addr, value);
        self.claim_control(&txn)?;
        self.pending = Some(txn);
        Ok(())
    }

    /// Collect the value of a completed staged read.
    pub fn take_reg_read(&mut self) -> Option<u32> {
        self.read_value.take()
    }

    /// Perform the staged control transaction, if any.
    pub(crate) fn service_control(&mut self) -> Result<()> {
        let Some(txn) = self.pending.take() else {
            self.link.end_control();
            return Ok(());
        };
        let value = self.transact(&txn)?;
        if !txn.is_write() {
            self.read_value = Some(value);
        }
        Ok(())
    }

    /// Run one control exchange.
    ///
    /// The transaction is abandoned on any error. Both control flags are
    /// cleared either way and data credits are left alone.
    fn transact(&mut self, txn: &ControlTransaction) -> Result<u32> {
        let protected = self.protected_spi;
        let len = txn.encode(&mut self.ctrl_buf, protected);

        let exchanged = self.spi.exchange(&mut self.ctrl_buf[..len], true);
        self.link.end_control();
        exchanged?;
        self.link.stats.exchanges += 1;

        let value = txn.decode(&self.ctrl_buf[..len], protected)?;
        tracing::debug!(
            addr = %txn.addr,
            write = txn.is_write(),
            value = format_args!("{value:#010x}"),
            protected,
            "control transaction"
        );
        Ok(value)
    }

    /// Read a register.
    pub fn reg_read(&mut self, addr: RegAddr) -> Result<u32> {
        let txn = ControlTransaction::read(addr);
        self.claim_control(&txn)?;
        self.transact(&txn)
    }

    /// Write a register.
    pub fn reg_write(&mut self, addr: RegAddr, value: u32) -> Result<()> {
        let txn = ControlTransaction::write(addr, value);
        self.claim_control(&txn)?;
        self.transact(&txn)?;
        Ok(())
    }

    /// Read-modify-write: replace the bits selected by `mask` with those of
    /// `value`. Returns the value written.
    ///
    /// Not atomic against other control accesses to the same register.
    pub fn reg_update(&mut self, addr: RegAddr, mask: u32, value: u32) -> Result<u32> {
        let current = self.reg_read(addr)?;
        let updated = (current & !mask) | (value & mask);
        self.reg_write(addr, updated)?;
        Ok(updated)
    }

    /// Read and acknowledge STATUS0, then reset the EXST/HDRB latches.
    ///
    /// Returns the status bits that were set.
    pub fn clear_status(&mut self) -> Result<u32> {
        let status = self.reg_read(regs::STATUS0)?;
        if status != 0 {
            self.reg_write(regs::STATUS0, status)?;
        }
        self.link.clear_status_latches();
        Ok(status)
    }

    /// Switch protected control transactions on or off.
    ///
    /// CONFIG0.PROTE is updated in the current mode; the local codec
    /// switches once the write has gone through.
    pub fn set_protected_spi(&mut self, enable: bool) -> Result<()> {
        let bit = if enable { regs::CONFIG0_PROTE } else { 0 };
        self.reg_update(regs::CONFIG0, regs::CONFIG0_PROTE, bit)?;
        self.protected_spi = enable;
        tracing::debug!(enable, "protected control mode");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::protocol::{read_be32, write_be32, CtrlHeader};
    use std::collections::HashMap;

    /// Register file answering control exchanges; data exchanges are
    /// answered with zeroes.
    #[derive(Default)]
    struct Regs {
        values: HashMap<u32, u32>,
        lens: Vec<usize>,
        fail: bool,
    }

    impl SpiTransport for Regs {
        fn exchange(
            &mut self,
            buf: &mut [u8],
            _cs_change: bool,
        ) -> std::result::Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::Bus("no device".into()));
            }
            self.lens.push(buf.len());
            let word = read_be32(buf, 0);
            let header = CtrlHeader::from_word(word);
            let addr = RegAddr::new(header.mms, header.addr).raw();
            let value = if header.write {
                let value = read_be32(buf, 4);
                self.values.insert(addr, value);
                value
            } else {
                self.values.get(&addr).copied().unwrap_or(0)
            };
            write_be32(buf, 0, 0);
            write_be32(buf, 4, word);
            write_be32(buf, 8, value);
            if buf.len() == 16 {
                write_be32(buf, 12, !value);
            }
            Ok(())
        }
    }

    fn tc6() -> Tc6<Regs> {
        Tc6::new(Regs::default(), Tc6Config::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Tc6::new(Regs::default(), Tc6Config::default().with_tx_buffers(0));
        assert!(matches!(result, Err(Tc6Error::Config(_))));
    }

    #[test]
    fn test_reg_write_then_read() {
        let mut tc6 = tc6();
        tc6.reg_write(regs::IMASK0, 0x1234).unwrap();
        assert_eq!(tc6.reg_read(regs::IMASK0).unwrap(), 0x1234);
        assert_eq!(tc6.transport().lens, vec![12, 12]);
        assert!(!tc6.link().ctrl_outstanding());
        assert_eq!(tc6.stats().exchanges, 2);
    }

    #[test]
    fn test_reg_update_masks() {
        let mut tc6 = tc6();
        tc6.reg_write(regs::CONFIG0, 0xF0F0).unwrap();
        let written = tc6.reg_update(regs::CONFIG0, 0x00FF, 0x0F0F).unwrap();
        assert_eq!(written, 0xF00F);
        assert_eq!(tc6.transport().values[&regs::CONFIG0.raw()], 0xF00F);
    }

    #[test]
    fn test_set_protected_spi() {
        let mut tc6 = tc6();
        tc6.set_protected_spi(true).unwrap();
        assert!(tc6.protected_spi());
        assert_ne!(tc6.transport().values[&regs::CONFIG0.raw()] & regs::CONFIG0_PROTE, 0);

        tc6.reg_read(regs::IDVER).unwrap();
        assert_eq!(tc6.transport().lens.last(), Some(&16));
    }

    #[test]
    fn test_queue_twice_is_busy() {
        let mut tc6 = tc6();
        tc6.queue_reg_read(regs::STATUS0).unwrap();
        assert!(tc6.link().ctrl_rx_credit());
        assert!(matches!(
            tc6.queue_reg_write(regs::STATUS0, 1),
            Err(Tc6Error::ControlBusy)
        ));
        assert!(matches!(tc6.reg_read(regs::IDVER), Err(Tc6Error::ControlBusy)));
    }

    #[test]
    fn test_transport_error_clears_control() {
        let mut tc6 = tc6();
        tc6.transport_mut().fail = true;
        assert!(matches!(
            tc6.reg_read(regs::IDVER),
            Err(Tc6Error::Transport(_))
        ));
        assert!(!tc6.link().ctrl_outstanding());
        assert!(tc6.take_reg_read().is_none());

        tc6.transport_mut().fail = false;
        assert!(tc6.reg_read(regs::IDVER).is_ok());
    }

    #[test]
    fn test_send_validates_length() {
        let mut tc6 = tc6();
        assert!(matches!(
            tc6.send(0, &[]),
            Err(Tc6Error::InvalidLength { len: 0, .. })
        ));
        assert!(matches!(
            tc6.send(0, &vec![0u8; 1537]),
            Err(Tc6Error::InvalidLength { len: 1537, max: 1536 })
        ));
        assert!(tc6.send(1, b"frame").is_ok());
        assert!(tc6.pool().has_tx_ready());
    }

    #[test]
    fn test_try_recv_empty() {
        let mut tc6 = tc6();
        assert!(tc6.try_recv().unwrap().is_none());
    }
}
