//! Simulated TC6 MAC-PHY shared by the integration tests.
//!
//! The mock answers control exchanges from a register map and runs the
//! data side of the protocol: it reassembles the frames the host sends and
//! streams queued receive frames back through footers, one frame start per
//! chunk, advertising RCA and TXC like a real device.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use oa_tc6::control::{regs, RegAddr};
use oa_tc6::protocol::{
    bits, read_be32, write_be32, CtrlHeader, DataFooter, DataHeader, CHUNK_PAYLOAD_SIZE,
    CHUNK_SIZE, HEADER_SIZE, MAX_CREDIT,
};
use oa_tc6::{SpiTransport, TransportError};

/// One successful SPI exchange as seen on MOSI.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Bytes sent by the host.
    pub tx: Vec<u8>,
    /// Chip-select release hint.
    pub cs_change: bool,
}

impl Exchange {
    /// Check if this was a control transaction.
    pub fn is_control(&self) -> bool {
        !bits::has(read_be32(&self.tx, 0), bits::DNC)
    }

    /// Decoded data headers, one per chunk.
    pub fn headers(&self) -> Vec<DataHeader> {
        self.tx
            .chunks_exact(CHUNK_SIZE)
            .map(|chunk| DataHeader::from_word(read_be32(chunk, 0)))
            .collect()
    }

    /// Chunks carrying frame data.
    pub fn data_chunks(&self) -> usize {
        self.headers().iter().filter(|h| h.dv).count()
    }

    /// Chunks sent only to pull receive data.
    pub fn empty_chunks(&self) -> usize {
        self.headers().iter().filter(|h| !h.dv).count()
    }
}

/// A frame being streamed to the host.
struct Outgoing {
    vs: u8,
    data: Vec<u8>,
    offset: usize,
}

/// Simulated MAC-PHY.
pub struct MockMacPhy {
    regs: HashMap<u32, u32>,
    /// TX credits advertised in every footer and in BUFSTS.
    pub txc: u8,
    /// EXST reported in every footer.
    pub exst: bool,
    /// Flip one bit of the complement word of protected responses.
    pub corrupt_complement: bool,
    /// Set HDRB in echoed control headers.
    pub corrupt_echo: bool,
    /// Fail this many upcoming data exchanges.
    pub fail_data: usize,
    /// Fail this many upcoming control exchanges.
    pub fail_control: usize,
    /// Frames received from the host, with their tags.
    pub tx_frames: Vec<(u8, Vec<u8>)>,
    tx_partial: Option<(u8, Vec<u8>)>,
    rx_queue: VecDeque<(u8, Vec<u8>)>,
    rx_current: Option<Outgoing>,
    /// Every successful exchange.
    pub log: Vec<Exchange>,
}

impl MockMacPhy {
    /// Device with full TX credit and nothing to send.
    pub fn new() -> Self {
        let mut regs = HashMap::new();
        regs.insert(regs::IDVER.raw(), 0x0000_0011);
        regs.insert(regs::PHYID.raw(), 0x0283_BC91);
        regs.insert(regs::CONFIG0.raw(), regs::CONFIG0_SYNC);
        Self {
            regs,
            txc: MAX_CREDIT as u8,
            exst: false,
            corrupt_complement: false,
            corrupt_echo: false,
            fail_data: 0,
            fail_control: 0,
            tx_frames: Vec::new(),
            tx_partial: None,
            rx_queue: VecDeque::new(),
            rx_current: None,
            log: Vec::new(),
        }
    }

    /// Register value as the device holds it.
    pub fn reg(&self, addr: RegAddr) -> u32 {
        self.regs.get(&addr.raw()).copied().unwrap_or(0)
    }

    /// Set a register behind the host's back.
    pub fn set_reg(&mut self, addr: RegAddr, value: u32) {
        self.regs.insert(addr.raw(), value);
    }

    /// Queue a frame for the host.
    pub fn queue_rx(&mut self, vs: u8, frame: &[u8]) {
        assert!(!frame.is_empty());
        self.rx_queue.push_back((vs, frame.to_vec()));
    }

    /// Frames not yet fully streamed to the host.
    pub fn rx_pending(&self) -> usize {
        self.rx_queue.len() + usize::from(self.rx_current.is_some())
    }

    /// Receive chunks waiting, as RCA reports them.
    pub fn rca(&self) -> u8 {
        let chunks = |len: usize| (len + CHUNK_PAYLOAD_SIZE - 1) / CHUNK_PAYLOAD_SIZE;
        let current = self
            .rx_current
            .as_ref()
            .map_or(0, |out| chunks(out.data.len() - out.offset));
        let queued: usize = self.rx_queue.iter().map(|(_, f)| chunks(f.len())).sum();
        (current + queued).min(MAX_CREDIT as usize) as u8
    }

    /// Logged control exchanges.
    pub fn control_exchanges(&self) -> Vec<&Exchange> {
        self.log.iter().filter(|e| e.is_control()).collect()
    }

    /// Logged data exchanges.
    pub fn data_exchanges(&self) -> Vec<&Exchange> {
        self.log.iter().filter(|e| !e.is_control()).collect()
    }

    fn read_reg(&self, addr: RegAddr) -> u32 {
        if addr == regs::BUFSTS {
            return ((self.txc as u32) << regs::BUFSTS_TXC_SHIFT) | self.rca() as u32;
        }
        self.reg(addr)
    }

    fn write_reg(&mut self, addr: RegAddr, value: u32) {
        if addr == regs::STATUS0 || addr == regs::STATUS1 {
            let current = self.reg(addr);
            self.set_reg(addr, current & !value);
        } else {
            self.set_reg(addr, value);
        }
    }

    /// Answer a control exchange. The reply trails the request by one
    /// word: junk, echoed header, value, then the complement if protected.
    fn control(&mut self, buf: &mut [u8]) {
        let word = read_be32(buf, 0);
        let header = CtrlHeader::from_word(word);
        let addr = RegAddr::new(header.mms, header.addr);
        let protected = buf.len() == 16;

        let value = if header.write {
            let value = read_be32(buf, 4);
            if protected && read_be32(buf, 8) != !value {
                buf.fill(0);
                write_be32(buf, 4, word | bits::HDRB);
                return;
            }
            self.write_reg(addr, value);
            value
        } else {
            self.read_reg(addr)
        };

        let echoed = if self.corrupt_echo { word | bits::HDRB } else { word };
        buf.fill(0);
        write_be32(buf, 4, echoed);
        write_be32(buf, 8, value);
        if protected {
            let flip = u32::from(self.corrupt_complement);
            write_be32(buf, 12, !value ^ flip);
        }
    }

    fn take_tx(&mut self, header: &DataHeader, payload: &[u8]) {
        let start = header.swo as usize * 4;
        let end = if header.ev {
            header.ebo as usize + 1
        } else {
            CHUNK_PAYLOAD_SIZE
        };
        if header.sv {
            assert!(self.tx_partial.is_none(), "frame start inside a frame");
            self.tx_partial = Some((header.vs, payload[start..end].to_vec()));
        } else {
            let (_, data) = self
                .tx_partial
                .as_mut()
                .expect("frame data without a start");
            data.extend_from_slice(&payload[..end]);
        }
        if header.ev {
            if let Some(frame) = self.tx_partial.take() {
                self.tx_frames.push(frame);
            }
        }
    }

    fn fill_rx(&mut self, payload: &mut [u8], footer: &mut DataFooter) {
        if self.rx_current.is_none() {
            self.rx_current = self
                .rx_queue
                .pop_front()
                .map(|(vs, data)| Outgoing { vs, data, offset: 0 });
        }
        let Some(out) = self.rx_current.as_mut() else {
            return;
        };
        let n = (out.data.len() - out.offset).min(CHUNK_PAYLOAD_SIZE);
        payload[..n].copy_from_slice(&out.data[out.offset..out.offset + n]);
        footer.dv = true;
        footer.vs = out.vs;
        footer.sv = out.offset == 0;
        out.offset += n;
        if out.offset == out.data.len() {
            footer.ev = true;
            footer.ebo = (n - 1) as u8;
            self.rx_current = None;
        }
    }

    fn data(&mut self, buf: &mut [u8]) {
        for chunk in buf.chunks_exact_mut(CHUNK_SIZE) {
            let header = DataHeader::from_word(read_be32(chunk, 0));
            if header.dv {
                let payload = chunk[HEADER_SIZE..].to_vec();
                self.take_tx(&header, &payload);
            }

            let mut payload = [0u8; CHUNK_PAYLOAD_SIZE];
            let mut footer = DataFooter {
                sync: true,
                exst: self.exst,
                ..DataFooter::default()
            };
            if !header.norx {
                self.fill_rx(&mut payload, &mut footer);
            }
            footer.rca = self.rca();
            footer.txc = self.txc;
            chunk[..CHUNK_PAYLOAD_SIZE].copy_from_slice(&payload);
            write_be32(chunk, CHUNK_PAYLOAD_SIZE, footer.to_word());
        }
    }
}

impl Default for MockMacPhy {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiTransport for MockMacPhy {
    fn exchange(&mut self, buf: &mut [u8], cs_change: bool) -> Result<(), TransportError> {
        let control = !bits::has(read_be32(buf, 0), bits::DNC);
        if control && self.fail_control > 0 {
            self.fail_control -= 1;
            return Err(TransportError::Bus("control exchange failed".into()));
        }
        if !control && self.fail_data > 0 {
            self.fail_data -= 1;
            return Err(TransportError::Bus("data exchange failed".into()));
        }

        self.log.push(Exchange {
            tx: buf.to_vec(),
            cs_change,
        });
        if control {
            self.control(buf);
        } else {
            assert_eq!(buf.len() % CHUNK_SIZE, 0, "partial chunk on the wire");
            self.data(buf);
        }
        Ok(())
    }
}
