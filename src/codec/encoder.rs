//! Data-plane encoder: queued TX frames to a run of chunks.
//!
//! Frames are emitted whole, in submission order, each starting on a
//! chunk boundary. When fewer data chunks than the MAC-PHY's RX credit
//! were written, empty chunks (`DV=0`) follow so the exchange clocks out
//! the waiting receive data.
//!
//! The encoder does not touch buffer states. It reports the drained
//! frames and the scheduler frees them once the exchange went through.

use crate::pool::FramePool;
use crate::protocol::{DataHeader, CHUNK_PAYLOAD_SIZE, CHUNK_SIZE, HEADER_SIZE};

/// Chunks needed to carry a frame of `len` bytes.
#[inline]
pub fn chunks_for(len: usize) -> usize {
    (len + CHUNK_PAYLOAD_SIZE - 1) / CHUNK_PAYLOAD_SIZE
}

/// Result of one encoder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOutcome {
    /// Bytes written, i.e. the SPI exchange length.
    pub len: usize,
    /// Chunks carrying frame data.
    pub data_chunks: usize,
    /// Empty chunks written to pull receive data.
    pub empty_chunks: usize,
    /// Frames fully written.
    pub frames: usize,
}

impl EncodeOutcome {
    /// Total chunks written.
    #[inline]
    pub fn chunks(&self) -> usize {
        self.data_chunks + self.empty_chunks
    }
}

/// Stateless chunk encoder.
pub struct Encoder;

impl Encoder {
    /// Fill `buf` with chunks for the next exchange.
    ///
    /// Data chunks are bounded by `tx_credit` and by `max_chunks` (and the
    /// room in `buf`). Indices of the frames written are collected in
    /// `drained`, which is cleared first.
    pub fn encode(
        pool: &FramePool,
        buf: &mut [u8],
        tx_credit: u8,
        rx_credit: u8,
        max_chunks: usize,
        drained: &mut Vec<usize>,
    ) -> EncodeOutcome {
        drained.clear();
        let buffer_limit = (buf.len() / CHUNK_SIZE).min(max_chunks);
        let data_limit = buffer_limit.min(tx_credit as usize);
        let norx = !pool.rx_can_accept();
        let mut outcome = EncodeOutcome::default();
        let mut written = 0;

        let mut last_seq = None;
        while let Some(index) = pool.next_tx_ready(last_seq) {
            let frame = pool.tx(index);
            let needed = chunks_for(frame.len());
            if written + needed > data_limit {
                break;
            }

            let data = frame.data();
            for (i, payload) in data.chunks(CHUNK_PAYLOAD_SIZE).enumerate() {
                let last = i + 1 == needed;
                let header = DataHeader {
                    norx,
                    vs: frame.vs(),
                    dv: true,
                    sv: i == 0,
                    swo: 0,
                    ev: last,
                    ebo: if last { (payload.len() - 1) as u8 } else { 0 },
                };
                let chunk = &mut buf[written * CHUNK_SIZE..(written + 1) * CHUNK_SIZE];
                header.encode_into(chunk);
                let body = &mut chunk[HEADER_SIZE..];
                body[..payload.len()].copy_from_slice(payload);
                body[payload.len()..].fill(0);
                tracing::trace!(
                    chunk = written,
                    header = format_args!("{:#010x}", header.to_word()),
                    "tx data chunk"
                );
                written += 1;
            }

            drained.push(index);
            last_seq = Some(pool.tx_seq(index));
            outcome.frames += 1;
        }
        outcome.data_chunks = written;

        let empty_target = buffer_limit.min(rx_credit as usize);
        let empty_header = DataHeader::empty(norx);
        while written < empty_target {
            let chunk = &mut buf[written * CHUNK_SIZE..(written + 1) * CHUNK_SIZE];
            empty_header.encode_into(chunk);
            chunk[HEADER_SIZE..].fill(0);
            written += 1;
        }
        outcome.empty_chunks = written - outcome.data_chunks;
        outcome.len = written * CHUNK_SIZE;
        outcome
    }
}
