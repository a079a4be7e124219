//! Data-plane decoder: received chunks to frames.
//!
//! Each received unit is `[payload (64)][footer (4)]`. The footer says
//! whether the payload carries frame data and where frames start (`SWO`,
//! in 32-bit words) and end (`EBO`, in bytes):
//!
//! ```text
//! SV EV  SWO*4 > EBO   meaning
//! 0  0                 continuation of the frame in progress
//! 1  0                 frame starts at SWO*4 and runs to the chunk end
//! 0  1                 frame in progress ends at EBO
//! 1  1   no            whole frame in [SWO*4, EBO]
//! 1  1   yes           frame ends at EBO, next frame starts at SWO*4
//! ```
//!
//! A receive buffer is claimed only when a frame actually starts, so an
//! idle link holds no buffer in `RX_IN_PROGRESS`.

use crate::credits::LinkState;
use crate::error::Result;
use crate::pool::FramePool;
use crate::protocol::{read_be32, DataFooter, CHUNK_PAYLOAD_SIZE, CHUNK_SIZE};

/// Receive reassembly state carried across exchanges.
#[derive(Debug, Default)]
pub struct Decoder {
    /// Skip frame data until the next start (overflow or lost buffer).
    discarding: bool,
}

impl Decoder {
    /// Create a decoder with no frame in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if frame data is being skipped until the next start.
    #[inline]
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Process one exchange's worth of received chunks.
    ///
    /// Every footer is latched and credits are taken from the last one,
    /// even when a frame is lost for want of a receive buffer. In that case
    /// the frame is skipped up to the next start and the first such error is
    /// returned once the whole exchange has been walked.
    pub fn decode(
        &mut self,
        pool: &mut FramePool,
        link: &mut LinkState,
        buf: &[u8],
    ) -> Result<()> {
        let mut last = None;
        let mut failed = None;

        for (n, chunk) in buf.chunks_exact(CHUNK_SIZE).enumerate() {
            let word = read_be32(chunk, CHUNK_PAYLOAD_SIZE);
            let footer = DataFooter::from_word(word);
            tracing::trace!(
                chunk = n,
                footer = format_args!("{word:#010x}"),
                "rx chunk"
            );
            link.latch_footer(word, &footer);
            last = Some(footer);

            if !footer.dv {
                continue;
            }
            let payload = &chunk[..CHUNK_PAYLOAD_SIZE];
            let start = footer.start_byte_offset();
            let end = footer.end_byte_offset();

            let started = match (footer.sv, footer.ev) {
                (true, true) if start > end => {
                    self.end_frame(pool, link, &payload[..=end], &footer);
                    self.start_frame(pool, link, &payload[start..], footer.vs)
                }
                (true, true) => {
                    let started = self.start_frame(pool, link, &payload[start..=end], footer.vs);
                    self.end_frame(pool, link, &[], &footer);
                    started
                }
                (true, false) => self.start_frame(pool, link, &payload[start..], footer.vs),
                (false, true) => {
                    self.end_frame(pool, link, &payload[..=end], &footer);
                    Ok(())
                }
                (false, false) => {
                    self.continue_frame(pool, link, payload);
                    Ok(())
                }
            };
            if let Err(e) = started {
                tracing::warn!(chunk = n, "no receive buffer for frame start, frame dropped");
                failed.get_or_insert(e);
            }
        }

        if let Some(footer) = last {
            link.update_credits(&footer);
        }
        failed.map_or(Ok(()), Err)
    }

    fn start_frame(
        &mut self,
        pool: &mut FramePool,
        link: &mut LinkState,
        bytes: &[u8],
        vs: u8,
    ) -> Result<()> {
        self.discarding = false;
        let index = match pool.rx_in_progress() {
            Some(index) => {
                if pool.rx_mut(index).cursor() > 0 {
                    link.stats.invalid_sv += 1;
                    tracing::warn!("frame start while a frame was in progress, restarting");
                }
                index
            }
            None => match pool.get_empty_rx_buffer(true) {
                Ok(index) => index,
                Err(e) => {
                    self.discarding = true;
                    return Err(e);
                }
            },
        };
        pool.restart_rx(index, vs);
        self.append(pool, link, index, bytes);
        Ok(())
    }

    fn continue_frame(&mut self, pool: &mut FramePool, link: &mut LinkState, bytes: &[u8]) {
        if self.discarding {
            return;
        }
        match pool.rx_in_progress() {
            Some(index) => {
                self.append(pool, link, index, bytes);
            }
            None => tracing::debug!("frame data with no frame in progress, skipped"),
        }
    }

    fn end_frame(
        &mut self,
        pool: &mut FramePool,
        link: &mut LinkState,
        bytes: &[u8],
        footer: &DataFooter,
    ) {
        if self.discarding {
            self.discarding = false;
            return;
        }
        let Some(index) = pool.rx_in_progress() else {
            link.stats.invalid_ev += 1;
            tracing::warn!("frame end with no frame in progress");
            return;
        };
        if !self.append(pool, link, index, bytes) {
            self.discarding = false;
            return;
        }
        if footer.fd {
            link.stats.fd_count += 1;
        }
        pool.complete_rx(index, footer.fd, footer.rtsa, footer.rtsp);
        link.stats.rx_frames += 1;
        tracing::trace!(len = pool.rx_mut(index).len(), vs = footer.vs, "rx frame complete");
    }

    /// Append to a buffer, dropping the frame if it overflows.
    fn append(
        &mut self,
        pool: &mut FramePool,
        link: &mut LinkState,
        index: usize,
        bytes: &[u8],
    ) -> bool {
        let buf = pool.rx_mut(index);
        if buf.append(bytes) {
            return true;
        }
        let capacity = buf.capacity();
        pool.abort_rx(index);
        link.stats.rx_overflow += 1;
        self.discarding = true;
        tracing::warn!(capacity, "received frame exceeds the frame buffer, dropped");
        false
    }
}
