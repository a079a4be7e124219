//! Fixed pool of transmit and receive frame buffers.
//!
//! Every buffer is allocated once when the pool is created and then cycles
//! through the states below. The state says who owns the buffer contents:
//!
//! ```text
//! FREE --get_tx_frame--> TX_BUSY --put_tx_frame--> TX_READY --drained--> FREE
//! FREE --decoder--> RX_IN_PROGRESS --frame end--> RX_COMPLETE
//! RX_COMPLETE --get_rx_frame--> RX_USER_OWNED --put_rx_frame--> FREE
//! ```
//!
//! No other code path changes a buffer's state.
//!
//! # Usage
//!
//! ```
//! use oa_tc6::pool::{FramePool, FrameState};
//!
//! let mut pool = FramePool::new(2, 2, 1536);
//! let buf = pool.get_tx_frame().unwrap();
//! buf.fill(b"frame bytes").unwrap();
//! let id = buf.id();
//! pool.put_tx_frame(id).unwrap();
//! assert_eq!(pool.frame(id).unwrap().state(), FrameState::TxReady);
//! ```

use crate::error::{Result, Tc6Error};

/// Lifecycle state of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Unused, owned by the pool.
    Free,
    /// Handed to the application for filling.
    TxBusy,
    /// Queued for transmission, owned by the scheduler.
    TxReady,
    /// Being reassembled from received chunks.
    RxInProgress,
    /// Fully received, waiting for the application.
    RxComplete,
    /// Handed to the application for reading.
    RxUserOwned,
}

/// Which pool a buffer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Transmit pool.
    Tx,
    /// Receive pool.
    Rx,
}

/// Handle naming one buffer of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId {
    dir: Direction,
    index: usize,
}

impl FrameId {
    /// Pool the buffer belongs to.
    pub fn direction(&self) -> Direction {
        self.dir
    }

    /// Slot index within its pool.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// One Ethernet frame in flight.
#[derive(Debug)]
pub struct FrameBuffer {
    data: Box<[u8]>,
    index: usize,
    len: usize,
    vs: u8,
    frame_drop: bool,
    rtsa: bool,
    rtsp: bool,
    state: FrameState,
    seq: u64,
    id: FrameId,
}

impl FrameBuffer {
    fn new(id: FrameId, capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            index: 0,
            len: 0,
            vs: 0,
            frame_drop: false,
            rtsa: false,
            rtsp: false,
            state: FrameState::Free,
            seq: 0,
            id,
        }
    }

    /// Handle used to return the buffer to the pool.
    #[inline]
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Maximum frame size this buffer holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Valid frame length.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer holds no frame bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reassembly cursor (bytes written so far while receiving).
    #[inline]
    pub fn cursor(&self) -> usize {
        self.index
    }

    /// The valid frame bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The whole data area, for filling a transmit frame in place.
    ///
    /// Call [`set_len`](Self::set_len) afterwards.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Set the valid frame length after writing through `data_mut`.
    pub fn set_len(&mut self, len: usize) -> Result<()> {
        if len > self.capacity() {
            return Err(Tc6Error::InvalidLength {
                len,
                max: self.capacity(),
            });
        }
        self.len = len;
        Ok(())
    }

    /// Copy a frame into the buffer and set its length.
    pub fn fill(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() > self.capacity() {
            return Err(Tc6Error::InvalidLength {
                len: frame.len(),
                max: self.capacity(),
            });
        }
        self.data[..frame.len()].copy_from_slice(frame);
        self.len = frame.len();
        Ok(())
    }

    /// Vendor-specific 2-bit tag.
    #[inline]
    pub fn vs(&self) -> u8 {
        self.vs
    }

    /// Set the vendor-specific tag (truncated to 2 bits).
    #[inline]
    pub fn set_vs(&mut self, vs: u8) {
        self.vs = vs & 0x3;
    }

    /// Frame-drop flag latched from the terminating footer.
    #[inline]
    pub fn frame_drop(&self) -> bool {
        self.frame_drop
    }

    /// Timestamp-added flag latched from the terminating footer.
    #[inline]
    pub fn rtsa(&self) -> bool {
        self.rtsa
    }

    /// Timestamp-parity flag latched from the terminating footer.
    #[inline]
    pub fn rtsp(&self) -> bool {
        self.rtsp
    }

    /// Append received bytes at the cursor.
    ///
    /// Returns `false` without writing if the bytes do not fit.
    pub(crate) fn append(&mut self, bytes: &[u8]) -> bool {
        let end = self.index + bytes.len();
        if end > self.data.len() {
            return false;
        }
        self.data[self.index..end].copy_from_slice(bytes);
        self.index = end;
        true
    }

    fn reset(&mut self) {
        self.index = 0;
        self.len = 0;
        self.vs = 0;
        self.frame_drop = false;
        self.rtsa = false;
        self.rtsp = false;
    }
}

/// Fixed-capacity transmit and receive buffer pools.
#[derive(Debug)]
pub struct FramePool {
    tx: Vec<FrameBuffer>,
    rx: Vec<FrameBuffer>,
    next_seq: u64,
}

impl FramePool {
    /// Allocate `tx_count` and `rx_count` buffers of `frame_size` bytes each.
    pub fn new(tx_count: usize, rx_count: usize, frame_size: usize) -> Self {
        let make = |dir: Direction, count: usize| -> Vec<FrameBuffer> {
            (0..count)
                .map(|index| FrameBuffer::new(FrameId { dir, index }, frame_size))
                .collect()
        };
        Self {
            tx: make(Direction::Tx, tx_count),
            rx: make(Direction::Rx, rx_count),
            next_seq: 0,
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }

    /// Look up a buffer by handle.
    pub fn frame(&self, id: FrameId) -> Option<&FrameBuffer> {
        match id.dir {
            Direction::Tx => self.tx.get(id.index),
            Direction::Rx => self.rx.get(id.index),
        }
    }

    fn frame_mut(&mut self, id: FrameId) -> Result<&mut FrameBuffer> {
        let buf = match id.dir {
            Direction::Tx => self.tx.get_mut(id.index),
            Direction::Rx => self.rx.get_mut(id.index),
        };
        buf.ok_or(Tc6Error::NoFrameAvailable)
    }

    /// Number of buffers of a pool in `state`.
    pub fn count(&self, dir: Direction, state: FrameState) -> usize {
        let bufs = match dir {
            Direction::Tx => &self.tx,
            Direction::Rx => &self.rx,
        };
        bufs.iter().filter(|b| b.state == state).count()
    }

    // ------------------------------------------------------------------
    // Application side
    // ------------------------------------------------------------------

    /// Claim a free transmit buffer with a cleared data area.
    pub fn get_tx_frame(&mut self) -> Result<&mut FrameBuffer> {
        let buf = self
            .tx
            .iter_mut()
            .find(|b| b.state == FrameState::Free)
            .ok_or(Tc6Error::NoBuffersAvailable)?;
        buf.data.fill(0);
        buf.reset();
        buf.state = FrameState::TxBusy;
        Ok(buf)
    }

    /// Queue a filled transmit buffer for sending.
    pub fn put_tx_frame(&mut self, id: FrameId) -> Result<()> {
        let seq = self.next_seq;
        let buf = self.frame_mut(id)?;
        if id.dir != Direction::Tx || buf.state != FrameState::TxBusy {
            return Err(Tc6Error::InvalidState {
                expected: FrameState::TxBusy,
                found: buf.state,
            });
        }
        if buf.len == 0 {
            return Err(Tc6Error::InvalidLength {
                len: 0,
                max: buf.capacity(),
            });
        }
        buf.seq = seq;
        buf.state = FrameState::TxReady;
        self.bump_seq();
        Ok(())
    }

    /// Take the oldest completed receive frame.
    pub fn get_rx_frame(&mut self) -> Result<&FrameBuffer> {
        self.get_rx_frame_matching(0, 0)
    }

    /// Take the oldest completed receive frame whose tag matches
    /// `vs` under `mask`.
    pub fn get_rx_frame_matching(&mut self, vs: u8, mask: u8) -> Result<&FrameBuffer> {
        let index = self
            .rx
            .iter()
            .filter(|b| b.state == FrameState::RxComplete && b.vs & mask == vs & mask)
            .min_by_key(|b| b.seq)
            .map(|b| b.id.index)
            .ok_or(Tc6Error::NoFrameAvailable)?;
        let buf = &mut self.rx[index];
        buf.state = FrameState::RxUserOwned;
        Ok(buf)
    }

    /// Hand a receive buffer back to the pool.
    pub fn put_rx_frame(&mut self, id: FrameId) -> Result<()> {
        let buf = self.frame_mut(id)?;
        if id.dir != Direction::Rx || buf.state != FrameState::RxUserOwned {
            return Err(Tc6Error::InvalidState {
                expected: FrameState::RxUserOwned,
                found: buf.state,
            });
        }
        buf.reset();
        buf.state = FrameState::Free;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scheduler side
    // ------------------------------------------------------------------

    /// Check if any transmit frame is queued.
    pub fn has_tx_ready(&self) -> bool {
        self.tx.iter().any(|b| b.state == FrameState::TxReady)
    }

    /// Oldest queued transmit frame submitted after sequence `after`.
    pub(crate) fn next_tx_ready(&self, after: Option<u64>) -> Option<usize> {
        self.tx
            .iter()
            .filter(|b| b.state == FrameState::TxReady)
            .filter(|b| after.map_or(true, |seq| b.seq > seq))
            .min_by_key(|b| b.seq)
            .map(|b| b.id.index)
    }

    pub(crate) fn tx(&self, index: usize) -> &FrameBuffer {
        &self.tx[index]
    }

    pub(crate) fn tx_seq(&self, index: usize) -> u64 {
        self.tx[index].seq
    }

    /// Return a transmitted buffer to the pool.
    pub(crate) fn release_tx(&mut self, index: usize) {
        let buf = &mut self.tx[index];
        debug_assert_eq!(buf.state, FrameState::TxReady);
        if buf.state == FrameState::TxReady {
            buf.reset();
            buf.state = FrameState::Free;
        }
    }

    /// The receive buffer currently being reassembled, if any.
    pub(crate) fn rx_in_progress(&self) -> Option<usize> {
        self.rx
            .iter()
            .position(|b| b.state == FrameState::RxInProgress)
    }

    /// Check if the receive side can take another chunk of frame data.
    pub fn rx_can_accept(&self) -> bool {
        self.rx
            .iter()
            .any(|b| matches!(b.state, FrameState::Free | FrameState::RxInProgress))
    }

    /// Buffer for incoming chunk data.
    ///
    /// Unless `new` is set, a frame already being reassembled is continued.
    /// Otherwise a free buffer is claimed with its cursor reset.
    pub(crate) fn get_empty_rx_buffer(&mut self, new: bool) -> Result<usize> {
        if !new {
            if let Some(index) = self.rx_in_progress() {
                return Ok(index);
            }
        }
        let buf = self
            .rx
            .iter_mut()
            .find(|b| b.state == FrameState::Free)
            .ok_or(Tc6Error::NoBuffersAvailable)?;
        buf.reset();
        buf.state = FrameState::RxInProgress;
        Ok(buf.id.index)
    }

    pub(crate) fn rx_mut(&mut self, index: usize) -> &mut FrameBuffer {
        &mut self.rx[index]
    }

    /// Restart reassembly in a buffer for a frame tagged `vs`.
    pub(crate) fn restart_rx(&mut self, index: usize, vs: u8) {
        let buf = &mut self.rx[index];
        buf.reset();
        buf.set_vs(vs);
    }

    /// Mark a reassembled frame complete and latch its footer flags.
    pub(crate) fn complete_rx(&mut self, index: usize, frame_drop: bool, rtsa: bool, rtsp: bool) {
        let seq = self.bump_seq();
        let buf = &mut self.rx[index];
        debug_assert_eq!(buf.state, FrameState::RxInProgress);
        buf.len = buf.index;
        buf.frame_drop = frame_drop;
        buf.rtsa = rtsa;
        buf.rtsp = rtsp;
        buf.seq = seq;
        buf.state = FrameState::RxComplete;
    }

    /// Abandon a frame being reassembled.
    pub(crate) fn abort_rx(&mut self, index: usize) {
        let buf = &mut self.rx[index];
        buf.reset();
        buf.state = FrameState::Free;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_tx(pool: &mut FramePool, bytes: &[u8]) -> FrameId {
        let buf = pool.get_tx_frame().unwrap();
        buf.fill(bytes).unwrap();
        let id = buf.id();
        pool.put_tx_frame(id).unwrap();
        id
    }

    fn receive(pool: &mut FramePool, bytes: &[u8], vs: u8) -> usize {
        let index = pool.get_empty_rx_buffer(true).unwrap();
        pool.restart_rx(index, vs);
        assert!(pool.rx_mut(index).append(bytes));
        pool.complete_rx(index, false, false, false);
        index
    }

    #[test]
    fn test_pool_creation() {
        let pool = FramePool::new(3, 2, 128);
        assert_eq!(pool.count(Direction::Tx, FrameState::Free), 3);
        assert_eq!(pool.count(Direction::Rx, FrameState::Free), 2);
        assert!(!pool.has_tx_ready());
        assert!(pool.rx_can_accept());
    }

    #[test]
    fn test_get_tx_frame_clears_data() {
        let mut pool = FramePool::new(1, 1, 16);
        let id = queue_tx(&mut pool, &[0xAA; 16]);
        let index = pool.next_tx_ready(None).unwrap();
        pool.release_tx(index);

        let buf = pool.get_tx_frame().unwrap();
        assert_eq!(buf.id(), id);
        assert_eq!(buf.state(), FrameState::TxBusy);
        assert!(buf.data_mut().iter().all(|&b| b == 0));
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn test_tx_pool_exhaustion_leaves_state_unchanged() {
        let mut pool = FramePool::new(2, 1, 16);
        queue_tx(&mut pool, b"one");
        pool.get_tx_frame().unwrap();

        let result = pool.get_tx_frame();
        assert!(matches!(result, Err(Tc6Error::NoBuffersAvailable)));
        assert_eq!(pool.count(Direction::Tx, FrameState::TxReady), 1);
        assert_eq!(pool.count(Direction::Tx, FrameState::TxBusy), 1);
    }

    #[test]
    fn test_put_tx_frame_requires_tx_busy() {
        let mut pool = FramePool::new(1, 1, 16);
        let id = queue_tx(&mut pool, b"x");

        let result = pool.put_tx_frame(id);
        assert!(matches!(
            result,
            Err(Tc6Error::InvalidState {
                expected: FrameState::TxBusy,
                found: FrameState::TxReady
            })
        ));
    }

    #[test]
    fn test_put_tx_frame_rejects_empty_frame() {
        let mut pool = FramePool::new(1, 1, 16);
        let id = pool.get_tx_frame().unwrap().id();
        assert!(matches!(
            pool.put_tx_frame(id),
            Err(Tc6Error::InvalidLength { len: 0, .. })
        ));
    }

    #[test]
    fn test_fill_rejects_oversized_frame() {
        let mut pool = FramePool::new(1, 1, 8);
        let buf = pool.get_tx_frame().unwrap();
        assert!(buf.fill(&[0u8; 9]).is_err());
        assert!(buf.set_len(9).is_err());
        assert!(buf.set_len(8).is_ok());
    }

    #[test]
    fn test_tx_ready_fifo_order() {
        let mut pool = FramePool::new(3, 1, 16);
        let first = queue_tx(&mut pool, b"a");
        let second = queue_tx(&mut pool, b"b");

        // Free slot 0 and requeue it: it must now come after slot 1.
        let index = pool.next_tx_ready(None).unwrap();
        assert_eq!(index, first.index());
        pool.release_tx(index);
        let third = queue_tx(&mut pool, b"c");
        assert_eq!(third.index(), first.index());

        let next = pool.next_tx_ready(None).unwrap();
        assert_eq!(next, second.index());
        let after = pool.next_tx_ready(Some(pool.tx_seq(next))).unwrap();
        assert_eq!(after, third.index());
        assert!(pool.next_tx_ready(Some(pool.tx_seq(after))).is_none());
    }

    #[test]
    fn test_rx_lifecycle() {
        let mut pool = FramePool::new(1, 2, 32);
        receive(&mut pool, b"hello", 1);

        let buf = pool.get_rx_frame().unwrap();
        assert_eq!(buf.data(), b"hello");
        assert_eq!(buf.vs(), 1);
        assert_eq!(buf.state(), FrameState::RxUserOwned);
        let id = buf.id();

        pool.put_rx_frame(id).unwrap();
        assert_eq!(pool.frame(id).unwrap().state(), FrameState::Free);
        assert_eq!(pool.frame(id).unwrap().len(), 0);
        assert_eq!(pool.frame(id).unwrap().cursor(), 0);
    }

    #[test]
    fn test_get_rx_frame_empty_pool() {
        let mut pool = FramePool::new(1, 1, 32);
        assert!(matches!(
            pool.get_rx_frame(),
            Err(Tc6Error::NoFrameAvailable)
        ));
    }

    #[test]
    fn test_get_rx_frame_matching() {
        let mut pool = FramePool::new(1, 3, 32);
        receive(&mut pool, b"zero", 0);
        receive(&mut pool, b"two", 2);

        let buf = pool.get_rx_frame_matching(2, 0x3).unwrap();
        assert_eq!(buf.data(), b"two");
        assert!(matches!(
            pool.get_rx_frame_matching(1, 0x3),
            Err(Tc6Error::NoFrameAvailable)
        ));
        // Mask 0 matches anything.
        assert_eq!(pool.get_rx_frame_matching(3, 0).unwrap().data(), b"zero");
    }

    #[test]
    fn test_rx_frames_in_completion_order() {
        let mut pool = FramePool::new(1, 3, 32);
        receive(&mut pool, b"first", 0);
        receive(&mut pool, b"second", 0);

        let id = pool.get_rx_frame().unwrap().id();
        pool.put_rx_frame(id).unwrap();
        // The freed slot 0 is reused, yet "second" is still older.
        receive(&mut pool, b"third", 0);

        assert_eq!(pool.get_rx_frame().unwrap().data(), b"second");
        assert_eq!(pool.get_rx_frame().unwrap().data(), b"third");
    }

    #[test]
    fn test_put_rx_frame_wrong_state_changes_nothing() {
        let mut pool = FramePool::new(1, 2, 32);
        let index = receive(&mut pool, b"data", 0);
        let id = pool.rx_mut(index).id();

        let result = pool.put_rx_frame(id);
        assert!(matches!(
            result,
            Err(Tc6Error::InvalidState {
                expected: FrameState::RxUserOwned,
                found: FrameState::RxComplete
            })
        ));
        let buf = pool.frame(id).unwrap();
        assert_eq!(buf.state(), FrameState::RxComplete);
        assert_eq!(buf.data(), b"data");
    }

    #[test]
    fn test_get_empty_rx_buffer_prefers_in_progress() {
        let mut pool = FramePool::new(1, 2, 32);
        let first = pool.get_empty_rx_buffer(false).unwrap();
        assert!(pool.rx_mut(first).append(b"abc"));

        assert_eq!(pool.get_empty_rx_buffer(false).unwrap(), first);
        let second = pool.get_empty_rx_buffer(true).unwrap();
        assert_ne!(second, first);
        assert!(matches!(
            pool.get_empty_rx_buffer(true),
            Err(Tc6Error::NoBuffersAvailable)
        ));
    }

    #[test]
    fn test_append_overflow() {
        let mut pool = FramePool::new(1, 1, 4);
        let index = pool.get_empty_rx_buffer(false).unwrap();
        assert!(pool.rx_mut(index).append(b"abc"));
        assert!(!pool.rx_mut(index).append(b"de"));
        assert_eq!(pool.rx_mut(index).cursor(), 3);

        pool.abort_rx(index);
        assert_eq!(pool.count(Direction::Rx, FrameState::Free), 1);
    }

    #[test]
    fn test_rx_can_accept() {
        let mut pool = FramePool::new(1, 1, 8);
        receive(&mut pool, b"x", 0);
        assert!(!pool.rx_can_accept());
    }

    #[test]
    fn test_vs_is_two_bits() {
        let mut pool = FramePool::new(1, 1, 8);
        let buf = pool.get_tx_frame().unwrap();
        buf.set_vs(0xFF);
        assert_eq!(buf.vs(), 3);
    }
}
