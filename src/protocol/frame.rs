//! Owned receive frame handed to the application.
//!
//! Uses `bytes::Bytes` so the payload can be passed on to a network stack
//! without another copy.
//!
//! # Example
//!
//! ```
//! use oa_tc6::protocol::Frame;
//! use bytes::Bytes;
//!
//! let frame = Frame::new(1, Bytes::from_static(b"hello"));
//!
//! assert_eq!(frame.vs(), 1);
//! assert_eq!(frame.payload(), b"hello");
//! ```

use bytes::Bytes;

use crate::pool::FrameBuffer;

/// A complete Ethernet frame copied out of the receive pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Vendor-specific tag from the footer that started the frame.
    pub vs: u8,
    /// Frame bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
    /// The MAC-PHY asked for the frame to be dropped.
    pub frame_drop: bool,
    /// A receive timestamp was added in front of the frame.
    pub rtsa: bool,
    /// Parity of the receive timestamp.
    pub rtsp: bool,
}

impl Frame {
    /// Create a frame with no footer flags set.
    pub fn new(vs: u8, payload: Bytes) -> Self {
        Self {
            vs,
            payload,
            frame_drop: false,
            rtsa: false,
            rtsp: false,
        }
    }

    /// Copy a completed buffer out of the pool.
    pub fn from_buffer(buf: &FrameBuffer) -> Self {
        Self {
            vs: buf.vs(),
            payload: Bytes::copy_from_slice(buf.data()),
            frame_drop: buf.frame_drop(),
            rtsa: buf.rtsa(),
            rtsp: buf.rtsp(),
        }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Get the vendor-specific tag.
    #[inline]
    pub fn vs(&self) -> u8 {
        self.vs
    }

    /// Get the frame-drop flag.
    #[inline]
    pub fn frame_drop(&self) -> bool {
        self.frame_drop
    }

    /// Get the timestamp-added flag.
    #[inline]
    pub fn rtsa(&self) -> bool {
        self.rtsa
    }

    /// Get the timestamp parity flag.
    #[inline]
    pub fn rtsp(&self) -> bool {
        self.rtsp
    }
}
