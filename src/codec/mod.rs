//! Codec module - data-plane chunk encoding and decoding.
//!
//! - [`Encoder`] - turns queued TX frames into data and empty chunks
//! - [`Decoder`] - reassembles RX frames from received chunks
//!
//! # Design
//!
//! The encoder is a marker struct with a static method since it keeps no
//! state between exchanges. The decoder remembers whether it is skipping
//! the remainder of a dropped frame.
//!
//! # Example
//!
//! ```
//! use oa_tc6::codec::Encoder;
//! use oa_tc6::pool::FramePool;
//! use oa_tc6::protocol::CHUNK_SIZE;
//!
//! let mut pool = FramePool::new(1, 1, 1536);
//! let buf = pool.get_tx_frame().unwrap();
//! buf.fill(&[0x55; 100]).unwrap();
//! let id = buf.id();
//! pool.put_tx_frame(id).unwrap();
//!
//! let mut spi_buf = vec![0u8; 4 * CHUNK_SIZE];
//! let mut drained = Vec::new();
//! let out = Encoder::encode(&pool, &mut spi_buf, 4, 0, 4, &mut drained);
//! assert_eq!(out.data_chunks, 2);
//! ```

mod decoder;
mod encoder;

pub use decoder::Decoder;
pub use encoder::{chunks_for, EncodeOutcome, Encoder};
