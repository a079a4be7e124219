//! Protocol module - wire format and frame types.
//!
//! This module implements the TC6 framing primitives:
//! - 32-bit header, footer and control header packing
//! - Odd parity over each word
//! - Owned frame type for completed receive frames

mod frame;
mod wire_format;

pub use frame::Frame;
pub use wire_format::{
    bits, check_parity, is_data_word, parity_bit, read_be32, with_parity, write_be32, CtrlHeader,
    DataFooter, DataHeader, CHUNK_PAYLOAD_SIZE, CHUNK_SIZE, CTRL_HEADER_SIZE, HEADER_SIZE,
    MAX_CREDIT, REG_SIZE,
};
